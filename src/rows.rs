//! Result rows, one shape per logical query. All string fields hold values
//! already passed through the value parser, so they are safe to render.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::QueryKind;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    pub descr: String,
    pub object_id: String,
    pub uptime: String,
    pub contact: String,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArpRow {
    pub ip: String,
    pub mac: String,
    /// Interface index.
    pub port: Option<u32>,
    pub port_name: String,
    pub vrf_context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacRow {
    pub mac: String,
    pub bridge_port: Option<u32>,
    pub vlan: Option<u32>,
    pub port: String,
    pub port_alias: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceIpRow {
    pub ip: String,
    pub mac: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RouteRow {
    pub subnet: String,
    pub mask: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VrfRow {
    pub index: Option<u32>,
    pub profile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_distinguisher: Option<String>,
}

/// ARP rows for the default context, or keyed by VRF context name when the
/// device was polled context by context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ArpTable {
    Single(Vec<ArpRow>),
    PerContext(BTreeMap<String, Vec<ArpRow>>),
}

impl ArpTable {
    pub fn is_empty(&self) -> bool {
        match self {
            ArpTable::Single(rows) => rows.is_empty(),
            ArpTable::PerContext(contexts) => contexts.values().all(Vec::is_empty),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ArpTable::Single(rows) => rows.len(),
            ArpTable::PerContext(contexts) => contexts.values().map(Vec::len).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum QueryResult {
    SystemInfo(SystemInfo),
    Arp(ArpTable),
    Mac(Vec<MacRow>),
    InterfaceIps(Vec<InterfaceIpRow>),
    Routes(Vec<RouteRow>),
    Vlans(BTreeMap<u32, String>),
    Vrfs(BTreeMap<String, VrfRow>),
    /// The device's vendor has no known MIB for this query.
    NotEstablished { query: QueryKind, reason: String },
}

impl QueryResult {
    /// True when the device returned no rows. System info is never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            QueryResult::SystemInfo(_) => false,
            QueryResult::Arp(table) => table.is_empty(),
            QueryResult::Mac(rows) => rows.is_empty(),
            QueryResult::InterfaceIps(rows) => rows.is_empty(),
            QueryResult::Routes(rows) => rows.is_empty(),
            QueryResult::Vlans(rows) => rows.is_empty(),
            QueryResult::Vrfs(rows) => rows.is_empty(),
            QueryResult::NotEstablished { .. } => true,
        }
    }

    pub fn is_established(&self) -> bool {
        !matches!(self, QueryResult::NotEstablished { .. })
    }
}

/// A query result as handed back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub hostname: String,
    pub query: QueryKind,
    pub polled_at: DateTime<Utc>,
    pub result: QueryResult,
}
