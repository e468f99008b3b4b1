//! `run_query`: open a session, run one logical query, close the session.

use chrono::Utc;
use tracing::info;

use crate::catalog::{self, QueryKind};
use crate::context::arp_table;
use crate::error::Result;
use crate::rows::{QueryOutcome, QueryResult};
use crate::session::Session;
use crate::snmp_utils::DeviceConnector;
use crate::tables::{interface_ip_rows, mac_rows, route_rows, system_info, vlan_rows, vrf_rows};
use crate::target::DeviceTarget;
use crate::transport::Connector;
use crate::vendor::detect_or_generic;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Poll this SNMPv3 context only, skipping VRF enumeration.
    pub context_name: Option<String>,
    /// Community-string VLAN index for v1/v2c (`community@vlan`).
    pub vlan: Option<u32>,
}

/// Run a named query against a device over the production transports.
pub fn run_query(target: &DeviceTarget, query: &str, options: &QueryOptions) -> Result<QueryOutcome> {
    run_query_with(DeviceConnector, target, query, options)
}

/// Run a named query through any connector. The session is closed on every
/// path out of this function.
pub fn run_query_with<C: Connector>(
    connector: C,
    target: &DeviceTarget,
    query: &str,
    options: &QueryOptions,
) -> Result<QueryOutcome> {
    let kind = catalog::lookup(query)?.kind;
    let polled_at = Utc::now();

    let mut session = Session::new(connector, target.clone());
    let result = execute(&mut session, kind, options);
    session.close();
    let result = result?;

    info!(host = %target.hostname, query = %kind, empty = result.is_empty(), "query finished");
    Ok(QueryOutcome {
        hostname: target.hostname.clone(),
        query: kind,
        polled_at,
        result,
    })
}

/// Run one query on an existing session, opening it if needed.
pub fn execute<C: Connector>(
    session: &mut Session<C>,
    kind: QueryKind,
    options: &QueryOptions,
) -> Result<QueryResult> {
    session.open()?;
    if options.vlan.is_some() {
        session.set_vlan(options.vlan)?;
    }
    if let Some(context) = options.context_name.as_deref() {
        session.switch_context(Some(context))?;
    }

    match kind {
        QueryKind::SystemInfo => Ok(QueryResult::SystemInfo(system_info(session)?)),
        QueryKind::ArpTable => Ok(QueryResult::Arp(arp_table(session)?)),
        QueryKind::MacTable => Ok(QueryResult::Mac(mac_rows(session)?)),
        QueryKind::InterfaceIps => Ok(QueryResult::InterfaceIps(interface_ip_rows(session)?)),
        QueryKind::RoutingTable => Ok(QueryResult::Routes(route_rows(session)?)),
        QueryKind::VlanTable => {
            let profile = detect_or_generic(session)?;
            vlan_rows(session, &profile)
        }
        QueryKind::VrfTable => {
            let profile = detect_or_generic(session)?;
            vrf_rows(session, &profile)
        }
    }
}
