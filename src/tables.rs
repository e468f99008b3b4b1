//! Table fetchers: walk the columns of a virtual table, normalise every
//! value, and join the columns into rows.
//!
//! Sibling columns of the same conceptual row (ARP, bridge forwarding,
//! address table) are joined by position. Independently walked tables are
//! correlated by the index suffix of each key. Secondary per-row lookups are
//! cached for the duration of one call, and a failed lookup only blanks the
//! affected row.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use crate::catalog::QueryKind;
use crate::error::Result;
use crate::oid::{self, extract_last_id, index_suffix, instance};
use crate::rows::{ArpRow, InterfaceIpRow, MacRow, QueryResult, RouteRow, SystemInfo, VrfRow};
use crate::session::Session;
use crate::transport::Connector;
use crate::value::{decode_vrf_name, format_mac, parse_index, parse_value};
use crate::vendor::{OidSupport, VendorProfile, VendorTable};

/// Walk a registry symbol; returns the resolved base OID with the rows.
fn walk_column<C: Connector>(
    session: &mut Session<C>,
    symbol: &str,
) -> Result<(String, Vec<(String, String)>)> {
    let base = session.resolve(symbol);
    let rows = session.walk(&base)?;
    Ok((base, rows))
}

fn check_aligned(hostname: &str, what: &str, lengths: &[usize]) {
    if lengths.windows(2).any(|w| w[0] != w[1]) {
        warn!(host = hostname, table = what, ?lengths, "column walks differ in length, joining the common prefix");
    }
}

pub(crate) fn not_established(query: QueryKind, profile: &VendorProfile) -> QueryResult {
    QueryResult::NotEstablished {
        query,
        reason: format!("no MIB established for vendor {}", profile.vendor),
    }
}

pub fn system_info<C: Connector>(session: &mut Session<C>) -> Result<SystemInfo> {
    let scalars = [
        oid::SYS_DESCR,
        oid::SYS_OBJECT_ID,
        oid::SYS_UPTIME,
        oid::SYS_CONTACT,
        oid::SYS_NAME,
        oid::SYS_LOCATION,
    ];
    let mut values = Vec::with_capacity(scalars.len());
    let mut first_error = None;
    for symbol in scalars {
        let oid = instance(&session.resolve(symbol), 0);
        match session.get(&oid) {
            Ok(raw) => values.push(parse_value(&raw)),
            Err(e) => {
                debug!(host = %session.hostname(), oid = %oid, error = %e, "system scalar unavailable");
                values.push(String::new());
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    if let Some(e) = first_error {
        if values.iter().all(String::is_empty) {
            return Err(e);
        }
    }

    let mut values = values.into_iter();
    let mut next = || values.next().unwrap_or_default();
    Ok(SystemInfo {
        descr: next(),
        object_id: next(),
        uptime: next(),
        contact: next(),
        name: next(),
        location: next(),
    })
}

/// Interface index to ifDescr, resolved at most once per call.
struct PortNames {
    names: HashMap<u32, String>,
}

impl PortNames {
    fn new() -> Self {
        Self {
            names: HashMap::new(),
        }
    }

    fn lookup<C: Connector>(&mut self, session: &mut Session<C>, if_index: u32) -> String {
        self.names
            .entry(if_index)
            .or_insert_with(|| {
                let oid = instance(&session.resolve(oid::IF_DESCR), if_index);
                match session.get(&oid) {
                    Ok(raw) => parse_value(&raw),
                    Err(e) => {
                        warn!(host = %session.hostname(), if_index, error = %e, "port name lookup failed");
                        String::new()
                    }
                }
            })
            .clone()
    }
}

/// ARP entries of the session's current context.
pub fn arp_rows<C: Connector>(session: &mut Session<C>) -> Result<Vec<ArpRow>> {
    let (_, ips) = walk_column(session, oid::IP_NET_TO_MEDIA_NET_ADDRESS)?;
    let (_, macs) = walk_column(session, oid::IP_NET_TO_MEDIA_PHYS_ADDRESS)?;
    let (_, if_indexes) = walk_column(session, oid::IP_NET_TO_MEDIA_IF_INDEX)?;
    check_aligned(session.hostname(), "arp", &[ips.len(), macs.len(), if_indexes.len()]);

    let context = session.context_name().map(str::to_string);
    let mut port_names = PortNames::new();
    let mut rows = Vec::with_capacity(ips.len());
    for (((_, ip), (_, mac)), (_, if_index)) in ips.iter().zip(&macs).zip(&if_indexes) {
        let port = parse_index(if_index);
        let port_name = match port {
            Some(idx) => port_names.lookup(session, idx),
            None => String::new(),
        };
        rows.push(ArpRow {
            ip: parse_value(ip),
            mac: format_mac(mac),
            port,
            port_name,
            vrf_context: context.clone(),
        });
    }
    Ok(rows)
}

/// Bridge port to (ifDescr, ifAlias) through dot1dBasePortIfIndex.
fn resolve_bridge_port<C: Connector>(
    session: &mut Session<C>,
    bridge_port: u32,
) -> std::result::Result<(String, String), String> {
    let oid = instance(&session.resolve(oid::DOT1D_BASE_PORT_IF_INDEX), bridge_port);
    let raw = session.get(&oid).map_err(|e| e.to_string())?;
    let if_index = parse_index(&raw)
        .ok_or_else(|| format!("bridge port {} maps to no interface index", bridge_port))?;

    let oid = instance(&session.resolve(oid::IF_DESCR), if_index);
    let port = parse_value(&session.get(&oid).map_err(|e| e.to_string())?);

    let oid = instance(&session.resolve(oid::IF_ALIAS), if_index);
    let alias = match session.get(&oid) {
        Ok(raw) => parse_value(&raw),
        Err(e) => {
            debug!(host = %session.hostname(), if_index, error = %e, "no ifAlias for port");
            String::new()
        }
    };
    Ok((port, alias))
}

/// Bridge forwarding table, tagged with the session's community VLAN.
pub fn mac_rows<C: Connector>(session: &mut Session<C>) -> Result<Vec<MacRow>> {
    let (_, macs) = walk_column(session, oid::DOT1D_TP_FDB_ADDRESS)?;
    let (_, ports) = walk_column(session, oid::DOT1D_TP_FDB_PORT)?;
    check_aligned(session.hostname(), "mac", &[macs.len(), ports.len()]);

    let vlan = session.vlan();
    let mut resolved: HashMap<u32, std::result::Result<(String, String), String>> = HashMap::new();
    let mut rows = Vec::with_capacity(macs.len());
    for ((_, mac), (_, port)) in macs.iter().zip(&ports) {
        let bridge_port = parse_index(port);
        let lookup = match bridge_port {
            Some(bp) => resolved
                .entry(bp)
                .or_insert_with(|| {
                    let result = resolve_bridge_port(session, bp);
                    if let Err(e) = &result {
                        warn!(host = %session.hostname(), bridge_port = bp, error = %e, "bridge port lookup failed");
                    }
                    result
                })
                .clone(),
            None => Err("unparseable bridge port".to_string()),
        };
        let (port, port_alias, error) = match lookup {
            Ok((port, alias)) => (port, alias, None),
            Err(e) => (String::new(), String::new(), Some(e)),
        };
        rows.push(MacRow {
            mac: format_mac(mac),
            bridge_port,
            vlan,
            port,
            port_alias,
            error,
        });
    }
    Ok(rows)
}

pub fn interface_ip_rows<C: Connector>(session: &mut Session<C>) -> Result<Vec<InterfaceIpRow>> {
    let (_, addrs) = walk_column(session, oid::IP_AD_ENT_ADDR)?;
    let (_, if_indexes) = walk_column(session, oid::IP_AD_ENT_IF_INDEX)?;
    check_aligned(session.hostname(), "interface ip", &[addrs.len(), if_indexes.len()]);

    let mut macs: HashMap<u32, String> = HashMap::new();
    let mut rows = Vec::with_capacity(addrs.len());
    for ((_, addr), (_, if_index)) in addrs.iter().zip(&if_indexes) {
        let mac = match parse_index(if_index) {
            Some(idx) => macs
                .entry(idx)
                .or_insert_with(|| {
                    let oid = instance(&session.resolve(oid::IF_PHYS_ADDRESS), idx);
                    match session.get(&oid) {
                        Ok(raw) => format_mac(&raw),
                        Err(e) => {
                            warn!(host = %session.hostname(), if_index = idx, error = %e, "interface MAC lookup failed");
                            String::new()
                        }
                    }
                })
                .clone(),
            None => String::new(),
        };
        rows.push(InterfaceIpRow {
            ip: parse_value(addr),
            mac,
        });
    }
    Ok(rows)
}

/// Subnet and mask from the index of an ipCidrRouteDest key: four octets of
/// destination followed by four octets of mask.
pub fn route_from_index(index: &str) -> Option<RouteRow> {
    let octets: Vec<u8> = index
        .split('.')
        .take(8)
        .map(|p| p.parse().ok())
        .collect::<Option<_>>()?;
    if octets.len() < 8 {
        return None;
    }
    let dotted = |o: &[u8]| {
        o.iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(".")
    };
    Some(RouteRow {
        subnet: dotted(&octets[..4]),
        mask: dotted(&octets[4..8]),
    })
}

pub fn route_rows<C: Connector>(session: &mut Session<C>) -> Result<Vec<RouteRow>> {
    let (base, dests) = walk_column(session, oid::IP_CIDR_ROUTE_DEST)?;
    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for (key, _) in &dests {
        let Some(route) = index_suffix(key, &base).and_then(route_from_index) else {
            debug!(key = %key, "route key has no subnet/mask index");
            continue;
        };
        if seen.insert(route.clone()) {
            rows.push(route);
        }
    }
    Ok(rows)
}

pub fn vlan_rows<C: Connector>(session: &mut Session<C>, profile: &VendorProfile) -> Result<QueryResult> {
    let symbol = match profile.table(VendorTable::Vlan) {
        OidSupport::Established(symbol) => symbol,
        OidSupport::NotEstablished => return Ok(not_established(QueryKind::VlanTable, profile)),
    };
    let (base, names) = walk_column(session, &symbol)?;

    let mut vlans = BTreeMap::new();
    for (key, raw) in &names {
        match index_suffix(key, &base).and_then(extract_last_id) {
            Some(vlan) => {
                vlans.insert(vlan, parse_value(raw));
            }
            None => debug!(key = %key, "VLAN key has no numeric index"),
        }
    }
    Ok(QueryResult::Vlans(vlans))
}

/// VRF names (decoded from key suffixes) with their values, in walk order.
pub(crate) fn walk_vrf_column<C: Connector>(
    session: &mut Session<C>,
    symbol: &str,
) -> Result<Vec<(String, String)>> {
    let (base, rows) = walk_column(session, symbol)?;
    Ok(rows
        .iter()
        .filter_map(|(key, raw)| {
            let suffix = index_suffix(key, &base)?;
            Some((decode_vrf_name(suffix), raw.clone()))
        })
        .collect())
}

pub fn vrf_rows<C: Connector>(session: &mut Session<C>, profile: &VendorProfile) -> Result<QueryResult> {
    let symbol = match profile.table(VendorTable::Vrf) {
        OidSupport::Established(symbol) => symbol,
        OidSupport::NotEstablished => return Ok(not_established(QueryKind::VrfTable, profile)),
    };

    let mut vrfs: BTreeMap<String, VrfRow> = BTreeMap::new();
    for (name, raw) in walk_vrf_column(session, &symbol)? {
        vrfs.insert(
            name,
            VrfRow {
                index: None,
                profile: parse_value(&raw),
                route_distinguisher: None,
            },
        );
    }

    match profile.table(VendorTable::VrfNameIndex) {
        OidSupport::Established(symbol) => match walk_vrf_column(session, &symbol) {
            Ok(indexes) => {
                for (name, raw) in indexes {
                    let row = vrfs.entry(name).or_insert_with(|| VrfRow {
                        index: None,
                        profile: String::new(),
                        route_distinguisher: None,
                    });
                    row.index = parse_index(&raw);
                }
            }
            Err(e) => warn!(host = %session.hostname(), error = %e, "VRF index walk failed"),
        },
        OidSupport::NotEstablished => {
            for (position, row) in vrfs.values_mut().enumerate() {
                row.index = u32::try_from(position + 1).ok();
            }
        }
    }

    if let OidSupport::Established(symbol) = profile.table(VendorTable::VrfDistinguisher) {
        match walk_vrf_column(session, &symbol) {
            Ok(distinguishers) => {
                for (name, raw) in distinguishers {
                    if let Some(row) = vrfs.get_mut(&name) {
                        row.route_distinguisher = Some(parse_value(&raw));
                    }
                }
            }
            Err(e) => warn!(host = %session.hostname(), error = %e, "VRF distinguisher walk failed"),
        }
    }

    Ok(QueryResult::Vrfs(vrfs))
}
