//! Symbolic MIB name to numeric OID registry, plus dotted-OID helpers.
//!
//! The baseline table covers the IETF MIBs every vendor implements. Vendor
//! dialects add or overwrite entries in a per-session [`OidRegistry`]; nothing
//! is ever removed, so a symbol a dialect does not touch keeps its generic
//! value.

use std::collections::HashMap;

// SNMPv2-MIB
pub const SYS_DESCR: &str = "SNMPv2-MIB::sysDescr";
pub const SYS_OBJECT_ID: &str = "SNMPv2-MIB::sysObjectID";
pub const SYS_UPTIME: &str = "SNMPv2-MIB::sysUpTime";
pub const SYS_CONTACT: &str = "SNMPv2-MIB::sysContact";
pub const SYS_NAME: &str = "SNMPv2-MIB::sysName";
pub const SYS_LOCATION: &str = "SNMPv2-MIB::sysLocation";
pub const SYSTEM: &str = "SNMPv2-MIB::system";

// IF-MIB
pub const IF_DESCR: &str = "IF-MIB::ifDescr";
pub const IF_PHYS_ADDRESS: &str = "IF-MIB::ifPhysAddress";
pub const IF_ALIAS: &str = "IF-MIB::ifAlias";

// IP-MIB / IP-FORWARD-MIB
pub const IP_NET_TO_MEDIA_IF_INDEX: &str = "IP-MIB::ipNetToMediaIfIndex";
pub const IP_NET_TO_MEDIA_PHYS_ADDRESS: &str = "IP-MIB::ipNetToMediaPhysAddress";
pub const IP_NET_TO_MEDIA_NET_ADDRESS: &str = "IP-MIB::ipNetToMediaNetAddress";
pub const IP_AD_ENT_ADDR: &str = "IP-MIB::ipAdEntAddr";
pub const IP_AD_ENT_IF_INDEX: &str = "IP-MIB::ipAdEntIfIndex";
pub const IP_CIDR_ROUTE_DEST: &str = "IP-FORWARD-MIB::ipCidrRouteDest";

// BRIDGE-MIB / Q-BRIDGE-MIB
pub const DOT1D_BASE_PORT_IF_INDEX: &str = "BRIDGE-MIB::dot1dBasePortIfIndex";
pub const DOT1D_TP_FDB_ADDRESS: &str = "BRIDGE-MIB::dot1dTpFdbAddress";
pub const DOT1D_TP_FDB_PORT: &str = "BRIDGE-MIB::dot1dTpFdbPort";
pub const DOT1Q_VLAN_STATIC_NAME: &str = "Q-BRIDGE-MIB::dot1qVlanStaticName";

// Vendor MIBs
pub const CISCO_VTP_VLAN_NAME: &str = "CISCO-VTP-MIB::vtpVlanName";
pub const MPLS_VPN_VRF_DESCRIPTION: &str = "MPLS-VPN-MIB::mplsVpnVrfDescription";
pub const MPLS_VPN_VRF_ROUTE_DISTINGUISHER: &str = "MPLS-VPN-MIB::mplsVpnVrfRouteDistinguisher";
pub const ALCATEL_VLAN_DESCRIPTION: &str = "ALCATEL-IND1-VLAN-MGR-MIB::vlanDescription";
pub const ALCATEL_VRF_PROFILE: &str = "ALCATEL-IND1-VIRTUAL-ROUTER-MIB::alaVrfConfigProfile";
pub const ALCATEL_VRF_NAME_INDEX: &str = "ALCATEL-IND1-VIRTUAL-ROUTER-MIB::alaVrfConfigNameIndex";

static BASELINE: &[(&str, &str)] = &[
    (SYSTEM, ".1.3.6.1.2.1.1"),
    (SYS_DESCR, ".1.3.6.1.2.1.1.1"),
    (SYS_OBJECT_ID, ".1.3.6.1.2.1.1.2"),
    (SYS_UPTIME, ".1.3.6.1.2.1.1.3"),
    (SYS_CONTACT, ".1.3.6.1.2.1.1.4"),
    (SYS_NAME, ".1.3.6.1.2.1.1.5"),
    (SYS_LOCATION, ".1.3.6.1.2.1.1.6"),
    (IF_DESCR, ".1.3.6.1.2.1.2.2.1.2"),
    (IF_PHYS_ADDRESS, ".1.3.6.1.2.1.2.2.1.6"),
    (IF_ALIAS, ".1.3.6.1.2.1.31.1.1.1.18"),
    (IP_NET_TO_MEDIA_IF_INDEX, ".1.3.6.1.2.1.4.22.1.1"),
    (IP_NET_TO_MEDIA_PHYS_ADDRESS, ".1.3.6.1.2.1.4.22.1.2"),
    (IP_NET_TO_MEDIA_NET_ADDRESS, ".1.3.6.1.2.1.4.22.1.3"),
    (IP_AD_ENT_ADDR, ".1.3.6.1.2.1.4.20.1.1"),
    (IP_AD_ENT_IF_INDEX, ".1.3.6.1.2.1.4.20.1.2"),
    (IP_CIDR_ROUTE_DEST, ".1.3.6.1.2.1.4.24.4.1.1"),
    (DOT1D_BASE_PORT_IF_INDEX, ".1.3.6.1.2.1.17.1.4.1.2"),
    (DOT1D_TP_FDB_ADDRESS, ".1.3.6.1.2.1.17.4.3.1.1"),
    (DOT1D_TP_FDB_PORT, ".1.3.6.1.2.1.17.4.3.1.2"),
    (DOT1Q_VLAN_STATIC_NAME, ".1.3.6.1.2.1.17.7.1.4.3.1.1"),
    (CISCO_VTP_VLAN_NAME, ".1.3.6.1.4.1.9.9.46.1.3.1.1.4"),
    (MPLS_VPN_VRF_DESCRIPTION, ".1.3.6.1.3.118.1.2.2.1.2"),
    (MPLS_VPN_VRF_ROUTE_DISTINGUISHER, ".1.3.6.1.3.118.1.2.2.1.3"),
];

/// Per-session view of the OID table: the static baseline plus whatever a
/// vendor dialect registered for this device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OidRegistry {
    overrides: HashMap<String, String>,
}

impl OidRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Numeric OID for `symbol`. Unregistered input is returned unchanged so
    /// callers may pass literal dotted OIDs.
    pub fn resolve(&self, symbol: &str) -> String {
        if let Some(oid) = self.overrides.get(symbol) {
            return oid.clone();
        }
        BASELINE
            .iter()
            .find(|(name, _)| *name == symbol)
            .map(|(_, oid)| oid.to_string())
            .unwrap_or_else(|| symbol.to_string())
    }

    pub fn override_symbol(&mut self, symbol: &str, oid: impl Into<String>) {
        self.overrides.insert(symbol.to_string(), oid.into());
    }

    pub fn is_registered(&self, symbol: &str) -> bool {
        self.overrides.contains_key(symbol) || BASELINE.iter().any(|(name, _)| *name == symbol)
    }

    /// Drop every vendor registration, back to the baseline.
    pub fn reset(&mut self) {
        self.overrides.clear();
    }
}

pub fn parse_oid(oid_str: &str) -> Option<Vec<u64>> {
    let parts: Vec<u64> = oid_str
        .trim()
        .split('.')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect::<Option<_>>()?;
    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}

/// Dotted form with a leading dot, the way every key leaves the transport.
pub fn to_dotted(parts: &[u64]) -> String {
    parts.iter().fold(String::new(), |mut acc, n| {
        acc.push('.');
        acc.push_str(&n.to_string());
        acc
    })
}

pub fn starts_with(oid: &[u64], prefix: &[u64]) -> bool {
    if oid.len() < prefix.len() {
        return false;
    }
    &oid[..prefix.len()] == prefix
}

/// The index portion of a walked key: everything after `base` and its
/// separating dot. Leading dots on either side are ignored.
pub fn index_suffix<'a>(key: &'a str, base: &str) -> Option<&'a str> {
    let key = key.trim_start_matches('.');
    let base = base.trim_start_matches('.');
    key.strip_prefix(base)?
        .strip_prefix('.')
        .filter(|rest| !rest.is_empty())
}

pub fn extract_last_id(key: &str) -> Option<u32> {
    key.rsplit('.').next()?.parse().ok()
}

/// `base.instance`, tolerating a trailing dot on the base.
pub fn instance(base: &str, index: impl std::fmt::Display) -> String {
    format!("{}.{}", base.trim_end_matches('.'), index)
}
