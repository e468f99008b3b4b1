//! The logical queries a caller may run against a device.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::PollError;
use crate::oid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QueryKind {
    SystemInfo,
    ArpTable,
    MacTable,
    InterfaceIps,
    RoutingTable,
    VlanTable,
    VrfTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryDescriptor {
    pub id: u8,
    pub kind: QueryKind,
    pub name: &'static str,
    pub base_oid: &'static str,
    pub description: &'static str,
}

pub static CATALOG: [QueryDescriptor; 7] = [
    QueryDescriptor {
        id: 1,
        kind: QueryKind::SystemInfo,
        name: "get_system_info",
        base_oid: oid::SYSTEM,
        description: "Fetches system information",
    },
    QueryDescriptor {
        id: 2,
        kind: QueryKind::ArpTable,
        name: "get_arp_table",
        base_oid: oid::IP_NET_TO_MEDIA_NET_ADDRESS,
        description: "Fetches ARP table",
    },
    QueryDescriptor {
        id: 3,
        kind: QueryKind::MacTable,
        name: "get_mac_table",
        base_oid: oid::DOT1D_TP_FDB_ADDRESS,
        description: "Fetches MAC address table",
    },
    QueryDescriptor {
        id: 4,
        kind: QueryKind::InterfaceIps,
        name: "get_interfaces_ip",
        base_oid: oid::IP_AD_ENT_ADDR,
        description: "Fetches interface IP addresses",
    },
    QueryDescriptor {
        id: 5,
        kind: QueryKind::RoutingTable,
        name: "get_routing_table",
        base_oid: oid::IP_CIDR_ROUTE_DEST,
        description: "Fetches routing table",
    },
    QueryDescriptor {
        id: 6,
        kind: QueryKind::VlanTable,
        name: "get_vlan_table",
        base_oid: oid::DOT1Q_VLAN_STATIC_NAME,
        description: "Fetches VLAN table",
    },
    QueryDescriptor {
        id: 7,
        kind: QueryKind::VrfTable,
        name: "get_vrf_table",
        base_oid: oid::MPLS_VPN_VRF_DESCRIPTION,
        description: "Fetches VRF table",
    },
];

impl QueryKind {
    pub fn descriptor(self) -> &'static QueryDescriptor {
        match self {
            QueryKind::SystemInfo => &CATALOG[0],
            QueryKind::ArpTable => &CATALOG[1],
            QueryKind::MacTable => &CATALOG[2],
            QueryKind::InterfaceIps => &CATALOG[3],
            QueryKind::RoutingTable => &CATALOG[4],
            QueryKind::VlanTable => &CATALOG[5],
            QueryKind::VrfTable => &CATALOG[6],
        }
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QueryKind {
    type Err = PollError;

    fn from_str(name: &str) -> Result<Self, PollError> {
        lookup(name).map(|d| d.kind)
    }
}

/// Descriptor by logical name. The `get_` prefix is optional.
pub fn lookup(name: &str) -> Result<&'static QueryDescriptor, PollError> {
    let wanted = name.trim();
    CATALOG
        .iter()
        .find(|d| d.name == wanted || d.name.strip_prefix("get_") == Some(wanted))
        .ok_or_else(|| PollError::UnsupportedQuery(wanted.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptors_match_their_kind() {
        for d in CATALOG.iter() {
            assert_eq!(d.kind.descriptor().id, d.id);
        }
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(lookup("get_arp_table").unwrap().kind, QueryKind::ArpTable);
        assert_eq!(lookup("vrf_table").unwrap().id, 7);
        assert_eq!("get_mac_table".parse::<QueryKind>().unwrap(), QueryKind::MacTable);
    }

    #[test]
    fn unknown_name_is_unsupported() {
        let err = lookup("get_bgp_peers").unwrap_err();
        assert!(matches!(err, PollError::UnsupportedQuery(ref n) if n == "get_bgp_peers"));
    }
}
