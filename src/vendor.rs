//! Vendor dialect detection from sysObjectID.
//!
//! Only VLAN and VRF discovery differ between vendors; everything else uses
//! IETF MIBs. Each dialect is a row in [`DIALECTS`] keyed by the enterprise
//! number found in the 8th component of the dotted sysObjectID, so a new
//! vendor is a new row plus its OID registrations.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{PollError, Result};
use crate::oid::{self, OidRegistry};
use crate::session::Session;
use crate::transport::{Connector, TransportError};
use crate::value::parse_value;

/// Vendor-dependent logical tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VendorTable {
    Vlan,
    Vrf,
    VrfDistinguisher,
    VrfNameIndex,
}

/// Resolution of a vendor table: the MIB symbol to walk, or the explicit
/// "not established" sentinel when no MIB is known for this vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OidSupport {
    Established(String),
    NotEstablished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Vendor {
    Alcatel,
    Cisco,
    Netgear,
    Generic,
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Vendor::Alcatel => "alcatel",
            Vendor::Cisco => "cisco",
            Vendor::Netgear => "netgear",
            Vendor::Generic => "generic",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorProfile {
    pub vendor: Vendor,
    /// Enterprise number taken from sysObjectID.
    pub token: String,
    /// MIB revision fragment, for dialects that version their subtree.
    pub mib_fragment: Option<String>,
    tables: HashMap<VendorTable, String>,
    registrations: Vec<(&'static str, String)>,
}

impl VendorProfile {
    fn new(vendor: Vendor, token: &str) -> Self {
        Self {
            vendor,
            token: token.to_string(),
            mib_fragment: None,
            tables: HashMap::new(),
            registrations: Vec::new(),
        }
    }

    /// Profile used when the device's dialect is unknown or undetectable.
    pub fn generic(token: &str) -> Self {
        VendorProfile::new(Vendor::Generic, token).with_table(VendorTable::Vlan, oid::DOT1Q_VLAN_STATIC_NAME)
    }

    fn with_table(mut self, table: VendorTable, symbol: &str) -> Self {
        self.tables.insert(table, symbol.to_string());
        self
    }

    fn with_registration(mut self, symbol: &'static str, numeric: String) -> Self {
        self.registrations.push((symbol, numeric));
        self
    }

    pub fn table(&self, table: VendorTable) -> OidSupport {
        match self.tables.get(&table) {
            Some(symbol) => OidSupport::Established(symbol.clone()),
            None => OidSupport::NotEstablished,
        }
    }

    /// Write this dialect's OIDs into a session registry.
    pub fn apply(&self, registry: &mut OidRegistry) {
        for (symbol, numeric) in &self.registrations {
            registry.override_symbol(symbol, numeric.clone());
        }
    }
}

struct Dialect {
    token: &'static str,
    build: fn(&str, &[&str]) -> std::result::Result<VendorProfile, String>,
}

static DIALECTS: &[Dialect] = &[
    Dialect {
        token: "6486",
        build: alcatel,
    },
    Dialect {
        token: "9",
        build: cisco,
    },
    Dialect {
        token: "4526",
        build: netgear,
    },
];

fn alcatel(token: &str, parts: &[&str]) -> std::result::Result<VendorProfile, String> {
    let fragment = parts
        .get(8)
        .filter(|f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()))
        .ok_or_else(|| "alcatel sysObjectID carries no MIB revision".to_string())?;
    let base = format!(".1.3.6.1.4.1.6486.{}.1.2.1", fragment);

    let mut profile = VendorProfile::new(Vendor::Alcatel, token)
        .with_table(VendorTable::Vlan, oid::ALCATEL_VLAN_DESCRIPTION)
        .with_table(VendorTable::Vrf, oid::ALCATEL_VRF_PROFILE)
        .with_table(VendorTable::VrfNameIndex, oid::ALCATEL_VRF_NAME_INDEX)
        .with_registration(oid::ALCATEL_VLAN_DESCRIPTION, format!("{}.3.1.1.1.1.1.2", base))
        .with_registration(oid::ALCATEL_VRF_PROFILE, format!("{}.73.1.1.1.1.2", base))
        .with_registration(oid::ALCATEL_VRF_NAME_INDEX, format!("{}.73.1.1.1.1.6", base));
    profile.mib_fragment = Some(fragment.to_string());
    Ok(profile)
}

fn cisco(token: &str, _parts: &[&str]) -> std::result::Result<VendorProfile, String> {
    // vtpVlanName is indexed by management domain first; domain 1 is the default.
    let vlan_name = OidRegistry::new().resolve(oid::CISCO_VTP_VLAN_NAME);
    Ok(VendorProfile::new(Vendor::Cisco, token)
        .with_table(VendorTable::Vlan, oid::CISCO_VTP_VLAN_NAME)
        .with_table(VendorTable::Vrf, oid::MPLS_VPN_VRF_DESCRIPTION)
        .with_table(VendorTable::VrfDistinguisher, oid::MPLS_VPN_VRF_ROUTE_DISTINGUISHER)
        .with_registration(oid::CISCO_VTP_VLAN_NAME, oid::instance(&vlan_name, 1)))
}

fn netgear(token: &str, _parts: &[&str]) -> std::result::Result<VendorProfile, String> {
    Ok(VendorProfile::new(Vendor::Netgear, token))
}

/// Pick the dialect for a dotted sysObjectID value.
pub fn profile_from_sys_object_id(sys_object_id: &str) -> std::result::Result<VendorProfile, String> {
    let trimmed = sys_object_id.trim();
    let dotted = if trimmed.starts_with('.') {
        trimmed.to_string()
    } else {
        format!(".{}", trimmed)
    };
    let parts: Vec<&str> = dotted.split('.').collect();
    let token = parts
        .get(7)
        .filter(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_digit()))
        .ok_or_else(|| format!("sysObjectID '{}' has no enterprise component", trimmed))?;

    match DIALECTS.iter().find(|d| d.token == *token) {
        Some(dialect) => (dialect.build)(token, &parts),
        None => Ok(VendorProfile::generic(token)),
    }
}

/// Detect the vendor of the session's device, once per session.
///
/// A failed detection is returned as a protocol error and nothing is cached;
/// see [`detect_or_generic`] for the form the table fetchers use.
pub fn detect<C: Connector>(session: &mut Session<C>) -> Result<&VendorProfile> {
    if session.vendor_profile().is_none() {
        let oid = oid::instance(&session.resolve(oid::SYS_OBJECT_ID), 0);
        let raw = session.get(&oid)?;
        let sys_object_id = parse_value(&raw);
        let profile = profile_from_sys_object_id(&sys_object_id).map_err(|reason| {
            PollError::protocol(session.hostname(), &oid, TransportError::Malformed(reason))
        })?;
        info!(
            host = %session.hostname(),
            vendor = %profile.vendor,
            token = %profile.token,
            "detected device vendor"
        );
        session.install_profile(profile);
    } else {
        debug!(host = %session.hostname(), "vendor already detected");
    }
    session
        .vendor_profile()
        .ok_or_else(|| PollError::configuration(session.hostname(), "vendor profile missing after detection"))
}

/// Like [`detect`], but an undetectable device is cached as generic so the
/// session never retries detection.
pub fn detect_or_generic<C: Connector>(session: &mut Session<C>) -> Result<VendorProfile> {
    match detect(session) {
        Ok(profile) => Ok(profile.clone()),
        Err(e) if e.is_protocol() => {
            warn!(host = %session.hostname(), error = %e, "vendor detection failed, using generic profile");
            let profile = VendorProfile::generic("");
            session.install_profile(profile.clone());
            Ok(profile)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(profile: &VendorProfile, table: VendorTable) -> Option<String> {
        let mut registry = OidRegistry::new();
        profile.apply(&mut registry);
        match profile.table(table) {
            OidSupport::Established(symbol) => Some(registry.resolve(&symbol)),
            OidSupport::NotEstablished => None,
        }
    }

    #[test]
    fn alcatel_dialect_uses_mib_revision() {
        let profile = profile_from_sys_object_id(".1.3.6.1.4.1.6486.801.1.1.2.1.11.1.1").unwrap();
        assert_eq!(profile.vendor, Vendor::Alcatel);
        assert_eq!(profile.mib_fragment.as_deref(), Some("801"));
        let vlan = resolved(&profile, VendorTable::Vlan).unwrap();
        assert!(vlan.contains("6486.801"));
        assert!(resolved(&profile, VendorTable::Vrf).unwrap().contains("6486.801"));
        assert!(resolved(&profile, VendorTable::VrfNameIndex).is_some());
    }

    #[test]
    fn cisco_dialect_uses_vtp_default_domain() {
        let profile = profile_from_sys_object_id(".1.3.6.1.4.1.9.1.1208").unwrap();
        assert_eq!(profile.vendor, Vendor::Cisco);
        let vlan = resolved(&profile, VendorTable::Vlan).unwrap();
        assert_eq!(vlan, ".1.3.6.1.4.1.9.9.46.1.3.1.1.4.1");
        assert_eq!(
            resolved(&profile, VendorTable::Vrf).as_deref(),
            Some(".1.3.6.1.3.118.1.2.2.1.2")
        );
    }

    #[test]
    fn netgear_has_no_vlan_or_vrf_mib() {
        let profile = profile_from_sys_object_id(".1.3.6.1.4.1.4526.100.4.10").unwrap();
        assert_eq!(profile.vendor, Vendor::Netgear);
        assert_eq!(profile.table(VendorTable::Vlan), OidSupport::NotEstablished);
        assert_eq!(profile.table(VendorTable::Vrf), OidSupport::NotEstablished);
    }

    #[test]
    fn unknown_enterprise_is_generic() {
        let profile = profile_from_sys_object_id("1.3.6.1.4.1.2636.1.1.1.2.21").unwrap();
        assert_eq!(profile.vendor, Vendor::Generic);
        assert_eq!(profile.token, "2636");
        assert_eq!(profile.table(VendorTable::Vrf), OidSupport::NotEstablished);
        assert_eq!(
            resolved(&profile, VendorTable::Vlan).as_deref(),
            Some(".1.3.6.1.2.1.17.7.1.4.3.1.1")
        );
    }

    #[test]
    fn token_match_is_exact() {
        // 96 is not Cisco's 9
        let profile = profile_from_sys_object_id(".1.3.6.1.4.1.96.1").unwrap();
        assert_eq!(profile.vendor, Vendor::Generic);
    }

    #[test]
    fn short_sys_object_id_is_rejected() {
        assert!(profile_from_sys_object_id(".1.3.6.1.4").is_err());
        assert!(profile_from_sys_object_id("").is_err());
        assert!(profile_from_sys_object_id(".1.3.6.1.4.1.6486").is_err());
    }
}
