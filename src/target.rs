//! Connection parameters for one device, as handed over by the inventory.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::error::{PollError, Result};

pub const DEFAULT_PORT: u16 = 161;
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
pub const MAX_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_RETRIES: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SnmpVersion {
    V1,
    V2c,
    V3,
}

impl TryFrom<u8> for SnmpVersion {
    type Error = u8;

    fn try_from(version: u8) -> std::result::Result<Self, u8> {
        match version {
            1 => Ok(SnmpVersion::V1),
            2 => Ok(SnmpVersion::V2c),
            3 => Ok(SnmpVersion::V3),
            other => Err(other),
        }
    }
}

impl FromStr for SnmpVersion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "v1" => Ok(SnmpVersion::V1),
            "2" | "2c" | "v2c" => Ok(SnmpVersion::V2c),
            "3" | "v3" => Ok(SnmpVersion::V3),
            other => Err(format!("SNMP version {} is not supported", other)),
        }
    }
}

impl fmt::Display for SnmpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnmpVersion::V1 => write!(f, "v1"),
            SnmpVersion::V2c => write!(f, "v2c"),
            SnmpVersion::V3 => write!(f, "v3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityLevel {
    NoAuthNoPriv,
    #[default]
    AuthNoPriv,
    AuthPriv,
}

impl FromStr for SecurityLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "noauthnopriv" => Ok(SecurityLevel::NoAuthNoPriv),
            "authnopriv" => Ok(SecurityLevel::AuthNoPriv),
            "authpriv" => Ok(SecurityLevel::AuthPriv),
            other => Err(format!("unknown security level '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthProtocol {
    #[default]
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl FromStr for AuthProtocol {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(AuthProtocol::Md5),
            "sha" | "sha1" => Ok(AuthProtocol::Sha1),
            "sha224" => Ok(AuthProtocol::Sha224),
            "sha256" => Ok(AuthProtocol::Sha256),
            "sha384" => Ok(AuthProtocol::Sha384),
            "sha512" => Ok(AuthProtocol::Sha512),
            other => Err(format!("unknown auth protocol '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrivProtocol {
    #[default]
    Des,
    Aes128,
    Aes192,
    Aes256,
}

impl FromStr for PrivProtocol {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "des" => Ok(PrivProtocol::Des),
            "aes" | "aes128" => Ok(PrivProtocol::Aes128),
            "aes192" => Ok(PrivProtocol::Aes192),
            "aes256" => Ok(PrivProtocol::Aes256),
            other => Err(format!("unknown privacy protocol '{}'", other)),
        }
    }
}

/// SNMPv3 USM parameters. The security name is the target's community field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityBundle {
    pub level: SecurityLevel,
    pub auth_protocol: AuthProtocol,
    pub auth_passphrase: String,
    pub priv_protocol: PrivProtocol,
    pub priv_passphrase: String,
    pub context_name: Option<String>,
    pub context_engine_id: Option<String>,
}

impl SecurityBundle {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.level != SecurityLevel::NoAuthNoPriv && self.auth_passphrase.is_empty() {
            return Err("SNMPv3 authentication requires an auth passphrase".to_string());
        }
        if self.level == SecurityLevel::AuthPriv && self.priv_passphrase.is_empty() {
            return Err("SNMPv3 authPriv requires a privacy passphrase".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    pub host: String,
    /// Display label used in diagnostics only.
    pub hostname: String,
    pub version: SnmpVersion,
    /// Community string for v1/v2c, USM security name for v3.
    pub community: String,
    pub security: Option<SecurityBundle>,
    pub port: u16,
    timeout_ms: u64,
    pub retries: u32,
}

impl DeviceTarget {
    pub fn new(host: impl Into<String>, version: SnmpVersion) -> Self {
        let host = host.into();
        Self {
            hostname: host.clone(),
            host,
            version,
            community: "public".to_string(),
            security: None,
            port: DEFAULT_PORT,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            retries: DEFAULT_RETRIES,
        }
    }

    /// Build from the inventory's numeric version field.
    pub fn from_numeric_version(host: impl Into<String>, version: u8) -> Result<Self> {
        let host = host.into();
        let version = SnmpVersion::try_from(version).map_err(|v| {
            PollError::configuration(&host, format!("SNMP version {} is not supported", v))
        })?;
        Ok(Self::new(host, version))
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn with_community(mut self, community: impl Into<String>) -> Self {
        self.community = community.into();
        self
    }

    pub fn with_security(mut self, security: SecurityBundle) -> Self {
        self.security = Some(security);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = clamp_timeout(timeout_ms);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Context name configured on the security bundle, if any.
    pub fn context_name(&self) -> Option<&str> {
        self.security
            .as_ref()
            .and_then(|s| s.context_name.as_deref())
            .filter(|c| !c.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(PollError::configuration(&self.hostname, "empty host"));
        }
        if self.version == SnmpVersion::V3 {
            let security = self.security.as_ref().ok_or_else(|| {
                PollError::configuration(&self.hostname, "SNMPv3 requires a security bundle")
            })?;
            if self.community.is_empty() {
                return Err(PollError::configuration(
                    &self.hostname,
                    "SNMPv3 requires a security name",
                ));
            }
            security
                .validate()
                .map_err(|reason| PollError::configuration(&self.hostname, reason))?;
        }
        Ok(())
    }
}

fn clamp_timeout(timeout_ms: u64) -> u64 {
    timeout_ms.clamp(DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_clamped() {
        let t = DeviceTarget::new("10.0.0.1", SnmpVersion::V2c);
        assert_eq!(t.timeout_ms(), 1000);
        assert_eq!(t.clone().with_timeout_ms(0).timeout_ms(), 1000);
        assert_eq!(t.clone().with_timeout_ms(2500).timeout_ms(), 2500);
        assert_eq!(t.with_timeout_ms(60_000).timeout(), Duration::from_secs(10));
    }

    #[test]
    fn numeric_version_outside_range_is_configuration_error() {
        let err = DeviceTarget::from_numeric_version("10.0.0.1", 4).unwrap_err();
        assert!(matches!(err, PollError::Configuration { .. }));
        assert!(DeviceTarget::from_numeric_version("10.0.0.1", 2).is_ok());
    }

    #[test]
    fn v3_without_bundle_fails_validation() {
        let t = DeviceTarget::new("10.0.0.1", SnmpVersion::V3).with_community("poller");
        assert!(matches!(t.validate(), Err(PollError::Configuration { .. })));
    }

    #[test]
    fn v3_auth_priv_needs_both_passphrases() {
        let bundle = SecurityBundle {
            level: SecurityLevel::AuthPriv,
            auth_passphrase: "authpass1".into(),
            ..Default::default()
        };
        let t = DeviceTarget::new("10.0.0.1", SnmpVersion::V3)
            .with_community("poller")
            .with_security(bundle.clone());
        assert!(t.validate().is_err());

        let t = t.with_security(SecurityBundle {
            priv_passphrase: "privpass1".into(),
            ..bundle
        });
        assert!(t.validate().is_ok());
    }

    #[test]
    fn empty_context_name_counts_as_unset() {
        let t = DeviceTarget::new("10.0.0.1", SnmpVersion::V3).with_security(SecurityBundle {
            context_name: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(t.context_name(), None);
    }

    #[test]
    fn version_parsing() {
        assert_eq!("2c".parse::<SnmpVersion>(), Ok(SnmpVersion::V2c));
        assert_eq!("3".parse::<SnmpVersion>(), Ok(SnmpVersion::V3));
        assert!("5".parse::<SnmpVersion>().is_err());
    }
}
