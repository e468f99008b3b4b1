//! Error taxonomy for a device poll.
//!
//! Configuration errors abort the poll, protocol errors abort the current
//! query (or the current VRF context), parse errors never leave the value
//! parser, and unsupported queries are reported to the caller by name.

use thiserror::Error;

use crate::transport::TransportError;

pub type Result<T> = std::result::Result<T, PollError>;

#[derive(Debug, Error)]
pub enum PollError {
    /// Invalid version, missing SNMPv3 security fields and similar.
    #[error("configuration error for {hostname}: {reason}")]
    Configuration { hostname: String, reason: String },

    /// A get/walk failed, or the vendor could not be detected.
    #[error("SNMP failure on {hostname} at {oid}: {source}")]
    Protocol {
        hostname: String,
        oid: String,
        #[source]
        source: TransportError,
    },

    #[error("cannot parse {raw:?}: {reason}")]
    Parse { raw: String, reason: String },

    #[error("unsupported query '{0}'")]
    UnsupportedQuery(String),
}

impl PollError {
    pub fn configuration(hostname: &str, reason: impl Into<String>) -> Self {
        PollError::Configuration {
            hostname: hostname.to_string(),
            reason: reason.into(),
        }
    }

    pub fn protocol(hostname: &str, oid: &str, source: TransportError) -> Self {
        PollError::Protocol {
            hostname: hostname.to_string(),
            oid: oid.to_string(),
            source,
        }
    }

    pub fn parse(raw: &str, reason: impl Into<String>) -> Self {
        PollError::Parse {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, PollError::Protocol { .. })
    }
}
