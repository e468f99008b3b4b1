//! The seam between the polling engine and an SNMP protocol library.
//!
//! A [`Transport`] is one open protocol connection. Keys it returns are fully
//! numeric dotted OIDs with a leading dot; values are raw `TYPE: VALUE`
//! strings which only the value parser interprets.

use thiserror::Error;

use crate::target::DeviceTarget;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("agent returned error status {status} at index {index}")]
    Agent { status: u32, index: u32 },

    #[error("no such object or instance")]
    NoSuchInstance,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("invalid OID '{0}'")]
    InvalidOid(String),

    #[error("{0}")]
    Library(String),
}

/// Everything a connector needs to open one connection.
#[derive(Debug, Clone, Copy)]
pub struct SessionParams<'a> {
    pub target: &'a DeviceTarget,
    /// Community after `@vlan` suffixing; the security name on v3.
    pub community: &'a str,
    /// SNMPv3 context name in effect for this connection.
    pub context_name: Option<&'a str>,
}

pub trait Transport {
    /// Value at one exact instance OID.
    fn get(&mut self, oid: &str) -> Result<String, TransportError>;

    /// Every `(key, value)` under `oid`, in agent order. An empty subtree is
    /// an empty vector, not an error.
    fn walk(&mut self, oid: &str) -> Result<Vec<(String, String)>, TransportError>;

    /// Whether `SessionParams::context_name` actually reaches the wire.
    fn supports_contexts(&self) -> bool {
        true
    }
}

pub trait Connector {
    type Transport: Transport;

    fn connect(&self, params: &SessionParams<'_>) -> Result<Self::Transport, TransportError>;
}

impl<C: Connector + ?Sized> Connector for &C {
    type Transport = C::Transport;

    fn connect(&self, params: &SessionParams<'_>) -> Result<Self::Transport, TransportError> {
        (**self).connect(params)
    }
}
