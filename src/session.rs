//! Session lifecycle for one device: `Closed -> Open -> Closed`.
//!
//! A session owns its target, at most one open transport, and the vendor
//! profile detected for the device. Closing drops all three kinds of state
//! except the target; dropping the session closes it.

use tracing::{debug, warn};

use crate::error::{PollError, Result};
use crate::oid::OidRegistry;
use crate::target::{DeviceTarget, SnmpVersion};
use crate::transport::{Connector, SessionParams, Transport};
use crate::vendor::VendorProfile;

const CONNECT: &str = "<connect>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Open,
}

pub struct Session<C: Connector> {
    connector: C,
    target: DeviceTarget,
    vlan: Option<u32>,
    context_name: Option<String>,
    transport: Option<C::Transport>,
    registry: OidRegistry,
    profile: Option<VendorProfile>,
}

impl<C: Connector> Session<C> {
    pub fn new(connector: C, target: DeviceTarget) -> Self {
        let context_name = configured_context(&target);
        Self {
            connector,
            target,
            vlan: None,
            context_name,
            transport: None,
            registry: OidRegistry::new(),
            profile: None,
        }
    }

    pub fn target(&self) -> &DeviceTarget {
        &self.target
    }

    pub fn hostname(&self) -> &str {
        &self.target.hostname
    }

    pub fn state(&self) -> SessionState {
        if self.transport.is_some() {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Open the protocol connection. A no-op when already open.
    pub fn open(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Ok(());
        }
        self.target.validate()?;

        let community = self.effective_community();
        let params = SessionParams {
            target: &self.target,
            community: &community,
            context_name: self.context_name.as_deref(),
        };
        let transport = self
            .connector
            .connect(&params)
            .map_err(|e| PollError::protocol(&self.target.hostname, CONNECT, e))?;
        if self.context_name.is_some() && !transport.supports_contexts() {
            warn!(
                host = %self.target.hostname,
                context = ?self.context_name,
                "transport cannot select SNMPv3 contexts, using the default context"
            );
            self.context_name = None;
        }
        debug!(
            host = %self.target.hostname,
            version = %self.target.version,
            context = ?self.context_name,
            "SNMP session opened"
        );
        self.transport = Some(transport);
        Ok(())
    }

    /// Release the connection and forget the detected vendor. Safe to call
    /// on a closed session.
    pub fn close(&mut self) {
        if self.disconnect() {
            debug!(host = %self.target.hostname, "SNMP session closed");
        }
        self.profile = None;
        self.registry.reset();
        self.vlan = None;
        self.context_name = configured_context(&self.target);
    }

    fn disconnect(&mut self) -> bool {
        self.transport.take().is_some()
    }

    fn effective_community(&self) -> String {
        match (self.target.version, self.vlan) {
            (SnmpVersion::V1 | SnmpVersion::V2c, Some(vlan)) => {
                format!("{}@{}", self.target.community, vlan)
            }
            _ => self.target.community.clone(),
        }
    }

    /// Community-string indexing (`community@vlan`) for v1/v2c. Reconnects
    /// when the effective community changes.
    pub fn set_vlan(&mut self, vlan: Option<u32>) -> Result<()> {
        if self.vlan == vlan {
            return Ok(());
        }
        if self.target.version == SnmpVersion::V3 && vlan.is_some() {
            warn!(host = %self.target.hostname, "VLAN community indexing ignored for SNMPv3");
        }
        self.vlan = vlan;
        self.reconnect()
    }

    pub fn vlan(&self) -> Option<u32> {
        self.vlan
    }

    /// Swap the SNMPv3 context name and re-apply the security parameters by
    /// reconnecting. Ignored for v1/v2c, which have no contexts.
    pub fn switch_context(&mut self, context_name: Option<&str>) -> Result<()> {
        let context_name = context_name.filter(|c| !c.is_empty()).map(str::to_string);
        if self.target.version != SnmpVersion::V3 {
            if context_name.is_some() {
                warn!(host = %self.target.hostname, "SNMP context ignored for {}", self.target.version);
            }
            return self.open();
        }
        if self.context_name == context_name && self.transport.is_some() {
            return Ok(());
        }
        self.context_name = context_name;
        self.reconnect()
    }

    pub fn context_name(&self) -> Option<&str> {
        self.context_name.as_deref()
    }

    /// Go back to the target's configured context. The connection is
    /// re-established lazily by the next request.
    pub fn restore_context(&mut self) {
        let configured = configured_context(&self.target);
        if self.context_name != configured {
            self.disconnect();
            self.context_name = configured;
        }
    }

    fn reconnect(&mut self) -> Result<()> {
        if self.disconnect() {
            debug!(host = %self.target.hostname, "reconnecting SNMP session");
        }
        self.open()
    }

    fn transport(&mut self) -> Result<&mut C::Transport> {
        self.open()?;
        self.transport
            .as_mut()
            .ok_or_else(|| PollError::configuration(&self.target.hostname, "session is not open"))
    }

    pub fn supports_contexts(&mut self) -> Result<bool> {
        Ok(self.transport()?.supports_contexts())
    }

    /// GET one instance, opening the session if needed.
    pub fn get(&mut self, oid: &str) -> Result<String> {
        let hostname = self.target.hostname.clone();
        self.transport()?
            .get(oid)
            .map_err(|e| PollError::protocol(&hostname, oid, e))
    }

    /// Walk a subtree, opening the session if needed.
    pub fn walk(&mut self, oid: &str) -> Result<Vec<(String, String)>> {
        let hostname = self.target.hostname.clone();
        let rows = self
            .transport()?
            .walk(oid)
            .map_err(|e| PollError::protocol(&hostname, oid, e))?;
        debug!(host = %hostname, oid, rows = rows.len(), "walk complete");
        Ok(rows)
    }

    pub fn resolve(&self, symbol: &str) -> String {
        self.registry.resolve(symbol)
    }

    pub fn registry(&self) -> &OidRegistry {
        &self.registry
    }

    pub fn vendor_profile(&self) -> Option<&VendorProfile> {
        self.profile.as_ref()
    }

    /// Cache a detected profile and register its OIDs. Repeating it with the
    /// same profile changes nothing.
    pub(crate) fn install_profile(&mut self, profile: VendorProfile) {
        profile.apply(&mut self.registry);
        self.profile = Some(profile);
    }
}

/// Context from the security bundle. Only v3 sessions carry one.
fn configured_context(target: &DeviceTarget) -> Option<String> {
    match target.version {
        SnmpVersion::V3 => target.context_name().map(str::to_string),
        SnmpVersion::V1 | SnmpVersion::V2c => None,
    }
}

impl<C: Connector> Drop for Session<C> {
    fn drop(&mut self) {
        self.close();
    }
}
