//! Scripted in-memory SNMP agent for driving the engine without a network.
//!
//! Walk responses are stored per context name (the empty string is the
//! default context); GET responses are shared by every context. The agent
//! records every connection and request so tests can assert on caching.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use ipam_snmp_poller::{
    Connector, DeviceTarget, SecurityBundle, SecurityLevel, SessionParams, SnmpVersion, Transport,
    TransportError,
};

pub const SYS_OBJECT_ID_0: &str = ".1.3.6.1.2.1.1.2.0";

pub const CISCO_OBJECT_ID: &str = "OID: .1.3.6.1.4.1.9.1.1208";
pub const ALCATEL_OBJECT_ID: &str = "OID: .1.3.6.1.4.1.6486.801.1.1.2.1.11.1.1";
pub const NETGEAR_OBJECT_ID: &str = "OID: .1.3.6.1.4.1.4526.100.4.10";
pub const JUNIPER_OBJECT_ID: &str = "OID: .1.3.6.1.4.1.2636.1.1.1.2.29";

#[derive(Default)]
struct AgentState {
    walks: HashMap<(String, String), Vec<(String, String)>>,
    gets: HashMap<String, String>,
    failing_contexts: HashSet<String>,
    failing_oids: HashSet<String>,
    no_context_support: bool,
    connects: Vec<(String, Option<String>)>,
    gets_issued: Vec<String>,
    walks_issued: Vec<(String, String)>,
}

#[derive(Clone, Default)]
pub struct MockAgent {
    state: Rc<RefCell<AgentState>>,
}

impl MockAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn walk(&self, oid: &str, rows: &[(&str, &str)]) -> &Self {
        self.walk_in("", oid, rows)
    }

    pub fn walk_in(&self, context: &str, oid: &str, rows: &[(&str, &str)]) -> &Self {
        let rows = rows
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.state
            .borrow_mut()
            .walks
            .insert((context.to_string(), oid.to_string()), rows);
        self
    }

    pub fn get(&self, oid: &str, raw: &str) -> &Self {
        self.state.borrow_mut().gets.insert(oid.to_string(), raw.to_string());
        self
    }

    pub fn fail_context(&self, context: &str) -> &Self {
        self.state.borrow_mut().failing_contexts.insert(context.to_string());
        self
    }

    pub fn fail_oid(&self, oid: &str) -> &Self {
        self.state.borrow_mut().failing_oids.insert(oid.to_string());
        self
    }

    pub fn without_context_support(&self) -> &Self {
        self.state.borrow_mut().no_context_support = true;
        self
    }

    /// `(community, context)` of every connection attempt, failed ones too.
    pub fn connects(&self) -> Vec<(String, Option<String>)> {
        self.state.borrow().connects.clone()
    }

    pub fn get_count(&self, oid: &str) -> usize {
        self.state.borrow().gets_issued.iter().filter(|o| *o == oid).count()
    }

    pub fn walk_count(&self, oid: &str) -> usize {
        self.state
            .borrow()
            .walks_issued
            .iter()
            .filter(|(_, o)| o == oid)
            .count()
    }
}

pub struct MockTransport {
    state: Rc<RefCell<AgentState>>,
    context: String,
}

impl Connector for MockAgent {
    type Transport = MockTransport;

    fn connect(&self, params: &SessionParams<'_>) -> Result<MockTransport, TransportError> {
        let mut state = self.state.borrow_mut();
        state.connects.push((
            params.community.to_string(),
            params.context_name.map(str::to_string),
        ));
        // An agent reached without context support answers from the default context.
        let context = match params.context_name {
            Some(name) if !state.no_context_support => name.to_string(),
            _ => String::new(),
        };
        if state.failing_contexts.contains(&context) {
            return Err(TransportError::Library(format!("unknown context '{}'", context)));
        }
        Ok(MockTransport {
            state: Rc::clone(&self.state),
            context,
        })
    }
}

impl Transport for MockTransport {
    fn get(&mut self, oid: &str) -> Result<String, TransportError> {
        let mut state = self.state.borrow_mut();
        state.gets_issued.push(oid.to_string());
        if state.failing_oids.contains(oid) {
            return Err(TransportError::Library("request timed out".to_string()));
        }
        state.gets.get(oid).cloned().ok_or(TransportError::NoSuchInstance)
    }

    fn walk(&mut self, oid: &str) -> Result<Vec<(String, String)>, TransportError> {
        let mut state = self.state.borrow_mut();
        state.walks_issued.push((self.context.clone(), oid.to_string()));
        if state.failing_oids.contains(oid) {
            return Err(TransportError::Library("request timed out".to_string()));
        }
        Ok(state
            .walks
            .get(&(self.context.clone(), oid.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    fn supports_contexts(&self) -> bool {
        !self.state.borrow().no_context_support
    }
}

pub fn v2c_target() -> DeviceTarget {
    DeviceTarget::new("192.0.2.10", SnmpVersion::V2c)
        .with_hostname("core-sw1")
        .with_community("public")
}

pub fn v3_target() -> DeviceTarget {
    DeviceTarget::new("192.0.2.20", SnmpVersion::V3)
        .with_hostname("pe-router1")
        .with_community("monitor")
        .with_security(SecurityBundle {
            level: SecurityLevel::AuthNoPriv,
            auth_passphrase: "monitor-auth".to_string(),
            ..SecurityBundle::default()
        })
}
