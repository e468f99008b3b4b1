//! SNMP polling engine for network devices: ARP, MAC forwarding, interface
//! addresses, routes, VLANs and VRFs, normalized into typed rows.
//!
//! ```no_run
//! use ipam_snmp_poller::{run_query, DeviceTarget, QueryOptions, SnmpVersion};
//!
//! let target = DeviceTarget::new("192.0.2.10", SnmpVersion::V2c).with_community("public");
//! let outcome = run_query(&target, "get_arp_table", &QueryOptions::default())?;
//! println!("empty: {}", outcome.result.is_empty());
//! # Ok::<(), ipam_snmp_poller::PollError>(())
//! ```

pub mod catalog;
pub mod context;
pub mod error;
pub mod logging;
pub mod oid;
pub mod query;
pub mod rows;
pub mod session;
pub mod snmp_utils;
pub mod tables;
pub mod target;
pub mod transport;
pub mod usm;
pub mod value;
pub mod vendor;

pub use catalog::{QueryDescriptor, QueryKind, CATALOG};
pub use error::{PollError, Result};
pub use query::{execute, run_query, run_query_with, QueryOptions};
pub use rows::{
    ArpRow, ArpTable, InterfaceIpRow, MacRow, QueryOutcome, QueryResult, RouteRow, SystemInfo, VrfRow,
};
pub use session::{Session, SessionState};
pub use snmp_utils::DeviceConnector;
pub use target::{AuthProtocol, DeviceTarget, PrivProtocol, SecurityBundle, SecurityLevel, SnmpVersion};
pub use transport::{Connector, SessionParams, Transport, TransportError};
