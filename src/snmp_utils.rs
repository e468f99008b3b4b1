//! Production transports. v1/v2c run on the `snmp2` crate's blocking
//! `SyncSession`; v3 goes through [`UsmTransport`].

use std::fmt;

use snmp2::{Oid, Pdu, SyncSession, Value};
use tracing::debug;

use crate::oid::{parse_oid, starts_with, to_dotted};
use crate::target::SnmpVersion;
use crate::transport::{Connector, SessionParams, Transport, TransportError};
use crate::usm::UsmTransport;

pub(crate) const MAX_REPETITIONS: u32 = 10;
// SNMPv1 noSuchName, also how v1 agents report the end of the MIB view
const NO_SUCH_NAME: u32 = 2;

#[derive(Debug, Clone, Copy, Default)]
pub struct Snmp2Connector;

pub struct Snmp2Transport {
    session: SyncSession,
    version: SnmpVersion,
    retries: u32,
}

impl Connector for Snmp2Connector {
    type Transport = Snmp2Transport;

    fn connect(&self, params: &SessionParams<'_>) -> Result<Snmp2Transport, TransportError> {
        Ok(Snmp2Transport {
            session: create_session(params)?,
            version: params.target.version,
            retries: params.target.retries,
        })
    }
}

fn snmp_error(e: impl fmt::Debug) -> TransportError {
    TransportError::Library(format!("{:?}", e))
}

pub fn create_session(params: &SessionParams<'_>) -> Result<SyncSession, TransportError> {
    let target = params.target;
    let agent_addr = (target.host.as_str(), target.port);
    let timeout = Some(target.timeout());
    let community = params.community.as_bytes();

    match target.version {
        SnmpVersion::V1 => SyncSession::new_v1(agent_addr, community, timeout, 0).map_err(snmp_error),
        SnmpVersion::V2c => SyncSession::new_v2c(agent_addr, community, timeout, 0).map_err(snmp_error),
        SnmpVersion::V3 => Err(TransportError::Library(
            "SNMPv3 sessions go through the USM transport".to_string(),
        )),
    }
}

fn to_snmp_oid(parts: &[u64], text: &str) -> Result<Oid<'static>, TransportError> {
    Oid::from(parts).map_err(|_| TransportError::InvalidOid(text.to_string()))
}

fn check_status(pdu: &Pdu<'_>) -> Result<(), TransportError> {
    match pdu.error_status {
        0 => Ok(()),
        NO_SUCH_NAME => Err(TransportError::NoSuchInstance),
        status => Err(TransportError::Agent {
            status,
            index: pdu.error_index,
        }),
    }
}

/// Net-SNMP style `TYPE: VALUE` text. `None` for the exception values that
/// mark a missing instance or the end of the MIB view.
fn render_value(value: &Value<'_>) -> Option<String> {
    let rendered = match value {
        Value::Integer(n) => format!("INTEGER: {}", n),
        Value::OctetString(bytes) => render_octets(bytes),
        Value::ObjectIdentifier(oid) => {
            let text = oid.to_id_string();
            match parse_oid(&text) {
                Some(parts) => format!("OID: {}", to_dotted(&parts)),
                None => format!("OID: {}", text),
            }
        }
        Value::IpAddress(ip) => format!("IpAddress: {}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]),
        Value::Counter32(n) => format!("Counter32: {}", n),
        Value::Unsigned32(n) => format!("Gauge32: {}", n),
        Value::Timeticks(n) => format!("Timeticks: ({})", n),
        Value::Counter64(n) => format!("Counter64: {}", n),
        Value::Null => "NULL: ".to_string(),
        Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => return None,
        other => {
            debug!(value = ?other, "unexpected SNMP value type");
            format!("UNKNOWN: {:?}", other)
        }
    };
    Some(rendered)
}

pub(crate) fn render_octets(bytes: &[u8]) -> String {
    let printable = bytes
        .iter()
        .all(|b| matches!(b, 0x20..=0x7e | b'\t' | b'\r' | b'\n'));
    if printable {
        format!("STRING: \"{}\"", String::from_utf8_lossy(bytes))
    } else {
        format!("Hex-STRING: {}", hex_octets(bytes))
    }
}

fn hex_octets(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Snmp2Transport {
    fn with_retries<T>(
        &mut self,
        oid: &str,
        mut op: impl FnMut(&mut SyncSession) -> Result<T, TransportError>,
    ) -> Result<T, TransportError> {
        let mut attempt = 0;
        loop {
            match op(&mut self.session) {
                Err(TransportError::Library(e)) if attempt < self.retries => {
                    attempt += 1;
                    debug!(oid, attempt, error = %e, "retrying SNMP request");
                }
                other => return other,
            }
        }
    }

    /// One GETNEXT (v1) or GETBULK round trip from `start`.
    fn next_batch(
        &mut self,
        oid: &str,
        start: &Oid<'static>,
    ) -> Result<Vec<(Vec<u64>, Option<String>)>, TransportError> {
        let use_bulk = self.version != SnmpVersion::V1;
        self.with_retries(oid, |session| {
            let response = if use_bulk {
                session.getbulk(&[start], 0, MAX_REPETITIONS)
            } else {
                session.getnext(start)
            };
            let pdu = response.map_err(snmp_error)?;
            match check_status(&pdu) {
                Ok(()) => {}
                Err(TransportError::NoSuchInstance) => return Ok(Vec::new()),
                Err(e) => return Err(e),
            }

            let mut batch = Vec::new();
            for (name, value) in pdu.varbinds {
                let name = name.to_id_string();
                let parts = parse_oid(&name).ok_or_else(|| TransportError::Malformed(name.clone()))?;
                batch.push((parts, render_value(&value)));
            }
            Ok(batch)
        })
    }
}

impl Transport for Snmp2Transport {
    fn get(&mut self, oid: &str) -> Result<String, TransportError> {
        let parts = parse_oid(oid).ok_or_else(|| TransportError::InvalidOid(oid.to_string()))?;
        let name = to_snmp_oid(&parts, oid)?;
        self.with_retries(oid, |session| {
            let mut pdu = session.get(&name).map_err(snmp_error)?;
            check_status(&pdu)?;
            let (_, value) = pdu
                .varbinds
                .next()
                .ok_or_else(|| TransportError::Malformed("empty response".to_string()))?;
            render_value(&value).ok_or(TransportError::NoSuchInstance)
        })
    }

    fn walk(&mut self, oid: &str) -> Result<Vec<(String, String)>, TransportError> {
        let base = parse_oid(oid).ok_or_else(|| TransportError::InvalidOid(oid.to_string()))?;
        let mut results = Vec::new();
        let mut current = base.clone();

        'walk: loop {
            let start = to_snmp_oid(&current, oid)?;
            let batch = self.next_batch(oid, &start)?;
            if batch.is_empty() {
                break;
            }
            for (parts, value) in batch {
                // Left the subtree, or the agent went backwards.
                if !starts_with(&parts, &base) || parts <= current {
                    break 'walk;
                }
                let Some(value) = value else {
                    break 'walk;
                };
                results.push((to_dotted(&parts), value));
                current = parts;
            }
        }

        Ok(results)
    }

    // v1/v2c have no contexts.
    fn supports_contexts(&self) -> bool {
        false
    }
}

/// Connector used by `run_query`: community sessions over `snmp2`, USM
/// sessions over `async-snmp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceConnector;

pub enum DeviceTransport {
    Community(Snmp2Transport),
    Usm(UsmTransport),
}

impl Connector for DeviceConnector {
    type Transport = DeviceTransport;

    fn connect(&self, params: &SessionParams<'_>) -> Result<DeviceTransport, TransportError> {
        match params.target.version {
            SnmpVersion::V1 | SnmpVersion::V2c => {
                Ok(DeviceTransport::Community(Snmp2Connector.connect(params)?))
            }
            SnmpVersion::V3 => Ok(DeviceTransport::Usm(UsmTransport::connect(params)?)),
        }
    }
}

impl Transport for DeviceTransport {
    fn get(&mut self, oid: &str) -> Result<String, TransportError> {
        match self {
            DeviceTransport::Community(t) => t.get(oid),
            DeviceTransport::Usm(t) => t.get(oid),
        }
    }

    fn walk(&mut self, oid: &str) -> Result<Vec<(String, String)>, TransportError> {
        match self {
            DeviceTransport::Community(t) => t.walk(oid),
            DeviceTransport::Usm(t) => t.walk(oid),
        }
    }

    fn supports_contexts(&self) -> bool {
        match self {
            DeviceTransport::Community(t) => t.supports_contexts(),
            DeviceTransport::Usm(t) => t.supports_contexts(),
        }
    }
}
