//! SNMPv3 transport on `async-snmp`. Unlike `snmp2`, it puts the context
//! name into the scoped PDU, so VRF contexts can be selected per session.
//!
//! The client is async; each request blocks on a single-threaded runtime
//! owned by the transport.

use std::borrow::Borrow;
use std::time::Duration;

use async_snmp::{Auth, Client, Error, ErrorStatus, Oid, Retry, Value, VarBind};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use crate::oid::{parse_oid, to_dotted};
use crate::snmp_utils::{render_octets, MAX_REPETITIONS};
use crate::target::{AuthProtocol, DeviceTarget, PrivProtocol, SecurityBundle, SecurityLevel};
use crate::transport::{SessionParams, Transport, TransportError};

pub struct UsmTransport {
    runtime: Runtime,
    client: Client,
}

impl UsmTransport {
    pub fn connect(params: &SessionParams<'_>) -> Result<Self, TransportError> {
        let target = params.target;
        let bundle = target.security.as_ref().ok_or_else(|| {
            TransportError::Library("SNMPv3 target without security bundle".to_string())
        })?;
        if bundle.context_engine_id.is_some() {
            debug!(host = %target.hostname, "context engine ID follows the discovered engine, configured value unused");
        }

        let runtime = Builder::new_current_thread().enable_all().build()?;
        let auth = usm_auth(params.community, bundle, params.context_name);
        let client = runtime
            .block_on(
                Client::builder(agent_address(target), auth)
                    .timeout(target.timeout())
                    .retry(Retry::fixed(target.retries, Duration::ZERO))
                    .max_repetitions(MAX_REPETITIONS)
                    .connect(),
            )
            .map_err(usm_error)?;
        debug!(host = %target.hostname, context = ?params.context_name, "USM client ready");
        Ok(Self { runtime, client })
    }
}

fn agent_address(target: &DeviceTarget) -> String {
    if target.host.contains(':') && !target.host.starts_with('[') {
        format!("[{}]:{}", target.host, target.port)
    } else {
        format!("{}:{}", target.host, target.port)
    }
}

fn usm_auth(security_name: &str, bundle: &SecurityBundle, context_name: Option<&str>) -> Auth {
    let mut usm = Auth::usm(security_name);
    if bundle.level != SecurityLevel::NoAuthNoPriv {
        usm = usm.auth(auth_protocol(bundle.auth_protocol), bundle.auth_passphrase.as_str());
    }
    if bundle.level == SecurityLevel::AuthPriv {
        usm = usm.privacy(priv_protocol(bundle.priv_protocol), bundle.priv_passphrase.as_str());
    }
    if let Some(context) = context_name {
        usm = usm.context_name(context);
    }
    usm.into()
}

fn auth_protocol(protocol: AuthProtocol) -> async_snmp::AuthProtocol {
    match protocol {
        AuthProtocol::Md5 => async_snmp::AuthProtocol::Md5,
        AuthProtocol::Sha1 => async_snmp::AuthProtocol::Sha1,
        AuthProtocol::Sha224 => async_snmp::AuthProtocol::Sha224,
        AuthProtocol::Sha256 => async_snmp::AuthProtocol::Sha256,
        AuthProtocol::Sha384 => async_snmp::AuthProtocol::Sha384,
        AuthProtocol::Sha512 => async_snmp::AuthProtocol::Sha512,
    }
}

fn priv_protocol(protocol: PrivProtocol) -> async_snmp::PrivProtocol {
    match protocol {
        PrivProtocol::Des => async_snmp::PrivProtocol::Des,
        PrivProtocol::Aes128 => async_snmp::PrivProtocol::Aes128,
        PrivProtocol::Aes192 => async_snmp::PrivProtocol::Aes192,
        PrivProtocol::Aes256 => async_snmp::PrivProtocol::Aes256,
    }
}

fn usm_error<E: Borrow<Error>>(e: E) -> TransportError {
    match e.borrow() {
        Error::Snmp {
            status: ErrorStatus::NoSuchName,
            ..
        } => TransportError::NoSuchInstance,
        Error::Snmp { status, index, .. } => TransportError::Agent {
            status: u32::try_from(status.as_i32()).unwrap_or(u32::MAX),
            index: *index,
        },
        other => TransportError::Library(other.to_string()),
    }
}

fn to_usm_oid(text: &str) -> Result<Oid, TransportError> {
    let arcs = parse_oid(text)
        .and_then(|parts| {
            parts
                .into_iter()
                .map(|arc| u32::try_from(arc).ok())
                .collect::<Option<Vec<u32>>>()
        })
        .ok_or_else(|| TransportError::InvalidOid(text.to_string()))?;
    Ok(Oid::from_slice(&arcs))
}

fn dotted_key(oid: &Oid) -> String {
    let parts: Vec<u64> = oid.arcs().iter().map(|&arc| u64::from(arc)).collect();
    to_dotted(&parts)
}

/// Same `TYPE: VALUE` text as the community transport produces.
fn render_value(value: &Value) -> Option<String> {
    let rendered = match value {
        Value::Integer(n) => format!("INTEGER: {}", n),
        Value::OctetString(bytes) => render_octets(bytes),
        Value::ObjectIdentifier(oid) => format!("OID: {}", dotted_key(oid)),
        Value::IpAddress(ip) => format!("IpAddress: {}.{}.{}.{}", ip[0], ip[1], ip[2], ip[3]),
        Value::Counter32(n) => format!("Counter32: {}", n),
        Value::Gauge32(n) => format!("Gauge32: {}", n),
        Value::TimeTicks(n) => format!("Timeticks: ({})", n),
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

impl Transport for UsmTransport {
    fn get(&mut self, oid: &str) -> Result<String, TransportError> {
        let name = to_usm_oid(oid)?;
        let varbind: VarBind = self
            .runtime
            .block_on(self.client.get(&name))
            .map_err(usm_error)?;
        render_value(&varbind.value).ok_or(TransportError::NoSuchInstance)
    }

    fn walk(&mut self, oid: &str) -> Result<Vec<(String, String)>, TransportError> {
        let base = to_usm_oid(oid)?;
        let client = &self.client;
        self.runtime.block_on(async {
            let mut stream = client.walk(base).map_err(usm_error)?;
            let mut results = Vec::new();
            while let Some(item) = stream.next().await {
                let varbind = match item {
                    Ok(varbind) => varbind,
                    Err(e) => {
                        let error: &Error = e.borrow();
                        // Agent went backwards; keep what was collected.
                        if let Error::WalkAborted { .. } = error {
                            debug!(oid, %error, "walk stopped early");
                            break;
                        }
                        return Err(usm_error(error));
                    }
                };
                let Some(value) = render_value(&varbind.value) else {
                    break;
                };
                results.push((dotted_key(&varbind.oid), value));
            }
            Ok(results)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::SnmpVersion;

    #[test]
    fn oids_keep_the_leading_dot() {
        let oid = to_usm_oid(".1.3.6.1.2.1.4.22.1.2").unwrap();
        assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1, 4, 22, 1, 2]);
        assert_eq!(dotted_key(&oid), ".1.3.6.1.2.1.4.22.1.2");
        assert!(to_usm_oid("1.3.6.99999999999").is_err());
    }

    #[test]
    fn values_render_like_the_community_transport() {
        assert_eq!(render_value(&Value::Integer(5)).unwrap(), "INTEGER: 5");
        assert_eq!(render_value(&Value::IpAddress([10, 3, 0, 1])).unwrap(), "IpAddress: 10.3.0.1");
        assert_eq!(render_value(&Value::TimeTicks(42)).unwrap(), "Timeticks: (42)");
        assert!(render_value(&Value::NoSuchInstance).is_none());
        assert!(render_value(&Value::EndOfMibView).is_none());
    }

    #[test]
    fn ipv6_agents_are_bracketed() {
        let target = DeviceTarget::new("2001:db8::1", SnmpVersion::V3);
        assert_eq!(agent_address(&target), "[2001:db8::1]:161");
        let target = DeviceTarget::new("192.0.2.1", SnmpVersion::V3);
        assert_eq!(agent_address(&target), "192.0.2.1:161");
    }
}
