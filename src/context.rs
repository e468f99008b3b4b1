//! VRF context iteration for SNMPv3 ARP polls.
//!
//! Contexts are visited one after another on the same session: the context
//! name is part of the security parameters, so each switch reconnects.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::error::Result;
use crate::rows::{ArpRow, ArpTable};
use crate::session::Session;
use crate::tables::{arp_rows, walk_vrf_column};
use crate::target::SnmpVersion;
use crate::transport::Connector;
use crate::vendor::{detect_or_generic, OidSupport, VendorProfile, VendorTable};

/// VRF names known to the device, in walk order without repeats. Empty when
/// the vendor has no VRF MIB.
pub fn vrf_context_names<C: Connector>(
    session: &mut Session<C>,
    profile: &VendorProfile,
) -> Result<Vec<String>> {
    let symbol = match (
        profile.table(VendorTable::VrfNameIndex),
        profile.table(VendorTable::Vrf),
    ) {
        (OidSupport::Established(symbol), _) | (OidSupport::NotEstablished, OidSupport::Established(symbol)) => symbol,
        (OidSupport::NotEstablished, OidSupport::NotEstablished) => return Ok(Vec::new()),
    };

    let mut names: Vec<String> = Vec::new();
    for (name, _) in walk_vrf_column(session, &symbol)? {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

/// Run `query` once per context. A context that cannot be selected or
/// queried is logged and left out; configuration errors still abort.
pub fn for_each_context<C, T, F>(
    session: &mut Session<C>,
    contexts: &[String],
    mut query: F,
) -> Result<BTreeMap<String, T>>
where
    C: Connector,
    F: FnMut(&mut Session<C>) -> Result<T>,
{
    let mut results = BTreeMap::new();
    for context in contexts {
        let outcome = session
            .switch_context(Some(context.as_str()))
            .and_then(|()| query(session));
        match outcome {
            Ok(rows) => {
                results.insert(context.clone(), rows);
            }
            Err(e) if e.is_protocol() => {
                warn!(host = %session.hostname(), context = %context, error = %e, "skipping VRF context");
            }
            Err(e) => {
                session.restore_context();
                return Err(e);
            }
        }
    }
    session.restore_context();
    Ok(results)
}

/// ARP table of the device. SNMPv3 targets without a configured context are
/// polled once per VRF context and keyed by context name.
pub fn arp_table<C: Connector>(session: &mut Session<C>) -> Result<ArpTable> {
    let multi_context =
        session.target().version == SnmpVersion::V3 && session.context_name().is_none();
    if !multi_context {
        return Ok(ArpTable::Single(arp_rows(session)?));
    }
    if !session.supports_contexts()? {
        warn!(
            host = %session.hostname(),
            "transport cannot select SNMPv3 contexts, polling the default context only"
        );
        return Ok(ArpTable::Single(arp_rows(session)?));
    }

    let profile = detect_or_generic(session)?;
    let contexts = match vrf_context_names(session, &profile) {
        Ok(contexts) => contexts,
        Err(e) if e.is_protocol() => {
            warn!(host = %session.hostname(), error = %e, "VRF enumeration failed, polling the default context");
            Vec::new()
        }
        Err(e) => return Err(e),
    };
    if contexts.is_empty() {
        return Ok(ArpTable::Single(arp_rows(session)?));
    }

    info!(host = %session.hostname(), contexts = contexts.len(), "polling ARP per VRF context");
    let per_context: BTreeMap<String, Vec<ArpRow>> = for_each_context(session, &contexts, arp_rows)?;
    Ok(ArpTable::PerContext(per_context))
}
