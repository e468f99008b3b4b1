use std::collections::BTreeMap;

use ipam_snmp_poller::{
    ArpRow, ArpTable, InterfaceIpRow, MacRow, QueryOutcome, QueryResult, RouteRow, SystemInfo, VrfRow,
    CATALOG,
};

fn cell(value: &str) -> String {
    value.replace('|', "\\|")
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn generate_catalog_table() -> String {
    let mut table = String::new();

    table.push_str("| ID | Name | Base OID | Description |\n");
    table.push_str("|----|------|----------|-------------|\n");
    for d in CATALOG.iter() {
        table.push_str(&format!("| {} | {} | {} | {} |\n", d.id, d.name, d.base_oid, d.description));
    }

    table
}

pub fn generate_outcome(outcome: &QueryOutcome) -> String {
    let mut doc = String::new();
    doc.push_str(&format!(
        "## {} on {}\n\nPolled at {}\n\n",
        outcome.query,
        outcome.hostname,
        outcome.polled_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    doc.push_str(&generate_result(&outcome.result));
    doc
}

pub fn generate_result(result: &QueryResult) -> String {
    match result {
        QueryResult::SystemInfo(info) => system_table(info),
        QueryResult::Arp(ArpTable::Single(rows)) => arp_table(rows),
        QueryResult::Arp(ArpTable::PerContext(contexts)) => {
            let mut doc = String::new();
            for (context, rows) in contexts {
                doc.push_str(&format!("### VRF {}\n\n", context));
                doc.push_str(&arp_table(rows));
                doc.push('\n');
            }
            doc
        }
        QueryResult::Mac(rows) => mac_table(rows),
        QueryResult::InterfaceIps(rows) => interface_table(rows),
        QueryResult::Routes(rows) => route_table(rows),
        QueryResult::Vlans(vlans) => vlan_table(vlans),
        QueryResult::Vrfs(vrfs) => vrf_table(vrfs),
        QueryResult::NotEstablished { query, reason } => {
            format!("{} is not available on this device: {}\n", query, reason)
        }
    }
}

fn system_table(info: &SystemInfo) -> String {
    let mut table = String::new();
    table.push_str("| Field | Value |\n");
    table.push_str("|-------|-------|\n");
    for (field, value) in [
        ("Description", &info.descr),
        ("Object ID", &info.object_id),
        ("Uptime", &info.uptime),
        ("Contact", &info.contact),
        ("Name", &info.name),
        ("Location", &info.location),
    ] {
        table.push_str(&format!("| {} | {} |\n", field, cell(value)));
    }
    table
}

fn arp_table(rows: &[ArpRow]) -> String {
    let mut table = String::new();
    table.push_str("| IP | MAC | Port | Port name |\n");
    table.push_str("|----|-----|------|-----------|\n");
    for row in rows {
        table.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            row.ip,
            row.mac,
            opt(row.port),
            cell(&row.port_name)
        ));
    }
    table
}

fn mac_table(rows: &[MacRow]) -> String {
    let mut table = String::new();
    table.push_str("| MAC | Bridge port | VLAN | Port | Alias |\n");
    table.push_str("|-----|-------------|------|------|-------|\n");
    for row in rows {
        // A failed port lookup is shown in place of the port name.
        let port = match &row.error {
            Some(error) => format!("error: {}", cell(error)),
            None => cell(&row.port),
        };
        table.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            row.mac,
            opt(row.bridge_port),
            opt(row.vlan),
            port,
            cell(&row.port_alias)
        ));
    }
    table
}

fn interface_table(rows: &[InterfaceIpRow]) -> String {
    let mut table = String::new();
    table.push_str("| IP | MAC |\n");
    table.push_str("|----|-----|\n");
    for row in rows {
        table.push_str(&format!("| {} | {} |\n", row.ip, row.mac));
    }
    table
}

fn route_table(rows: &[RouteRow]) -> String {
    let mut table = String::new();
    table.push_str("| Subnet | Mask |\n");
    table.push_str("|--------|------|\n");
    for row in rows {
        table.push_str(&format!("| {} | {} |\n", row.subnet, row.mask));
    }
    table
}

fn vlan_table(vlans: &BTreeMap<u32, String>) -> String {
    let mut table = String::new();
    table.push_str("| VLAN | Name |\n");
    table.push_str("|------|------|\n");
    for (vlan_id, name) in vlans {
        table.push_str(&format!("| {} | {} |\n", vlan_id, cell(name)));
    }
    table
}

fn vrf_table(vrfs: &BTreeMap<String, VrfRow>) -> String {
    let mut table = String::new();
    table.push_str("| VRF | Index | Profile | RD |\n");
    table.push_str("|-----|-------|---------|----|\n");
    for (name, row) in vrfs {
        table.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            cell(name),
            opt(row.index),
            cell(&row.profile),
            row.route_distinguisher.as_deref().unwrap_or("")
        ));
    }
    table
}
