mod output;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ipam_snmp_poller::logging::init_logging;
use ipam_snmp_poller::target::{DEFAULT_PORT, DEFAULT_RETRIES, DEFAULT_TIMEOUT_MS};
use ipam_snmp_poller::{
    run_query, AuthProtocol, DeviceTarget, PrivProtocol, QueryOptions, SecurityBundle, SecurityLevel,
    SnmpVersion,
};
use output::{generate_catalog_table, generate_outcome};

/// Poll one device over SNMP and print the result.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Logical query, e.g. get_arp_table
    query: Option<String>,

    /// Device address
    #[arg(long)]
    host: Option<String>,

    /// Label used in logs and output instead of the address
    #[arg(long)]
    hostname: Option<String>,

    /// SNMP version: 1, 2c or 3
    #[arg(long = "snmp-version", default_value = "2c")]
    snmp_version: SnmpVersion,

    /// Community string (v1/v2c) or security name (v3)
    #[arg(long, default_value = "public")]
    community: String,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Request timeout in milliseconds (1000 to 10000)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout: u64,

    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    retries: u32,

    /// SNMPv3 security level: noAuthNoPriv, authNoPriv or authPriv
    #[arg(long = "sec-level", default_value = "authnopriv")]
    sec_level: SecurityLevel,

    #[arg(long = "auth-protocol", default_value = "md5")]
    auth_protocol: AuthProtocol,

    #[arg(long = "auth-pass", default_value = "")]
    auth_pass: String,

    #[arg(long = "priv-protocol", default_value = "des")]
    priv_protocol: PrivProtocol,

    #[arg(long = "priv-pass", default_value = "")]
    priv_pass: String,

    /// SNMPv3 context to poll instead of enumerating VRFs
    #[arg(long)]
    context: Option<String>,

    #[arg(long = "context-engine-id")]
    context_engine_id: Option<String>,

    /// VLAN for community string indexing (v1/v2c)
    #[arg(long)]
    vlan: Option<u32>,

    /// Print JSON instead of Markdown
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// List the available queries and exit
    #[arg(long)]
    list: bool,
}

impl Args {
    fn target(&self) -> Result<DeviceTarget> {
        let Some(host) = self.host.as_deref() else {
            bail!("--host is required to run a query");
        };

        let mut target = DeviceTarget::new(host, self.snmp_version)
            .with_community(self.community.as_str())
            .with_port(self.port)
            .with_timeout_ms(self.timeout)
            .with_retries(self.retries);
        if let Some(hostname) = self.hostname.as_deref() {
            target = target.with_hostname(hostname);
        }
        if self.snmp_version == SnmpVersion::V3 {
            target = target.with_security(SecurityBundle {
                level: self.sec_level,
                auth_protocol: self.auth_protocol,
                auth_passphrase: self.auth_pass.clone(),
                priv_protocol: self.priv_protocol,
                priv_passphrase: self.priv_pass.clone(),
                context_name: None,
                context_engine_id: self.context_engine_id.clone(),
            });
        }
        Ok(target)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug)?;

    if args.list {
        print!("{}", generate_catalog_table());
        return Ok(());
    }

    let Some(query) = args.query.as_deref() else {
        bail!("no query given, use --list to see the available queries");
    };
    let target = args.target()?;
    let options = QueryOptions {
        context_name: args.context.clone(),
        vlan: args.vlan,
    };

    let outcome = run_query(&target, query, &options)
        .with_context(|| format!("{} failed on {}", query, target.hostname))?;

    if args.json {
        let json = serde_json::to_string_pretty(&outcome).context("serializing result")?;
        println!("{}", json);
    } else {
        print!("{}", generate_outcome(&outcome));
    }

    Ok(())
}
