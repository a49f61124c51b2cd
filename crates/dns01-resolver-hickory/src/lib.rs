// # hickory-resolver DNS Lookups
//
// `DnsLookup` backed by hickory-resolver.
//
// - NS and A queries go through the system's recursive resolver
//   (`/etc/resolv.conf` on Unix)
// - TXT queries go to one authoritative server at a time over UDP port 53,
//   through a resolver built for that server alone
//
// Response caching is disabled everywhere: every poll must reach the wire.

use async_trait::async_trait;
use dns01_core::traits::DnsLookup;
use dns01_core::{Error, Result};
use hickory_resolver::config::{NameServerConfig, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::rr::rdata::TXT;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::{Resolver, TokioResolver, system_conf};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Port authoritative servers are queried on
const DNS_PORT: u16 = 53;

/// Per-query timeout for direct TXT queries
const DIRECT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// DNS lookups through hickory-resolver
pub struct HickoryLookup {
    /// Recursive resolver from the system configuration
    recursive: TokioResolver,
}

impl std::fmt::Debug for HickoryLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HickoryLookup").finish_non_exhaustive()
    }
}

impl HickoryLookup {
    /// Create lookups using the system resolver configuration
    ///
    /// # Errors
    ///
    /// `Error::Dns` if the system configuration can't be read.
    pub fn from_system() -> Result<Self> {
        let (config, mut opts) = system_conf::read_system_conf()
            .map_err(|e| Error::dns(format!("Failed to read system resolver config: {}", e)))?;
        opts.cache_size = 0;

        Ok(Self::with_recursive_config(config, opts))
    }

    /// Create lookups using an explicit recursive resolver configuration
    pub fn with_recursive_config(config: ResolverConfig, mut opts: ResolverOpts) -> Self {
        opts.cache_size = 0;
        let recursive = Resolver::builder_with_config(config, TokioConnectionProvider::default())
            .with_options(opts)
            .build();

        Self { recursive }
    }
}

/// Resolver that only talks to `server`
fn direct_resolver(server: IpAddr) -> TokioResolver {
    let mut config = ResolverConfig::new();
    config.add_name_server(NameServerConfig::new(
        SocketAddr::new(server, DNS_PORT),
        Protocol::Udp,
    ));

    let mut opts = ResolverOpts::default();
    opts.timeout = DIRECT_QUERY_TIMEOUT;
    opts.attempts = 1;
    opts.cache_size = 0;

    Resolver::builder_with_config(config, TokioConnectionProvider::default())
        .with_options(opts)
        .build()
}

/// Join the character-strings of one TXT record
fn txt_value(txt: &TXT) -> String {
    txt.txt_data()
        .iter()
        .map(|data| String::from_utf8_lossy(data))
        .collect()
}

#[async_trait]
impl DnsLookup for HickoryLookup {
    async fn nameservers(&self, name: &str) -> Result<Vec<String>> {
        let lookup = self
            .recursive
            .ns_lookup(name)
            .await
            .map_err(|e| Error::dns(format!("NS lookup for {} failed: {}", name, e)))?;

        Ok(lookup.iter().map(|ns| ns.0.to_utf8()).collect())
    }

    async fn ipv4_addrs(&self, host: &str) -> Result<Vec<Ipv4Addr>> {
        let lookup = self
            .recursive
            .ipv4_lookup(host)
            .await
            .map_err(|e| Error::dns(format!("A lookup for {} failed: {}", host, e)))?;

        Ok(lookup.iter().map(|a| a.0).collect())
    }

    async fn txt_at(&self, server: IpAddr, name: &str) -> Result<Vec<String>> {
        let lookup = direct_resolver(server)
            .txt_lookup(name)
            .await
            .map_err(|e| Error::dns(format!("TXT lookup for {} at {} failed: {}", name, server, e)))?;

        let values: Vec<String> = lookup.iter().map(txt_value).collect();
        tracing::trace!("{} answered {} TXT value(s) for {}", server, values.len(), name);
        Ok(values)
    }
}
