// # DNS Lookup Trait
//
// The three queries the propagation check needs:
//
// - NS and A lookups through the system's recursive resolver
// - TXT lookups sent straight to one authoritative server, bypassing caches
//
// ## Implementations
//
// - hickory-resolver: `dns01-resolver-hickory` crate
//
// Errors are reported, not swallowed. The algorithms in
// [`authority`](crate::authority) and [`propagation`](crate::propagation)
// decide that a failed lookup counts as an empty answer.

use crate::error::Result;
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr};

/// Trait for DNS query backends
#[async_trait]
pub trait DnsLookup: Send + Sync {
    /// NS targets for `name` via the recursive resolver
    ///
    /// `name` is absolute (trailing dot). Returns host names.
    async fn nameservers(&self, name: &str) -> Result<Vec<String>>;

    /// IPv4 addresses of `host` via the recursive resolver
    async fn ipv4_addrs(&self, host: &str) -> Result<Vec<Ipv4Addr>>;

    /// TXT strings for `name` as answered by `server` directly
    async fn txt_at(&self, server: IpAddr, name: &str) -> Result<Vec<String>>;
}
