//! Authoritative nameserver discovery
//!
//! Walks up the label hierarchy of a domain until some ancestor (or the
//! domain itself) has NS records, then resolves those nameservers to IPv4
//! addresses.
//!
//! ```text
//! a.b.example.com.  NS? -> no answer
//!   b.example.com.  NS? -> no answer
//!     example.com.  NS? -> ns1.example.net., ns2.example.net.   (stop)
//!
//! ns1.example.net.  A?  -> 192.0.2.1
//! ns2.example.net.  A?  -> 192.0.2.2
//! ```
//!
//! Lookup failures count as "no answer". If no ancestor has NS records the
//! result is empty and the caller skips the propagation wait. IPv6
//! nameserver addresses are not collected.

use crate::traits::DnsLookup;
use crate::zone::labels;
use std::net::IpAddr;
use tracing::debug;

/// The servers authoritative for a domain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthoritativeServers {
    /// Nearest enclosing name that returned NS records
    pub apex: Option<String>,
    /// NS target host names
    pub nameservers: Vec<String>,
    /// IPv4 addresses of all nameservers, de-duplicated, in discovery order
    pub addresses: Vec<IpAddr>,
}

impl AuthoritativeServers {
    /// True when there is nothing to query
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Candidate zone apexes for `domain`, longest first, each absolute
///
/// `a.b.example.com` yields `a.b.example.com.`, `b.example.com.`,
/// `example.com.`, `com.`. The root is never a candidate.
pub fn candidate_apexes(domain: &str) -> Vec<String> {
    let labels = labels(domain);
    (0..labels.len())
        .map(|start| format!("{}.", labels[start..].join(".")))
        .collect()
}

/// Find the authoritative servers for `domain`
pub async fn find_authoritative(lookup: &dyn DnsLookup, domain: &str) -> AuthoritativeServers {
    let mut servers = AuthoritativeServers::default();

    for candidate in candidate_apexes(domain) {
        let nameservers = match lookup.nameservers(&candidate).await {
            Ok(nameservers) => nameservers,
            Err(e) => {
                debug!("NS lookup for {} failed: {}", candidate, e);
                Vec::new()
            }
        };

        if !nameservers.is_empty() {
            debug!("{} is served by {}", candidate, nameservers.join(", "));
            servers.apex = Some(candidate);
            servers.nameservers = nameservers;
            break;
        }
    }

    for host in &servers.nameservers {
        let addrs = match lookup.ipv4_addrs(host).await {
            Ok(addrs) => addrs,
            Err(e) => {
                debug!("A lookup for nameserver {} failed: {}", host, e);
                continue;
            }
        };

        for addr in addrs {
            let addr = IpAddr::V4(addr);
            if !servers.addresses.contains(&addr) {
                servers.addresses.push(addr);
            }
        }
    }

    servers
}
