//! Propagation waiter
//!
//! After the challenge record is committed, every authoritative server is
//! asked directly for the TXT record until all of them return the expected
//! value or the round budget runs out.
//!
//! ## Round Loop
//!
//! 1. Query each still-pending server, in order, one at a time
//! 2. A server that returns the expected value leaves the pending set
//! 3. If servers remain pending and rounds remain, sleep `poll_interval`
//!
//! The pending set only ever shrinks. Running out of rounds is not an
//! error: the report says which servers never caught up and the caller
//! carries on, leaving the rest to the CA's own retries.

use crate::config::PropagationConfig;
use crate::traits::DnsLookup;
use std::net::IpAddr;
use tracing::{info, warn};

/// Outcome of a propagation wait
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Number of query rounds performed
    pub rounds: usize,
    /// Servers that returned the expected value
    pub synced: Vec<IpAddr>,
    /// Servers that never did
    pub pending: Vec<IpAddr>,
}

impl PropagationReport {
    /// True when every server returned the expected value
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Compare a TXT string from the wire against the expected value
///
/// `value`, `"value"` and `'value'` are equal; an unbalanced quote is not
/// stripped.
pub fn txt_value_matches(found: &str, expected: &str) -> bool {
    if found == expected {
        return true;
    }

    ['"', '\''].iter().any(|&quote| {
        found
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
            .is_some_and(|inner| inner == expected)
    })
}

/// Polls authoritative servers until the challenge record is visible on all
pub struct PropagationWaiter<'a> {
    lookup: &'a dyn DnsLookup,
    config: PropagationConfig,
}

impl<'a> PropagationWaiter<'a> {
    /// Create a waiter over a lookup backend
    pub fn new(lookup: &'a dyn DnsLookup, config: PropagationConfig) -> Self {
        Self { lookup, config }
    }

    /// Wait until every server in `servers` answers `fqdn` with `expected`
    pub async fn wait(&self, fqdn: &str, expected: &str, servers: &[IpAddr]) -> PropagationReport {
        let mut pending: Vec<IpAddr> = servers.to_vec();
        let mut report = PropagationReport::default();
        let poll_interval = self.config.poll_interval();

        while !pending.is_empty() && report.rounds < self.config.max_rounds {
            report.rounds += 1;
            info!("Round {}", report.rounds);

            let mut still_pending = Vec::with_capacity(pending.len());
            for server in pending {
                if self.server_has_value(server, fqdn, expected).await {
                    report.synced.push(server);
                } else {
                    still_pending.push(server);
                }
            }
            pending = still_pending;

            if !pending.is_empty() && report.rounds < self.config.max_rounds {
                tokio::time::sleep(poll_interval).await;
            }
        }

        report.pending = pending;
        report
    }

    async fn server_has_value(&self, server: IpAddr, fqdn: &str, expected: &str) -> bool {
        let answers = self.lookup.txt_at(server, fqdn).await.unwrap_or_default();

        if answers.is_empty() {
            warn!("DNS server {}: Record for {} doesn't exist yet", server, fqdn);
            return false;
        }

        if answers.iter().any(|found| txt_value_matches(found, expected)) {
            return true;
        }

        warn!("DNS server {}: Another record for {} exists", server, fqdn);
        false
    }
}
