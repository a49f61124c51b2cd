//! Hook orchestrator
//!
//! The [`HookRunner`] wires a [`Registrar`] and, optionally, a [`DnsLookup`]
//! into the two certbot hook actions.
//!
//! ## Flow
//!
//! ```text
//!                 ┌──────────────────────┐
//!                 │ list zones + select  │  (both actions)
//!                 └──────────┬───────────┘
//!            publish         │          cleanup
//!        ┌───────────────────┴───────────────────┐
//!        ▼                                       ▼
//! ┌──────────────┐                       ┌───────────────┐
//! │ add TXT      │                       │ list records  │
//! │ commit       │                       │ delete matches│
//! └──────┬───────┘                       │ commit        │
//!        ▼                               └───────────────┘
//! ┌──────────────┐
//! │ find NS/IPs  │  (skipped without a lookup backend)
//! │ wait rounds  │
//! └──────────────┘
//! ```
//!
//! Registrar failures abort the run. DNS failures never do, and the
//! outcome of the propagation wait never changes the result.

use crate::authority::{AuthoritativeServers, find_authoritative};
use crate::challenge::Challenge;
use crate::config::PropagationConfig;
use crate::error::{Error, Result};
use crate::propagation::{PropagationReport, PropagationWaiter};
use crate::traits::{DnsLookup, Registrar};
use crate::zone::{Zone, select_zone};
use std::path::Path;
use tracing::{debug, info, warn};

/// Program name selecting [`HookAction::Publish`]
pub const AUTH_HOOK_NAME: &str = "ru-center-certbot-auth-hook";

/// Program name selecting [`HookAction::Cleanup`]
pub const CLEANUP_HOOK_NAME: &str = "ru-center-certbot-cleanup-hook";

/// Which hook the process was invoked as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookAction {
    /// Create the challenge record and wait for it to propagate
    Publish,
    /// Remove the challenge record
    Cleanup,
}

impl HookAction {
    /// Select the action from the invoked program path (`argv[0]`)
    pub fn from_program_name(program: &str) -> Result<Self> {
        let name = Path::new(program)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(program);

        match name {
            AUTH_HOOK_NAME => Ok(HookAction::Publish),
            CLEANUP_HOOK_NAME => Ok(HookAction::Cleanup),
            _ => Err(Error::usage(format!(
                "Call this program as {AUTH_HOOK_NAME} or {CLEANUP_HOOK_NAME}"
            ))),
        }
    }
}

/// Result of a successful hook run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    /// Challenge record created and committed
    Published {
        /// Zone the record was written to
        zone: Zone,
        /// Registrar id of the new record
        record_id: String,
        /// Propagation wait result (`None` when the wait was skipped)
        propagation: Option<PropagationReport>,
    },
    /// Matching challenge records deleted and committed
    CleanedUp {
        /// Zone the records were deleted from
        zone: Zone,
        /// Registrar ids of the deleted records (may be empty)
        deleted: Vec<String>,
    },
}

/// Runs one hook action against a registrar
pub struct HookRunner {
    /// Registrar holding the zone
    registrar: Box<dyn Registrar>,

    /// Lookup backend for the propagation wait
    lookup: Option<Box<dyn DnsLookup>>,

    /// Propagation wait settings
    propagation: PropagationConfig,
}

impl HookRunner {
    /// Create a runner that does not wait for propagation
    pub fn new(registrar: Box<dyn Registrar>) -> Self {
        Self {
            registrar,
            lookup: None,
            propagation: PropagationConfig {
                enabled: false,
                ..PropagationConfig::default()
            },
        }
    }

    /// Enable the propagation wait stage
    pub fn with_propagation(mut self, lookup: Box<dyn DnsLookup>, config: PropagationConfig) -> Self {
        self.lookup = Some(lookup);
        self.propagation = config;
        self
    }

    /// Run `action` for `challenge`
    pub async fn run(&self, action: HookAction, challenge: &Challenge) -> Result<HookOutcome> {
        let zone = self.select_zone(&challenge.domain).await?;
        debug!(
            "Using {} zone {} for {}",
            self.registrar.registrar_name(),
            zone,
            challenge.domain
        );

        match action {
            HookAction::Publish => self.publish(zone, challenge).await,
            HookAction::Cleanup => self.cleanup(zone, challenge).await,
        }
    }

    async fn select_zone(&self, domain: &str) -> Result<Zone> {
        let zones = self.registrar.list_zones().await?;
        select_zone(domain, zones)
    }

    async fn publish(&self, zone: Zone, challenge: &Challenge) -> Result<HookOutcome> {
        let fqdn = challenge.record_fqdn();

        info!("Creating TXT DNS record for {}", fqdn);
        let record_id = self
            .registrar
            .add_txt_record(&zone, &fqdn, &challenge.validation)
            .await?;
        self.registrar.commit(&zone).await?;
        debug!("Committed record {} in zone {}", record_id, zone);

        let propagation = self.await_propagation(challenge).await;

        Ok(HookOutcome::Published {
            zone,
            record_id,
            propagation,
        })
    }

    async fn await_propagation(&self, challenge: &Challenge) -> Option<PropagationReport> {
        let lookup = match &self.lookup {
            Some(lookup) if self.propagation.enabled => lookup.as_ref(),
            _ => {
                debug!("Propagation wait disabled");
                return None;
            }
        };

        let servers: AuthoritativeServers = find_authoritative(lookup, &challenge.domain).await;
        if servers.is_empty() {
            warn!(
                "No authoritative nameservers found for {}, not waiting",
                challenge.domain
            );
            return None;
        }

        let fqdn = challenge.record_fqdn();
        let report = PropagationWaiter::new(lookup, self.propagation.clone())
            .wait(&fqdn, &challenge.validation, &servers.addresses)
            .await;

        if report.is_complete() {
            info!(
                "Record for {} is visible on all {} authoritative servers after {} round(s)",
                fqdn,
                report.synced.len(),
                report.rounds
            );
        } else {
            let pending: Vec<String> = report.pending.iter().map(|ip| ip.to_string()).collect();
            warn!(
                "Gave up waiting after {} round(s); not yet synced: {}",
                report.rounds,
                pending.join(", ")
            );
        }

        Some(report)
    }

    async fn cleanup(&self, zone: Zone, challenge: &Challenge) -> Result<HookOutcome> {
        let fqdn = challenge.record_fqdn();
        let records = self.registrar.list_records(&zone).await?;

        let mut deleted = Vec::new();
        for record in records.iter().filter(|r| challenge.matches_record(r, &zone)) {
            info!("Deleting TXT DNS record {} for {}", record.id, fqdn);
            self.registrar.delete_record(&zone, &record.id).await?;
            deleted.push(record.id.clone());
        }

        self.registrar.commit(&zone).await?;

        if deleted.is_empty() {
            info!("No TXT DNS record for {} matched, nothing deleted", fqdn);
        }

        Ok(HookOutcome::CleanedUp { zone, deleted })
    }
}
