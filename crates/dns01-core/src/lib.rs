// # dns01-core
//
// Core library for DNS-01 certbot hooks.
//
// ## Architecture Overview
//
// This library holds everything that is not network plumbing:
// - **Registrar**: Trait for zone and TXT record management via a registrar API
// - **DnsLookup**: Trait for NS/A lookups and direct TXT queries
// - **select_zone**: Label-aligned longest-suffix zone selection
// - **find_authoritative**: Walk up the labels of a domain to its nameservers
// - **PropagationWaiter**: Bounded poll until all authoritative servers agree
// - **HookRunner**: Publish/cleanup orchestration behind the two hook names
//
// ## Design Principles
//
// 1. **Core vs. integrations**: HTTP and DNS clients live in their own crates
// 2. **Typed failures**: One error variant per category, one exit-code mapping
// 3. **Soft DNS**: DNS lookup failures degrade the wait, never abort the hook
// 4. **Library-First**: The binary is a thin wrapper over `HookRunner`

pub mod traits;
pub mod zone;
pub mod challenge;
pub mod authority;
pub mod propagation;
pub mod hook;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{DnsLookup, Registrar};
pub use zone::{TxtRecord, Zone, select_zone};
pub use challenge::Challenge;
pub use authority::{AuthoritativeServers, find_authoritative};
pub use propagation::{PropagationReport, PropagationWaiter, txt_value_matches};
pub use hook::{HookAction, HookOutcome, HookRunner};
pub use config::{HookConfig, PropagationConfig, RegistrarConfig};
pub use error::{Error, ExitStatus, Result};
