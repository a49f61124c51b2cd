//! Core traits for the DNS-01 hook
//!
//! This module defines the abstract interfaces the hook is wired from.
//!
//! - [`Registrar`]: Zone and TXT record management through a registrar API
//! - [`DnsLookup`]: NS/A lookups and direct TXT queries against one server

pub mod registrar;
pub mod dns_lookup;

pub use registrar::Registrar;
pub use dns_lookup::DnsLookup;
