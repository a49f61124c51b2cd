//! DNS-01 challenge input
//!
//! The ACME client hands the hook the domain under validation and the
//! key-authorization digest through its environment.

use crate::error::{Error, Result};
use crate::zone::{TxtRecord, Zone};

/// Label prefix of every DNS-01 challenge record
pub const ACME_CHALLENGE_LABEL: &str = "_acme-challenge";

/// Environment variable carrying the domain under validation
pub const DOMAIN_ENV: &str = "CERTBOT_DOMAIN";

/// Environment variable carrying the validation token
pub const VALIDATION_ENV: &str = "CERTBOT_VALIDATION";

/// One DNS-01 challenge: which domain, which TXT value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    /// Domain under validation, without wildcard prefix or root dot
    pub domain: String,
    /// Expected TXT value
    pub validation: String,
}

impl Challenge {
    /// Create a challenge, normalizing wildcard identifiers
    pub fn new(domain: impl AsRef<str>, validation: impl Into<String>) -> Self {
        let domain = domain.as_ref();
        let domain = domain.strip_prefix("*.").unwrap_or(domain);
        let domain = domain.strip_suffix('.').unwrap_or(domain);

        Self {
            domain: domain.to_string(),
            validation: validation.into(),
        }
    }

    /// Read the challenge from `CERTBOT_DOMAIN` / `CERTBOT_VALIDATION`
    ///
    /// `lookup` resolves a variable name to its value; the binary passes
    /// `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let domain = required(&lookup, DOMAIN_ENV)?;
        let validation = required(&lookup, VALIDATION_ENV)?;
        Ok(Self::new(domain, validation))
    }

    /// Absolute name of the challenge record, e.g. `_acme-challenge.example.com.`
    pub fn record_fqdn(&self) -> String {
        format!("{}.{}.", ACME_CHALLENGE_LABEL, self.domain)
    }

    /// Does `record` in `zone` hold this challenge's value?
    ///
    /// The name matches either as an absolute name or as a zone-relative name
    /// that becomes the challenge FQDN once the zone suffix is appended. The
    /// value must match exactly.
    pub fn matches_record(&self, record: &TxtRecord, zone: &Zone) -> bool {
        let fqdn = self.record_fqdn();
        let zone_name = zone.name.strip_suffix('.').unwrap_or(&zone.name);

        let name_matches =
            record.name == fqdn || format!("{}.{}.", record.name, zone_name) == fqdn;

        name_matches && record.value == self.validation
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::config(format!("{key} is not set"))),
    }
}
