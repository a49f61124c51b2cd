//! Zones, records and zone selection
//!
//! A domain is served by the zone whose name is a label-aligned suffix of it:
//! `example.com` owns `foo.example.com` but not `notexample.com`.

use crate::error::{Error, Result};
use std::fmt;

/// A DNS zone the authenticated account can manage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Registrar service the zone belongs to
    pub service: String,
    /// Zone apex name (e.g. "example.com")
    pub name: String,
}

impl Zone {
    /// Create a zone reference
    pub fn new(service: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            name: name.into(),
        }
    }

    /// Check whether this zone is a label-aligned suffix of `domain`
    pub fn contains(&self, domain: &str) -> bool {
        is_label_suffix(&self.name, domain)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.name)
    }
}

/// A TXT record as listed by the registrar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxtRecord {
    /// Registrar-assigned record id
    pub id: String,
    /// Record name, absolute ("_acme-challenge.example.com.") or zone-relative
    pub name: String,
    /// Record type as reported by the registrar
    pub record_type: String,
    /// First TXT string of the record
    pub value: String,
}

/// Split a name into labels, ignoring one trailing root dot
pub fn labels(name: &str) -> Vec<&str> {
    let name = name.strip_suffix('.').unwrap_or(name);
    if name.is_empty() {
        return Vec::new();
    }
    name.split('.').collect()
}

/// True iff the labels of `zone` equal a trailing slice of the labels of `domain`
pub fn is_label_suffix(zone: &str, domain: &str) -> bool {
    let zone_labels = labels(zone);
    let domain_labels = labels(domain);

    if zone_labels.is_empty() || zone_labels.len() > domain_labels.len() {
        return false;
    }

    let offset = domain_labels.len() - zone_labels.len();
    domain_labels[offset..]
        .iter()
        .zip(&zone_labels)
        .all(|(d, z)| d.eq_ignore_ascii_case(z))
}

/// Pick the first zone, in listing order, that owns `domain`
///
/// The zone sequence is consumed lazily and consumption stops at the match.
pub fn select_zone<I>(domain: &str, zones: I) -> Result<Zone>
where
    I: IntoIterator<Item = Zone>,
{
    zones
        .into_iter()
        .find(|zone| zone.contains(domain))
        .ok_or_else(|| Error::zone_not_found(domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_suffix_is_label_aligned() {
        assert!(is_label_suffix("example.com", "foo.example.com"));
        assert!(is_label_suffix("example.com", "example.com"));
        assert!(is_label_suffix("example.com.", "a.b.example.com"));
        assert!(is_label_suffix("Example.COM", "www.example.com."));
        assert!(!is_label_suffix("example.com", "notexample.com"));
        assert!(!is_label_suffix("foo.example.com", "example.com"));
        assert!(!is_label_suffix("", "example.com"));
    }

    #[test]
    fn labels_ignore_root_dot() {
        assert_eq!(labels("_acme-challenge.example.com."), vec!["_acme-challenge", "example", "com"]);
        assert_eq!(labels("example.com"), vec!["example", "com"]);
        assert!(labels(".").is_empty());
    }

    #[test]
    fn selects_matching_zone() {
        let zones = vec![Zone::new("SVC1", "example.com"), Zone::new("SVC2", "other.org")];
        let zone = select_zone("sub.example.com", zones).unwrap();
        assert_eq!(zone, Zone::new("SVC1", "example.com"));
    }

    #[test]
    fn first_match_wins_in_listing_order() {
        let zones = vec![
            Zone::new("SVC1", "example.com"),
            Zone::new("SVC2", "sub.example.com"),
        ];
        let zone = select_zone("www.sub.example.com", zones).unwrap();
        assert_eq!(zone.service, "SVC1");
    }

    #[test]
    fn selection_stops_consuming_after_match() {
        let mut consumed = 0;
        let zones = [
            Zone::new("SVC1", "other.org"),
            Zone::new("SVC2", "example.com"),
            Zone::new("SVC3", "example.net"),
        ]
        .into_iter()
        .inspect(|_| consumed += 1);

        select_zone("example.com", zones).unwrap();
        assert_eq!(consumed, 2);
    }

    #[test]
    fn no_match_names_domain() {
        let zones = vec![Zone::new("SVC1", "example.com")];
        let err = select_zone("notexample.com", zones).unwrap_err();
        assert!(matches!(err, Error::ZoneNotFound { ref domain } if domain == "notexample.com"));
    }
}
