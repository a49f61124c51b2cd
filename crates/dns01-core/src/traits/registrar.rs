// # Registrar Trait
//
// Defines the interface for managing DNS-01 challenge records through a
// registrar's DNS-management API.
//
// ## Implementations
//
// - RU-CENTER (nic.ru): `dns01-provider-rucenter` crate
//
// ## Two-Phase Changes
//
// Writes and deletes are staged by the registrar and only become visible to
// resolvers after [`Registrar::commit`]. Callers must commit once after their
// last mutation in a zone.
//
// ## Usage
//
// ```rust,ignore
// use dns01_core::{select_zone, Registrar};
//
// let zone = select_zone("www.example.com", registrar.list_zones().await?)?;
// let id = registrar
//     .add_txt_record(&zone, "_acme-challenge.www.example.com.", "token")
//     .await?;
// registrar.commit(&zone).await?;
// ```

use crate::error::Result;
use crate::zone::{TxtRecord, Zone};
use async_trait::async_trait;

/// Trait for registrar client implementations
///
/// Implementations hold an authenticated session; authentication happens
/// when the client is constructed.
///
/// # Failure
///
/// Every method fails on a non-success status or transport error. There is
/// no retry at this layer. Zone listing failures are
/// [`Error::ZoneDiscovery`](crate::Error::ZoneDiscovery); everything else is
/// [`Error::Registrar`](crate::Error::Registrar) naming the zone.
#[async_trait]
pub trait Registrar: Send + Sync {
    /// List the zones the account holds primary authority for, in listing order
    async fn list_zones(&self) -> Result<Vec<Zone>>;

    /// Stage a new TXT record and return its registrar-assigned id
    ///
    /// # Parameters
    ///
    /// - `zone`: The zone to write into
    /// - `fqdn`: Absolute record name (e.g. "_acme-challenge.example.com.")
    /// - `value`: TXT string
    async fn add_txt_record(&self, zone: &Zone, fqdn: &str, value: &str) -> Result<String>;

    /// List the TXT records of a zone
    ///
    /// Entries missing their name, type or TXT string are left out.
    async fn list_records(&self, zone: &Zone) -> Result<Vec<TxtRecord>>;

    /// Stage removal of a record by id
    async fn delete_record(&self, zone: &Zone, record_id: &str) -> Result<()>;

    /// Materialize all staged changes in the zone
    async fn commit(&self, zone: &Zone) -> Result<()>;

    /// Registrar name (for logging)
    fn registrar_name(&self) -> &'static str;
}
