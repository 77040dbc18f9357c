//! # VacuFlow
//!
//! Catalog data layer for the VacuFlow vacuum-pump distributor site: a
//! document store over PostgreSQL JSONB (or memory), the catalog entity
//! schemas, the brand / pump type usage index, and the referential
//! integrity rules between customers, business types, industries,
//! applications and products.
//!
//! All calls are blocking. Run them on a `may` coroutine and every
//! PostgreSQL round trip yields to the scheduler.
//!
//! ```no_run
//! use vacuflow::{Catalog, CatalogConfig};
//! use vacuflow::model::DocumentId;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Catalog::connect(&CatalogConfig::load()?)?;
//! catalog.sync_all_usage()?;
//! match catalog.delete_business_type(&DocumentId::from("pharmaceutical")) {
//!     Ok(deleted) => println!("deleted {}", deleted.name),
//!     Err(e) => println!("{}", e.public_message()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod model;
pub mod relation;
pub mod repository;
pub mod store;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod usage;

pub use catalog::Catalog;
pub use config::CatalogConfig;
pub use connection::{connect, ConnectionError};
pub use error::{CatalogError, DeleteConflict, Deleted};
pub use executor::{DbError, DbExecutor, MayPostgresExecutor};
pub use model::{DocumentId, Entity};
pub use store::{DocumentStore, MemoryStore, PgDocumentStore, StoreError};
pub use usage::SyncReport;
