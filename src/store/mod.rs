//! Document store primitives.
//!
//! The catalog persists every entity as a JSON document inside a named
//! collection. [`DocumentStore`] is the only seam between the catalog logic
//! and storage: collection-level find / count / insert / replace /
//! update-many / delete, each atomic for a single document and nothing more.
//! There are no multi-document transactions; the usage index and the
//! back-pointer arrays are kept consistent by the callers.
//!
//! Two backends ship with the crate:
//! - [`MemoryStore`] keeps collections in process memory
//! - [`PgDocumentStore`] stores documents as JSONB rows in PostgreSQL

mod filter;
mod id;
mod memory;
mod postgres;
mod schema;

pub use filter::{validate_field_name, Filter, Update};
pub use id::DocumentId;
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;
pub use schema::{ensure_schema, DOCUMENTS_TABLE};

use crate::executor::DbError;
use serde_json::Value;
use std::fmt;
use std::time::Instant;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// A stored document: a JSON object carrying its id under [`ID_FIELD`].
pub type Document = serde_json::Map<String, Value>;

/// Name of the id field inside every document.
pub const ID_FIELD: &str = "_id";

/// Store error type
#[derive(Debug)]
pub enum StoreError {
    /// A document with the same id already exists in the collection
    DuplicateKey { collection: String, id: String },
    /// Field name rejected (not an identifier, or immutable)
    InvalidField(String),
    /// Stored or submitted document has the wrong shape
    InvalidDocument(String),
    /// JSON (de)serialization failure
    Serialization(String),
    /// Backend failure
    Backend(DbError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DuplicateKey { collection, id } => {
                write!(f, "Duplicate key: {collection}/{id} already exists")
            }
            StoreError::InvalidField(field) => write!(f, "Invalid field: {field}"),
            StoreError::InvalidDocument(msg) => write!(f, "Invalid document: {msg}"),
            StoreError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            StoreError::Backend(e) => write!(f, "Store backend error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Backend(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        StoreError::Backend(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Collection-level access to stored documents.
///
/// Result order is the collection's natural (insertion) order for every
/// backend, so callers that report lists (usage names, blocking customers)
/// are deterministic.
pub trait DocumentStore: Send + Sync {
    /// All documents matching `filter`.
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    /// Like [`DocumentStore::find`], keeping only `_id` and `fields`.
    fn find_projected(
        &self,
        collection: &str,
        filter: &Filter,
        fields: &[&str],
    ) -> Result<Vec<Document>, StoreError> {
        for field in fields {
            validate_field_name(field)?;
        }
        Ok(self
            .find(collection, filter)?
            .into_iter()
            .map(|doc| project(doc, fields))
            .collect())
    }

    /// First matching document in natural order.
    fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>, StoreError> {
        Ok(self.find(collection, filter)?.into_iter().next())
    }

    fn find_by_id(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>, StoreError> {
        self.find_one(collection, &Filter::id(id))
    }

    fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    /// Insert a new document; fails with [`StoreError::DuplicateKey`] if the id exists.
    fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError>;

    /// Replace the whole document stored under `id`. Returns whether a document matched.
    fn replace(&self, collection: &str, id: &DocumentId, document: Document)
        -> Result<bool, StoreError>;

    /// Apply `update` to every matching document. Returns how many changed.
    fn update_many(&self, collection: &str, filter: &Filter, update: &Update)
        -> Result<u64, StoreError>;

    /// Returns whether a document was deleted.
    fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError>;
}

/// Read the id of a stored document.
pub fn document_id(doc: &Document) -> Result<DocumentId, StoreError> {
    doc.get(ID_FIELD)
        .and_then(Value::as_str)
        .map(DocumentId::from)
        .ok_or_else(|| StoreError::InvalidDocument(format!("missing string {ID_FIELD}")))
}

pub(crate) fn project(doc: Document, fields: &[&str]) -> Document {
    doc.into_iter()
        .filter(|(key, _)| key == ID_FIELD || fields.contains(&key.as_str()))
        .collect()
}

/// Wrap a backend call with the store span, timing metric and failure log.
pub(crate) fn instrumented<T>(
    op: &'static str,
    collection: &str,
    call: impl FnOnce() -> Result<T, StoreError>,
) -> Result<T, StoreError> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::store_op_span(op, collection).entered();

    let start = Instant::now();
    let result = call();
    let _elapsed = start.elapsed();

    #[cfg(feature = "metrics")]
    METRICS.record_store_op(op, collection, _elapsed);

    if let Err(e) = &result {
        log::debug!("store {op} on {collection} failed: {e}");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_keeps_id_and_named_fields() {
        let doc = json!({"_id": "p1", "name": "RV-100", "slug": "rv-100", "subPumpType": "s1"})
            .as_object()
            .cloned()
            .unwrap();
        let projected = project(doc, &["name", "subPumpType"]);
        assert_eq!(
            Value::Object(projected),
            json!({"_id": "p1", "name": "RV-100", "subPumpType": "s1"})
        );
    }

    #[test]
    fn test_document_id_requires_string() {
        let ok = json!({"_id": "b1"}).as_object().cloned().unwrap();
        assert_eq!(document_id(&ok).unwrap(), DocumentId::from("b1"));
        let bad = json!({"_id": 7}).as_object().cloned().unwrap();
        assert!(matches!(document_id(&bad), Err(StoreError::InvalidDocument(_))));
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::DuplicateKey {
            collection: "brands".into(),
            id: "b1".into(),
        };
        assert!(err.to_string().contains("brands/b1"));
        assert!(StoreError::InvalidField("x y".into()).to_string().contains("x y"));
    }
}
