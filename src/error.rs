//! Caller-facing error type of the catalog operations.

use serde::Serialize;
use std::fmt;

use crate::connection::ConnectionError;
use crate::model::{DocumentId, ValidationErrors};
use crate::store::StoreError;

/// Message returned to callers for infrastructure failures.
pub const GENERIC_FAILURE: &str = "The operation failed. Please try again later.";

/// A delete refused because other documents still reference the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteConflict {
    /// Label of the entity being deleted ("business type").
    pub entity: String,
    pub id: DocumentId,
    pub name: String,
    /// Label of the referencing entities ("customer").
    pub referenced_by: String,
    pub count: u64,
    /// Names of the referencing documents, for the operator to act on.
    pub names: Vec<String>,
}

impl fmt::Display for DeleteConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (plural, verb) = if self.count == 1 {
            ("", "references")
        } else {
            ("s", "reference")
        };
        write!(
            f,
            "Cannot delete {} \"{}\": {} {}{} still {} it",
            self.entity, self.name, self.count, self.referenced_by, plural, verb
        )?;
        if !self.names.is_empty() {
            write!(f, " ({})", self.names.join(", "))?;
        }
        Ok(())
    }
}

/// Confirmation of a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub collection: String,
    pub id: DocumentId,
    pub name: String,
}

/// Catalog operation error
#[derive(Debug)]
pub enum CatalogError {
    /// Schema constraint violations
    Validation(ValidationErrors),
    /// Id does not resolve to a document
    NotFound { collection: String, id: DocumentId },
    /// Unique field already taken by another document
    Duplicate {
        collection: String,
        field: String,
        value: String,
    },
    /// Delete refused while references exist
    DeleteBlocked(DeleteConflict),
    /// Store unreachable or failing
    Store(StoreError),
    /// Database connection could not be established
    Connection(ConnectionError),
}

impl CatalogError {
    pub fn not_found(collection: &str, id: &DocumentId) -> Self {
        CatalogError::NotFound {
            collection: collection.to_string(),
            id: id.clone(),
        }
    }

    /// Whether this is an infrastructure failure rather than a caller mistake.
    pub fn is_internal(&self) -> bool {
        matches!(self, CatalogError::Store(_) | CatalogError::Connection(_))
    }

    /// Message safe to return to an API caller.
    ///
    /// Validation, not-found and conflict messages are returned verbatim;
    /// infrastructure failures are logged here and replaced by
    /// [`GENERIC_FAILURE`].
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            log::error!("Catalog operation failed: {self}");
            GENERIC_FAILURE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Validation(errors) => write!(f, "{errors}"),
            CatalogError::NotFound { collection, id } => {
                write!(f, "Not found: no document {id} in {collection}")
            }
            CatalogError::Duplicate {
                collection,
                field,
                value,
            } => write!(f, "Duplicate {field} \"{value}\" in {collection}"),
            CatalogError::DeleteBlocked(conflict) => write!(f, "{conflict}"),
            CatalogError::Store(e) => write!(f, "{e}"),
            CatalogError::Connection(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Validation(e) => Some(e),
            CatalogError::Store(e) => Some(e),
            CatalogError::Connection(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for CatalogError {
    fn from(errors: ValidationErrors) -> Self {
        CatalogError::Validation(errors)
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { collection, id } => CatalogError::Duplicate {
                collection,
                field: "_id".to_string(),
                value: id,
            },
            other => CatalogError::Store(other),
        }
    }
}

impl From<ConnectionError> for CatalogError {
    fn from(err: ConnectionError) -> Self {
        CatalogError::Connection(err)
    }
}

impl From<DeleteConflict> for CatalogError {
    fn from(conflict: DeleteConflict) -> Self {
        CatalogError::DeleteBlocked(conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::DbError;

    #[test]
    fn test_conflict_message_names_blockers() {
        let conflict = DeleteConflict {
            entity: "business type".into(),
            id: DocumentId::from("bt1"),
            name: "Pharmaceutical".into(),
            referenced_by: "customer".into(),
            count: 1,
            names: vec!["Acme Pharma".into()],
        };
        assert_eq!(
            CatalogError::from(conflict).public_message(),
            "Cannot delete business type \"Pharmaceutical\": 1 customer still references it (Acme Pharma)"
        );
    }

    #[test]
    fn test_public_message_hides_infrastructure_detail() {
        let err = CatalogError::from(StoreError::Backend(DbError::QueryError(
            "relation \"catalog_documents\" does not exist".into(),
        )));
        assert!(err.is_internal());
        assert_eq!(err.public_message(), GENERIC_FAILURE);

        let err = CatalogError::not_found("customers", &DocumentId::from("c9"));
        assert!(err.public_message().contains("c9"));
    }

    #[test]
    fn test_duplicate_key_maps_to_duplicate() {
        let err = CatalogError::from(StoreError::DuplicateKey {
            collection: "brands".into(),
            id: "b1".into(),
        });
        assert!(matches!(err, CatalogError::Duplicate { ref field, .. } if field == "_id"));
    }
}
