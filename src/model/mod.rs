//! Catalog entity schemas.
//!
//! Each entity maps onto one collection and serializes to the camelCase
//! document layout the site reads. [`Entity::validate`] is the schema check
//! run before every validated write; back-pointer and usage writes go
//! through the raw store and skip it.

mod application;
mod brand;
mod business_type;
mod customer;
mod industry;
mod product;
mod pump_type;
mod slug;
mod sub_document;
mod validation;

pub use application::Application;
pub use brand::{Brand, ProductLine};
pub use business_type::BusinessType;
pub use customer::{Customer, CustomerInput, CustomerStatus, CustomerTier};
pub use industry::{Industry, IndustryStats};
pub use product::Product;
pub use pump_type::{PumpType, SubPumpType};
pub use slug::{is_valid_slug, slugify};
pub use sub_document::SubDocument;
pub use validation::{FieldError, ValidationErrors};

pub use crate::store::DocumentId;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::store::{Document, StoreError};

/// A document type stored in its own collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Collection name.
    const COLLECTION: &'static str;
    /// Field shown to operators when listing documents (names in conflicts, usage lists).
    const NAME_FIELD: &'static str = "name";
    /// Human-readable singular, used in messages.
    const LABEL: &'static str;

    fn id(&self) -> &DocumentId;

    fn display_name(&self) -> &str;

    /// Schema constraints that can be checked on the document alone.
    fn validate(&self) -> Result<(), ValidationErrors>;

    fn to_document(&self) -> Result<Document, StoreError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::InvalidDocument(format!(
                "{} serialized to a non-object: {other}",
                Self::COLLECTION
            ))),
        }
    }

    fn from_document(document: Document) -> Result<Self, StoreError> {
        Ok(serde_json::from_value(Value::Object(document))?)
    }
}

/// Name + slug checks shared by every top-level entity.
pub(crate) fn validate_named(name_field: &str, name: &str, slug: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.require(name_field, name);
    errors.check_slug("slug", slug);
    errors
}

pub(crate) fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_round_trip_keeps_wire_names() {
        let product = Product::new("RV-100")
            .with_brand(DocumentId::from("b1"), Some("L1"))
            .with_pump_type(DocumentId::from("pt1"), None);
        let doc = product.to_document().unwrap();
        assert_eq!(doc["_id"], Value::String(product.id.to_string()));
        assert_eq!(doc["productLineId"], Value::from("L1"));
        assert_eq!(doc["pumpType"], Value::from("pt1"));
        assert!(!doc.contains_key("subPumpType"));
        assert_eq!(Product::from_document(doc).unwrap(), product);
    }

    #[test]
    fn test_from_document_rejects_wrong_shape() {
        let doc = serde_json::json!({"_id": "x", "name": 5})
            .as_object()
            .cloned()
            .unwrap();
        assert!(matches!(
            BusinessType::from_document(doc),
            Err(StoreError::Serialization(_))
        ));
    }
}
