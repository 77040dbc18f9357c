use serde::{Deserialize, Serialize};

use super::{slugify, validate_named, DocumentId, Entity, ValidationErrors};

/// Customer segment ("Pharmaceutical", "Food & Beverage" ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessType {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Back-pointers to the customers of this type, kept in step with
    /// `Customer::business_type` by the customer operations.
    #[serde(default)]
    pub customer_ids: Vec<DocumentId>,
}

impl BusinessType {
    pub fn new(name: &str) -> Self {
        Self {
            id: DocumentId::generate(),
            name: name.to_string(),
            slug: slugify(name),
            description: None,
            customer_ids: Vec::new(),
        }
    }
}

impl Entity for BusinessType {
    const COLLECTION: &'static str = "businesstypes";
    const LABEL: &'static str = "business type";

    fn id(&self) -> &DocumentId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_named("name", &self.name, &self.slug).into_result()
    }
}
