use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{default_true, slugify, DocumentId, ValidationErrors};

/// Record embedded in a parent document with its own generated id.
///
/// Owned entirely by the parent: no collection, no independent lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubDocument {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub name: String,
    pub slug: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub display_order: i32,
}

impl SubDocument {
    pub fn new(name: &str) -> Self {
        Self {
            id: DocumentId::generate(),
            name: name.to_string(),
            slug: slugify(name),
            is_active: true,
            display_order: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<DocumentId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_display_order(mut self, order: i32) -> Self {
        self.display_order = order;
        self
    }
}

/// Per-entry checks plus id and slug uniqueness within the parent.
pub(crate) fn validate_sub_documents(field: &str, items: &[SubDocument]) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let mut ids = HashSet::new();
    let mut slugs = HashSet::new();
    for (i, item) in items.iter().enumerate() {
        let prefix = format!("{field}[{i}]");
        if item.id.as_str().is_empty() {
            errors.add(format!("{prefix}._id"), "_id is required");
        } else if !ids.insert(item.id.as_str()) {
            errors.add(format!("{prefix}._id"), format!("duplicate id {}", item.id));
        }
        errors.require(&format!("{prefix}.name"), &item.name);
        errors.check_slug(&format!("{prefix}.slug"), &item.slug);
        if !item.slug.is_empty() && !slugs.insert(item.slug.as_str()) {
            errors.add(
                format!("{prefix}.slug"),
                format!("slug {} is already used in {field}", item.slug),
            );
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_unique_within_parent() {
        let items = vec![
            SubDocument::new("Rotary Vane"),
            SubDocument::new("Rotary  Vane"),
        ];
        let errors = validate_sub_documents("productLines", &items);
        assert!(errors.has("productLines[1].slug"));
        assert!(!errors.has("productLines[0].slug"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let items = vec![
            SubDocument::new("Claw").with_id("L1"),
            SubDocument::new("Screw").with_id("L1"),
        ];
        assert!(validate_sub_documents("productLines", &items).has("productLines[1]._id"));
    }
}
