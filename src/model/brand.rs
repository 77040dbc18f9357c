use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::sub_document::validate_sub_documents;
use super::{default_true, slugify, validate_named, DocumentId, Entity, SubDocument, ValidationErrors};

/// Product line embedded in a [`Brand`].
pub type ProductLine = SubDocument;

/// Manufacturer brand.
///
/// `product_usage` and `product_line_usage` are derived by the usage sync
/// and are never edited directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub product_lines: Vec<ProductLine>,
    /// Product-line id → names of products on that line.
    #[serde(default)]
    pub product_line_usage: BTreeMap<String, Vec<String>>,
    /// Names of every product of this brand.
    #[serde(default)]
    pub product_usage: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Brand {
    pub fn new(name: &str) -> Self {
        Self {
            id: DocumentId::generate(),
            name: name.to_string(),
            slug: slugify(name),
            description: None,
            product_lines: Vec::new(),
            product_line_usage: BTreeMap::new(),
            product_usage: Vec::new(),
            is_active: true,
        }
    }

    pub fn with_product_line(mut self, line: ProductLine) -> Self {
        self.product_lines.push(line);
        self
    }

    pub fn product_line(&self, id: &str) -> Option<&ProductLine> {
        self.product_lines.iter().find(|l| l.id.as_str() == id)
    }
}

impl Entity for Brand {
    const COLLECTION: &'static str = "brands";
    const LABEL: &'static str = "brand";

    fn id(&self) -> &DocumentId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = validate_named("name", &self.name, &self.slug);
        errors.merge(validate_sub_documents("productLines", &self.product_lines));
        errors.into_result()
    }
}
