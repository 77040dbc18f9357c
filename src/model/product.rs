use serde::{Deserialize, Serialize};

use super::{default_true, slugify, validate_named, DocumentId, Entity, ValidationErrors};

/// Catalog product.
///
/// Holds weak references: `brand` / `pump_type` are document ids, while
/// `product_line_id` / `sub_pump_type` name sub-documents embedded in the
/// referenced parent and compare by plain string equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<DocumentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_line_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pump_type: Option<DocumentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_pump_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Product {
    pub fn new(name: &str) -> Self {
        Self {
            id: DocumentId::generate(),
            name: name.to_string(),
            slug: slugify(name),
            brand: None,
            product_line_id: None,
            pump_type: None,
            sub_pump_type: None,
            description: None,
            is_active: true,
        }
    }

    pub fn with_brand(mut self, brand: DocumentId, product_line_id: Option<&str>) -> Self {
        self.brand = Some(brand);
        self.product_line_id = product_line_id.map(str::to_string);
        self
    }

    pub fn with_pump_type(mut self, pump_type: DocumentId, sub_pump_type: Option<&str>) -> Self {
        self.pump_type = Some(pump_type);
        self.sub_pump_type = sub_pump_type.map(str::to_string);
        self
    }
}

impl Entity for Product {
    const COLLECTION: &'static str = "products";
    const LABEL: &'static str = "product";

    fn id(&self) -> &DocumentId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = validate_named("name", &self.name, &self.slug);
        if self.product_line_id.is_some() && self.brand.is_none() {
            errors.add("productLineId", "a product line requires a brand");
        }
        if self.sub_pump_type.is_some() && self.pump_type.is_none() {
            errors.add("subPumpType", "a sub pump type requires a pump type");
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_reference_requires_parent() {
        let mut product = Product::new("RV-100");
        product.product_line_id = Some("L1".into());
        let errors = product.validate().unwrap_err();
        assert!(errors.has("productLineId"));

        let product = Product::new("RV-100").with_brand(DocumentId::from("b1"), Some("L1"));
        assert!(product.validate().is_ok());
    }

    #[test]
    fn test_new_derives_slug() {
        let product = Product::new("Dry Screw DS 300");
        assert_eq!(product.slug, "dry-screw-ds-300");
        assert!(product.is_active);
    }
}
