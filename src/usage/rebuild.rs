use serde_json::Value;
use std::collections::BTreeMap;

use crate::store::Document;

/// A product as seen by the usage rebuild: its name and the sub-document
/// id it points at inside the parent, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRef {
    pub name: String,
    pub sub_id: Option<String>,
}

impl ProductRef {
    pub fn new(name: &str, sub_id: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            sub_id: sub_id.map(str::to_string),
        }
    }

    /// Read from a projected product document. Empty sub ids count as none.
    pub(crate) fn from_projection(doc: &Document, sub_field: &str) -> Self {
        let name = doc
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let sub_id = doc
            .get(sub_field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self { name, sub_id }
    }
}

/// Usage fields of one parent document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageIndex {
    /// Names of every product referencing the parent, in product order.
    pub product_usage: Vec<String>,
    /// Sub-document id → names of products on that sub-document.
    pub sub_usage: BTreeMap<String, Vec<String>>,
}

/// Rebuild a parent's usage from scratch.
///
/// Every declared sub id gets a key, even with no products. Previous keys
/// are not consulted, so removed sub-documents disappear. A product naming
/// an undeclared sub id still gets a key of its own.
pub fn rebuild_usage<'a, I>(declared_sub_ids: I, products: &[ProductRef]) -> UsageIndex
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sub_usage: BTreeMap<String, Vec<String>> = declared_sub_ids
        .into_iter()
        .map(|id| (id.to_string(), Vec::new()))
        .collect();

    for product in products {
        if let Some(sub_id) = &product.sub_id {
            sub_usage
                .entry(sub_id.clone())
                .or_default()
                .push(product.name.clone());
        }
    }

    UsageIndex {
        product_usage: products.iter().map(|p| p.name.clone()).collect(),
        sub_usage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_seeded_and_filled_in_product_order() {
        let products = [
            ProductRef::new("RV-100", Some("L1")),
            ProductRef::new("RV-200", Some("L1")),
            ProductRef::new("C-10", None),
        ];
        let index = rebuild_usage(["L1", "L2"], &products);
        assert_eq!(index.product_usage, vec!["RV-100", "RV-200", "C-10"]);
        assert_eq!(index.sub_usage["L1"], vec!["RV-100", "RV-200"]);
        assert!(index.sub_usage["L2"].is_empty());
        assert_eq!(index.sub_usage.len(), 2);
    }

    #[test]
    fn test_undeclared_sub_id_gets_its_own_key() {
        let products = [ProductRef::new("RV-300", Some("gone"))];
        let index = rebuild_usage(["L1"], &products);
        assert_eq!(index.sub_usage["gone"], vec!["RV-300"]);
        assert!(index.sub_usage["L1"].is_empty());
    }

    #[test]
    fn test_no_products_no_subs() {
        let index = rebuild_usage(std::iter::empty(), &[]);
        assert_eq!(index, UsageIndex::default());
    }

    #[test]
    fn test_projection_ignores_empty_sub_id() {
        let doc = serde_json::json!({"_id": "p1", "name": "RV-100", "productLineId": ""})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(
            ProductRef::from_projection(&doc, "productLineId"),
            ProductRef::new("RV-100", None)
        );
    }
}
