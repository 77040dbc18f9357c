//! Query and update vocabulary shared by every store backend.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{Document, DocumentId, StoreError, ID_FIELD};

static FIELD_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("field name pattern is valid")
});

/// Reject anything that is not a plain top-level identifier.
///
/// Field names are spliced into SQL by the PostgreSQL backend, so this check
/// runs before any statement is built.
pub fn validate_field_name(field: &str) -> Result<(), StoreError> {
    if FIELD_NAME.is_match(field) {
        Ok(())
    } else {
        Err(StoreError::InvalidField(field.to_string()))
    }
}

/// Document selection predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every document in the collection.
    All,
    /// Field equals a scalar value.
    Eq(String, Value),
    /// Array field contains the value.
    Contains(String, Value),
    /// String field is one of the values.
    In(String, Vec<String>),
    /// Every sub-filter matches.
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(field.to_string(), value.into())
    }

    pub fn contains(field: &str, value: impl Into<Value>) -> Self {
        Filter::Contains(field.to_string(), value.into())
    }

    pub fn id(id: &DocumentId) -> Self {
        Filter::eq(ID_FIELD, id)
    }

    pub fn ids(ids: &[DocumentId]) -> Self {
        Filter::In(
            ID_FIELD.to_string(),
            ids.iter().map(|id| id.as_str().to_string()).collect(),
        )
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::All => other,
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => doc.get(field) == Some(value),
            Filter::Contains(field, value) => doc
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
            Filter::In(field, values) => doc
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| values.iter().any(|v| v == s)),
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
        }
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        match self {
            Filter::All => Ok(()),
            Filter::Eq(field, _) | Filter::Contains(field, _) | Filter::In(field, _) => {
                validate_field_name(field)
            }
            Filter::And(filters) => filters.iter().try_for_each(Filter::validate),
        }
    }
}

/// Document mutation applied by `update_many`.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Overwrite top-level fields.
    Set(Vec<(String, Value)>),
    /// Remove every occurrence of the value from an array field.
    Pull(String, Value),
    /// Append the value to an array field unless already present.
    AddToSet(String, Value),
}

impl Update {
    pub fn set(field: &str, value: impl Into<Value>) -> Self {
        Update::Set(vec![(field.to_string(), value.into())])
    }

    pub fn pull(field: &str, value: impl Into<Value>) -> Self {
        Update::Pull(field.to_string(), value.into())
    }

    pub fn add_to_set(field: &str, value: impl Into<Value>) -> Self {
        Update::AddToSet(field.to_string(), value.into())
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        let fields: Vec<&str> = match self {
            Update::Set(pairs) => pairs.iter().map(|(f, _)| f.as_str()).collect(),
            Update::Pull(field, _) | Update::AddToSet(field, _) => vec![field.as_str()],
        };
        for field in fields {
            validate_field_name(field)?;
            if field == ID_FIELD {
                return Err(StoreError::InvalidField(format!("{ID_FIELD} is immutable")));
            }
        }
        Ok(())
    }

    /// Apply to an in-memory document; returns whether anything changed.
    ///
    /// A missing (or null) array field counts as empty.
    pub fn apply(&self, doc: &mut Document) -> Result<bool, StoreError> {
        match self {
            Update::Set(pairs) => {
                let mut modified = false;
                for (field, value) in pairs {
                    if doc.get(field) != Some(value) {
                        doc.insert(field.clone(), value.clone());
                        modified = true;
                    }
                }
                Ok(modified)
            }
            Update::Pull(field, value) => match doc.get_mut(field) {
                None | Some(Value::Null) => Ok(false),
                Some(Value::Array(items)) => {
                    let before = items.len();
                    items.retain(|item| item != value);
                    Ok(items.len() != before)
                }
                Some(_) => Err(StoreError::InvalidDocument(format!(
                    "cannot pull from non-array field {field}"
                ))),
            },
            Update::AddToSet(field, value) => match doc.get_mut(field) {
                None | Some(Value::Null) => {
                    doc.insert(field.clone(), Value::Array(vec![value.clone()]));
                    Ok(true)
                }
                Some(Value::Array(items)) => {
                    if items.contains(value) {
                        Ok(false)
                    } else {
                        items.push(value.clone());
                        Ok(true)
                    }
                }
                Some(_) => Err(StoreError::InvalidDocument(format!(
                    "cannot add to non-array field {field}"
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_eq_and_contains() {
        let d = doc(json!({"_id": "c1", "businessType": "b1", "industry": ["i1", "i2"]}));
        assert!(Filter::eq("businessType", "b1").matches(&d));
        assert!(!Filter::eq("businessType", "b2").matches(&d));
        assert!(Filter::contains("industry", "i2").matches(&d));
        assert!(!Filter::contains("industry", "i3").matches(&d));
        // equality never reaches into arrays
        assert!(!Filter::eq("industry", "i1").matches(&d));
    }

    #[test]
    fn test_in_and_combination() {
        let d = doc(json!({"_id": "c1", "slug": "acme"}));
        let ids = [DocumentId::from("c0"), DocumentId::from("c1")];
        assert!(Filter::ids(&ids).matches(&d));
        assert!(Filter::ids(&ids).and(Filter::eq("slug", "acme")).matches(&d));
        assert!(!Filter::ids(&ids).and(Filter::eq("slug", "other")).matches(&d));
        assert!(Filter::All.and(Filter::eq("slug", "acme")).matches(&d));
    }

    #[test]
    fn test_field_name_validation() {
        assert!(validate_field_name("productLineId").is_ok());
        assert!(validate_field_name("_id").is_ok());
        assert!(validate_field_name("name'); DROP TABLE x; --").is_err());
        assert!(validate_field_name("stats.customerCount").is_err());
        assert!(Filter::And(vec![Filter::eq("ok", 1), Filter::eq("not ok", 1)])
            .validate()
            .is_err());
        assert!(Update::set("_id", "x").validate().is_err());
    }

    #[test]
    fn test_add_to_set_is_idempotent() {
        let mut d = doc(json!({"_id": "b1"}));
        assert!(Update::add_to_set("customerIds", "c1").apply(&mut d).unwrap());
        assert!(!Update::add_to_set("customerIds", "c1").apply(&mut d).unwrap());
        assert_eq!(d["customerIds"], json!(["c1"]));
    }

    #[test]
    fn test_pull_removes_every_occurrence() {
        let mut d = doc(json!({"_id": "b1", "customerIds": ["c1", "c2", "c1"]}));
        assert!(Update::pull("customerIds", "c1").apply(&mut d).unwrap());
        assert_eq!(d["customerIds"], json!(["c2"]));
        assert!(!Update::pull("customerIds", "c9").apply(&mut d).unwrap());
        assert!(!Update::pull("missing", "c1").apply(&mut d).unwrap());
    }

    #[test]
    fn test_array_ops_reject_scalars() {
        let mut d = doc(json!({"_id": "b1", "name": "Pharma"}));
        assert!(Update::add_to_set("name", "x").apply(&mut d).is_err());
        assert!(Update::pull("name", "x").apply(&mut d).is_err());
    }

    #[test]
    fn test_set_reports_changes_only() {
        let mut d = doc(json!({"_id": "p1", "name": "RV-100"}));
        assert!(!Update::set("name", "RV-100").apply(&mut d).unwrap());
        assert!(Update::set("name", "RV-200").apply(&mut d).unwrap());
    }
}
