use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::{default_true, slugify, validate_named, DocumentId, Entity, ValidationErrors};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    #[default]
    Active,
    Inactive,
    Prospect,
}

impl CustomerStatus {
    pub const VALUES: [&'static str; 3] = ["active", "inactive", "prospect"];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerTier {
    Strategic,
    Key,
    #[default]
    Standard,
}

impl CustomerTier {
    pub const VALUES: [&'static str; 3] = ["strategic", "key", "standard"];
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::VALUES[*self as usize])
    }
}

impl fmt::Display for CustomerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::VALUES[*self as usize])
    }
}

/// Reference customer shown on the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legal_name: Option<String>,
    /// Exactly one segment; mirrored in `BusinessType::customer_ids`.
    pub business_type: DocumentId,
    #[serde(default)]
    pub industry: Vec<DocumentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default)]
    pub customer_status: CustomerStatus,
    #[serde(default)]
    pub customer_tier: CustomerTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Entity for Customer {
    const COLLECTION: &'static str = "customers";
    const LABEL: &'static str = "customer";

    fn id(&self) -> &DocumentId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = validate_named("name", &self.name, &self.slug);
        errors.require("businessType", self.business_type.as_str());
        if let Some(website) = &self.website {
            if !(website.starts_with("http://") || website.starts_with("https://")) {
                errors.add("website", "must be an http(s) URL");
            }
        }
        errors.into_result()
    }
}

/// Writable customer fields as submitted by the admin form.
///
/// `slug` defaults to the slugified name; `business_type` is optional here
/// only so a missing value surfaces as a field error rather than a parse
/// failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub legal_name: Option<String>,
    #[serde(default)]
    pub business_type: Option<DocumentId>,
    #[serde(default)]
    pub industry: Vec<DocumentId>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub customer_status: CustomerStatus,
    #[serde(default)]
    pub customer_tier: CustomerTier,
    #[serde(default)]
    pub complete_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl CustomerInput {
    pub fn new(name: &str, business_type: DocumentId) -> Self {
        Self {
            name: name.to_string(),
            business_type: Some(business_type),
            is_active: true,
            ..Self::default()
        }
    }

    pub fn with_industries(mut self, industries: Vec<DocumentId>) -> Self {
        self.industry = industries;
        self
    }

    /// Parse a request body.
    ///
    /// Enum and shape problems come back as field errors, never as a
    /// deserializer message about internal types.
    pub fn from_json(body: Value) -> Result<Self, ValidationErrors> {
        let Value::Object(fields) = &body else {
            return Err(ValidationErrors::single("body", "expected a JSON object"));
        };

        let mut errors = ValidationErrors::new();
        check_enum(&mut errors, fields.get("customerStatus"), "customerStatus", &CustomerStatus::VALUES);
        check_enum(&mut errors, fields.get("customerTier"), "customerTier", &CustomerTier::VALUES);
        if let Some(Value::String(date)) = fields.get("completeDate") {
            if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
                errors.add("completeDate", "must be a date in YYYY-MM-DD form");
            }
        }
        errors.into_result()?;

        serde_json::from_value(body).map_err(|e| ValidationErrors::single("body", e.to_string()))
    }

    /// Build the stored document for `id`, running the customer schema checks.
    pub fn into_customer(self, id: DocumentId) -> Result<Customer, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let Some(business_type) = self.business_type else {
            errors.add("businessType", "businessType is required");
            return Err(errors);
        };
        let slug = match self.slug {
            Some(slug) if !slug.is_empty() => slug,
            _ => slugify(&self.name),
        };
        let customer = Customer {
            id,
            name: self.name,
            slug,
            legal_name: self.legal_name,
            business_type,
            industry: self.industry,
            website: self.website,
            logo: self.logo,
            customer_status: self.customer_status,
            customer_tier: self.customer_tier,
            complete_date: self.complete_date,
            description: self.description,
            is_active: self.is_active,
        };
        customer.validate()?;
        Ok(customer)
    }
}

fn check_enum(errors: &mut ValidationErrors, value: Option<&Value>, field: &str, allowed: &[&str]) {
    match value {
        None | Some(Value::Null) => {}
        Some(Value::String(s)) if allowed.contains(&s.as_str()) => {}
        Some(_) => errors.add(field, format!("must be one of: {}", allowed.join(", "))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_full_body() {
        let input = CustomerInput::from_json(json!({
            "name": "Acme Pharma",
            "legalName": "Acme Pharma GmbH",
            "businessType": "bt1",
            "industry": ["i1", "i2"],
            "customerStatus": "prospect",
            "customerTier": "key",
            "completeDate": "2023-05-01",
            "website": "https://acme.example"
        }))
        .unwrap();
        assert_eq!(input.customer_status, CustomerStatus::Prospect);
        assert_eq!(input.customer_tier, CustomerTier::Key);
        assert!(input.is_active);

        let customer = input.into_customer(DocumentId::from("c1")).unwrap();
        assert_eq!(customer.slug, "acme-pharma");
        assert_eq!(customer.business_type, DocumentId::from("bt1"));
        assert_eq!(customer.industry.len(), 2);
    }

    #[test]
    fn test_from_json_reports_enum_fields() {
        let errors = CustomerInput::from_json(json!({
            "name": "Acme",
            "businessType": "bt1",
            "customerStatus": "gold",
            "customerTier": 3
        }))
        .unwrap_err();
        assert!(errors.has("customerStatus"));
        assert!(errors.has("customerTier"));
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(CustomerInput::from_json(json!(["Acme"])).unwrap_err().has("body"));
        assert!(CustomerInput::from_json(json!({"industry": "i1"}))
            .unwrap_err()
            .has("body"));
    }

    #[test]
    fn test_business_type_is_required() {
        let input = CustomerInput {
            name: "Acme".into(),
            ..CustomerInput::default()
        };
        let errors = input.into_customer(DocumentId::from("c1")).unwrap_err();
        assert!(errors.has("businessType"));
    }

    #[test]
    fn test_explicit_slug_is_checked() {
        let mut input = CustomerInput::new("Acme", DocumentId::from("bt1"));
        input.slug = Some("Acme Corp".into());
        let errors = input.into_customer(DocumentId::from("c1")).unwrap_err();
        assert!(errors.has("slug"));
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(CustomerTier::Strategic.to_string(), "strategic");
        assert_eq!(json!(CustomerStatus::Inactive), json!("inactive"));
    }
}
