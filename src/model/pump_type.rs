use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::sub_document::validate_sub_documents;
use super::{default_true, slugify, validate_named, DocumentId, Entity, SubDocument, ValidationErrors};

/// Sub-type embedded in a [`PumpType`].
pub type SubPumpType = SubDocument;

/// Pump technology (rotary vane, claw, screw ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PumpType {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    /// Display name; unique across pump types.
    pub pump_type: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sub_pump_types: Vec<SubPumpType>,
    #[serde(default)]
    pub sub_pump_type_usage: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub product_usage: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl PumpType {
    pub fn new(name: &str) -> Self {
        Self {
            id: DocumentId::generate(),
            pump_type: name.to_string(),
            slug: slugify(name),
            description: None,
            sub_pump_types: Vec::new(),
            sub_pump_type_usage: BTreeMap::new(),
            product_usage: Vec::new(),
            is_active: true,
        }
    }

    pub fn with_sub_pump_type(mut self, sub: SubPumpType) -> Self {
        self.sub_pump_types.push(sub);
        self
    }
}

impl Entity for PumpType {
    const COLLECTION: &'static str = "pumptypes";
    const NAME_FIELD: &'static str = "pumpType";
    const LABEL: &'static str = "pump type";

    fn id(&self) -> &DocumentId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.pump_type
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = validate_named("pumpType", &self.pump_type, &self.slug);
        errors.merge(validate_sub_documents("subPumpTypes", &self.sub_pump_types));
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_lives_in_pump_type_field() {
        let pt = PumpType::new("Rotary Vane");
        let doc = pt.to_document().unwrap();
        assert_eq!(doc["pumpType"], "Rotary Vane");
        assert!(!doc.contains_key("name"));
        assert_eq!(pt.display_name(), "Rotary Vane");
    }

    #[test]
    fn test_validate_reports_missing_name_field() {
        let mut pt = PumpType::new("Claw");
        pt.pump_type.clear();
        assert!(pt.validate().unwrap_err().has("pumpType"));
    }
}
