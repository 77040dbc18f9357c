use serde::{Deserialize, Serialize};

use super::{slugify, validate_named, DocumentId, Entity, ValidationErrors};

/// Vacuum application (packaging, degassing ...), linked to the industries
/// it is recommended for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub recommended_industries: Vec<DocumentId>,
}

impl Application {
    pub fn new(name: &str) -> Self {
        Self {
            id: DocumentId::generate(),
            name: name.to_string(),
            slug: slugify(name),
            description: None,
            recommended_industries: Vec::new(),
        }
    }

    pub fn with_industry(mut self, industry: DocumentId) -> Self {
        self.recommended_industries.push(industry);
        self
    }
}

impl Entity for Application {
    const COLLECTION: &'static str = "applications";
    const LABEL: &'static str = "application";

    fn id(&self) -> &DocumentId {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = validate_named("name", &self.name, &self.slug);
        for (i, industry) in self.recommended_industries.iter().enumerate() {
            if industry.as_str().is_empty() {
                errors.add(format!("recommendedIndustries[{i}]"), "industry id is empty");
            }
        }
        errors.into_result()
    }
}
