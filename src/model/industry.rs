use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{slugify, validate_named, DocumentId, Entity, ValidationErrors};

/// Snapshot of how many documents reference an industry.
///
/// Informational only; guards always count live.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryStats {
    #[serde(default)]
    pub customer_count: u64,
    #[serde(default)]
    pub application_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Industry served. Referenced from `Customer::industry` and
/// `Application::recommended_industries`; holds no back-pointers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Industry {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub stats: IndustryStats,
}

impl Industry {
    pub fn new(name: &str) -> Self {
        Self {
            id: DocumentId::generate(),
            name: name.to_string(),
            slug: slugify(name),
            description: None,
            stats: IndustryStats::default(),
        }
    }
}

impl Entity for Industry {
    const COLLECTION: &'static str = "industries";
    const LABEL: &'static str = "industry";

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
