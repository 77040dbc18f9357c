//! Reverse-reference bookkeeping.
//!
//! Each relationship is reached through [`BackReferences`], whatever the
//! storage strategy behind it:
//!
//! - [`StoredBackReferences`]: the target keeps an array of referencing ids
//!   (`BusinessType.customerIds`) that writers must keep in step.
//! - [`QueriedBackReferences`]: the referencing side is authoritative and
//!   references are found by query (`Customer.industry`,
//!   `Application.recommendedIndustries`, `Product.brand`,
//!   `Product.pumpType`). Adding and removing are no-ops.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

use crate::error::CatalogError;
use crate::model::{Application, BusinessType, Customer, DocumentId, Entity, Product};
use crate::store::{document_id, DocumentStore, Filter, Update};

/// The documents of one relationship that point at a target.
pub trait BackReferences: Send + Sync {
    /// Record that `source` references `target`. Returns whether anything changed.
    fn add_back_reference(
        &self,
        target: &DocumentId,
        source: &DocumentId,
    ) -> Result<bool, CatalogError>;

    /// Forget that `source` references `target`. Returns whether anything changed.
    fn remove_back_reference(
        &self,
        target: &DocumentId,
        source: &DocumentId,
    ) -> Result<bool, CatalogError>;

    fn count_references(&self, target: &DocumentId) -> Result<u64, CatalogError>;

    /// Display names of the referencing documents.
    fn referencing_names(&self, target: &DocumentId) -> Result<Vec<String>, CatalogError>;

    /// Singular label of the referencing entity, for messages.
    fn source_label(&self) -> &'static str;
}

/// Back-pointer array stored on the target document.
///
/// Array edits are single-document `AddToSet` / `Pull` updates that skip
/// the target's schema validation. Editing a target that does not exist
/// matches nothing and is not an error.
#[derive(Clone)]
pub struct StoredBackReferences {
    store: Arc<dyn DocumentStore>,
    relation: &'static str,
    target_collection: &'static str,
    array_field: &'static str,
    source_collection: &'static str,
    source_name_field: &'static str,
    source_label: &'static str,
}

impl StoredBackReferences {
    /// `BusinessType.customerIds` ← `Customer.businessType`.
    pub fn business_type_customers(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            relation: "customer.businessType",
            target_collection: BusinessType::COLLECTION,
            array_field: "customerIds",
            source_collection: Customer::COLLECTION,
            source_name_field: Customer::NAME_FIELD,
            source_label: Customer::LABEL,
        }
    }

    /// Ids currently stored on the target, in array order.
    pub fn referencing_ids(&self, target: &DocumentId) -> Result<Vec<DocumentId>, CatalogError> {
        let doc = self
            .store
            .find_projected(self.target_collection, &Filter::id(target), &[self.array_field])?
            .into_iter()
            .next()
            .ok_or_else(|| CatalogError::not_found(self.target_collection, target))?;
        Ok(doc
            .get(self.array_field)
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(DocumentId::from)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn edit(&self, target: &DocumentId, update: Update) -> Result<bool, CatalogError> {
        let modified =
            self.store
                .update_many(self.target_collection, &Filter::id(target), &update)?;
        if modified > 0 {
            #[cfg(feature = "metrics")]
            METRICS.record_backref_update(self.relation);
        } else {
            log::debug!(
                "{}: no change on {}/{target}",
                self.relation,
                self.target_collection
            );
        }
        Ok(modified > 0)
    }
}

impl BackReferences for StoredBackReferences {
    fn add_back_reference(
        &self,
        target: &DocumentId,
        source: &DocumentId,
    ) -> Result<bool, CatalogError> {
        self.edit(target, Update::add_to_set(self.array_field, source))
    }

    fn remove_back_reference(
        &self,
        target: &DocumentId,
        source: &DocumentId,
    ) -> Result<bool, CatalogError> {
        self.edit(target, Update::pull(self.array_field, source))
    }

    /// Length of the stored array.
    fn count_references(&self, target: &DocumentId) -> Result<u64, CatalogError> {
        Ok(self.referencing_ids(target)?.len() as u64)
    }

    /// Names of the stored ids that resolve, in array order.
    fn referencing_names(&self, target: &DocumentId) -> Result<Vec<String>, CatalogError> {
        let ids = self.referencing_ids(target)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let names: HashMap<DocumentId, String> = self
            .store
            .find_projected(
                self.source_collection,
                &Filter::ids(&ids),
                &[self.source_name_field],
            )?
            .iter()
            .filter_map(|doc| {
                let id = document_id(doc).ok()?;
                let name = doc.get(self.source_name_field)?.as_str()?.to_string();
                Some((id, name))
            })
            .collect();
        Ok(ids.iter().filter_map(|id| names.get(id).cloned()).collect())
    }

    fn source_label(&self) -> &'static str {
        self.source_label
    }
}

/// References computed by querying the referencing collection.
#[derive(Clone)]
pub struct QueriedBackReferences {
    store: Arc<dyn DocumentStore>,
    relation: &'static str,
    source_collection: &'static str,
    source_field: &'static str,
    /// `source_field` is an array of ids rather than a single id.
    many: bool,
    source_name_field: &'static str,
    source_label: &'static str,
}

impl QueriedBackReferences {
    fn of<S: Entity>(
        store: Arc<dyn DocumentStore>,
        relation: &'static str,
        source_field: &'static str,
        many: bool,
    ) -> Self {
        Self {
            store,
            relation,
            source_collection: S::COLLECTION,
            source_field,
            many,
            source_name_field: S::NAME_FIELD,
            source_label: S::LABEL,
        }
    }

    /// Customers whose `industry` array holds the industry.
    pub fn industry_customers(store: Arc<dyn DocumentStore>) -> Self {
        Self::of::<Customer>(store, "customer.industry", "industry", true)
    }

    /// Applications recommending the industry.
    pub fn industry_applications(store: Arc<dyn DocumentStore>) -> Self {
        Self::of::<Application>(
            store,
            "application.recommendedIndustries",
            "recommendedIndustries",
            true,
        )
    }

    /// Products of a brand.
    pub fn brand_products(store: Arc<dyn DocumentStore>) -> Self {
        Self::of::<Product>(store, "product.brand", "brand", false)
    }

    /// Products of a pump type.
    pub fn pump_type_products(store: Arc<dyn DocumentStore>) -> Self {
        Self::of::<Product>(store, "product.pumpType", "pumpType", false)
    }

    pub fn filter(&self, target: &DocumentId) -> Filter {
        if self.many {
            Filter::contains(self.source_field, target)
        } else {
            Filter::eq(self.source_field, target)
        }
    }
}

impl BackReferences for QueriedBackReferences {
    fn add_back_reference(
        &self,
        target: &DocumentId,
        _source: &DocumentId,
    ) -> Result<bool, CatalogError> {
        log::trace!("{}: {target} is derived by query; nothing to add", self.relation);
        Ok(false)
    }

    fn remove_back_reference(
        &self,
        target: &DocumentId,
        _source: &DocumentId,
    ) -> Result<bool, CatalogError> {
        log::trace!("{}: {target} is derived by query; nothing to remove", self.relation);
        Ok(false)
    }

    fn count_references(&self, target: &DocumentId) -> Result<u64, CatalogError> {
        Ok(self.store.count(self.source_collection, &self.filter(target))?)
    }

    fn referencing_names(&self, target: &DocumentId) -> Result<Vec<String>, CatalogError> {
        Ok(self
            .store
            .find_projected(
                self.source_collection,
                &self.filter(target),
                &[self.source_name_field],
            )?
            .iter()
            .filter_map(|doc| doc.get(self.source_name_field)?.as_str().map(str::to_string))
            .collect())
    }

    fn source_label(&self) -> &'static str {
        self.source_label
    }
}
