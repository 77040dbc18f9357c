use std::sync::Arc;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

use crate::error::{CatalogError, DeleteConflict, Deleted};
use crate::model::{Application, Brand, BusinessType, DocumentId, Entity, Industry, PumpType};
use crate::repository::Repository;
use crate::store::{DocumentStore, Filter, Update};

use super::backref::{BackReferences, QueriedBackReferences, StoredBackReferences};

/// Deletes that are refused while other documents still point at the target.
///
/// Business types are guarded by their stored `customerIds`; industries,
/// brands and pump types by a live count of the referencing documents.
/// The usage index is not consulted: it may be stale until the next sync.
#[derive(Clone)]
pub struct DeleteGuards {
    store: Arc<dyn DocumentStore>,
}

impl DeleteGuards {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn delete_business_type(&self, id: &DocumentId) -> Result<Deleted, CatalogError> {
        let refs = StoredBackReferences::business_type_customers(Arc::clone(&self.store));
        self.guarded_delete::<BusinessType>(id, &refs)
    }

    /// Refused while any customer lists the industry. After a delete the id
    /// is pulled from every application's `recommendedIndustries`.
    pub fn delete_industry(&self, id: &DocumentId) -> Result<Deleted, CatalogError> {
        let refs = QueriedBackReferences::industry_customers(Arc::clone(&self.store));
        let deleted = self.guarded_delete::<Industry>(id, &refs)?;

        let cleaned = Repository::<Application>::new(Arc::clone(&self.store)).update_raw(
            &Filter::contains("recommendedIndustries", id),
            &Update::pull("recommendedIndustries", id),
        )?;
        if cleaned > 0 {
            log::info!("Removed industry {id} from {cleaned} applications");
        }
        Ok(deleted)
    }

    pub fn delete_brand(&self, id: &DocumentId) -> Result<Deleted, CatalogError> {
        let refs = QueriedBackReferences::brand_products(Arc::clone(&self.store));
        self.guarded_delete::<Brand>(id, &refs)
    }

    pub fn delete_pump_type(&self, id: &DocumentId) -> Result<Deleted, CatalogError> {
        let refs = QueriedBackReferences::pump_type_products(Arc::clone(&self.store));
        self.guarded_delete::<PumpType>(id, &refs)
    }

    fn guarded_delete<T: Entity>(
        &self,
        id: &DocumentId,
        refs: &dyn BackReferences,
    ) -> Result<Deleted, CatalogError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::relation_span("guarded_delete", id.as_str()).entered();

        let repo = Repository::<T>::new(Arc::clone(&self.store));
        let target = repo.get(id)?;

        let count = refs.count_references(id)?;
        if count > 0 {
            let conflict = DeleteConflict {
                entity: T::LABEL.to_string(),
                id: id.clone(),
                name: target.display_name().to_string(),
                referenced_by: refs.source_label().to_string(),
                count,
                names: refs.referencing_names(id)?,
            };
            log::warn!("{conflict}");
            #[cfg(feature = "metrics")]
            METRICS.record_blocked_delete(T::COLLECTION);
            return Err(conflict.into());
        }

        if !repo.delete(id)? {
            return Err(CatalogError::not_found(T::COLLECTION, id));
        }
        log::info!("Deleted {} {} ({id})", T::LABEL, target.display_name());
        Ok(Deleted {
            collection: T::COLLECTION.to_string(),
            id: id.clone(),
            name: target.display_name().to_string(),
        })
    }
}
