//! Usage index maintenance.
//!
//! Brands and pump types carry denormalized lists of the products that
//! reference them (`productUsage`) and of the products on each of their
//! sub-documents (`productLineUsage` / `subPumpTypeUsage`). The lists are a
//! cache: [`UsageSync`] rebuilds them from the product collection, one
//! parent at a time, and running it again with unchanged products writes
//! identical values.
//!
//! A failure while processing a parent stops the run. Parents already
//! written keep their new values; rerunning the sync is the recovery.

mod rebuild;

pub use rebuild::{rebuild_usage, ProductRef, UsageIndex};

use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

use crate::error::CatalogError;
use crate::model::{Brand, DocumentId, Entity, Product, PumpType};
use crate::repository::Repository;
use crate::store::{DocumentStore, Filter, Update};

/// Field holding the names of every referencing product.
pub const PRODUCT_USAGE_FIELD: &str = "productUsage";

/// A parent entity whose usage fields are derived from products.
pub trait UsageParent: Entity {
    /// Product field holding the parent id.
    const PRODUCT_FIELD: &'static str;
    /// Product field holding the sub-document id.
    const SUB_FIELD: &'static str;
    /// Parent field holding the per-sub-document usage map.
    const SUB_USAGE_FIELD: &'static str;
    /// Plural label for reports.
    const PLURAL: &'static str;

    fn declared_sub_ids(&self) -> Vec<&str>;
}

impl UsageParent for PumpType {
    const PRODUCT_FIELD: &'static str = "pumpType";
    const SUB_FIELD: &'static str = "subPumpType";
    const SUB_USAGE_FIELD: &'static str = "subPumpTypeUsage";
    const PLURAL: &'static str = "pump types";

    fn declared_sub_ids(&self) -> Vec<&str> {
        self.sub_pump_types.iter().map(|s| s.id.as_str()).collect()
    }
}

impl UsageParent for Brand {
    const PRODUCT_FIELD: &'static str = "brand";
    const SUB_FIELD: &'static str = "productLineId";
    const SUB_USAGE_FIELD: &'static str = "productLineUsage";
    const PLURAL: &'static str = "brands";

    fn declared_sub_ids(&self) -> Vec<&str> {
        self.product_lines.iter().map(|l| l.id.as_str()).collect()
    }
}

/// Overwrite only the derived fields; everything else on the parent is
/// left as currently stored.
fn usage_update<P: UsageParent>(index: UsageIndex) -> Update {
    let sub_usage: Map<String, Value> = index
        .sub_usage
        .into_iter()
        .map(|(sub_id, names)| (sub_id, Value::from(names)))
        .collect();
    Update::Set(vec![
        (PRODUCT_USAGE_FIELD.to_string(), Value::from(index.product_usage)),
        (P::SUB_USAGE_FIELD.to_string(), Value::Object(sub_usage)),
    ])
}

/// Outcome of a sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub success: bool,
    pub message: String,
    /// Parent documents synced.
    #[serde(skip)]
    pub parents: usize,
    /// Product references counted across those parents.
    #[serde(skip)]
    pub product_refs: usize,
}

impl SyncReport {
    fn new(plural: &str, parents: usize, product_refs: usize) -> Self {
        Self {
            success: true,
            message: format!("Synced usage for {parents} {plural} ({product_refs} product references)"),
            parents,
            product_refs,
        }
    }
}

/// Rebuilds brand and pump type usage fields from the product collection.
#[derive(Clone)]
pub struct UsageSync {
    store: Arc<dyn DocumentStore>,
}

impl UsageSync {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Rebuild `productUsage` and `subPumpTypeUsage` on every pump type.
    pub fn sync_pump_type_usage(&self) -> Result<SyncReport, CatalogError> {
        self.sync_all_of::<PumpType>()
    }

    /// Rebuild `productUsage` and `productLineUsage` on every brand.
    pub fn sync_brand_usage(&self) -> Result<SyncReport, CatalogError> {
        self.sync_all_of::<Brand>()
    }

    /// Pump types, then brands. The first error aborts and is returned.
    pub fn sync_all_usage(&self) -> Result<SyncReport, CatalogError> {
        let pump_types = self.sync_pump_type_usage()?;
        let brands = self.sync_brand_usage()?;
        Ok(SyncReport {
            success: true,
            message: format!("{}; {}", pump_types.message, brands.message),
            parents: pump_types.parents + brands.parents,
            product_refs: pump_types.product_refs + brands.product_refs,
        })
    }

    /// Rebuild a single brand.
    pub fn sync_brand(&self, id: &DocumentId) -> Result<SyncReport, CatalogError> {
        self.sync_one_of::<Brand>(id)
    }

    /// Rebuild a single pump type.
    pub fn sync_pump_type(&self, id: &DocumentId) -> Result<SyncReport, CatalogError> {
        self.sync_one_of::<PumpType>(id)
    }

    fn sync_all_of<P: UsageParent>(&self) -> Result<SyncReport, CatalogError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::usage_sync_span(P::COLLECTION).entered();

        log::info!("Syncing usage for {}", P::PLURAL);
        let parents = Repository::<P>::new(Arc::clone(&self.store)).find_all()?;

        let mut written = 0;
        let mut product_refs = 0;
        for parent in parents {
            match self.sync_parent(parent) {
                Ok(Some(count)) => {
                    written += 1;
                    product_refs += count;
                }
                Ok(None) => {}
                Err(e) => {
                    log::error!(
                        "Usage sync for {} aborted after {written} documents: {e}",
                        P::PLURAL
                    );
                    return Err(e);
                }
            }
        }

        let report = SyncReport::new(P::PLURAL, written, product_refs);
        log::info!("{}", report.message);
        Ok(report)
    }

    fn sync_one_of<P: UsageParent>(&self, id: &DocumentId) -> Result<SyncReport, CatalogError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::usage_sync_span(P::COLLECTION).entered();

        let parent = Repository::<P>::new(Arc::clone(&self.store)).get(id)?;
        let product_refs = self
            .sync_parent(parent)?
            .ok_or_else(|| CatalogError::not_found(P::COLLECTION, id))?;
        Ok(SyncReport::new(P::LABEL, 1, product_refs))
    }

    /// Rebuild and persist one parent. `None` when it vanished mid-run.
    ///
    /// `parent` is only read for its id and declared sub-documents; the
    /// write touches the usage fields alone.
    fn sync_parent<P: UsageParent>(&self, parent: P) -> Result<Option<usize>, CatalogError> {
        let products = self
            .store
            .find_projected(
                Product::COLLECTION,
                &Filter::eq(P::PRODUCT_FIELD, parent.id()),
                &["name", P::SUB_FIELD],
            )?
            .iter()
            .map(|doc| ProductRef::from_projection(doc, P::SUB_FIELD))
            .collect::<Vec<_>>();

        let index = rebuild_usage(parent.declared_sub_ids(), &products);

        let by_id = Filter::id(parent.id());
        let repo = Repository::<P>::new(Arc::clone(&self.store));
        // zero modified is either unchanged usage or a deleted parent
        if repo.update_raw(&by_id, &usage_update::<P>(index))? == 0
            && self.store.count(P::COLLECTION, &by_id)? == 0
        {
            log::warn!(
                "{} {} was deleted during usage sync; skipped",
                P::LABEL,
                parent.id()
            );
            return Ok(None);
        }

        #[cfg(feature = "metrics")]
        METRICS.record_usage_write(P::COLLECTION);

        log::debug!(
            "{} {} now used by {} products",
            P::LABEL,
            parent.display_name(),
            products.len()
        );
        Ok(Some(products.len()))
    }
}
