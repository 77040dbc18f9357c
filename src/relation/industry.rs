use chrono::Utc;
use std::sync::Arc;

use crate::error::CatalogError;
use crate::model::{Industry, IndustryStats};
use crate::repository::Repository;
use crate::store::{DocumentStore, Filter, StoreError, Update};

use super::backref::{BackReferences, QueriedBackReferences};

/// Recompute `stats` on every industry from live customer and application
/// counts. Returns how many industries were refreshed.
///
/// Only the `stats` field is written, without schema validation.
pub fn refresh_industry_stats(store: &Arc<dyn DocumentStore>) -> Result<usize, CatalogError> {
    let industries = Repository::<Industry>::new(Arc::clone(store));
    let customers = QueriedBackReferences::industry_customers(Arc::clone(store));
    let applications = QueriedBackReferences::industry_applications(Arc::clone(store));

    let mut refreshed = 0;
    for (id, name) in industries.names(&Filter::All)? {
        let stats = IndustryStats {
            customer_count: customers.count_references(&id)?,
            application_count: applications.count_references(&id)?,
            refreshed_at: Some(Utc::now()),
        };
        let value = serde_json::to_value(&stats).map_err(StoreError::from)?;
        industries.update_raw(&Filter::id(&id), &Update::set("stats", value))?;
        log::debug!(
            "Industry {name}: {} customers, {} applications",
            stats.customer_count,
            stats.application_count
        );
        refreshed += 1;
    }
    log::info!("Refreshed stats for {refreshed} industries");
    Ok(refreshed)
}
