//! Deletes refused while references remain.

use vacuflow::model::{Application, Brand, BusinessType, Customer, DocumentId, Industry, PumpType};
use vacuflow::store::DocumentStore;
use vacuflow::test_helpers::CatalogFixture;
use vacuflow::{CatalogError, DeleteConflict};

fn conflict(err: CatalogError) -> DeleteConflict {
    match err {
        CatalogError::DeleteBlocked(conflict) => conflict,
        other => panic!("expected a blocked delete, got {other:?}"),
    }
}

#[test]
fn test_business_type_in_use_is_kept() {
    let fx = CatalogFixture::new();
    let pharma = fx.business_type("Pharmaceutical");
    let c1 = fx.customer("Acme Pharma", &pharma.id, &[]);

    let blocked = conflict(fx.catalog.delete_business_type(&pharma.id).unwrap_err());
    assert_eq!(blocked.count, 1);
    assert_eq!(blocked.names, vec!["Acme Pharma"]);
    assert_eq!(blocked.referenced_by, "customer");
    assert!(blocked.to_string().contains("Acme Pharma"));

    let stored: BusinessType = fx.reload(&pharma.id);
    assert_eq!(stored, BusinessType {
        customer_ids: vec![c1.id.clone()],
        ..pharma
    });
    assert_eq!(fx.reload::<Customer>(&c1.id), c1);
}

#[test]
fn test_business_type_deletable_once_customers_leave() {
    let fx = CatalogFixture::new();
    let pharma = fx.business_type("Pharmaceutical");
    let c1 = fx.customer("Acme Pharma", &pharma.id, &[]);
    fx.catalog.delete_customer(&c1.id).unwrap();

    let deleted = fx.catalog.delete_business_type(&pharma.id).unwrap();
    assert_eq!(deleted.name, "Pharmaceutical");
    assert!(fx
        .catalog
        .repository::<BusinessType>()
        .find_by_id(&pharma.id)
        .unwrap()
        .is_none());
}

#[test]
fn test_business_type_count_uses_stored_array() {
    let fx = CatalogFixture::new();
    let pharma = fx.business_type("Pharmaceutical");
    fx.catalog
        .repository::<BusinessType>()
        .update_raw(
            &vacuflow::store::Filter::id(&pharma.id),
            &vacuflow::store::Update::add_to_set("customerIds", "c-dangling"),
        )
        .unwrap();

    let blocked = conflict(fx.catalog.delete_business_type(&pharma.id).unwrap_err());
    assert_eq!(blocked.count, 1);
    assert!(blocked.names.is_empty());
}

#[test]
fn test_missing_business_type_is_not_found() {
    let fx = CatalogFixture::new();
    assert!(matches!(
        fx.catalog.delete_business_type(&DocumentId::from("bt404")),
        Err(CatalogError::NotFound { .. })
    ));
}

#[test]
fn test_industry_guard_counts_live_customers() {
    let fx = CatalogFixture::new();
    let pharma = fx.business_type("Pharmaceutical");
    let biotech = fx.industry("Biotech");
    let other = fx.industry("Semiconductor");
    fx.customer("Acme", &pharma.id, &[&biotech.id]);
    fx.customer("Globex", &pharma.id, &[&other.id, &biotech.id]);

    let blocked = conflict(fx.catalog.delete_industry(&biotech.id).unwrap_err());
    assert_eq!(blocked.count, 2);
    assert_eq!(blocked.names, vec!["Acme", "Globex"]);
    assert_eq!(fx.reload::<Industry>(&biotech.id).name, "Biotech");
}

#[test]
fn test_industry_delete_cleans_applications() {
    let fx = CatalogFixture::new();
    let biotech = fx.industry("Biotech");
    let food = fx.industry("Food");
    let drying = fx.application("Freeze Drying", &[&biotech.id, &food.id]);
    let packaging = fx.application("Packaging", &[&food.id]);

    fx.catalog.delete_industry(&biotech.id).unwrap();

    assert_eq!(
        fx.reload::<Application>(&drying.id).recommended_industries,
        vec![food.id.clone()]
    );
    assert_eq!(
        fx.reload::<Application>(&packaging.id).recommended_industries,
        vec![food.id]
    );
}

#[test]
fn test_brand_and_pump_type_guarded_by_products() {
    let fx = CatalogFixture::new();
    let busch = fx.brand("Busch", &[("L1", "Rotary Vane")]);
    let vane = fx.pump_type("Rotary Vane", &[]);
    let product = fx.product(
        vacuflow::model::Product::new("RV-100")
            .with_brand(busch.id.clone(), Some("L1"))
            .with_pump_type(vane.id.clone(), None),
    );

    let blocked = conflict(fx.catalog.delete_brand(&busch.id).unwrap_err());
    assert_eq!((blocked.count, blocked.names), (1, vec!["RV-100".to_string()]));
    let blocked = conflict(fx.catalog.delete_pump_type(&vane.id).unwrap_err());
    assert_eq!(blocked.referenced_by, "product");

    fx.catalog.store().delete("products", &product.id).unwrap();
    fx.catalog.delete_brand(&busch.id).unwrap();
    fx.catalog.delete_pump_type(&vane.id).unwrap();
    assert!(fx.catalog.repository::<Brand>().find_by_id(&busch.id).unwrap().is_none());
    assert!(fx.catalog.repository::<PumpType>().find_by_id(&vane.id).unwrap().is_none());
}

#[test]
fn test_industry_stats_snapshot() {
    let fx = CatalogFixture::new();
    let pharma = fx.business_type("Pharmaceutical");
    let biotech = fx.industry("Biotech");
    let food = fx.industry("Food");
    fx.customer("Acme", &pharma.id, &[&biotech.id]);
    fx.application("Freeze Drying", &[&biotech.id, &food.id]);

    assert_eq!(fx.catalog.refresh_industry_stats().unwrap(), 2);

    let biotech: Industry = fx.reload(&biotech.id);
    assert_eq!(biotech.stats.customer_count, 1);
    assert_eq!(biotech.stats.application_count, 1);
    assert!(biotech.stats.refreshed_at.is_some());
    let food: Industry = fx.reload(&food.id);
    assert_eq!(food.stats.customer_count, 0);
}
