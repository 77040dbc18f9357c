//! Customer writes and the `BusinessType.customerIds` back-pointers.

use serde_json::json;
use vacuflow::model::{BusinessType, Customer, CustomerInput, DocumentId};
use vacuflow::test_helpers::CatalogFixture;
use vacuflow::CatalogError;

fn input_for(customer: &Customer, business_type: &DocumentId) -> CustomerInput {
    let mut input = CustomerInput::new(&customer.name, business_type.clone());
    input.slug = Some(customer.slug.clone());
    input.industry = customer.industry.clone();
    input
}

#[test]
fn test_create_registers_on_business_type() {
    let fx = CatalogFixture::new();
    let pharma = fx.business_type("Pharmaceutical");
    let acme = fx.customer("Acme Pharma", &pharma.id, &[]);

    let pharma: BusinessType = fx.reload(&pharma.id);
    assert_eq!(pharma.customer_ids, vec![acme.id.clone()]);
    assert_eq!(acme.slug, "acme-pharma");
}

#[test]
fn test_create_rejects_duplicate_slug() {
    let fx = CatalogFixture::new();
    let pharma = fx.business_type("Pharmaceutical");
    fx.customer("Acme", &pharma.id, &[]);

    let err = fx
        .catalog
        .create_customer(CustomerInput::new("ACME", pharma.id.clone()))
        .unwrap_err();
    assert!(matches!(err, CatalogError::Duplicate { ref field, .. } if field == "slug"));
    let pharma: BusinessType = fx.reload(&pharma.id);
    assert_eq!(pharma.customer_ids.len(), 1);
}

#[test]
fn test_create_from_json_body() {
    let fx = CatalogFixture::new();
    let food = fx.business_type("Food & Beverage");
    let input = CustomerInput::from_json(json!({
        "name": "Globex Foods",
        "businessType": food.id.as_str(),
        "customerStatus": "active",
        "customerTier": "strategic"
    }))
    .unwrap();
    let customer = fx.catalog.create_customer(input).unwrap();
    assert_eq!(customer.customer_tier.to_string(), "strategic");
    assert_eq!(fx.reload::<BusinessType>(&food.id).customer_ids, vec![customer.id]);
}

#[test]
fn test_update_moves_back_pointer() {
    let fx = CatalogFixture::new();
    let a = fx.business_type("Pharmaceutical");
    let b = fx.business_type("Chemical");
    let c = fx.customer("Acme", &a.id, &[]);

    let updated = fx.catalog.update_customer(&c.id, input_for(&c, &b.id)).unwrap();
    assert_eq!(updated.business_type, b.id);

    let a: BusinessType = fx.reload(&a.id);
    let b_stored: BusinessType = fx.reload(&b.id);
    assert!(!a.customer_ids.contains(&c.id));
    assert_eq!(b_stored.customer_ids, vec![c.id.clone()]);

    // same target again: still exactly once
    fx.catalog.update_customer(&c.id, input_for(&c, &b.id)).unwrap();
    let b_stored: BusinessType = fx.reload(&b.id);
    assert_eq!(b_stored.customer_ids, vec![c.id.clone()]);
    assert_eq!(fx.reload::<Customer>(&c.id).business_type, b.id);
}

#[test]
fn test_update_with_colliding_slug_leaves_business_types_untouched() {
    let fx = CatalogFixture::new();
    let a = fx.business_type("Pharmaceutical");
    let b = fx.business_type("Chemical");
    let acme = fx.customer("Acme", &a.id, &[]);
    let globex = fx.customer("Globex", &a.id, &[]);

    let mut input = input_for(&globex, &b.id);
    input.slug = Some(acme.slug.clone());
    let err = fx.catalog.update_customer(&globex.id, input).unwrap_err();
    assert!(matches!(err, CatalogError::Duplicate { .. }));

    let a: BusinessType = fx.reload(&a.id);
    let b: BusinessType = fx.reload(&b.id);
    assert_eq!(a.customer_ids, vec![acme.id, globex.id.clone()]);
    assert!(b.customer_ids.is_empty());
    assert_eq!(fx.reload::<Customer>(&globex.id).slug, "globex");
}

#[test]
fn test_update_with_invalid_input_changes_nothing() {
    let fx = CatalogFixture::new();
    let a = fx.business_type("Pharmaceutical");
    let b = fx.business_type("Chemical");
    let c = fx.customer("Acme", &a.id, &[]);

    let mut input = input_for(&c, &b.id);
    input.name.clear();
    input.slug = Some("acme".into());
    assert!(matches!(
        fx.catalog.update_customer(&c.id, input),
        Err(CatalogError::Validation(_))
    ));
    assert_eq!(fx.reload::<BusinessType>(&a.id).customer_ids, vec![c.id]);
    assert!(fx.reload::<BusinessType>(&b.id).customer_ids.is_empty());
}

#[test]
fn test_update_to_missing_business_type_is_silent() {
    let fx = CatalogFixture::new();
    let a = fx.business_type("Pharmaceutical");
    let c = fx.customer("Acme", &a.id, &[]);
    let ghost = DocumentId::from("no-such-type");

    let updated = fx.catalog.update_customer(&c.id, input_for(&c, &ghost)).unwrap();
    assert_eq!(updated.business_type, ghost);
    assert!(fx.reload::<BusinessType>(&a.id).customer_ids.is_empty());
}

#[test]
fn test_update_unknown_customer_is_not_found() {
    let fx = CatalogFixture::new();
    let a = fx.business_type("Pharmaceutical");
    let err = fx
        .catalog
        .update_customer(&DocumentId::from("c404"), CustomerInput::new("Nobody", a.id.clone()))
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
}

#[test]
fn test_delete_pulls_back_pointer() {
    let fx = CatalogFixture::new();
    let a = fx.business_type("Pharmaceutical");
    let acme = fx.customer("Acme", &a.id, &[]);
    let globex = fx.customer("Globex", &a.id, &[]);

    let deleted = fx.catalog.delete_customer(&acme.id).unwrap();
    assert_eq!(deleted.name, "Acme");
    assert_eq!(deleted.collection, "customers");
    assert_eq!(fx.reload::<BusinessType>(&a.id).customer_ids, vec![globex.id]);
    assert!(fx
        .catalog
        .repository::<Customer>()
        .find_by_id(&acme.id)
        .unwrap()
        .is_none());
}

#[test]
fn test_delete_missing_customer_touches_nothing() {
    let fx = CatalogFixture::new();
    let a = fx.business_type("Pharmaceutical");
    let acme = fx.customer("Acme", &a.id, &[]);

    let err = fx.catalog.delete_customer(&DocumentId::from("c404")).unwrap_err();
    assert!(matches!(err, CatalogError::NotFound { .. }));
    assert_eq!(fx.reload::<BusinessType>(&a.id).customer_ids, vec![acme.id]);
}

#[test]
fn test_concurrent_creates_all_register() {
    let fx = CatalogFixture::new();
    let pharma = fx.business_type("Pharmaceutical");

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let catalog = fx.catalog.clone();
            let business_type = pharma.id.clone();
            may::go!(move || {
                catalog
                    .create_customer(CustomerInput::new(&format!("Customer {i}"), business_type))
                    .map(|c| c.id)
            })
        })
        .collect();
    let mut created: Vec<DocumentId> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();

    let mut stored = fx.reload::<BusinessType>(&pharma.id).customer_ids;
    created.sort();
    stored.sort();
    assert_eq!(stored, created);
}
