//! Test support: catalog fixtures and a store with injectable failures.
//!
//! Used by the crate's integration tests; panics on setup errors.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::executor::DbError;
use crate::model::{
    Application, Brand, BusinessType, Customer, CustomerInput, DocumentId, Entity, Industry,
    Product, ProductLine, PumpType, SubPumpType,
};
use crate::store::{Document, DocumentStore, Filter, MemoryStore, StoreError, Update};

/// A catalog over a fresh store, with seeding shortcuts.
pub struct CatalogFixture {
    pub catalog: Catalog,
}

impl Default for CatalogFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogFixture {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            catalog: Catalog::new(store),
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        self.catalog.store()
    }

    /// Brand with product lines given as `(id, name)`.
    pub fn brand(&self, name: &str, lines: &[(&str, &str)]) -> Brand {
        let brand = lines.iter().enumerate().fold(Brand::new(name), |brand, (i, (id, line))| {
            brand.with_product_line(
                ProductLine::new(line)
                    .with_id(*id)
                    .with_display_order(i as i32),
            )
        });
        self.catalog.create_brand(brand).expect("seed brand")
    }

    /// Pump type with sub-types given as `(id, name)`.
    pub fn pump_type(&self, name: &str, subs: &[(&str, &str)]) -> PumpType {
        let pump_type = subs.iter().enumerate().fold(PumpType::new(name), |pt, (i, (id, sub))| {
            pt.with_sub_pump_type(
                SubPumpType::new(sub)
                    .with_id(*id)
                    .with_display_order(i as i32),
            )
        });
        self.catalog.create_pump_type(pump_type).expect("seed pump type")
    }

    pub fn product(&self, product: Product) -> Product {
        self.catalog.create_product(product).expect("seed product")
    }

    pub fn brand_product(&self, name: &str, brand: &DocumentId, line: Option<&str>) -> Product {
        self.product(Product::new(name).with_brand(brand.clone(), line))
    }

    pub fn pump_type_product(&self, name: &str, pump_type: &DocumentId, sub: Option<&str>) -> Product {
        self.product(Product::new(name).with_pump_type(pump_type.clone(), sub))
    }

    pub fn business_type(&self, name: &str) -> BusinessType {
        self.catalog
            .create_business_type(BusinessType::new(name))
            .expect("seed business type")
    }

    pub fn industry(&self, name: &str) -> Industry {
        self.catalog
            .create_industry(Industry::new(name))
            .expect("seed industry")
    }

    pub fn application(&self, name: &str, industries: &[&DocumentId]) -> Application {
        let application = industries
            .iter()
            .fold(Application::new(name), |app, id| app.with_industry((*id).clone()));
        self.catalog
            .create_application(application)
            .expect("seed application")
    }

    /// Customer created through the customer operations.
    pub fn customer(&self, name: &str, business_type: &DocumentId, industries: &[&DocumentId]) -> Customer {
        let input = CustomerInput::new(name, business_type.clone())
            .with_industries(industries.iter().map(|id| (*id).clone()).collect());
        self.catalog.create_customer(input).expect("seed customer")
    }

    /// Current stored state of an entity.
    pub fn reload<T: Entity>(&self, id: &DocumentId) -> T {
        self.catalog
            .repository::<T>()
            .get(id)
            .expect("reload entity")
    }

    /// Drop a field from every document of a collection.
    pub fn strip_field(&self, collection: &str, field: &str) {
        for mut doc in self.store().find(collection, &Filter::All).expect("scan") {
            doc.remove(field);
            let id = crate::store::document_id(&doc).expect("stored id");
            self.store().replace(collection, &id, doc).expect("strip field");
        }
    }
}

/// Store wrapper whose writes start failing after a budget is spent.
pub struct FlakyStore {
    inner: Arc<dyn DocumentStore>,
    writes_left: AtomicUsize,
}

impl FlakyStore {
    /// Allow `writes` successful writes, then fail every later one.
    pub fn new(inner: Arc<dyn DocumentStore>, writes: usize) -> Self {
        Self {
            inner,
            writes_left: AtomicUsize::new(writes),
        }
    }

    fn spend(&self) -> Result<(), StoreError> {
        self.writes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map(|_| ())
            .map_err(|_| StoreError::Backend(DbError::Other("connection reset".to_string())))
    }
}

impl DocumentStore for FlakyStore {
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        self.inner.find(collection, filter)
    }

    fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.inner.count(collection, filter)
    }

    fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        self.spend()?;
        self.inner.insert(collection, document)
    }

    fn replace(
        &self,
        collection: &str,
        id: &DocumentId,
        document: Document,
    ) -> Result<bool, StoreError> {
        self.spend()?;
        self.inner.replace(collection, id, document)
    }

    fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, StoreError> {
        self.spend()?;
        self.inner.update_many(collection, filter, update)
    }

    fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError> {
        self.spend()?;
        self.inner.delete(collection, id)
    }
}
