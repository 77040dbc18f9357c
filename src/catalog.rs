//! Admin facade over the catalog operations.

use std::sync::Arc;

use crate::config::CatalogConfig;
use crate::connection::connect;
use crate::error::{CatalogError, Deleted};
use crate::executor::MayPostgresExecutor;
use crate::model::{
    Application, Brand, BusinessType, Customer, CustomerInput, DocumentId, Entity, Industry,
    Product, PumpType, SubDocument,
};
use crate::relation::{refresh_industry_stats, CustomerService, DeleteGuards};
use crate::repository::Repository;
use crate::store::{DocumentStore, MemoryStore, PgDocumentStore};
use crate::usage::{SyncReport, UsageSync};

/// Entry point for everything the admin back-office does to the catalog.
///
/// Cheap to clone; all clones share one store handle.
///
/// # Examples
///
/// ```no_run
/// use vacuflow::{Catalog, CatalogConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CatalogConfig::load()?;
/// let catalog = Catalog::connect(&config)?;
/// let report = catalog.sync_all_usage()?;
/// println!("{}", report.message);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn DocumentStore>,
    usage: UsageSync,
    customers: CustomerService,
    guards: DeleteGuards,
}

impl Catalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            usage: UsageSync::new(Arc::clone(&store)),
            customers: CustomerService::new(Arc::clone(&store)),
            guards: DeleteGuards::new(Arc::clone(&store)),
            store,
        }
    }

    /// Catalog backed by a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Connect to PostgreSQL, creating the documents table when
    /// `database.bootstrap_schema` is set.
    pub fn connect(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = connect(&config.database.url)?;
        let store = PgDocumentStore::new(MayPostgresExecutor::new(client));
        if config.database.bootstrap_schema {
            store.ensure_schema()?;
        }
        log::info!("Catalog connected");
        Ok(Self::new(Arc::new(store)))
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn repository<T: Entity>(&self) -> Repository<T> {
        Repository::new(Arc::clone(&self.store))
    }

    // Usage index

    pub fn sync_all_usage(&self) -> Result<SyncReport, CatalogError> {
        self.usage.sync_all_usage()
    }

    pub fn sync_pump_type_usage(&self) -> Result<SyncReport, CatalogError> {
        self.usage.sync_pump_type_usage()
    }

    pub fn sync_brand_usage(&self) -> Result<SyncReport, CatalogError> {
        self.usage.sync_brand_usage()
    }

    pub fn sync_brand(&self, id: &DocumentId) -> Result<SyncReport, CatalogError> {
        self.usage.sync_brand(id)
    }

    pub fn sync_pump_type(&self, id: &DocumentId) -> Result<SyncReport, CatalogError> {
        self.usage.sync_pump_type(id)
    }

    // Customers

    pub fn create_customer(&self, input: CustomerInput) -> Result<Customer, CatalogError> {
        self.customers.create(input)
    }

    pub fn update_customer(
        &self,
        id: &DocumentId,
        input: CustomerInput,
    ) -> Result<Customer, CatalogError> {
        self.customers.update(id, input)
    }

    pub fn delete_customer(&self, id: &DocumentId) -> Result<Deleted, CatalogError> {
        self.customers.delete(id)
    }

    // Guarded deletes

    pub fn delete_business_type(&self, id: &DocumentId) -> Result<Deleted, CatalogError> {
        self.guards.delete_business_type(id)
    }

    pub fn delete_industry(&self, id: &DocumentId) -> Result<Deleted, CatalogError> {
        self.guards.delete_industry(id)
    }

    pub fn delete_brand(&self, id: &DocumentId) -> Result<Deleted, CatalogError> {
        self.guards.delete_brand(id)
    }

    pub fn delete_pump_type(&self, id: &DocumentId) -> Result<Deleted, CatalogError> {
        self.guards.delete_pump_type(id)
    }

    pub fn refresh_industry_stats(&self) -> Result<usize, CatalogError> {
        refresh_industry_stats(&self.store)
    }

    // Validated creation

    pub fn create_product(&self, product: Product) -> Result<Product, CatalogError> {
        let products = self.repository::<Product>();
        products.ensure_unique("slug", &product.slug, None)?;
        products.insert(&product)?;
        Ok(product)
    }

    pub fn create_brand(&self, mut brand: Brand) -> Result<Brand, CatalogError> {
        let brands = self.repository::<Brand>();
        brands.ensure_unique_ignore_case("name", &brand.name, None)?;
        brands.ensure_unique("slug", &brand.slug, None)?;
        assign_missing_ids(&mut brand.product_lines);
        brands.insert(&brand)?;
        Ok(brand)
    }

    pub fn create_pump_type(&self, mut pump_type: PumpType) -> Result<PumpType, CatalogError> {
        let pump_types = self.repository::<PumpType>();
        pump_types.ensure_unique("pumpType", &pump_type.pump_type, None)?;
        pump_types.ensure_unique("slug", &pump_type.slug, None)?;
        assign_missing_ids(&mut pump_type.sub_pump_types);
        pump_types.insert(&pump_type)?;
        Ok(pump_type)
    }

    pub fn create_business_type(&self, business_type: BusinessType) -> Result<BusinessType, CatalogError> {
        let business_types = self.repository::<BusinessType>();
        business_types.ensure_unique("name", &business_type.name, None)?;
        business_types.ensure_unique("slug", &business_type.slug, None)?;
        business_types.insert(&business_type)?;
        Ok(business_type)
    }

    pub fn create_industry(&self, industry: Industry) -> Result<Industry, CatalogError> {
        let industries = self.repository::<Industry>();
        industries.ensure_unique("name", &industry.name, None)?;
        industries.ensure_unique("slug", &industry.slug, None)?;
        industries.insert(&industry)?;
        Ok(industry)
    }

    pub fn create_application(&self, application: Application) -> Result<Application, CatalogError> {
        let applications = self.repository::<Application>();
        applications.ensure_unique("name", &application.name, None)?;
        applications.ensure_unique("slug", &application.slug, None)?;
        applications.insert(&application)?;
        Ok(application)
    }
}

fn assign_missing_ids(items: &mut [SubDocument]) {
    for item in items.iter_mut().filter(|i| i.id.as_str().is_empty()) {
        item.id = DocumentId::generate();
    }
}
