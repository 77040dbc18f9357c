use std::sync::Arc;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

use crate::error::{CatalogError, Deleted};
use crate::model::{Customer, CustomerInput, DocumentId, Entity};
use crate::repository::Repository;
use crate::store::DocumentStore;

use super::backref::{BackReferences, StoredBackReferences};

/// Customer writes that keep `BusinessType.customerIds` in step.
///
/// Every check that can reject the request runs before the first
/// back-pointer edit. Each `customerIds` edit is a single atomic
/// add-to-set or pull, so writes for different customers never clobber each
/// other. There is no transaction across documents: two concurrent updates
/// of the same customer to different business types can leave its id on
/// both.
#[derive(Clone)]
pub struct CustomerService {
    customers: Repository<Customer>,
    business_types: StoredBackReferences,
}

impl CustomerService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            customers: Repository::new(Arc::clone(&store)),
            business_types: StoredBackReferences::business_type_customers(store),
        }
    }

    /// Insert a customer and register it on its business type.
    ///
    /// A business type id that does not resolve is stored as given; the
    /// back-pointer edit then matches nothing.
    pub fn create(&self, input: CustomerInput) -> Result<Customer, CatalogError> {
        let customer = input.into_customer(DocumentId::generate())?;

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::relation_span("customer.create", customer.id.as_str()).entered();

        self.customers.ensure_unique("slug", &customer.slug, None)?;
        self.customers.insert(&customer)?;
        self.business_types
            .add_back_reference(&customer.business_type, &customer.id)?;

        log::info!("Created customer {} ({})", customer.name, customer.id);
        Ok(customer)
    }

    /// Replace a customer's writable fields, moving its back-pointer when
    /// the business type changes.
    pub fn update(&self, id: &DocumentId, input: CustomerInput) -> Result<Customer, CatalogError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::relation_span("customer.update", id.as_str()).entered();

        let current = self.customers.get(id)?;
        let updated = input.into_customer(id.clone())?;
        self.customers.ensure_unique("slug", &updated.slug, Some(id))?;

        if current.business_type != updated.business_type {
            self.business_types
                .remove_back_reference(&current.business_type, id)?;
            self.business_types
                .add_back_reference(&updated.business_type, id)?;
            log::info!(
                "Moved customer {id} from business type {} to {}",
                current.business_type,
                updated.business_type
            );
        }

        self.customers.save(&updated)?;
        Ok(updated)
    }

    /// Remove a customer and its back-pointer.
    pub fn delete(&self, id: &DocumentId) -> Result<Deleted, CatalogError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::relation_span("customer.delete", id.as_str()).entered();

        let current = self.customers.get(id)?;
        self.business_types
            .remove_back_reference(&current.business_type, id)?;
        if !self.customers.delete(id)? {
            return Err(CatalogError::not_found(Customer::COLLECTION, id));
        }

        log::info!("Deleted customer {} ({id})", current.name);
        Ok(Deleted {
            collection: Customer::COLLECTION.to_string(),
            id: id.clone(),
            name: current.name,
        })
    }

    pub fn get(&self, id: &DocumentId) -> Result<Customer, CatalogError> {
        self.customers.get(id)
    }
}
