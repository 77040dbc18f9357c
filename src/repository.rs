//! Typed collection access.
//!
//! [`Repository`] wraps the shared [`DocumentStore`] handle for one entity
//! type: it converts documents to entities, runs schema validation on the
//! validated write paths and maps store errors into [`CatalogError`].

use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::CatalogError;
use crate::model::{DocumentId, Entity};
use crate::store::{document_id, DocumentStore, Filter, Update};

pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn find(&self, filter: &Filter) -> Result<Vec<T>, CatalogError> {
        self.store
            .find(T::COLLECTION, filter)?
            .into_iter()
            .map(|doc| T::from_document(doc).map_err(CatalogError::from))
            .collect()
    }

    pub fn find_all(&self) -> Result<Vec<T>, CatalogError> {
        self.find(&Filter::All)
    }

    pub fn find_one(&self, filter: &Filter) -> Result<Option<T>, CatalogError> {
        self.store
            .find_one(T::COLLECTION, filter)?
            .map(T::from_document)
            .transpose()
            .map_err(CatalogError::from)
    }

    pub fn find_by_id(&self, id: &DocumentId) -> Result<Option<T>, CatalogError> {
        self.find_one(&Filter::id(id))
    }

    /// Like [`Repository::find_by_id`], with a missing document as [`CatalogError::NotFound`].
    pub fn get(&self, id: &DocumentId) -> Result<T, CatalogError> {
        self.find_by_id(id)?
            .ok_or_else(|| CatalogError::not_found(T::COLLECTION, id))
    }

    pub fn count(&self, filter: &Filter) -> Result<u64, CatalogError> {
        Ok(self.store.count(T::COLLECTION, filter)?)
    }

    /// `(id, display name)` of every match, in natural order, without
    /// loading whole documents.
    pub fn names(&self, filter: &Filter) -> Result<Vec<(DocumentId, String)>, CatalogError> {
        let docs = self
            .store
            .find_projected(T::COLLECTION, filter, &[T::NAME_FIELD])?;
        docs.iter()
            .map(|doc| {
                let name = doc
                    .get(T::NAME_FIELD)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                Ok((document_id(doc)?, name))
            })
            .collect()
    }

    /// Validate and insert a new entity.
    pub fn insert(&self, entity: &T) -> Result<(), CatalogError> {
        entity.validate()?;
        self.store.insert(T::COLLECTION, entity.to_document()?)?;
        Ok(())
    }

    /// Validate and overwrite; `Ok(false)` if the document no longer exists.
    pub fn replace(&self, entity: &T) -> Result<bool, CatalogError> {
        entity.validate()?;
        Ok(self
            .store
            .replace(T::COLLECTION, entity.id(), entity.to_document()?)?)
    }

    /// Validate and overwrite an existing entity.
    pub fn save(&self, entity: &T) -> Result<(), CatalogError> {
        if self.replace(entity)? {
            Ok(())
        } else {
            Err(CatalogError::not_found(T::COLLECTION, entity.id()))
        }
    }

    /// Apply a field-level update without schema validation.
    pub fn update_raw(&self, filter: &Filter, update: &Update) -> Result<u64, CatalogError> {
        Ok(self.store.update_many(T::COLLECTION, filter, update)?)
    }

    pub fn delete(&self, id: &DocumentId) -> Result<bool, CatalogError> {
        Ok(self.store.delete(T::COLLECTION, id)?)
    }

    /// Fail with [`CatalogError::Duplicate`] if another document has `field == value`.
    pub fn ensure_unique(
        &self,
        field: &str,
        value: &str,
        except: Option<&DocumentId>,
    ) -> Result<(), CatalogError> {
        let taken = self
            .store
            .find_projected(T::COLLECTION, &Filter::eq(field, value), &[])?
            .iter()
            .any(|doc| not_excepted(doc, except));
        if taken {
            return Err(duplicate::<T>(field, value));
        }
        Ok(())
    }

    /// Case-insensitive variant of [`Repository::ensure_unique`].
    ///
    /// Scans the projected field of the whole collection, which is fine
    /// at catalog sizes.
    pub fn ensure_unique_ignore_case(
        &self,
        field: &str,
        value: &str,
        except: Option<&DocumentId>,
    ) -> Result<(), CatalogError> {
        let wanted = value.to_lowercase();
        let taken = self
            .store
            .find_projected(T::COLLECTION, &Filter::All, &[field])?
            .iter()
            .filter(|doc| not_excepted(doc, except))
            .any(|doc| {
                doc.get(field)
                    .and_then(Value::as_str)
                    .is_some_and(|existing| existing.to_lowercase() == wanted)
            });
        if taken {
            return Err(duplicate::<T>(field, value));
        }
        Ok(())
    }
}

fn not_excepted(doc: &crate::store::Document, except: Option<&DocumentId>) -> bool {
    match except {
        None => true,
        Some(id) => document_id(doc).map_or(true, |found| &found != id),
    }
}

fn duplicate<T: Entity>(field: &str, value: &str) -> CatalogError {
    CatalogError::Duplicate {
        collection: T::COLLECTION.to_string(),
        field: field.to_string(),
        value: value.to_string(),
    }
}
