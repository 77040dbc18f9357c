use parking_lot::RwLock;
use std::collections::HashMap;

use super::{
    document_id, instrumented, Document, DocumentId, DocumentStore, Filter, StoreError, Update,
    ID_FIELD,
};

/// In-process document store.
///
/// Each collection is an insertion-ordered vector. Every trait call takes the
/// lock once, so single-document writes are atomic and nothing spans two
/// calls.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

impl DocumentStore for MemoryStore {
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        instrumented("find", collection, || {
            filter.validate()?;
            let collections = self.collections.read();
            Ok(collections
                .get(collection)
                .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
                .unwrap_or_default())
        })
    }

    fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        instrumented("count", collection, || {
            filter.validate()?;
            let collections = self.collections.read();
            Ok(collections
                .get(collection)
                .map_or(0, |docs| docs.iter().filter(|d| filter.matches(d)).count()) as u64)
        })
    }

    fn insert(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        instrumented("insert", collection, || {
            let id = document_id(&document)?;
            let mut collections = self.collections.write();
            let docs = collections.entry(collection.to_string()).or_default();
            if docs.iter().any(|d| d.get(ID_FIELD) == document.get(ID_FIELD)) {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    id: id.into_string(),
                });
            }
            docs.push(document);
            Ok(())
        })
    }

    fn replace(
        &self,
        collection: &str,
        id: &DocumentId,
        mut document: Document,
    ) -> Result<bool, StoreError> {
        instrumented("replace", collection, || {
            document.insert(ID_FIELD.to_string(), id.into());
            let filter = Filter::id(id);
            let mut collections = self.collections.write();
            let Some(docs) = collections.get_mut(collection) else {
                return Ok(false);
            };
            match docs.iter_mut().find(|d| filter.matches(d)) {
                Some(slot) => {
                    *slot = document;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
    ) -> Result<u64, StoreError> {
        instrumented("update_many", collection, || {
            filter.validate()?;
            update.validate()?;
            let mut collections = self.collections.write();
            let Some(docs) = collections.get_mut(collection) else {
                return Ok(0);
            };
            let mut modified = 0;
            for doc in docs.iter_mut().filter(|d| filter.matches(d)) {
                if update.apply(doc)? {
                    modified += 1;
                }
            }
            Ok(modified)
        })
    }

    fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool, StoreError> {
        instrumented("delete", collection, || {
            let filter = Filter::id(id);
            let mut collections = self.collections.write();
            let Some(docs) = collections.get_mut(collection) else {
                return Ok(false);
            };
            let before = docs.len();
            docs.retain(|d| !filter.matches(d));
            Ok(docs.len() != before)
        })
    }
}
