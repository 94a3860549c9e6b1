//! In-memory document store.

use std::collections::HashMap;

use mdl_core::{EmbeddedDocument, MdlError, Result};

use crate::store::{colliding_ids, id_order, DocumentStore, DuplicatePolicy};

/// A document store held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: HashMap<String, EmbeddedDocument>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get_document(&self, id: &str) -> Option<&EmbeddedDocument> {
        self.documents.get(id)
    }

    /// All documents, ordered by numeric id.
    #[must_use]
    pub fn documents(&self) -> Vec<&EmbeddedDocument> {
        let mut docs: Vec<&EmbeddedDocument> = self.documents.values().collect();
        docs.sort_by(|a, b| id_order(&a.id).cmp(&id_order(&b.id)));
        docs
    }
}

impl DocumentStore for MemoryStore {
    fn count_documents(&self) -> Result<usize> {
        Ok(self.documents.len())
    }

    fn delete_documents(&mut self, ids: &[String]) -> Result<()> {
        for id in ids {
            self.documents.remove(id);
        }
        Ok(())
    }

    fn write_documents(
        &mut self,
        documents: &[EmbeddedDocument],
        policy: DuplicatePolicy,
    ) -> Result<usize> {
        if policy == DuplicatePolicy::Fail {
            let collisions = colliding_ids(documents, |id| self.documents.contains_key(id));
            if !collisions.is_empty() {
                return Err(MdlError::Store(format!(
                    "duplicate document ids: {}",
                    collisions.join(", ")
                )));
            }
        }

        let mut written = 0;
        for doc in documents {
            if policy == DuplicatePolicy::Skip && self.documents.contains_key(&doc.id) {
                continue;
            }
            self.documents.insert(doc.id.clone(), doc.clone());
            written += 1;
        }
        Ok(written)
    }

    fn replace_all(&mut self, documents: &[EmbeddedDocument]) -> Result<usize> {
        let replacement: HashMap<String, EmbeddedDocument> = documents
            .iter()
            .map(|doc| (doc.id.clone(), doc.clone()))
            .collect();
        let written = replacement.len();
        self.documents = replacement;
        Ok(written)
    }
}
