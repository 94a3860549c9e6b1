//! The document store collaborator interface.

use mdl_core::{EmbeddedDocument, Result};

/// What to do when a written document's id already exists in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Replace the stored document.
    #[default]
    Overwrite,
    /// Keep the stored document and drop the new one.
    Skip,
    /// Reject the whole batch without writing anything.
    Fail,
}

/// One logical collection of documents keyed by id.
pub trait DocumentStore {
    /// Number of documents currently stored.
    ///
    /// # Errors
    ///
    /// Returns [`MdlError::Store`](mdl_core::MdlError::Store) if the store cannot be read.
    fn count_documents(&self) -> Result<usize>;

    /// Delete documents by id. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MdlError::Store`](mdl_core::MdlError::Store) if the delete fails.
    fn delete_documents(&mut self, ids: &[String]) -> Result<()>;

    /// Write documents under `policy`, returning how many were written.
    ///
    /// # Errors
    ///
    /// Returns [`MdlError::Store`](mdl_core::MdlError::Store) if the write
    /// fails, or if `policy` is [`DuplicatePolicy::Fail`] and an id collides.
    fn write_documents(
        &mut self,
        documents: &[EmbeddedDocument],
        policy: DuplicatePolicy,
    ) -> Result<usize>;

    /// Replace the whole collection with `documents`.
    ///
    /// The default clears and then writes, leaving the collection empty if
    /// the write fails. Stores that can swap atomically override this.
    ///
    /// # Errors
    ///
    /// Returns [`MdlError::Store`](mdl_core::MdlError::Store) on failure.
    fn replace_all(&mut self, documents: &[EmbeddedDocument]) -> Result<usize> {
        crate::sync::clear(self)?;
        self.write_documents(documents, DuplicatePolicy::Overwrite)
    }
}

/// Sort key that orders positional ids numerically (`"2"` before `"10"`).
pub(crate) fn id_order(id: &str) -> (u64, &str) {
    (id.parse().unwrap_or(u64::MAX), id)
}

/// Ids colliding within `documents` or with `existing`.
pub(crate) fn colliding_ids<'a>(
    documents: &'a [EmbeddedDocument],
    mut existing: impl FnMut(&str) -> bool,
) -> Vec<&'a str> {
    let mut seen = std::collections::HashSet::new();
    documents
        .iter()
        .map(|d| d.id.as_str())
        .filter(|id| !seen.insert(*id) || existing(*id))
        .collect()
}
