//! Store synchronization: replacing a collection's contents with a new batch.
//!
//! Two disciplines:
//! - [`SyncMode::ClearThenWrite`]: delete the prior documents, later write the
//!   new batch. A failure between the two leaves the store empty.
//! - [`SyncMode::Staged`]: build the new batch first and swap it in with
//!   [`DocumentStore::replace_all`]. The prior collection survives failures.
//!
//! Both assume ids are contiguous positions `0..count`, which only holds if
//! every write went through this module. Callers must not run two
//! synchronizations against the same store at once.

use serde::{Deserialize, Serialize};

use mdl_core::{EmbeddedDocument, Result};

use crate::store::{DocumentStore, DuplicatePolicy};

/// How a run replaces a collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    #[default]
    ClearThenWrite,
    Staged,
}

/// Delete every document with an id in `0..count`, returning how many ids
/// were deleted. A no-op on an empty store.
///
/// # Errors
///
/// Propagates the store's count or delete failure.
pub fn clear<S: DocumentStore + ?Sized>(store: &mut S) -> Result<usize> {
    let count = store.count_documents()?;
    if count == 0 {
        tracing::debug!("store already empty, nothing to clear");
        return Ok(0);
    }
    let ids: Vec<String> = (0..count).map(|i| i.to_string()).collect();
    store.delete_documents(&ids)?;
    tracing::debug!(deleted = count, "cleared store");
    Ok(count)
}

/// Write a batch under `policy`.
///
/// # Errors
///
/// Propagates the store's write failure.
pub fn write<S: DocumentStore + ?Sized>(
    store: &mut S,
    documents: &[EmbeddedDocument],
    policy: DuplicatePolicy,
) -> Result<usize> {
    let written = store.write_documents(documents, policy)?;
    tracing::debug!(written, ?policy, "wrote documents");
    Ok(written)
}

/// Commit a run's batch according to `mode`.
///
/// In [`SyncMode::ClearThenWrite`] the store is expected to have been
/// cleared already; the batch is written with overwrite-by-id.
///
/// # Errors
///
/// Propagates the store's write failure.
pub fn commit<S: DocumentStore + ?Sized>(
    store: &mut S,
    documents: &[EmbeddedDocument],
    mode: SyncMode,
) -> Result<usize> {
    match mode {
        SyncMode::ClearThenWrite => write(store, documents, DuplicatePolicy::Overwrite),
        SyncMode::Staged => {
            let written = store.replace_all(documents)?;
            tracing::debug!(written, "swapped in staged documents");
            Ok(written)
        }
    }
}
