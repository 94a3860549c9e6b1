//! The indexing orchestrator.
//!
//! A run moves through four stages:
//!
//! 1. **Validating**: parse the raw MDL; malformed input aborts before any
//!    store is touched.
//! 2. **Clearing**: delete both collections' prior documents (skipped in
//!    [`SyncMode::Staged`], where the swap happens at write time).
//! 3. **Compiling**: two independent branches over the same validated MDL:
//!    DDL documents and view-question documents. Each compiles, embeds its
//!    batch in one call, and writes to its own store.
//! 4. **Writing**: each branch commits its batch.
//!
//! The run succeeds only when both branches have written. The first branch
//! error aborts the run and is returned unchanged. The caller must ensure at
//! most one run per store pair at a time.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use mdl_compiler::{compile_ddl, project_views};
use mdl_core::{validate, CompiledDocument, EmbeddedDocument, Mdl, MdlError, Result};
use mdl_store::sync::{self, SyncMode};
use mdl_store::{DocumentStore, Embedder};

/// A stage of an indexing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Clearing,
    Compiling,
    Writing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validating => "validating",
            Self::Clearing => "clearing",
            Self::Compiling => "compiling",
            Self::Writing => "writing",
        })
    }
}

/// One of the two parallel branches of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Ddl,
    View,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ddl => "ddl",
            Self::View => "view",
        })
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexReport {
    pub ddl_documents: usize,
    pub view_documents: usize,
    /// SHA-256 of the raw MDL text, hex encoded.
    pub mdl_digest: String,
    pub sync_mode: SyncMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Indexes an MDL into a DDL store and a view-question store.
pub struct Indexer<E, D, V> {
    embedder: E,
    ddl_store: D,
    view_store: V,
    mode: SyncMode,
}

impl<E, D, V> Indexer<E, D, V>
where
    E: Embedder,
    D: DocumentStore,
    V: DocumentStore,
{
    #[must_use]
    pub fn new(embedder: E, ddl_store: D, view_store: V) -> Self {
        Self {
            embedder,
            ddl_store,
            view_store,
            mode: SyncMode::default(),
        }
    }

    #[must_use]
    pub fn with_sync_mode(mut self, mode: SyncMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn ddl_store(&self) -> &D {
        &self.ddl_store
    }

    pub fn view_store(&self) -> &V {
        &self.view_store
    }

    pub fn into_stores(self) -> (D, V) {
        (self.ddl_store, self.view_store)
    }

    /// Run a full indexing pass over `mdl_text`.
    ///
    /// # Errors
    ///
    /// - [`MdlError::MalformedInput`] / [`MdlError::Schema`] before any store mutation
    /// - [`MdlError::RelationshipResolution`] from the DDL branch; nothing is written to the DDL store
    /// - [`MdlError::Embedding`] / [`MdlError::Store`] from either branch
    pub async fn run(&mut self, mdl_text: &str) -> Result<IndexReport> {
        let started_at = Utc::now();
        let mdl_digest = digest(mdl_text);
        let Self {
            embedder,
            ddl_store,
            view_store,
            mode,
        } = self;
        let mode = *mode;

        tracing::info!(stage = %Stage::Validating, digest = %mdl_digest, "indexing run started");
        let mdl = validate(mdl_text)?;

        if mode == SyncMode::ClearThenWrite {
            tracing::info!(stage = %Stage::Clearing, "clearing old documents");
            sync::clear(ddl_store)?;
            sync::clear(view_store)?;
        }

        tracing::info!(stage = %Stage::Compiling, "compiling documents");
        let embedder = &*embedder;
        let (ddl_documents, view_documents) = tokio::try_join!(
            run_branch(Branch::Ddl, &mdl, embedder, ddl_store, mode),
            run_branch(Branch::View, &mdl, embedder, view_store, mode),
        )?;

        let report = IndexReport {
            ddl_documents,
            view_documents,
            mdl_digest,
            sync_mode: mode,
            started_at,
            finished_at: Utc::now(),
        };
        tracing::info!(
            ddl_documents,
            view_documents,
            "indexing run finished"
        );
        Ok(report)
    }
}

async fn run_branch<E, S>(
    branch: Branch,
    mdl: &Mdl,
    embedder: &E,
    store: &mut S,
    mode: SyncMode,
) -> Result<usize>
where
    E: Embedder,
    S: DocumentStore,
{
    let documents = match branch {
        Branch::Ddl => compile_ddl(mdl)?,
        Branch::View => project_views(&mdl.views)?,
    };
    tracing::debug!(%branch, documents = documents.len(), "compiled branch");

    let embedded = embed_batch(embedder, documents).await?;

    tracing::info!(stage = %Stage::Writing, %branch, documents = embedded.len(), "writing documents");
    sync::commit(store, &embedded, mode)
}

/// Embed a batch in one call and check the collaborator kept ids and order.
async fn embed_batch<E: Embedder>(
    embedder: &E,
    documents: Vec<CompiledDocument>,
) -> Result<Vec<EmbeddedDocument>> {
    if documents.is_empty() {
        return Ok(Vec::new());
    }
    let expected: Vec<String> = documents.iter().map(|d| d.id.clone()).collect();
    let embedded = embedder.embed(documents).await?;

    let returned = embedded.iter().map(|d| d.id.as_str());
    if embedded.len() != expected.len() || !returned.eq(expected.iter().map(String::as_str)) {
        return Err(MdlError::Embedding(format!(
            "embedder returned {} documents for a batch of {}, or changed their ids",
            embedded.len(),
            expected.len()
        )));
    }
    Ok(embedded)
}

fn digest(text: &str) -> String {
    Sha256::digest(text.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
