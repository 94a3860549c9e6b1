//! The embedding collaborator.
//!
//! An [`Embedder`] turns a batch of compiled documents into embedded ones,
//! one vector per document, preserving order. Failures are returned to the
//! caller as-is; nothing here retries.

use std::future::Future;

use sha2::{Digest, Sha256};

use mdl_core::{CompiledDocument, EmbeddedDocument, Result};

/// Default vector width of [`HashEmbedder`].
pub const DEFAULT_DIMENSIONS: usize = 64;

/// Embeds a batch of documents in one call.
pub trait Embedder {
    /// Embed `documents`, returning them in the same order with a vector each.
    ///
    /// # Errors
    ///
    /// Returns [`MdlError::Embedding`](mdl_core::MdlError::Embedding) if the
    /// backend rejects or fails the batch.
    fn embed(
        &self,
        documents: Vec<CompiledDocument>,
    ) -> impl Future<Output = Result<Vec<EmbeddedDocument>>> + Send;
}

/// Deterministic feature-hashing embedder.
///
/// Each lowercase whitespace-separated token is hashed with SHA-256 into a
/// signed bucket; the resulting vector is L2-normalised. Identical content
/// always yields an identical vector, and no network is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl HashEmbedder {
    /// Create an embedder producing vectors of `dimensions` (at least 1).
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    /// Embed a single text.
    #[must_use]
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text.split_whitespace() {
            let hash = Sha256::digest(token.to_lowercase().as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&hash[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
            let sign = if hash[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Embedder for HashEmbedder {
    fn embed(
        &self,
        documents: Vec<CompiledDocument>,
    ) -> impl Future<Output = Result<Vec<EmbeddedDocument>>> + Send {
        let embedder = *self;
        async move {
            Ok(documents
                .into_iter()
                .map(|doc| {
                    let embedding = embedder.embed_text(&doc.content);
                    EmbeddedDocument::new(doc, embedding)
                })
                .collect())
        }
    }
}
