//! Documents produced by compilation and consumed by stores.

use serde::{Deserialize, Serialize};

/// A unit of compiled text destined for a document store.
///
/// The `id` is the document's zero-based position in its emission order,
/// rendered as a string. Identity is positional: reordering or removing an
/// input object shifts the ids of every document after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledDocument {
    pub id: String,
    pub content: String,
}

impl CompiledDocument {
    /// Number a sequence of contents `"0"`, `"1"`, ... in iteration order.
    pub fn sequence<I>(contents: I) -> Vec<Self>
    where
        I: IntoIterator<Item = String>,
    {
        contents
            .into_iter()
            .enumerate()
            .map(|(i, content)| Self {
                id: i.to_string(),
                content,
            })
            .collect()
    }
}

/// A compiled document together with its embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedDocument {
    pub id: String,
    pub content: String,
    pub embedding: Vec<f32>,
}

impl EmbeddedDocument {
    #[must_use]
    pub fn new(document: CompiledDocument, embedding: Vec<f32>) -> Self {
        Self {
            id: document.id,
            content: document.content,
            embedding,
        }
    }
}
