//! # mdl-store
//!
//! Persistence side of the indexer.
//!
//! - [`DocumentStore`] — the store collaborator interface (count, delete, write)
//! - [`SqliteStore`] / [`MemoryStore`] — implementations
//! - [`sync`] — clear-then-write and staged synchronization
//! - [`Embedder`] — the embedding collaborator, with a deterministic [`HashEmbedder`]

pub mod embed;
pub mod memory;
pub mod sqlite;
pub mod store;
pub mod sync;

pub use embed::{Embedder, HashEmbedder};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{DocumentStore, DuplicatePolicy};
pub use sync::SyncMode;
