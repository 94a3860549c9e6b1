//! SQLite-backed document store.
//!
//! One database file holds any number of named collections:
//! - `documents` table keyed by `(collection, id)`
//! - embeddings stored as native-endian `f32` blobs

use std::path::Path;
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};
use zerocopy::{FromBytes, IntoBytes};

use mdl_core::{EmbeddedDocument, MdlError, Result};

use crate::store::{colliding_ids, DocumentStore, DuplicatePolicy};

/// A single collection inside a SQLite database.
pub struct SqliteStore {
    conn: Connection,
    collection: String,
}

fn store_err(e: rusqlite::Error) -> MdlError {
    MdlError::Store(e.to_string())
}

impl SqliteStore {
    /// Open or create the database at `path` and bind to `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`MdlError::Store`] if the database cannot be opened.
    pub fn open(path: &Path, collection: &str) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(store_err)?;
        conn.busy_timeout(Duration::from_secs(5)).map_err(store_err)?;
        Self::with_connection(conn, collection)
    }

    /// Create an in-memory store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns [`MdlError::Store`] if schema creation fails.
    pub fn in_memory(collection: &str) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(store_err)?;
        Self::with_connection(conn, collection)
    }

    fn with_connection(conn: Connection, collection: &str) -> Result<Self> {
        let store = Self {
            conn,
            collection: collection.to_string(),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn create_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (collection, id)
            );
            ",
            )
            .map_err(store_err)
    }

    /// Name of the collection this store reads and writes.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Fetch one document by id.
    ///
    /// # Errors
    ///
    /// Returns [`MdlError::Store`] if the query fails.
    pub fn get_document(&self, id: &str) -> Result<Option<EmbeddedDocument>> {
        self.conn
            .query_row(
                "SELECT id, content, embedding FROM documents WHERE collection = ?1 AND id = ?2",
                params![self.collection, id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get::<_, Vec<u8>>(2)?)),
            )
            .optional()
            .map_err(store_err)?
            .map(|(id, content, blob)| decode(id, content, &blob))
            .transpose()
    }

    /// All documents in the collection, ordered by numeric id.
    ///
    /// # Errors
    ///
    /// Returns [`MdlError::Store`] if the query fails.
    pub fn documents(&self) -> Result<Vec<EmbeddedDocument>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, content, embedding FROM documents
                 WHERE collection = ?1
                 ORDER BY CAST(id AS INTEGER), id",
            )
            .map_err(store_err)?;

        let rows = stmt
            .query_map(params![self.collection], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get::<_, Vec<u8>>(2)?))
            })
            .map_err(store_err)?
            .collect::<std::result::Result<Vec<(String, String, Vec<u8>)>, _>>()
            .map_err(store_err)?;

        rows.into_iter()
            .map(|(id, content, blob)| decode(id, content, &blob))
            .collect()
    }
}

fn decode(id: String, content: String, blob: &[u8]) -> Result<EmbeddedDocument> {
    if blob.len() % std::mem::size_of::<f32>() != 0 {
        return Err(MdlError::Store(format!(
            "embedding for document {id} has {} bytes, not a whole number of f32",
            blob.len()
        )));
    }
    let embedding = blob
        .chunks_exact(std::mem::size_of::<f32>())
        .map(|chunk| {
            f32::read_from_bytes(chunk)
                .map_err(|_| MdlError::Store(format!("corrupt embedding for document {id}")))
        })
        .collect::<Result<Vec<f32>>>()?;
    Ok(EmbeddedDocument {
        id,
        content,
        embedding,
    })
}

fn insert_sql(policy: DuplicatePolicy) -> &'static str {
    match policy {
        DuplicatePolicy::Overwrite => {
            "INSERT OR REPLACE INTO documents (collection, id, content, embedding) VALUES (?1, ?2, ?3, ?4)"
        }
        DuplicatePolicy::Skip => {
            "INSERT OR IGNORE INTO documents (collection, id, content, embedding) VALUES (?1, ?2, ?3, ?4)"
        }
        DuplicatePolicy::Fail => {
            "INSERT INTO documents (collection, id, content, embedding) VALUES (?1, ?2, ?3, ?4)"
        }
    }
}

fn insert_all(
    tx: &rusqlite::Transaction<'_>,
    collection: &str,
    documents: &[EmbeddedDocument],
    policy: DuplicatePolicy,
) -> Result<usize> {
    let mut stmt = tx.prepare(insert_sql(policy)).map_err(store_err)?;
    let mut written = 0;
    for doc in documents {
        written += stmt
            .execute(params![
                collection,
                doc.id,
                doc.content,
                doc.embedding.as_slice().as_bytes()
            ])
            .map_err(store_err)?;
    }
    Ok(written)
}

impl DocumentStore for SqliteStore {
    fn count_documents(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                params![self.collection],
                |row| row.get(0),
            )
            .map_err(store_err)?;
        Ok(count as usize)
    }

    fn delete_documents(&mut self, ids: &[String]) -> Result<()> {
        let tx = self.conn.transaction().map_err(store_err)?;
        {
            let mut stmt = tx
                .prepare("DELETE FROM documents WHERE collection = ?1 AND id = ?2")
                .map_err(store_err)?;
            for id in ids {
                stmt.execute(params![self.collection, id]).map_err(store_err)?;
            }
        }
        tx.commit().map_err(store_err)
    }

    fn write_documents(
        &mut self,
        documents: &[EmbeddedDocument],
        policy: DuplicatePolicy,
    ) -> Result<usize> {
        if policy == DuplicatePolicy::Fail {
            let existing = self
                .documents()?
                .into_iter()
                .map(|d| d.id)
                .collect::<std::collections::HashSet<_>>();
            let collisions = colliding_ids(documents, |id| existing.contains(id));
            if !collisions.is_empty() {
                return Err(MdlError::Store(format!(
                    "duplicate document ids: {}",
                    collisions.join(", ")
                )));
            }
        }

        let tx = self.conn.transaction().map_err(store_err)?;
        let written = insert_all(&tx, &self.collection, documents, policy)?;
        tx.commit().map_err(store_err)?;
        Ok(written)
    }

    fn replace_all(&mut self, documents: &[EmbeddedDocument]) -> Result<usize> {
        let tx = self.conn.transaction().map_err(store_err)?;
        tx.execute(
            "DELETE FROM documents WHERE collection = ?1",
            params![self.collection],
        )
        .map_err(store_err)?;
        let written = insert_all(&tx, &self.collection, documents, DuplicatePolicy::Overwrite)?;
        tx.commit().map_err(store_err)?;
        Ok(written)
    }
}
