//! # mdl-pipeline
//!
//! Runs an MDL through validation, compilation, embedding, and store
//! synchronization.
//!
//! Includes:
//! - [`Indexer`] — the two-branch indexing orchestrator (DDL and view questions)
//! - [`IndexConfig`] — TOML configuration for stores, embedding, and sync mode
//! - [`semantics`] — the model/column description step around an LLM generator

pub mod config;
pub mod indexer;
pub mod semantics;

pub use config::IndexConfig;
pub use indexer::{IndexReport, Indexer, Stage};
