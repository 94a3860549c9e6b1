//! # mdl-core
//!
//! Core types for the MDL indexer.
//!
//! This crate defines the foundational types used across all other crates:
//! - [`Mdl`] — the root schema aggregate (models, relationships, metrics, views)
//! - [`CompiledDocument`] / [`EmbeddedDocument`] — the units written to a store
//! - Error hierarchy ([`MdlError`], [`ResolutionFailure`])
//! - Input validation ([`validator`])

pub mod document;
pub mod error;
pub mod mdl;
pub mod validator;

pub use document::{CompiledDocument, EmbeddedDocument};
pub use error::{MdlError, ResolutionFailure, Result};
pub use mdl::{Column, JoinType, Mdl, Metric, MetricColumn, Model, Properties, Relationship, View};
pub use validator::validate;
