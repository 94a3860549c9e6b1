//! # mdl-compiler
//!
//! Compiles a validated [`Mdl`](mdl_core::Mdl) into retrieval documents.
//!
//! Includes:
//! - Relationship resolver (join type + condition → foreign-key constraints)
//! - DDL compiler (models, then metrics, then views)
//! - View projector (question/description/statement records)

pub mod ddl;
pub mod projector;
pub mod resolver;

pub use ddl::{compile_ddl, compile_statements};
pub use projector::{project_views, ViewQuestion};
pub use resolver::{ForeignKey, RelationshipResolver};
