//! Schema validation: the gate every raw MDL passes before compilation.
//!
//! Guarantees:
//! - the input is a JSON object, otherwise [`MdlError::MalformedInput`]
//! - `models`, `views`, `relationships`, and `metrics` are present, defaulting
//!   absent (or null) sections to empty lists
//!
//! Nothing else is checked here. Dangling relationships and malformed join
//! conditions surface later as compiler errors.

use serde_json::Value;

use crate::error::{MdlError, Result};
use crate::mdl::Mdl;

/// Top-level sections that must exist after normalization, in insertion order.
pub const REQUIRED_SECTIONS: [&str; 4] = ["models", "views", "relationships", "metrics"];

/// Parse raw text and fill in missing top-level sections.
///
/// # Errors
///
/// Returns [`MdlError::MalformedInput`] if the text is not a JSON object.
pub fn normalize(raw: &str) -> Result<Value> {
    let mut value: Value =
        serde_json::from_str(raw).map_err(|e| MdlError::MalformedInput(e.to_string()))?;

    let object = value.as_object_mut().ok_or_else(|| {
        MdlError::MalformedInput("MDL must be a JSON object at the top level".to_string())
    })?;

    for section in REQUIRED_SECTIONS {
        let slot = object
            .entry(section)
            .or_insert_with(|| Value::Array(Vec::new()));
        if slot.is_null() {
            *slot = Value::Array(Vec::new());
        }
    }

    Ok(value)
}

/// Validate raw MDL text into a typed [`Mdl`].
///
/// # Errors
///
/// Returns [`MdlError::MalformedInput`] if the text is not a JSON object, or
/// [`MdlError::Schema`] if it does not have the shape of an MDL document
/// (wrong field types, a relationship without two models).
pub fn validate(raw: &str) -> Result<Mdl> {
    let value = normalize(raw)?;
    let mdl: Mdl = serde_json::from_value(value).map_err(|e| MdlError::Schema(e.to_string()))?;

    tracing::debug!(
        models = mdl.models.len(),
        relationships = mdl.relationships.len(),
        metrics = mdl.metrics.len(),
        views = mdl.views.len(),
        "validated MDL"
    );

    Ok(mdl)
}
