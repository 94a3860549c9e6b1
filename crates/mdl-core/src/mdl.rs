//! MDL schema types: models, relationships, metrics, and views.
//!
//! Field names follow the camelCase JSON of MDL documents. Keys this crate
//! does not interpret are kept in `extra` so an MDL can be re-serialized
//! without losing them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Free-form properties attached to a model, column, or view.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// The root MDL aggregate.
///
/// Missing sections deserialize as empty lists; an MDL never carries a
/// null or absent collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mdl {
    #[serde(default)]
    pub models: Vec<Model>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub views: Vec<View>,
    #[serde(flatten)]
    pub extra: Properties,
}

/// A table-like entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(
        rename = "primaryKey",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub primary_key: Option<String>,
    #[serde(flatten)]
    pub extra: Properties,
}

impl Model {
    /// The declared primary key, treating an empty string as undeclared.
    #[must_use]
    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref().filter(|pk| !pk.is_empty())
    }

    /// Columns that are physical attributes (not relationship pointers).
    pub fn physical_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.is_relationship())
    }
}

/// A column of a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type", default)]
    pub column_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    /// Name of the relationship this column navigates, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(
        rename = "isCalculated",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub is_calculated: Option<bool>,
    #[serde(flatten)]
    pub extra: Properties,
}

impl Column {
    #[must_use]
    pub fn is_relationship(&self) -> bool {
        self.relationship.is_some()
    }

    #[must_use]
    pub fn is_calculated(&self) -> bool {
        self.is_calculated.unwrap_or(false)
    }
}

/// A typed join between two models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Ordered pair of model names; the condition's sides follow this order.
    pub models: [String; 2],
    #[serde(rename = "joinType")]
    pub join_type: JoinType,
    /// Join condition of the form `a.col = b.col`.
    pub condition: String,
    #[serde(flatten)]
    pub extra: Properties,
}

impl Relationship {
    /// Human-readable label: the relationship name, or its condition when unnamed.
    #[must_use]
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.condition
        } else {
            &self.name
        }
    }
}

/// Cardinality and direction of a relationship.
///
/// Parsed case-insensitively; serialized in upper snake case. Any other tag
/// is kept verbatim as [`JoinType::Other`] and contributes no foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JoinType {
    ManyToOne,
    OneToMany,
    OneToOne,
    Other(String),
}

impl JoinType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ManyToOne => "MANY_TO_ONE",
            Self::OneToMany => "ONE_TO_MANY",
            Self::OneToOne => "ONE_TO_ONE",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for JoinType {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "MANY_TO_ONE" => Self::ManyToOne,
            "ONE_TO_MANY" => Self::OneToMany,
            "ONE_TO_ONE" => Self::OneToOne,
            _ => Self::Other(value.to_string()),
        }
    }
}

impl From<String> for JoinType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<JoinType> for String {
    fn from(value: JoinType) -> Self {
        match value {
            JoinType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

/// A metric: an aggregate over a base object, exposed as a synthetic table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    #[serde(rename = "baseObject")]
    pub base_object: String,
    #[serde(default)]
    pub dimension: Vec<MetricColumn>,
    #[serde(default)]
    pub measure: Vec<MetricColumn>,
    #[serde(flatten)]
    pub extra: Properties,
}

/// A dimension or measure of a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricColumn {
    pub name: String,
    #[serde(rename = "type", default)]
    pub column_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(flatten)]
    pub extra: Properties,
}

/// A stored ad-hoc view, optionally annotated with the question it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    pub statement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
    #[serde(flatten)]
    pub extra: Properties,
}

impl View {
    /// A property rendered as text, or `""` when absent.
    #[must_use]
    pub fn property_text(&self, key: &str) -> String {
        match self.properties.as_ref().and_then(|p| p.get(key)) {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}
