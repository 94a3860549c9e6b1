//! Semantics description step.
//!
//! Asks an LLM to describe selected models and their columns, then turns the
//! reply into `{model name -> {description, columns: [{name, description}]}}`
//! restricted to the models and columns that were asked about. The indexer
//! does not depend on this step; [`apply_descriptions`] writes its output
//! back into `properties.description` so the next indexing run picks it up.

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mdl_core::{Mdl, MdlError, Properties, Result};

/// Language used when a request does not name one.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Instructions sent to the generator with every request.
pub const SYSTEM_PROMPT: &str = r#"You will receive a list of data models as JSON. Each model has a name,
a list of columns (name, type, properties), and its own properties.

Write a short description of each model and of each of its columns, based on
the user's explanation of what the data is for. Answer in the requested
language and reply with JSON only, in exactly this shape:

{
  "models": [
    {
      "name": "<model name>",
      "columns": [
        {"name": "<column name>", "properties": {"description": "<column description>"}}
      ],
      "properties": {"description": "<model description>"}
    }
  ]
}

Keep every description concise and specific to the user's context."#;

/// The LLM collaborator that writes descriptions.
pub trait DescriptionGenerator {
    /// Produce a reply for `prompt` under `system_prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`MdlError::Generation`] if the backend call fails.
    fn generate(
        &self,
        system_prompt: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Description and display alias as shown to the generator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PickedProperties {
    pub description: String,
    pub alias: String,
}

impl PickedProperties {
    fn from_properties(properties: Option<&Properties>) -> Self {
        let text = |key: &str| {
            properties
                .and_then(|p| p.get(key))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            description: text("description"),
            alias: text("displayName"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickedColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub properties: PickedProperties,
}

/// A model selected for description, reduced to what the generator needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickedModel {
    pub name: String,
    pub columns: Vec<PickedColumn>,
    pub properties: PickedProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescription {
    pub name: String,
    pub description: String,
    pub columns: Vec<ColumnDescription>,
}

/// Descriptions keyed by model name.
pub type Descriptions = BTreeMap<String, ModelDescription>;

/// Input to one description run.
#[derive(Debug, Clone)]
pub struct DescriptionRequest<'a> {
    pub mdl: &'a Mdl,
    pub selected_models: &'a [String],
    pub user_prompt: &'a str,
    pub language: &'a str,
}

impl<'a> DescriptionRequest<'a> {
    #[must_use]
    pub fn new(mdl: &'a Mdl, selected_models: &'a [String], user_prompt: &'a str) -> Self {
        Self {
            mdl,
            selected_models,
            user_prompt,
            language: DEFAULT_LANGUAGE,
        }
    }

    #[must_use]
    pub fn language(mut self, language: &'a str) -> Self {
        self.language = language;
        self
    }
}

/// Selected models in MDL order, without relationship columns.
#[must_use]
pub fn pick_models(mdl: &Mdl, selected_models: &[String]) -> Vec<PickedModel> {
    mdl.models
        .iter()
        .filter(|model| selected_models.contains(&model.name))
        .map(|model| PickedModel {
            name: model.name.clone(),
            columns: model
                .physical_columns()
                .map(|column| PickedColumn {
                    name: column.name.clone(),
                    column_type: column.column_type.clone(),
                    properties: PickedProperties::from_properties(column.properties.as_ref()),
                })
                .collect(),
            properties: PickedProperties::from_properties(model.properties.as_ref()),
        })
        .collect()
}

/// Render the user prompt for the generator.
///
/// # Errors
///
/// Returns [`MdlError::Serialization`] if the picked models cannot be encoded.
pub fn build_prompt(picked: &[PickedModel], user_prompt: &str, language: &str) -> Result<String> {
    let picked_json =
        serde_json::to_string(picked).map_err(|e| MdlError::Serialization(e.to_string()))?;
    Ok(format!(
        "### Input:\n\
         User's prompt: {user_prompt}\n\
         Picked models: {picked_json}\n\
         Localization Language: {language}\n\n\
         Please provide a brief description for the model and each column based on the user's prompt."
    ))
}

#[derive(Debug, Default, Deserialize)]
struct Reply {
    #[serde(default)]
    models: Vec<ReplyModel>,
}

#[derive(Debug, Deserialize)]
struct ReplyModel {
    name: String,
    #[serde(default)]
    columns: Vec<ReplyColumn>,
    #[serde(default)]
    properties: ReplyProperties,
}

#[derive(Debug, Deserialize)]
struct ReplyColumn {
    name: String,
    #[serde(default)]
    properties: ReplyProperties,
}

#[derive(Debug, Default, Deserialize)]
struct ReplyProperties {
    #[serde(default)]
    description: String,
}

/// Decode a generator reply. Undecodable replies yield no descriptions.
#[must_use]
pub fn normalize_reply(reply: &str) -> Descriptions {
    let text = reply.split_whitespace().collect::<Vec<_>>().join(" ");
    let reply: Reply = match serde_json::from_str(&text) {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, "could not decode description reply");
            Reply::default()
        }
    };

    reply
        .models
        .into_iter()
        .map(|model| {
            let description = ModelDescription {
                name: model.name.clone(),
                description: model.properties.description,
                columns: model
                    .columns
                    .into_iter()
                    .map(|column| ColumnDescription {
                        name: column.name,
                        description: column.properties.description,
                    })
                    .collect(),
            };
            (model.name, description)
        })
        .collect()
}

/// Keep only models that were picked, and only their picked columns.
#[must_use]
pub fn filter_descriptions(normalized: Descriptions, picked: &[PickedModel]) -> Descriptions {
    normalized
        .into_iter()
        .filter_map(|(name, mut description)| {
            let model = picked.iter().find(|m| m.name == name)?;
            description
                .columns
                .retain(|c| model.columns.iter().any(|p| p.name == c.name));
            Some((name, description))
        })
        .collect()
}

/// Write descriptions into `properties.description` of matching models and
/// columns. Returns the number of models updated.
pub fn apply_descriptions(mdl: &mut Mdl, descriptions: &Descriptions) -> usize {
    let mut updated = 0;
    for model in &mut mdl.models {
        let Some(described) = descriptions.get(&model.name) else {
            continue;
        };
        set_description(&mut model.properties, &described.description);
        for column in &mut model.columns {
            if let Some(c) = described.columns.iter().find(|c| c.name == column.name) {
                set_description(&mut column.properties, &c.description);
            }
        }
        updated += 1;
    }
    updated
}

fn set_description(properties: &mut Option<Properties>, description: &str) {
    properties.get_or_insert_with(Properties::new).insert(
        "description".to_string(),
        Value::String(description.to_string()),
    );
}

/// Runs the description step against a generator.
pub struct SemanticsDescription<G> {
    generator: G,
}

impl<G: DescriptionGenerator> SemanticsDescription<G> {
    #[must_use]
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Pick, prompt, generate, decode, and filter.
    ///
    /// # Errors
    ///
    /// Returns the generator's error, or [`MdlError::Serialization`] if the
    /// prompt cannot be built. A reply that cannot be decoded is not an
    /// error; it yields no descriptions.
    pub async fn run(&self, request: &DescriptionRequest<'_>) -> Result<Descriptions> {
        tracing::info!(
            models = request.selected_models.len(),
            language = request.language,
            "semantics description running"
        );
        let picked = pick_models(request.mdl, request.selected_models);
        let prompt = build_prompt(&picked, request.user_prompt, request.language)?;
        let reply = self.generator.generate(SYSTEM_PROMPT, &prompt).await?;
        Ok(filter_descriptions(normalize_reply(&reply), &picked))
    }
}
