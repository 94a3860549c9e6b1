//! View projector: retrieval records for stored views.
//!
//! Each view becomes a JSON object keyed for question-based retrieval:
//! `{"question": ..., "description": ..., "statement": ...}`. Missing
//! properties render as empty strings.

use serde::Serialize;

use mdl_core::{CompiledDocument, MdlError, Result, View};

/// The retrieval record stored for one view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewQuestion {
    pub question: String,
    pub description: String,
    pub statement: String,
}

impl From<&View> for ViewQuestion {
    fn from(view: &View) -> Self {
        Self {
            question: view.property_text("question"),
            description: view.property_text("description"),
            statement: view.statement.clone(),
        }
    }
}

/// Project views into documents whose ids are positions in `views`.
///
/// # Errors
///
/// Returns [`MdlError::Serialization`] if a record cannot be encoded.
pub fn project_views(views: &[View]) -> Result<Vec<CompiledDocument>> {
    let contents = views
        .iter()
        .map(|view| {
            serde_json::to_string(&ViewQuestion::from(view))
                .map_err(|e| MdlError::Serialization(e.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CompiledDocument::sequence(contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdl_core::validate;

    #[test]
    fn projects_question_description_and_statement() {
        let mdl = validate(
            r#"{"views": [{
                "name": "top_customers",
                "statement": "select name from customers order by spend desc limit 10",
                "properties": {"question": "Who are the top customers?", "description": "Ten biggest spenders"}
            }]}"#,
        )
        .unwrap();

        let docs = project_views(&mdl.views).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "0");
        assert_eq!(
            docs[0].content,
            r#"{"question":"Who are the top customers?","description":"Ten biggest spenders","statement":"select name from customers order by spend desc limit 10"}"#
        );
    }

    #[test]
    fn missing_properties_become_empty_strings() {
        let mdl = validate(r#"{"views": [{"name": "v", "statement": "select 1"}]}"#).unwrap();
        let record = ViewQuestion::from(&mdl.views[0]);
        assert_eq!(record.question, "");
        assert_eq!(record.description, "");
        assert_eq!(record.statement, "select 1");
    }

    #[test]
    fn ids_are_positions_in_the_view_list() {
        let mdl = validate(
            r#"{"views": [
                {"name": "a", "statement": "select 1"},
                {"name": "b", "statement": "select 2"},
                {"name": "c", "statement": "select 3"}
            ]}"#,
        )
        .unwrap();
        let ids: Vec<String> = project_views(&mdl.views)
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
    }

    #[test]
    fn no_views_no_documents() {
        assert!(project_views(&[]).unwrap().is_empty());
    }
}
