//! MDL → DDL text compiler.
//!
//! Emission order is a contract: every model (in input order, each followed
//! by its relationship-derived foreign keys), then every metric, then every
//! view. Document ids are positions in that order.

use mdl_core::{CompiledDocument, Mdl, MdlError, Metric, Model, Properties, Result, View};

use crate::resolver::RelationshipResolver;

const COLUMN_SEPARATOR: &str = ",\n  ";

/// Compile an MDL into DDL documents with positional ids.
///
/// # Errors
///
/// Returns [`MdlError::RelationshipResolution`] if any model's foreign keys
/// cannot be resolved; no partial output is returned.
pub fn compile_ddl(mdl: &Mdl) -> Result<Vec<CompiledDocument>> {
    Ok(CompiledDocument::sequence(compile_statements(mdl)?))
}

/// Compile an MDL into DDL statements, in emission order.
///
/// # Errors
///
/// See [`compile_ddl`].
pub fn compile_statements(mdl: &Mdl) -> Result<Vec<String>> {
    let resolver = RelationshipResolver::new(&mdl.models, &mdl.relationships);

    let capacity = mdl.models.len() + mdl.metrics.len() + mdl.views.len();
    let mut statements = Vec::with_capacity(capacity);
    for model in &mdl.models {
        statements.push(model_ddl(model, &resolver)?);
    }
    for metric in &mdl.metrics {
        statements.push(metric_ddl(metric));
    }
    for view in &mdl.views {
        statements.push(view_ddl(view)?);
    }

    tracing::debug!(statements = statements.len(), "compiled DDL");
    Ok(statements)
}

fn model_ddl(model: &Model, resolver: &RelationshipResolver<'_>) -> Result<String> {
    let primary_key = model.primary_key();
    let mut lines = Vec::with_capacity(model.columns.len());

    for column in model.physical_columns() {
        let mut line = String::new();
        if let Some(properties) = column.properties.as_ref() {
            line.push_str(&format!("-- {}\n  ", to_json(properties)?));
        }
        if column.is_calculated() {
            line.push_str("-- This column is a Calculated Field\n  ");
            line.push_str(&format!(
                "-- column expression: {}\n  ",
                column.expression.as_deref().unwrap_or_default()
            ));
        }
        line.push_str(&format!("{} {}", column.name, column.column_type));
        if primary_key == Some(column.name.as_str()) {
            line.push_str(" PRIMARY KEY");
        }
        lines.push(line);
    }

    lines.extend(
        resolver
            .resolve(&model.name)?
            .into_iter()
            .map(|key| key.to_string()),
    );

    let header = match non_empty(model.properties.as_ref()) {
        Some(properties) => format!("\n/* {} */\n", to_json(properties)?),
        None => String::new(),
    };

    Ok(create_table(&header, &model.name, &lines))
}

fn metric_ddl(metric: &Metric) -> String {
    let dimensions = metric.dimension.iter().map(|dimension| {
        format!(
            "-- This column is a dimension\n  {} {}",
            dimension.name, dimension.column_type
        )
    });
    let measures = metric.measure.iter().map(|measure| {
        format!(
            "-- This column is a measure\n  -- expression: {}\n  {} {}",
            measure.expression.as_deref().unwrap_or_default(),
            measure.name,
            measure.column_type
        )
    });
    let lines: Vec<String> = dimensions.chain(measures).collect();

    let header = format!(
        "\n/* This table is a metric */\n/* Metric Base Object: {} */\n",
        metric.base_object
    );
    create_table(&header, &metric.name, &lines)
}

fn view_ddl(view: &View) -> Result<String> {
    let properties = match view.properties.as_ref() {
        Some(properties) => to_json(properties)?,
        None => String::new(),
    };
    Ok(format!(
        "/* {properties} */\nCREATE VIEW {}\nAS ({})",
        view.name, view.statement
    ))
}

fn create_table(header: &str, name: &str, lines: &[String]) -> String {
    format!(
        "{header}CREATE TABLE {name} (\n  {}\n);",
        lines.join(COLUMN_SEPARATOR)
    )
}

fn non_empty(properties: Option<&Properties>) -> Option<&Properties> {
    properties.filter(|p| !p.is_empty())
}

fn to_json(properties: &Properties) -> Result<String> {
    serde_json::to_string(properties).map_err(|e| MdlError::Serialization(e.to_string()))
}
