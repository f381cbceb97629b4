use std::path::Path;

use anyhow::Context;
use schemars::{JsonSchema, generate::SchemaSettings};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::state::FormState;

/// Generate the draft-07 schema of `C`, so that shared types are referenced
/// through `#/definitions/`.
pub fn schema_for<C: JsonSchema>() -> anyhow::Result<Value> {
    let schema = SchemaSettings::draft07()
        .into_generator()
        .into_root_schema_for::<C>();
    Ok(serde_json::to_value(&schema)?)
}

/// Load a typed config, completing it with the defaults its schema declares.
///
/// A missing or empty file counts as no data. When `write_back` is set and
/// defaults were added, the completed data is saved back to the file (the
/// old content is kept in a backup).
///
/// # Errors
///
/// Returns errors when schema generation, parsing, resolution, or I/O fails,
/// or when the completed data does not deserialize into `C`.
pub fn run<C: JsonSchema + DeserializeOwned>(
    config_path: impl AsRef<Path>,
    write_back: bool,
) -> anyhow::Result<C> {
    let config_path = config_path.as_ref();
    let schema = schema_for::<C>()?;

    let mut state = FormState::new_with_schema(Some(config_path), &schema)?;
    if state.fill_defaults()? {
        info!("filled defaults for {}", config_path.display());
    }
    if write_back {
        state.save()?;
    }

    let value = state
        .data
        .unwrap_or_else(|| Value::Object(Default::default()));
    let c = serde_json::from_value(value)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    Ok(c)
}
