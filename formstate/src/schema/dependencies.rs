//! Expansion of `dependencies` against the current data.
//!
//! Two forms are supported:
//!
//! - property dependencies, `{"a": ["b", "c"]}`: when `a` is present, `b` and
//!   `c` become required;
//! - schema dependencies, `{"a": {...}}`: when `a` is present, the sub-schema
//!   is merged in. A `oneOf` inside the sub-schema is narrowed to the single
//!   branch whose declaration of `a` accepts the current value.

use serde_json::{Map, Value, json};

use super::{SchemaError, resolve_reference, retrieve_schema};
use crate::{context::SchemaContext, utils::merge_schemas};

/// Remove `dependencies` from `schema` and apply each one whose trigger
/// property is present in `data`.
///
/// Dependencies are applied in declaration order; each one sees the schema
/// produced by the previous ones. A dependency whose trigger is not a
/// declared property of the schema at that point is skipped.
pub fn resolve_dependencies(
    cx: &SchemaContext<'_>,
    schema: &Map<String, Value>,
    data: Option<&Value>,
) -> Result<Map<String, Value>, SchemaError> {
    let mut resolved = schema.clone();
    let dependencies = match resolved.remove("dependencies") {
        Some(Value::Object(dependencies)) => dependencies,
        _ => return Ok(resolved),
    };

    let fields = data.and_then(Value::as_object);
    for (key, dependency) in &dependencies {
        if fields.and_then(|f| f.get(key)).is_none() {
            continue;
        }
        if let Some(Value::Object(properties)) = resolved.get("properties") {
            if !properties.contains_key(key) {
                continue;
            }
        }

        resolved = match dependency {
            Value::Array(required) => with_dependent_properties(resolved, required),
            Value::Object(_) => with_dependent_schema(cx, resolved, data, key, dependency)?,
            _ => resolved,
        };
    }
    Ok(resolved)
}

fn with_dependent_properties(
    mut schema: Map<String, Value>,
    additionally_required: &[Value],
) -> Map<String, Value> {
    let required = match schema.get("required") {
        Some(Value::Array(current)) => {
            let mut merged = current.clone();
            for name in additionally_required {
                if !merged.contains(name) {
                    merged.push(name.clone());
                }
            }
            merged
        }
        _ => additionally_required.to_vec(),
    };
    schema.insert("required".to_string(), Value::Array(required));
    schema
}

fn with_dependent_schema(
    cx: &SchemaContext<'_>,
    schema: Map<String, Value>,
    data: Option<&Value>,
    key: &str,
    dependency: &Value,
) -> Result<Map<String, Value>, SchemaError> {
    let Value::Object(mut dependent) = retrieve_schema(cx, dependency, data)? else {
        return Ok(schema);
    };
    let one_of = dependent.remove("oneOf");
    let schema = merge_schemas(&schema, &dependent);

    let branches = match one_of {
        None => return Ok(schema),
        Some(Value::Array(branches)) => branches,
        Some(other) => {
            return Err(SchemaError::invalid(
                &format!("dependencies/{key}/oneOf"),
                "an array",
                &other,
            ));
        }
    };

    let mut resolved = Vec::with_capacity(branches.len());
    for branch in &branches {
        match branch {
            Value::Object(map) if map.contains_key("$ref") => {
                resolved.push(Value::Object(resolve_reference(cx, map, data)?));
            }
            _ => resolved.push(branch.clone()),
        }
    }
    with_exactly_one_subschema(cx, schema, data, key, &resolved)
}

fn with_exactly_one_subschema(
    cx: &SchemaContext<'_>,
    schema: Map<String, Value>,
    data: Option<&Value>,
    key: &str,
    branches: &[Value],
) -> Result<Map<String, Value>, SchemaError> {
    let instance = data.cloned().unwrap_or(Value::Null);
    let root = cx.root_schema();
    let valid: Vec<&Map<String, Value>> = branches
        .iter()
        .filter_map(Value::as_object)
        .filter(|branch| {
            let Some(condition) = branch.get("properties").and_then(|p| p.get(key)) else {
                return false;
            };
            let condition_schema = json!({
                "type": "object",
                "properties": { key: condition },
                "definitions": root["definitions"],
            });
            cx.validator()
                .validate(&instance, &condition_schema)
                .errors
                .is_empty()
        })
        .collect();

    let [branch] = valid.as_slice() else {
        cx.warn(concat!(
            "ignoring oneOf in dependencies because ",
            "there isn't exactly one subschema that is valid"
        ));
        return Ok(schema);
    };

    let mut dependent = (*branch).clone();
    if let Some(Value::Object(properties)) = dependent.get_mut("properties") {
        properties.remove(key);
    }
    let dependent = retrieve_schema(cx, &Value::Object(dependent), data)?;
    let dependent = dependent.as_object().cloned().unwrap_or_default();
    Ok(merge_schemas(&schema, &dependent))
}
