//! Schema resolution.
//!
//! A raw schema does not reveal its effective shape until its `$ref`s are
//! followed, its `dependencies` are expanded against the current data and the
//! keys present in the data under `additionalProperties` are given property
//! schemas of their own. [`retrieve_schema`] does all three and returns a new
//! schema; the input is never modified.
//!
//! ## Submodules
//!
//! - [`additional`] - Property stubs for data under `additionalProperties`
//! - [`dependencies`] - Property and schema dependencies
//! - [`kind`] - Node classification ([`SchemaKind`], [`SchemaType`])
//! - [`reference`] - `$ref` lookup and JSON Pointer unescaping

pub mod additional;
pub mod dependencies;
pub mod kind;
pub mod reference;

mod error;

pub use additional::{ADDITIONAL_PROPERTY_FLAG, stub_existing_additional_properties};
pub use error::SchemaError;
pub use kind::{SchemaKind, SchemaType, get_schema_type};
pub use reference::find_schema_definition;

use serde_json::{Map, Value};

use crate::context::SchemaContext;

/// Compute the schema in effect for `data`.
///
/// 1. A `$ref` is replaced by its target with the local keys merged over it
///    (a local `title` wins), and the result is resolved again.
/// 2. `dependencies` are removed and expanded one after the other against
///    `data`; the result is resolved again.
/// 3. Anything else is taken as is.
/// 4. Unless `additionalProperties` is `false`, every key of `data` missing
///    from `properties` gets a synthesized property schema marked with
///    [`ADDITIONAL_PROPERTY_FLAG`].
///
/// A non-object schema resolves to `{}`.
///
/// # Errors
///
/// Returns [`SchemaError::MissingDefinition`] for an unresolvable `$ref` and
/// [`SchemaError::CircularReference`] for a reference chain that loops.
pub fn retrieve_schema(
    cx: &SchemaContext<'_>,
    schema: &Value,
    data: Option<&Value>,
) -> Result<Value, SchemaError> {
    match schema {
        Value::Object(map) => retrieve_map(cx, map, data).map(Value::Object),
        _ => Ok(Value::Object(Map::new())),
    }
}

pub(crate) fn retrieve_map(
    cx: &SchemaContext<'_>,
    schema: &Map<String, Value>,
    data: Option<&Value>,
) -> Result<Map<String, Value>, SchemaError> {
    let resolved = resolve_schema(cx, schema, data)?;
    if has_additional_properties(&resolved) {
        stub_existing_additional_properties(cx, resolved, data)
    } else {
        Ok(resolved)
    }
}

fn has_additional_properties(schema: &Map<String, Value>) -> bool {
    matches!(schema.get("additionalProperties"), Some(v) if *v != Value::Bool(false))
}

fn resolve_schema(
    cx: &SchemaContext<'_>,
    schema: &Map<String, Value>,
    data: Option<&Value>,
) -> Result<Map<String, Value>, SchemaError> {
    if schema.contains_key("$ref") {
        resolve_reference(cx, schema, data)
    } else if schema.contains_key("dependencies") {
        let resolved = dependencies::resolve_dependencies(cx, schema, data)?;
        retrieve_map(cx, &resolved, data)
    } else {
        Ok(schema.clone())
    }
}

/// Replace a `$ref` node by its target, local keys winning, then resolve the
/// merged schema.
pub(crate) fn resolve_reference(
    cx: &SchemaContext<'_>,
    schema: &Map<String, Value>,
    data: Option<&Value>,
) -> Result<Map<String, Value>, SchemaError> {
    let mut seen: Vec<String> = Vec::new();
    let mut current = schema.clone();

    while let Some(reference) = current.remove("$ref") {
        let reference = reference.as_str().unwrap_or_default().to_string();
        if seen.contains(&reference) {
            return Err(SchemaError::CircularReference { reference });
        }
        debug!("resolving {reference}");

        let target = find_schema_definition(&reference, cx.definitions())?;
        let mut merged = target.as_object().cloned().unwrap_or_default();
        merged.extend(current);
        current = merged;
        seen.push(reference);
    }

    retrieve_map(cx, &current, data)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_ref_local_override_wins() {
        let defs = json!({"X": {"type": "string", "title": "orig"}});
        let cx = SchemaContext::new(&defs);
        let schema = json!({"$ref": "#/definitions/X", "title": "T"});

        let resolved = retrieve_schema(&cx, &schema, None).unwrap();
        assert_eq!(resolved, json!({"type": "string", "title": "T"}));
    }

    #[test]
    fn test_chained_refs() {
        let defs = json!({
            "a": {"$ref": "#/definitions/b", "description": "from a"},
            "b": {"type": "integer", "description": "from b"}
        });
        let cx = SchemaContext::new(&defs);

        let resolved = retrieve_schema(&cx, &json!({"$ref": "#/definitions/a"}), None).unwrap();
        assert_eq!(resolved, json!({"type": "integer", "description": "from a"}));
    }

    #[test]
    fn test_ref_then_dependencies() {
        let defs = json!({
            "person": {
                "type": "object",
                "properties": {"name": {"type": "string"}, "email": {"type": "string"}},
                "dependencies": {"name": ["email"]}
            }
        });
        let cx = SchemaContext::new(&defs);
        let data = json!({"name": "ada"});

        let schema = json!({"$ref": "#/definitions/person"});
        let resolved = retrieve_schema(&cx, &schema, Some(&data)).unwrap();
        assert_eq!(resolved["required"], json!(["email"]));
        assert!(resolved.get("dependencies").is_none());
        assert!(resolved.get("$ref").is_none());
    }

    #[test]
    fn test_unresolvable_ref_is_error() {
        let defs = json!({});
        let cx = SchemaContext::new(&defs);
        let err = retrieve_schema(&cx, &json!({"$ref": "#/definitions/nope"}), None).unwrap_err();
        assert_eq!(err, SchemaError::missing("#/definitions/nope"));
    }

    #[test]
    fn test_circular_ref_is_error() {
        let defs = json!({
            "a": {"$ref": "#/definitions/b"},
            "b": {"$ref": "#/definitions/a"}
        });
        let cx = SchemaContext::new(&defs);
        let err = retrieve_schema(&cx, &json!({"$ref": "#/definitions/a"}), None).unwrap_err();
        assert!(matches!(err, SchemaError::CircularReference { .. }));
    }

    #[test]
    fn test_recursive_definition_resolves_one_level() {
        let defs = json!({
            "node": {
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "children": {"type": "array", "items": {"$ref": "#/definitions/node"}}
                }
            }
        });
        let cx = SchemaContext::new(&defs);
        let resolved = retrieve_schema(&cx, &json!({"$ref": "#/definitions/node"}), None).unwrap();
        assert_eq!(
            resolved["properties"]["children"]["items"],
            json!({"$ref": "#/definitions/node"})
        );
    }

    #[test]
    fn test_plain_and_non_object_schemas() {
        let cx = SchemaContext::default();
        let schema = json!({"type": "string", "title": "plain"});
        assert_eq!(retrieve_schema(&cx, &schema, None).unwrap(), schema);
        assert_eq!(retrieve_schema(&cx, &json!(true), None).unwrap(), json!({}));
    }

    #[test]
    fn test_idempotent() {
        let defs = json!({
            "address": {
                "type": "object",
                "properties": {"street": {"type": "string"}},
                "additionalProperties": {"type": "string"},
                "dependencies": {"street": {"properties": {"zip": {"type": "string"}}}}
            }
        });
        let cx = SchemaContext::new(&defs);
        let data = json!({"street": "Main", "note": "back door"});
        let schema = json!({"$ref": "#/definitions/address", "title": "Address"});

        let once = retrieve_schema(&cx, &schema, Some(&data)).unwrap();
        let twice = retrieve_schema(&cx, &once, Some(&data)).unwrap();
        assert_eq!(once, twice);
        assert!(once["properties"].get("zip").is_some());
        assert_eq!(once["properties"]["note"][ADDITIONAL_PROPERTY_FLAG], json!(true));
    }

    #[test]
    fn test_input_schema_untouched() {
        let defs = json!({"X": {"type": "object", "additionalProperties": true}});
        let cx = SchemaContext::new(&defs);
        let schema = json!({"$ref": "#/definitions/X"});
        let snapshot = schema.clone();
        let defs_snapshot = defs.clone();

        retrieve_schema(&cx, &schema, Some(&json!({"k": 1}))).unwrap();
        assert_eq!(schema, snapshot);
        assert_eq!(defs, defs_snapshot);
    }
}
