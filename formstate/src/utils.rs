//! Generic value helpers and schema shape predicates.
//!
//! The first half of this module works on arbitrary JSON values
//! ([`deep_equals`], [`merge_objects`], [`guess_type`]); the second half
//! answers questions about a schema's shape that renderers and the defaults
//! computation both need.

use serde_json::{Map, Number, Value};

use crate::{
    context::SchemaContext,
    schema::{SchemaError, retrieve_schema},
};

/// Structural equality.
///
/// Objects compare as key sets regardless of order, arrays element by
/// element, and numbers by value, so `1` equals `1.0`.
pub fn deep_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, x)| b.get(k).is_some_and(|y| deep_equals(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Merge `b` into a copy of `a`.
///
/// When `a` already has a key and `b`'s value for it is an object, the two
/// are merged recursively. With `concat_arrays`, two arrays under the same
/// key become `a`'s elements followed by `b`'s. Otherwise `b`'s value wins.
pub fn merge_objects(
    a: &Map<String, Value>,
    b: &Map<String, Value>,
    concat_arrays: bool,
) -> Map<String, Value> {
    let mut acc = a.clone();
    for (key, right) in b {
        let merged = match (a.get(key), right) {
            (Some(left), Value::Object(right)) => {
                let empty = Map::new();
                let left = left.as_object().unwrap_or(&empty);
                Value::Object(merge_objects(left, right, concat_arrays))
            }
            (Some(Value::Array(left)), Value::Array(right)) if concat_arrays => {
                Value::Array(left.iter().chain(right).cloned().collect())
            }
            _ => right.clone(),
        };
        acc.insert(key.clone(), merged);
    }
    acc
}

/// Merge schema `b` into a copy of schema `a`.
///
/// Sub-schemas merge recursively. When either side is an object schema,
/// `required` lists are unioned without duplicates. Any other keyword,
/// arrays such as `enum` included, is taken from `b`.
pub fn merge_schemas(a: &Map<String, Value>, b: &Map<String, Value>) -> Map<String, Value> {
    let mut acc = a.clone();
    let object_schema = is_object_schema(a) || is_object_schema(b);
    for (key, right) in b {
        let merged = match (a.get(key), right) {
            (Some(left), Value::Object(right)) => {
                let empty = Map::new();
                let left = left.as_object().unwrap_or(&empty);
                Value::Object(merge_schemas(left, right))
            }
            (Some(Value::Array(left)), Value::Array(right))
                if object_schema && key == "required" =>
            {
                let mut union = left.clone();
                for name in right {
                    if !union.contains(name) {
                        union.push(name.clone());
                    }
                }
                Value::Array(union)
            }
            _ => right.clone(),
        };
        acc.insert(key.clone(), merged);
    }
    acc
}

fn is_object_schema(schema: &Map<String, Value>) -> bool {
    match schema.get("type") {
        Some(Value::String(name)) => name == "object",
        Some(Value::Array(names)) => names.iter().any(|n| n == "object"),
        _ => schema.contains_key("properties") || schema.contains_key("additionalProperties"),
    }
}

/// JSON Schema `type` name describing a runtime value.
pub fn guess_type(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::Object(_) => "object",
    }
}

/// JavaScript-style truthiness: `null`, `false`, `0` and `""` are falsy.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Value of `key` when `data` is an object.
pub(crate) fn field<'a>(data: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    data.and_then(Value::as_object).and_then(|m| m.get(key))
}

/// A schema that admits exactly one value: a single-entry `enum` or a `const`.
pub fn is_constant(schema: &Value) -> bool {
    matches!(schema.get("enum"), Some(Value::Array(values)) if values.len() == 1)
        || schema.get("const").is_some()
}

/// The single value a constant schema admits.
///
/// # Errors
///
/// [`SchemaError::NotConstant`] unless [`is_constant`] holds.
pub fn to_constant(schema: &Value) -> Result<Value, SchemaError> {
    match (schema.get("enum"), schema.get("const")) {
        (Some(Value::Array(values)), _) if values.len() == 1 => Ok(values[0].clone()),
        (_, Some(constant)) => Ok(constant.clone()),
        _ => Err(SchemaError::NotConstant),
    }
}

/// One selectable choice of an enumeration.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumOption {
    pub label: String,
    pub value: Value,
}

fn label_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Choices of an enumeration schema.
///
/// Reads `enum` (labels from `enumNames` when given) or, failing that, a
/// `oneOf`/`anyOf` whose alternatives are all constants (labels from each
/// alternative's `title`). Returns `Ok(None)` for schemas that are neither.
///
/// # Errors
///
/// [`SchemaError::NotConstant`] if an alternative is not a constant.
pub fn options_list(schema: &Value) -> Result<Option<Vec<EnumOption>>, SchemaError> {
    if let Some(Value::Array(values)) = schema.get("enum") {
        let names = schema.get("enumNames").and_then(Value::as_array);
        let options = values
            .iter()
            .enumerate()
            .map(|(i, value)| EnumOption {
                label: names
                    .and_then(|n| n.get(i))
                    .map(label_of)
                    .unwrap_or_else(|| label_of(value)),
                value: value.clone(),
            })
            .collect();
        return Ok(Some(options));
    }

    let alternatives = schema
        .get("oneOf")
        .or_else(|| schema.get("anyOf"))
        .and_then(Value::as_array);
    let Some(alternatives) = alternatives else {
        return Ok(None);
    };

    alternatives
        .iter()
        .map(|alt| {
            let value = to_constant(alt)?;
            let label = alt
                .get("title")
                .map(label_of)
                .unwrap_or_else(|| label_of(&value));
            Ok(EnumOption { label, value })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Whether a schema is a closed enumeration.
///
/// # Errors
///
/// Propagates resolution errors.
pub fn is_select(cx: &SchemaContext<'_>, schema: &Value) -> Result<bool, SchemaError> {
    let schema = retrieve_schema(cx, schema, None)?;
    if let Some(Value::Array(_)) = schema.get("enum") {
        return Ok(true);
    }
    let alternatives = schema
        .get("oneOf")
        .or_else(|| schema.get("anyOf"))
        .and_then(Value::as_array);
    Ok(alternatives.is_some_and(|alts| alts.iter().all(is_constant)))
}

/// Whether an array schema is a set of choices: `uniqueItems` over a closed enumeration.
///
/// # Errors
///
/// Propagates resolution errors.
pub fn is_multi_select(cx: &SchemaContext<'_>, schema: &Value) -> Result<bool, SchemaError> {
    let unique = schema.get("uniqueItems").and_then(Value::as_bool) == Some(true);
    match schema.get("items") {
        Some(items @ Value::Object(_)) if unique => is_select(cx, items),
        _ => Ok(false),
    }
}

/// Whether `items` is a non-empty list of object schemas (a fixed-size tuple).
pub fn is_fixed_items(schema: &Value) -> bool {
    matches!(
        schema.get("items"),
        Some(Value::Array(items)) if !items.is_empty() && items.iter().all(Value::is_object)
    )
}

/// Whether a tuple array accepts entries beyond its fixed items.
///
/// Only an `additionalItems` schema counts; `additionalItems: true` is
/// reported as unsupported.
pub fn allow_additional_items(cx: &SchemaContext<'_>, schema: &Value) -> bool {
    match schema.get("additionalItems") {
        Some(Value::Bool(true)) => {
            cx.warn("additionalItems=true is currently not supported");
            false
        }
        Some(additional) => additional.is_object(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_deep_equals() {
        assert!(deep_equals(&json!({"a": 1, "b": [1, 2]}), &json!({"b": [1, 2], "a": 1})));
        assert!(deep_equals(&json!(1), &json!(1.0)));
        assert!(!deep_equals(&json!({"a": 1}), &json!({"a": 1, "b": null})));
        assert!(!deep_equals(&json!([1, 2]), &json!([2, 1])));
        assert!(!deep_equals(&json!("1"), &json!(1)));
        assert!(deep_equals(&json!(null), &json!(null)));
    }

    #[test]
    fn test_merge_objects_recursive() {
        let a = json!({"a": 1, "b": {"x": 1, "y": 2}, "list": [1]});
        let b = json!({"b": {"y": 3, "z": 4}, "c": true, "list": [2]});
        let merged = merge_objects(a.as_object().unwrap(), b.as_object().unwrap(), false);
        assert_eq!(
            Value::Object(merged),
            json!({"a": 1, "b": {"x": 1, "y": 3, "z": 4}, "c": true, "list": [2]})
        );
    }

    #[test]
    fn test_merge_objects_concat_arrays() {
        let a = json!({"required": ["a"], "nested": {"required": ["x"]}});
        let b = json!({"required": ["b"], "nested": {"required": ["y"]}});
        let merged = merge_objects(a.as_object().unwrap(), b.as_object().unwrap(), true);
        assert_eq!(
            Value::Object(merged),
            json!({"required": ["a", "b"], "nested": {"required": ["x", "y"]}})
        );
    }

    #[test]
    fn test_merge_schemas_unions_required() {
        let a = json!({"type": "object", "required": ["a"]});
        let b = json!({"required": ["a", "b"]});
        let merged = merge_schemas(a.as_object().unwrap(), b.as_object().unwrap());
        assert_eq!(Value::Object(merged), json!({"type": "object", "required": ["a", "b"]}));
    }

    #[test]
    fn test_merge_schemas_right_array_wins() {
        let a = json!({
            "type": "object",
            "properties": {"size": {"type": "string", "enum": ["s", "m", "l"]}}
        });
        let b = json!({"properties": {"size": {"enum": ["s"]}}});
        let merged = merge_schemas(a.as_object().unwrap(), b.as_object().unwrap());
        assert_eq!(
            merged["properties"]["size"],
            json!({"type": "string", "enum": ["s"]})
        );
    }

    #[test]
    fn test_merge_schemas_required_on_non_object_schema() {
        let a = json!({"type": "string", "required": ["a"]});
        let b = json!({"required": ["b"]});
        let merged = merge_schemas(a.as_object().unwrap(), b.as_object().unwrap());
        assert_eq!(merged["required"], json!(["b"]));
    }

    #[test]
    fn test_merge_objects_does_not_mutate() {
        let a = json!({"a": {"b": 1}, "list": [1]});
        let b = json!({"a": {"c": 2}, "list": [2]});
        let (snap_a, snap_b) = (a.clone(), b.clone());
        let _ = merge_objects(a.as_object().unwrap(), b.as_object().unwrap(), true);
        assert_eq!(a, snap_a);
        assert_eq!(b, snap_b);
    }

    #[test]
    fn test_merge_object_over_scalar() {
        let a = json!({"k": 5});
        let b = json!({"k": {"x": 1}});
        let merged = merge_objects(a.as_object().unwrap(), b.as_object().unwrap(), false);
        assert_eq!(Value::Object(merged), json!({"k": {"x": 1}}));
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!("0")));
    }

    #[test]
    fn test_constants() {
        assert!(is_constant(&json!({"enum": ["one"]})));
        assert!(is_constant(&json!({"const": 0})));
        assert!(!is_constant(&json!({"enum": ["one", "two"]})));
        assert_eq!(to_constant(&json!({"const": false})).unwrap(), json!(false));
        assert_eq!(to_constant(&json!({"enum": ["one"]})).unwrap(), json!("one"));
        assert_eq!(to_constant(&json!({"type": "string"})), Err(SchemaError::NotConstant));
    }

    #[test]
    fn test_options_list() {
        let from_enum = options_list(&json!({"enum": ["a", 2], "enumNames": ["Alpha"]}))
            .unwrap()
            .unwrap();
        assert_eq!(
            from_enum,
            vec![
                EnumOption { label: "Alpha".into(), value: json!("a") },
                EnumOption { label: "2".into(), value: json!(2) },
            ]
        );

        let from_one_of = options_list(&json!({
            "oneOf": [{"const": "x", "title": "Ex"}, {"enum": ["y"]}]
        }))
        .unwrap()
        .unwrap();
        assert_eq!(from_one_of[0].label, "Ex");
        assert_eq!(from_one_of[1].value, json!("y"));

        assert_eq!(options_list(&json!({"type": "string"})).unwrap(), None);
        assert!(options_list(&json!({"anyOf": [{"type": "string"}]})).is_err());
    }

    #[test]
    fn test_select_and_multi_select() {
        let defs = json!({"colors": {"enum": ["red", "green"]}});
        let cx = SchemaContext::new(&defs);

        assert!(is_select(&cx, &json!({"$ref": "#/definitions/colors"})).unwrap());
        assert!(is_select(&cx, &json!({"oneOf": [{"const": 1}, {"const": 2}]})).unwrap());
        assert!(!is_select(&cx, &json!({"oneOf": [{"const": 1}, {"type": "number"}]})).unwrap());
        assert!(!is_select(&cx, &json!({"type": "string"})).unwrap());

        let multi = json!({
            "type": "array",
            "uniqueItems": true,
            "items": {"$ref": "#/definitions/colors"}
        });
        assert!(is_multi_select(&cx, &multi).unwrap());

        let not_unique = json!({"type": "array", "items": {"enum": ["a"]}});
        assert!(!is_multi_select(&cx, &not_unique).unwrap());
    }

    #[test]
    fn test_fixed_items() {
        assert!(is_fixed_items(&json!({"items": [{"type": "string"}, {}]})));
        assert!(!is_fixed_items(&json!({"items": []})));
        assert!(!is_fixed_items(&json!({"items": [true]})));
        assert!(!is_fixed_items(&json!({"items": {"type": "string"}})));
    }

    #[test]
    fn test_allow_additional_items() {
        let seen = Mutex::new(Vec::new());
        let sink = |msg: &str| seen.lock().unwrap().push(msg.to_string());
        let cx = SchemaContext::default().with_diagnostics(&sink);

        assert!(allow_additional_items(&cx, &json!({"additionalItems": {"type": "number"}})));
        assert!(!allow_additional_items(&cx, &json!({"items": []})));
        assert!(!allow_additional_items(&cx, &json!({"additionalItems": true})));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
