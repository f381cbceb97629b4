//! `$ref` lookup in the definitions table.

use std::borrow::Cow;

use serde_json::Value;

use super::SchemaError;

const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Upper bound on `$ref` hops taken while walking a single reference.
const MAX_REFERENCE_HOPS: usize = 64;

/// Unescape one JSON Pointer segment (`~1` is `/`, `~0` is `~`).
pub fn unescape_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') {
        Cow::Owned(segment.replace("~1", "/").replace("~0", "~"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Split a JSON Pointer (`/a/b~1c`) into unescaped segments.
pub fn split_pointer(pointer: &str) -> Vec<String> {
    pointer
        .strip_prefix('#')
        .unwrap_or(pointer)
        .split('/')
        .skip(1)
        .map(|s| unescape_segment(s).into_owned())
        .collect()
}

/// Look up the schema a `#/definitions/...` reference points at.
///
/// Every `/` separated segment is unescaped and walked from the definitions
/// root; a node met on the way that is itself a `$ref` is followed first.
///
/// # Errors
///
/// [`SchemaError::MissingDefinition`] when the reference has another form or
/// any segment is absent, [`SchemaError::CircularReference`] when chained
/// references do not terminate.
pub fn find_schema_definition<'a>(
    reference: &str,
    definitions: &'a Value,
) -> Result<&'a Value, SchemaError> {
    lookup(reference, definitions, 0)
}

fn lookup<'a>(
    reference: &str,
    definitions: &'a Value,
    hops: usize,
) -> Result<&'a Value, SchemaError> {
    if hops > MAX_REFERENCE_HOPS {
        return Err(SchemaError::CircularReference {
            reference: reference.to_string(),
        });
    }

    let path = reference
        .strip_prefix(DEFINITIONS_PREFIX)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| SchemaError::missing(reference))?;

    let mut current = definitions;
    let mut hops = hops;
    for part in path.split('/') {
        let part = unescape_segment(part);
        while let Some(next) = current.get("$ref").and_then(Value::as_str) {
            hops += 1;
            current = lookup(next, definitions, hops)?;
        }
        current = child(current, &part).ok_or_else(|| SchemaError::missing(reference))?;
    }
    trace!("resolved {reference}");
    Ok(current)
}

fn child<'a>(node: &'a Value, segment: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(segment),
        Value::Array(list) => segment.parse::<usize>().ok().and_then(|i| list.get(i)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_unescape_segment() {
        assert_eq!(unescape_segment("plain"), "plain");
        assert_eq!(unescape_segment("a~1b"), "a/b");
        assert_eq!(unescape_segment("a~0b"), "a~b");
        assert_eq!(unescape_segment("~01"), "~1");
    }

    #[test]
    fn test_split_pointer() {
        assert_eq!(split_pointer(""), Vec::<String>::new());
        assert_eq!(split_pointer("/a/0/b~1c"), vec!["a", "0", "b/c"]);
        assert_eq!(split_pointer("#/definitions/x"), vec!["definitions", "x"]);
    }

    #[test]
    fn test_find_nested_and_escaped() {
        let defs = json!({
            "a/b": {"type": "string"},
            "group": {"inner": {"type": "number"}},
            "tuple": [{"type": "null"}, {"type": "boolean"}]
        });
        assert_eq!(
            find_schema_definition("#/definitions/a~1b", &defs).unwrap(),
            &json!({"type": "string"})
        );
        assert_eq!(
            find_schema_definition("#/definitions/group/inner", &defs).unwrap(),
            &json!({"type": "number"})
        );
        assert_eq!(
            find_schema_definition("#/definitions/tuple/1", &defs).unwrap(),
            &json!({"type": "boolean"})
        );
    }

    #[test]
    fn test_follows_intermediate_refs() {
        let defs = json!({
            "alias": {"$ref": "#/definitions/target"},
            "target": {"leaf": {"type": "integer"}}
        });
        assert_eq!(
            find_schema_definition("#/definitions/alias/leaf", &defs).unwrap(),
            &json!({"type": "integer"})
        );
    }

    #[test]
    fn test_missing_definition() {
        let defs = json!({"a": {}});
        assert_eq!(
            find_schema_definition("#/definitions/b", &defs),
            Err(SchemaError::missing("#/definitions/b"))
        );
        assert!(find_schema_definition("#/components/a", &defs).is_err());
        assert!(find_schema_definition("#/definitions/", &defs).is_err());
    }

    #[test]
    fn test_self_referencing_chain_terminates() {
        let defs = json!({
            "loop": {"$ref": "#/definitions/loop"}
        });
        assert!(matches!(
            find_schema_definition("#/definitions/loop/x", &defs),
            Err(SchemaError::CircularReference { .. })
        ));
    }
}
