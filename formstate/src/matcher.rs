//! Selection of the `oneOf`/`anyOf` alternative matching the current data.

use serde_json::{Map, Value, json};

use crate::context::SchemaContext;

/// Index of the first alternative in `options` that `data` satisfies.
///
/// An object alternative with `properties` would accept any object that
/// merely lacks conflicting keys, so it is tightened before validation: at
/// least one of its declared properties must be present (an `anyOf` of
/// single-key `required` clauses, put under `allOf` when the alternative has
/// its own `anyOf`), and its own `required` list is dropped because the form
/// may not be filled in yet.
///
/// An alternative declaring an empty `properties` map never matches.
/// Absent data is validated as `null`. When nothing matches, `0` is returned
/// so callers always have a branch to render.
pub fn get_matching_option(
    cx: &SchemaContext<'_>,
    data: Option<&Value>,
    options: &[Value],
) -> usize {
    let root = cx.root_schema();
    let instance = data.unwrap_or(&Value::Null);

    for (index, option) in options.iter().enumerate() {
        let matched = match option.get("properties").and_then(Value::as_object) {
            // No declared key can ever be present.
            Some(properties) if properties.is_empty() => false,
            Some(properties) => {
                let augmented = require_any_property(option, properties);
                cx.validator().is_valid(&augmented, instance, &root)
            }
            None => cx.validator().is_valid(option, instance, &root),
        };
        if matched {
            trace!("option {index} matches");
            return index;
        }
    }
    0
}

fn require_any_property(option: &Value, properties: &Map<String, Value>) -> Value {
    let requires_any_of: Vec<Value> = properties
        .keys()
        .map(|key| json!({ "required": [key] }))
        .collect();

    let mut augmented = option.as_object().cloned().unwrap_or_default();
    if augmented.contains_key("anyOf") {
        let clause = json!({ "anyOf": requires_any_of });
        match augmented.get_mut("allOf") {
            Some(Value::Array(all_of)) => all_of.push(clause),
            _ => {
                augmented.insert("allOf".to_string(), Value::Array(vec![clause]));
            }
        }
    } else {
        augmented.insert("anyOf".to_string(), Value::Array(requires_any_of));
    }
    augmented.remove("required");
    Value::Object(augmented)
}
