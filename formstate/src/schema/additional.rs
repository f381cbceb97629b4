//! Property schemas for data allowed by `additionalProperties`.

use serde_json::{Map, Value, json};

use super::{SchemaError, retrieve_schema};
use crate::{context::SchemaContext, utils::guess_type};

/// Marker set on a property schema that was synthesized from the data rather
/// than declared in `properties`.
pub const ADDITIONAL_PROPERTY_FLAG: &str = "__additional_property";

/// Give every key of `data` that `schema` does not declare a property schema.
///
/// The stub is the `additionalProperties` schema when it has a `$ref`
/// (resolved against the property's value) or a `type`; otherwise a schema
/// whose `type` is guessed from the value. Each stub carries
/// [`ADDITIONAL_PROPERTY_FLAG`]. Declared properties are never touched.
pub fn stub_existing_additional_properties(
    cx: &SchemaContext<'_>,
    mut schema: Map<String, Value>,
    data: Option<&Value>,
) -> Result<Map<String, Value>, SchemaError> {
    let mut properties = match schema.get("properties") {
        Some(Value::Object(properties)) => properties.clone(),
        _ => Map::new(),
    };
    let additional = schema.get("additionalProperties").cloned().unwrap_or(Value::Null);

    if let Some(Value::Object(fields)) = data {
        for (key, value) in fields {
            if properties.contains_key(key) {
                continue;
            }

            let stub = match &additional {
                Value::Object(ap) if ap.contains_key("$ref") => {
                    retrieve_schema(cx, &json!({ "$ref": ap["$ref"] }), Some(value))?
                }
                Value::Object(ap) if ap.contains_key("type") => additional.clone(),
                _ => json!({ "type": guess_type(value) }),
            };

            let mut stub = match stub {
                Value::Object(stub) => stub,
                _ => Map::new(),
            };
            stub.insert(ADDITIONAL_PROPERTY_FLAG.to_string(), Value::Bool(true));
            properties.insert(key.clone(), Value::Object(stub));
        }
    }

    schema.insert("properties".to_string(), Value::Object(properties));
    Ok(schema)
}
