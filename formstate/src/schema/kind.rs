//! Classification of schema nodes.

use std::fmt;

use serde_json::{Map, Value};

use crate::utils::{guess_type, is_fixed_items};

/// Primitive JSON Schema `type` names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
}

impl SchemaType {
    /// Parse a `type` keyword value.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "string" => SchemaType::String,
            "number" => SchemaType::Number,
            "integer" => SchemaType::Integer,
            "boolean" => SchemaType::Boolean,
            "object" => SchemaType::Object,
            "array" => SchemaType::Array,
            "null" => SchemaType::Null,
            _ => return None,
        })
    }

    /// The keyword spelling of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::Null => "null",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective type of a schema node.
///
/// Falls back to what `const`, `enum` or `properties` imply when `type` is
/// missing. A nullable pair such as `["string", "null"]` yields the non-null
/// member; any other list of types has no single effective type.
pub fn get_schema_type(schema: &Value) -> Option<SchemaType> {
    match schema.get("type") {
        Some(Value::String(name)) => SchemaType::from_name(name),
        Some(Value::Array(names)) => {
            if names.len() == 2 && names.iter().any(|n| n == "null") {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .find(|n| *n != "null")
                    .and_then(SchemaType::from_name)
            } else {
                None
            }
        }
        Some(_) => None,
        None => {
            if let Some(constant) = schema.get("const") {
                SchemaType::from_name(guess_type(constant))
            } else if schema.get("enum").is_some() {
                Some(SchemaType::String)
            } else if schema.get("properties").is_some()
                || schema.get("additionalProperties").is_some()
            {
                Some(SchemaType::Object)
            } else {
                None
            }
        }
    }
}

/// How a schema node is processed, decided once per node.
///
/// The variants are checked in declaration order: a node carrying both a
/// `$ref` and `dependencies` is a [`SchemaKind::Ref`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchemaKind<'a> {
    /// `$ref` indirection into the definitions table.
    Ref(&'a str),
    /// Property or schema `dependencies` to expand against the data.
    Dependent(&'a Map<String, Value>),
    /// `items` is a sequence of object schemas.
    FixedTuple(&'a [Value]),
    /// `oneOf` or `anyOf` alternatives.
    Polymorphic(&'a [Value]),
    Object,
    Array,
    Scalar,
}

impl<'a> SchemaKind<'a> {
    pub fn of(schema: &'a Value) -> Self {
        if let Some(reference) = schema.get("$ref") {
            return SchemaKind::Ref(reference.as_str().unwrap_or_default());
        }
        if let Some(Value::Object(dependencies)) = schema.get("dependencies") {
            return SchemaKind::Dependent(dependencies);
        }
        if is_fixed_items(schema) {
            if let Some(Value::Array(items)) = schema.get("items") {
                return SchemaKind::FixedTuple(items);
            }
        }
        if let Some(Value::Array(options)) = schema.get("oneOf") {
            return SchemaKind::Polymorphic(options);
        }
        if let Some(Value::Array(options)) = schema.get("anyOf") {
            return SchemaKind::Polymorphic(options);
        }
        match get_schema_type(schema) {
            Some(SchemaType::Object) => SchemaKind::Object,
            Some(SchemaType::Array) => SchemaKind::Array,
            _ => SchemaKind::Scalar,
        }
    }

    /// Whether the node must go through the resolver before its shape can be inspected.
    pub fn needs_resolution(&self) -> bool {
        matches!(self, SchemaKind::Ref(_) | SchemaKind::Dependent(_))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_schema_type_inference() {
        assert_eq!(get_schema_type(&json!({"type": "integer"})), Some(SchemaType::Integer));
        assert_eq!(get_schema_type(&json!({"const": 3})), Some(SchemaType::Number));
        assert_eq!(get_schema_type(&json!({"enum": ["a", "b"]})), Some(SchemaType::String));
        assert_eq!(get_schema_type(&json!({"properties": {}})), Some(SchemaType::Object));
        assert_eq!(
            get_schema_type(&json!({"additionalProperties": true})),
            Some(SchemaType::Object)
        );
        assert_eq!(
            get_schema_type(&json!({"type": ["null", "array"]})),
            Some(SchemaType::Array)
        );
        assert_eq!(get_schema_type(&json!({"type": ["string", "number"]})), None);
        assert_eq!(get_schema_type(&json!({})), None);
    }

    #[test]
    fn test_kind_precedence() {
        let both = json!({"$ref": "#/definitions/a", "dependencies": {"x": ["y"]}});
        assert_eq!(SchemaKind::of(&both), SchemaKind::Ref("#/definitions/a"));

        let dependent = json!({"type": "object", "dependencies": {"x": ["y"]}});
        assert!(matches!(SchemaKind::of(&dependent), SchemaKind::Dependent(_)));
        assert!(SchemaKind::of(&dependent).needs_resolution());

        let tuple = json!({"type": "array", "items": [{"type": "string"}, {"type": "number"}]});
        assert!(matches!(
            SchemaKind::of(&tuple),
            SchemaKind::FixedTuple(items) if items.len() == 2
        ));

        let poly = json!({"anyOf": [{"type": "string"}]});
        assert!(matches!(SchemaKind::of(&poly), SchemaKind::Polymorphic(_)));

        assert_eq!(SchemaKind::of(&json!({"type": "array"})), SchemaKind::Array);
        assert_eq!(SchemaKind::of(&json!({"type": "boolean"})), SchemaKind::Scalar);
        assert!(!SchemaKind::of(&json!({"type": "object"})).needs_resolution());
    }
}
