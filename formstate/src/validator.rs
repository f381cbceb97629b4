//! Validation engine.
//!
//! Option matching and `oneOf` dependencies only need a yes/no answer from a
//! validator; [`Validator::validate`] additionally reports every error and
//! arranges them in an [`ErrorSchema`] shaped like the data.

use indexmap::IndexMap;
use jsonschema::Draft;
use serde::Serialize;
use serde_json::Value;

use crate::schema::reference::split_pointer;

/// A JSON Schema validation engine.
pub trait Validator: Send + Sync {
    /// Whether `data` satisfies `schema`.
    ///
    /// `root_schema` carries the `definitions` that `$ref`s inside `schema`
    /// point at. A schema the engine cannot compile is not satisfied by
    /// anything.
    fn is_valid(&self, schema: &Value, data: &Value, root_schema: &Value) -> bool;

    /// Validate `data` against `schema` and report every error.
    fn validate(&self, data: &Value, schema: &Value) -> ValidationReport;
}

/// One validation failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// Dotted path of the failing value, `""` for the root.
    pub property: String,
    pub message: String,
    /// `property` and `message` on one line.
    pub stack: String,
}

impl ValidationIssue {
    fn new(segments: &[String], message: String) -> Self {
        let property: String = segments.iter().map(|s| format!(".{s}")).collect();
        let stack = format!("{property} {message}").trim().to_string();
        Self {
            property,
            message,
            stack,
        }
    }
}

/// Outcome of [`Validator::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub error_schema: ErrorSchema,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validation messages nested by data path.
///
/// Serializes as `{"__errors": [...], "<key>": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorSchema {
    #[serde(rename = "__errors", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(flatten)]
    pub children: IndexMap<String, ErrorSchema>,
}

impl ErrorSchema {
    /// Record `message` under the node at `path`, creating nodes on the way.
    pub fn add_error(&mut self, path: &[String], message: impl Into<String>) {
        let mut node = self;
        for segment in path {
            node = node.children.entry(segment.clone()).or_default();
        }
        node.errors.push(message.into());
    }

    /// Child node for a property name or array index.
    pub fn get(&self, key: &str) -> Option<&ErrorSchema> {
        self.children.get(key)
    }

    /// Flatten into `"<field>: <message>"` lines, the root named `root`.
    pub fn to_error_list(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect("root", &mut out);
        out
    }

    fn collect(&self, name: &str, out: &mut Vec<String>) {
        out.extend(self.errors.iter().map(|msg| format!("{name}: {msg}")));
        for (key, child) in &self.children {
            child.collect(key, out);
        }
    }
}

/// [`Validator`] backed by the `jsonschema` crate, using Draft 7.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSchemaValidator;

impl JsonSchemaValidator {
    fn compile(schema: &Value) -> Result<jsonschema::Validator, String> {
        jsonschema::options()
            .with_draft(Draft::Draft7)
            .build(schema)
            .map_err(|err| err.to_string())
    }
}

/// Copy `definitions` from the root schema into `schema` so that local
/// `#/definitions/...` pointers resolve.
fn with_root_definitions(schema: &Value, root_schema: &Value) -> Value {
    let mut document = schema.clone();
    let definitions = root_schema.get("definitions");
    if let (Value::Object(map), Some(definitions)) = (&mut document, definitions) {
        if !map.contains_key("definitions") && definitions.is_object() {
            map.insert("definitions".to_string(), definitions.clone());
        }
    }
    document
}

impl Validator for JsonSchemaValidator {
    fn is_valid(&self, schema: &Value, data: &Value, root_schema: &Value) -> bool {
        let document = with_root_definitions(schema, root_schema);
        match Self::compile(&document) {
            Ok(validator) => validator.is_valid(data),
            Err(err) => {
                debug!("schema does not compile, treating as invalid: {err}");
                false
            }
        }
    }

    fn validate(&self, data: &Value, schema: &Value) -> ValidationReport {
        let mut report = ValidationReport::default();
        let issues: Vec<ValidationIssue> = match Self::compile(schema) {
            Ok(validator) => validator
                .iter_errors(data)
                .map(|err| {
                    let path = split_pointer(&err.instance_path.to_string());
                    ValidationIssue::new(&path, err.to_string())
                })
                .collect(),
            Err(err) => vec![ValidationIssue::new(&[], format!("invalid schema: {err}"))],
        };

        for issue in issues {
            let path = split_property(&issue.property);
            report.error_schema.add_error(&path, issue.message.clone());
            report.errors.push(issue);
        }
        report
    }
}

fn split_property(property: &str) -> Vec<String> {
    property
        .split('.')
        .skip(1)
        .map(str::to_string)
        .collect()
}
