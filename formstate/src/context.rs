//! Resolution context.

use serde_json::{Map, Value, json};

use crate::{
    diagnostics::{Diagnostics, LogDiagnostics},
    validator::{JsonSchemaValidator, Validator},
};

static DEFAULT_VALIDATOR: JsonSchemaValidator = JsonSchemaValidator;
static DEFAULT_DIAGNOSTICS: LogDiagnostics = LogDiagnostics;
static NO_DEFINITIONS: Value = Value::Null;

/// Everything a resolution call needs besides the schema and the data.
///
/// The context only borrows its parts and is `Copy`; build one per
/// definitions table and pass it to [`retrieve_schema`](crate::retrieve_schema),
/// [`get_default_form_state`](crate::get_default_form_state) and friends.
#[derive(Clone, Copy)]
pub struct SchemaContext<'a> {
    definitions: &'a Value,
    validator: &'a dyn Validator,
    diagnostics: &'a dyn Diagnostics,
}

impl Default for SchemaContext<'_> {
    fn default() -> Self {
        Self::new(&NO_DEFINITIONS)
    }
}

impl<'a> SchemaContext<'a> {
    /// Create a context over a definitions table.
    ///
    /// Uses [`JsonSchemaValidator`] and forwards warnings to the `log` facade.
    /// A non-object `definitions` value behaves like an empty table.
    pub fn new(definitions: &'a Value) -> Self {
        Self {
            definitions,
            validator: &DEFAULT_VALIDATOR,
            diagnostics: &DEFAULT_DIAGNOSTICS,
        }
    }

    /// Replace the validation engine.
    pub fn with_validator(mut self, validator: &'a dyn Validator) -> Self {
        self.validator = validator;
        self
    }

    /// Replace the warning sink.
    pub fn with_diagnostics(mut self, diagnostics: &'a dyn Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// The definitions table `$ref`s are resolved against.
    pub fn definitions(&self) -> &'a Value {
        self.definitions
    }

    /// The validation engine.
    pub fn validator(&self) -> &'a dyn Validator {
        self.validator
    }

    /// Report a recoverable condition.
    pub fn warn(&self, message: &str) {
        self.diagnostics.warn(message);
    }

    /// Root schema handed to the validator so that `$ref`s inside candidate
    /// schemas resolve against the same definitions.
    pub fn root_schema(&self) -> Value {
        match self.definitions {
            Value::Object(defs) => json!({ "definitions": defs }),
            _ => json!({ "definitions": Map::new() }),
        }
    }
}
