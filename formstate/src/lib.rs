//! # formstate
//!
//! JSON Schema resolution and form-state derivation for schema-driven forms.
//!
//! A form is described by a JSON Schema and edited as an independent JSON
//! value. `formstate` computes everything a renderer needs from that pair:
//! the schema actually in effect for the current data, the defaults for the
//! fields the user has not filled in, stable per-field identifiers and paths,
//! and which `oneOf`/`anyOf` alternative the data currently matches.
//!
//! ## Features
//!
//! - `$ref` resolution against a `definitions` table (JSON Pointer escaping)
//! - Property and schema `dependencies`, including polymorphic `oneOf` branches
//! - Synthesized property schemas for data under `additionalProperties`
//! - Layered defaults with `minItems` padding and tuple arrays
//! - `idSchema` / `pathSchema` trees mirroring the effective schema
//! - Pluggable validation (defaults to the `jsonschema` crate)
//! - TOML and JSON data files, schemas generated from Rust types
//!
//! ## Quick Start
//!
//! ```rust
//! use formstate::{SchemaContext, get_default_form_state};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "name": {"type": "string", "default": "kernel"},
//!         "smp": {"type": "integer", "default": 1}
//!     }
//! });
//! let definitions = json!({});
//! let cx = SchemaContext::new(&definitions);
//!
//! let data = json!({"smp": 4});
//! let filled = get_default_form_state(&cx, &schema, Some(&data), false).unwrap();
//! assert_eq!(filled, Some(json!({"name": "kernel", "smp": 4})));
//! ```
//!
//! ## Modules
//!
//! - [`schema`] - Schema resolution (`$ref`, dependencies, additional properties)
//! - [`matcher`] - `oneOf`/`anyOf` alternative selection
//! - [`defaults`] - Default form state computation
//! - [`ids`] - Identifier and path trees
//! - [`order`] - Property ordering
//! - [`validator`] - Validation engine adapter
//! - [`state`] - File-backed form state
//! - [`run`] - Typed configuration workflow

#[macro_use]
extern crate log;

/// Immutable resolution context shared by every operation.
pub mod context;

/// Default form state computation.
pub mod defaults;

/// Injectable warning channel.
pub mod diagnostics;

/// Identifier (`$id`) and path (`$name`) trees.
pub mod ids;

/// Selection of the alternative matching the current data.
pub mod matcher;

/// Property ordering with wildcard support.
pub mod order;

/// Typed configuration workflow backed by `schemars`.
pub mod run;

/// Schema resolution.
///
/// Resolves `$ref` indirection, expands `dependencies` against the current
/// data and stubs property schemas for data under `additionalProperties`.
pub mod schema;

/// File-backed schema and data container.
pub mod state;

/// Generic value helpers and schema shape predicates.
pub mod utils;

/// Validation engine abstraction and its `jsonschema` implementation.
pub mod validator;

pub use context::SchemaContext;
pub use defaults::get_default_form_state;
pub use diagnostics::{Diagnostics, LogDiagnostics, NoopDiagnostics};
pub use ids::{IdSchema, PathSchema, to_id_schema, to_path_schema};
pub use matcher::get_matching_option;
pub use order::order_properties;
pub use run::{run, schema_for};
pub use schema::{ADDITIONAL_PROPERTY_FLAG, SchemaError, retrieve_schema};
pub use serde_json::Value;
pub use state::FormState;
pub use validator::{ErrorSchema, JsonSchemaValidator, ValidationReport, Validator};
