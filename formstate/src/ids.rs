//! Identifier and path trees.
//!
//! Both trees follow the object nesting of the effective schema. An
//! [`IdSchema`] names every field definition (`root_net_port`); a
//! [`PathSchema`] addresses every value, including individual array rows
//! (`net.ports.0`).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    context::SchemaContext,
    schema::{SchemaError, SchemaKind, SchemaType, get_schema_type, retrieve_schema},
    utils::field,
};

/// Identifier tree. Serializes as `{"$id": "root", "<property>": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdSchema {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(flatten)]
    pub children: IndexMap<String, IdSchema>,
}

impl IdSchema {
    fn leaf(id: String) -> Self {
        Self {
            id,
            children: IndexMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&IdSchema> {
        self.children.get(key)
    }
}

/// Path tree. Serializes as `{"$name": "a.b", "<key>": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSchema {
    #[serde(rename = "$name")]
    pub name: String,
    /// The node's schema declares `additionalProperties`, so keys may be
    /// added or renamed.
    #[serde(
        rename = "__additional_properties",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub additional_properties: bool,
    #[serde(flatten)]
    pub children: IndexMap<String, PathSchema>,
}

impl PathSchema {
    pub fn get(&self, key: &str) -> Option<&PathSchema> {
        self.children.get(key)
    }
}

/// Build the identifier tree of `schema`.
///
/// The root is named `id`, or `id_prefix` when no id is given. Each object
/// property appends `_<name>`. Arrays contribute the tree of their item
/// schema once, under the array's own id, rather than one subtree per row.
///
/// # Errors
///
/// Propagates resolution errors.
pub fn to_id_schema(
    cx: &SchemaContext<'_>,
    schema: &Value,
    id: Option<&str>,
    data: Option<&Value>,
    id_prefix: &str,
) -> Result<IdSchema, SchemaError> {
    let id = id.unwrap_or(id_prefix).to_string();
    TreeWalker::new(cx).id_schema(schema, id, data)
}

/// Build the path tree of `schema`.
///
/// `name` is the dotted path of the root (usually `""`). Object properties
/// append `.<name>` and array rows present in `data` append `.<index>`; the
/// stored `$name` never starts with a dot.
///
/// # Errors
///
/// Propagates resolution errors.
pub fn to_path_schema(
    cx: &SchemaContext<'_>,
    schema: &Value,
    name: &str,
    data: Option<&Value>,
) -> Result<PathSchema, SchemaError> {
    TreeWalker::new(cx).path_schema(schema, name, data)
}

struct TreeWalker<'c, 'a> {
    cx: &'c SchemaContext<'a>,
    /// `$ref`s being expanded by ancestors.
    expanding: Vec<String>,
}

impl<'c, 'a> TreeWalker<'c, 'a> {
    fn new(cx: &'c SchemaContext<'a>) -> Self {
        Self {
            cx,
            expanding: Vec::new(),
        }
    }

    /// Resolve `schema` if its shape depends on `$ref`, `dependencies` or
    /// keys under `additionalProperties`.
    ///
    /// Returns `None` when the node refers back to a definition an ancestor
    /// is already expanding and there is no data left to follow, which makes
    /// the node a leaf. Otherwise the pushed reference, if any, must be popped
    /// by the caller.
    fn enter(
        &mut self,
        schema: &Value,
        data: Option<&Value>,
    ) -> Result<Option<(Value, bool)>, SchemaError> {
        match SchemaKind::of(schema) {
            SchemaKind::Ref(reference) => {
                if data.is_none() && self.expanding.iter().any(|r| r == reference) {
                    trace!("{reference} is already being expanded");
                    return Ok(None);
                }
                let resolved = retrieve_schema(self.cx, schema, data)?;
                self.expanding.push(reference.to_string());
                Ok(Some((resolved, true)))
            }
            SchemaKind::Dependent(_) => Ok(Some((retrieve_schema(self.cx, schema, data)?, false))),
            _ if schema.get("additionalProperties").is_some() => {
                Ok(Some((retrieve_schema(self.cx, schema, data)?, false)))
            }
            _ => Ok(Some((schema.clone(), false))),
        }
    }

    fn leave(&mut self, pushed: bool) {
        if pushed {
            self.expanding.pop();
        }
    }

    fn id_schema(
        &mut self,
        schema: &Value,
        id: String,
        data: Option<&Value>,
    ) -> Result<IdSchema, SchemaError> {
        let Some((schema, pushed)) = self.enter(schema, data)? else {
            return Ok(IdSchema::leaf(id));
        };
        let built = self.id_schema_resolved(&schema, id, data);
        self.leave(pushed);
        built
    }

    fn id_schema_resolved(
        &mut self,
        schema: &Value,
        id: String,
        data: Option<&Value>,
    ) -> Result<IdSchema, SchemaError> {
        if let Some(items @ Value::Object(_)) = schema.get("items") {
            return self.id_schema(items, id, None);
        }

        let mut node = IdSchema::leaf(id);
        if get_schema_type(schema) != Some(SchemaType::Object) {
            return Ok(node);
        }
        if let Some(Value::Object(properties)) = schema.get("properties") {
            for (name, property) in properties {
                let child_id = format!("{}_{name}", node.id);
                let child = self.id_schema(property, child_id, field(data, name))?;
                node.children.insert(name.clone(), child);
            }
        }
        Ok(node)
    }

    fn path_schema(
        &mut self,
        schema: &Value,
        name: &str,
        data: Option<&Value>,
    ) -> Result<PathSchema, SchemaError> {
        let Some((schema, pushed)) = self.enter(schema, data)? else {
            return Ok(PathSchema {
                name: display_name(name),
                ..Default::default()
            });
        };
        let built = self.path_schema_resolved(&schema, name, data);
        self.leave(pushed);
        built
    }

    fn path_schema_resolved(
        &mut self,
        schema: &Value,
        name: &str,
        data: Option<&Value>,
    ) -> Result<PathSchema, SchemaError> {
        let mut node = PathSchema {
            name: display_name(name),
            additional_properties: schema.get("additionalProperties").is_some(),
            children: IndexMap::new(),
        };

        match (schema.get("items"), data) {
            (Some(items), Some(Value::Array(rows))) => {
                for (i, row) in rows.iter().enumerate() {
                    let item_schema = match items {
                        Value::Array(tuple) => tuple
                            .get(i)
                            .or_else(|| schema.get("additionalItems"))
                            .cloned()
                            .unwrap_or_else(|| Value::Object(Default::default())),
                        item => item.clone(),
                    };
                    let child = self.path_schema(&item_schema, &format!("{name}.{i}"), Some(row))?;
                    node.children.insert(i.to_string(), child);
                }
            }
            _ => {
                if let Some(Value::Object(properties)) = schema.get("properties") {
                    for (key, property) in properties {
                        let child =
                            self.path_schema(property, &format!("{name}.{key}"), field(data, key))?;
                        node.children.insert(key.clone(), child);
                    }
                }
            }
        }
        Ok(node)
    }
}

fn display_name(name: &str) -> String {
    name.strip_prefix('.').unwrap_or(name).to_string()
}
