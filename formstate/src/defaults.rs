//! Default form state.
//!
//! Defaults are layered from the outside in: a default declared on a parent
//! object seeds its children, a node's own `default` overrides it (merged
//! key by key when both are objects), and the user's data finally wins over
//! everything.

use serde_json::{Map, Value};

use crate::{
    context::SchemaContext,
    matcher::get_matching_option,
    schema::{
        SchemaError, SchemaKind, SchemaType, dependencies::resolve_dependencies,
        find_schema_definition, get_schema_type, retrieve_schema,
    },
    utils::{allow_additional_items, field, is_multi_select, is_truthy, merge_objects},
};

/// Fill in `data` with the defaults declared by `schema`.
///
/// `None` means there is neither a default nor any data. With
/// `include_undefined`, object properties without a default are present as
/// `null` instead of being left out.
///
/// Data is merged over the defaults: objects key by key, arrays index by
/// index (padding entries past the end of the data are kept). Explicit `0`
/// and `false` are returned as they are; `null` and `""` count as absent.
///
/// # Errors
///
/// [`SchemaError::InvalidSchema`] if `schema` is not an object, and any error
/// from [`retrieve_schema`].
pub fn get_default_form_state(
    cx: &SchemaContext<'_>,
    schema: &Value,
    data: Option<&Value>,
    include_undefined: bool,
) -> Result<Option<Value>, SchemaError> {
    if !schema.is_object() {
        return Err(SchemaError::invalid("", "an object", schema));
    }

    let resolved = retrieve_schema(cx, schema, data)?;
    let mut walker = DefaultsWalker {
        cx,
        include_undefined,
        expanding: Vec::new(),
    };
    let defaults = walker.compute(&resolved, schema.get("default"), data)?;

    Ok(match data {
        None => defaults,
        Some(data @ (Value::Object(_) | Value::Array(_))) => {
            Some(merge_defaults_with_data(defaults.as_ref(), data))
        }
        Some(data @ Value::Bool(false)) => Some(data.clone()),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => data.cloned(),
        Some(data) if is_truthy(data) => Some(data.clone()),
        Some(_) => defaults,
    })
}

/// Overlay `data` on `defaults`. Scalars in the data always win.
fn merge_defaults_with_data(defaults: Option<&Value>, data: &Value) -> Value {
    match data {
        Value::Object(fields) => {
            let mut acc = match defaults {
                Some(Value::Object(defaults)) => defaults.clone(),
                _ => Map::new(),
            };
            for (key, value) in fields {
                let merged = merge_defaults_with_data(field(defaults, key), value);
                acc.insert(key.clone(), merged);
            }
            Value::Object(acc)
        }
        Value::Array(rows) => {
            let defaults = defaults.and_then(Value::as_array);
            let mut merged: Vec<Value> = rows
                .iter()
                .enumerate()
                .map(|(i, row)| merge_defaults_with_data(defaults.and_then(|d| d.get(i)), row))
                .collect();
            if let Some(padding) = defaults.and_then(|d| d.get(rows.len()..)) {
                merged.extend(padding.iter().cloned());
            }
            Value::Array(merged)
        }
        scalar => scalar.clone(),
    }
}

struct DefaultsWalker<'c, 'a> {
    cx: &'c SchemaContext<'a>,
    include_undefined: bool,
    /// `$ref`s entered on the way down. Re-entering one with no data left
    /// to descend into stops the walk.
    expanding: Vec<String>,
}

impl DefaultsWalker<'_, '_> {
    fn compute(
        &mut self,
        schema: &Value,
        parent_default: Option<&Value>,
        data: Option<&Value>,
    ) -> Result<Option<Value>, SchemaError> {
        let mut effective = schema.clone();

        let mut defaults = match (parent_default, schema.get("default")) {
            (Some(Value::Object(parent)), Some(Value::Object(own))) => {
                Some(Value::Object(merge_objects(parent, own, false)))
            }
            (_, Some(own)) => Some(own.clone()),
            (parent, None) => match SchemaKind::of(schema) {
                SchemaKind::Ref(reference) => {
                    return self.compute_reference(reference, parent, data);
                }
                SchemaKind::Dependent(_) => {
                    let map = schema.as_object().cloned().unwrap_or_default();
                    let resolved = Value::Object(resolve_dependencies(self.cx, &map, data)?);
                    return self.compute(&resolved, parent, data);
                }
                SchemaKind::FixedTuple(items) => {
                    let parent_items = parent.and_then(Value::as_array);
                    let mut tuple = Vec::with_capacity(items.len());
                    for (i, item) in items.iter().enumerate() {
                        let item_default = parent_items.and_then(|p| p.get(i));
                        let row = data.and_then(|d| d.get(i));
                        tuple.push(self.compute(item, item_default, row)?.unwrap_or(Value::Null));
                    }
                    Some(Value::Array(tuple))
                }
                SchemaKind::Polymorphic(options) => {
                    if !options.is_empty() {
                        let index = get_matching_option(self.cx, None, options);
                        effective = options[index].clone();
                        if SchemaKind::of(&effective).needs_resolution() {
                            effective = retrieve_schema(self.cx, &effective, data)?;
                        }
                    }
                    parent.cloned()
                }
                SchemaKind::Object | SchemaKind::Array | SchemaKind::Scalar => parent.cloned(),
            },
        };

        if defaults.is_none() {
            defaults = effective.get("default").cloned();
        }

        match get_schema_type(&effective) {
            Some(SchemaType::Object) => self.compute_object(&effective, defaults.as_ref(), data),
            Some(SchemaType::Array) => self.compute_array(&effective, defaults, data),
            _ => Ok(defaults),
        }
    }

    fn compute_reference(
        &mut self,
        reference: &str,
        parent_default: Option<&Value>,
        data: Option<&Value>,
    ) -> Result<Option<Value>, SchemaError> {
        if data.is_none() && self.expanding.iter().any(|r| r == reference) {
            trace!("not expanding {reference} again");
            return Ok(parent_default.cloned());
        }
        // Follow definitions that are themselves bare references, so that a
        // cycle with no schema in between fails instead of recursing forever.
        let mut chain = vec![reference.to_string()];
        let mut target = find_schema_definition(reference, self.cx.definitions())?;
        while target.get("default").is_none() {
            let SchemaKind::Ref(next) = SchemaKind::of(target) else {
                break;
            };
            if chain.iter().any(|r| r == next) {
                return Err(SchemaError::CircularReference {
                    reference: next.to_string(),
                });
            }
            chain.push(next.to_string());
            target = find_schema_definition(next, self.cx.definitions())?;
        }

        let depth = self.expanding.len();
        self.expanding.extend(chain);
        let computed = self.compute(target, parent_default, data);
        self.expanding.truncate(depth);
        computed
    }

    fn compute_object(
        &mut self,
        schema: &Value,
        defaults: Option<&Value>,
        data: Option<&Value>,
    ) -> Result<Option<Value>, SchemaError> {
        let mut acc = Map::new();
        if let Some(Value::Object(properties)) = schema.get("properties") {
            for (key, property) in properties {
                let computed = self.compute(property, field(defaults, key), field(data, key))?;
                match computed {
                    Some(value) => {
                        acc.insert(key.clone(), value);
                    }
                    None if self.include_undefined => {
                        acc.insert(key.clone(), Value::Null);
                    }
                    None => {}
                }
            }
        }
        Ok(Some(Value::Object(acc)))
    }

    fn compute_array(
        &mut self,
        schema: &Value,
        mut defaults: Option<Value>,
        data: Option<&Value>,
    ) -> Result<Option<Value>, SchemaError> {
        let tuple = schema.get("items").and_then(Value::as_array);

        if let Some(Value::Array(entries)) = &defaults {
            let mut remapped = Vec::with_capacity(entries.len());
            for (i, entry) in entries.iter().enumerate() {
                let item_schema = tuple
                    .and_then(|items| items.get(i))
                    .or_else(|| schema.get("additionalItems"))
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Map::new()));
                let entry = self.compute(&item_schema, Some(entry), None)?;
                remapped.push(entry.unwrap_or(Value::Null));
            }
            defaults = Some(Value::Array(remapped));
        }

        if let Some(Value::Array(rows)) = data {
            let current = defaults.as_ref().and_then(Value::as_array);
            let mut reshaped = Vec::with_capacity(rows.len());
            for (i, row) in rows.iter().enumerate() {
                let item_schema = match tuple {
                    Some(items) => items
                        .get(i)
                        .or_else(|| schema.get("additionalItems"))
                        .cloned()
                        .unwrap_or_else(|| Value::Object(Map::new())),
                    None => schema
                        .get("items")
                        .cloned()
                        .unwrap_or_else(|| Value::Object(Map::new())),
                };
                let row_default = current.and_then(|d| d.get(i));
                let row = self.compute(&item_schema, row_default, Some(row))?;
                reshaped.push(row.unwrap_or(Value::Null));
            }
            defaults = Some(Value::Array(reshaped));
        }

        let min_items = schema.get("minItems").and_then(Value::as_u64).unwrap_or(0) as usize;
        if min_items == 0 {
            return Ok(defaults);
        }
        if is_multi_select(self.cx, schema)? {
            return Ok(Some(defaults.unwrap_or_else(|| Value::Array(Vec::new()))));
        }

        let length = defaults.as_ref().and_then(Value::as_array).map_or(0, Vec::len);
        if min_items <= length {
            return Ok(defaults);
        }

        let filler_schema = if tuple.is_some() {
            if allow_additional_items(self.cx, schema) {
                schema.get("additionalItems")
            } else {
                None
            }
        } else {
            schema.get("items")
        };
        let Some(filler_schema) = filler_schema.filter(|s| s.is_object()) else {
            debug!("no filler schema, array stays below minItems");
            return Ok(defaults);
        };

        let filler = self.compute(filler_schema, None, None)?.unwrap_or(Value::Null);
        let mut entries = match defaults {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        };
        entries.resize(min_items, filler);
        Ok(Some(Value::Array(entries)))
    }
}
