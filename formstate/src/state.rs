//! File-backed form state.

use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use anyhow::{Context, bail};
use serde_json::Value;

use crate::{
    context::SchemaContext,
    defaults::get_default_form_state,
    ids::{IdSchema, PathSchema, to_id_schema, to_path_schema},
    matcher::get_matching_option,
    order::order_properties,
    schema::{SchemaError, SchemaKind, retrieve_schema},
    utils::deep_equals,
    validator::ValidationReport,
};

const DEFAULT_DATA_PATH: &str = ".config.toml";

/// Derive the schema path that belongs to a data file.
///
/// `config.toml` pairs with `config-schema.json` in the same directory.
pub fn default_schema_by_data(data_path: &Path) -> PathBuf {
    let file_name = data_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name_split = file_name.split('.').collect::<Vec<_>>();
    if name_split.len() > 1 {
        name_split.pop();
    }

    let name = format!("{}-schema.json", name_split.join("."));

    match data_path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Parse data file content according to the file extension.
fn parse_data(content: &str, path: &Path) -> anyhow::Result<Value> {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    let value = match ext {
        "json" => serde_json::from_str(content)?,
        "toml" | "tml" => {
            let v: toml::Value = toml::from_str(content)?;
            serde_json::to_value(v)?
        }
        _ => bail!("Unsupported data file extension: {ext:?}"),
    };
    Ok(value)
}

/// A schema together with the data being edited against it.
///
/// The schema's own `definitions` member is the definitions table for every
/// derivation.
#[derive(Debug, Clone)]
pub struct FormState {
    /// Raw schema as loaded.
    pub schema: Value,
    /// Current data; `None` until something is loaded or filled in.
    pub data: Option<Value>,
    /// File the data is loaded from and saved to.
    pub data_path: PathBuf,
    /// Whether the data changed since it was loaded.
    pub needs_save: bool,
}

impl FormState {
    /// Load a schema file and, if it exists, a data file.
    ///
    /// The data path defaults to `.config.toml`; the schema path defaults to
    /// the one [`default_schema_by_data`] derives from it.
    pub fn new(
        data_path: Option<impl AsRef<Path>>,
        schema_path: Option<impl AsRef<Path>>,
    ) -> anyhow::Result<Self> {
        let data_path = Self::resolve_data_path(data_path);

        let schema_path = match schema_path {
            Some(path) => path.as_ref().to_path_buf(),
            None => default_schema_by_data(&data_path),
        };

        if !schema_path.exists() {
            bail!("Schema file does not exist: {}", schema_path.display());
        }

        let content = fs::read_to_string(&schema_path)
            .with_context(|| format!("Failed to read {}", schema_path.display()))?;
        let schema: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", schema_path.display()))?;
        Self::new_with_schema(Some(data_path), &schema)
    }

    fn resolve_data_path(data_path: Option<impl AsRef<Path>>) -> PathBuf {
        data_path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH))
    }

    /// Build from a schema value, loading the data file if it exists.
    pub fn new_with_schema(
        data_path: Option<impl AsRef<Path>>,
        schema: &Value,
    ) -> anyhow::Result<Self> {
        let data_path = Self::resolve_data_path(data_path);

        let mut data = None;
        if data_path.exists() {
            let content = fs::read_to_string(&data_path)
                .with_context(|| format!("Failed to read {}", data_path.display()))?;
            if !content.trim().is_empty() {
                data = Some(parse_data(&content, &data_path)?);
            }
        }

        Ok(FormState {
            schema: schema.clone(),
            data,
            data_path,
            needs_save: false,
        })
    }

    /// Build from in-memory values. The data path is the default one.
    pub fn from_values(schema: Value, data: Option<Value>) -> Self {
        FormState {
            schema,
            data,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            needs_save: false,
        }
    }

    /// Resolution context over the schema's `definitions`.
    pub fn context(&self) -> SchemaContext<'_> {
        static NONE: Value = Value::Null;
        SchemaContext::new(self.schema.get("definitions").unwrap_or(&NONE))
    }

    /// Replace the data and mark it for saving.
    pub fn set_data(&mut self, data: Value) {
        self.data = Some(data);
        self.needs_save = true;
    }

    /// The schema in effect for the current data.
    pub fn resolved_schema(&self) -> Result<Value, SchemaError> {
        retrieve_schema(&self.context(), &self.schema, self.data.as_ref())
    }

    /// The current data with defaults filled in.
    pub fn defaults(&self, include_undefined: bool) -> Result<Option<Value>, SchemaError> {
        get_default_form_state(
            &self.context(),
            &self.schema,
            self.data.as_ref(),
            include_undefined,
        )
    }

    pub fn id_schema(&self, id_prefix: &str) -> Result<IdSchema, SchemaError> {
        to_id_schema(&self.context(), &self.schema, None, self.data.as_ref(), id_prefix)
    }

    pub fn path_schema(&self) -> Result<PathSchema, SchemaError> {
        to_path_schema(&self.context(), &self.schema, "", self.data.as_ref())
    }

    /// Selected `oneOf`/`anyOf` alternative of the node at a dotted path.
    ///
    /// `""` is the root. Returns `None` when the node is not polymorphic or
    /// the path does not name a node of the schema.
    pub fn matching_option(&self, path: &str) -> Result<Option<usize>, SchemaError> {
        let cx = self.context();
        let mut schema = self.resolved_schema()?;
        let mut data = self.data.as_ref();

        for segment in path.split('.').filter(|s| !s.is_empty()) {
            let child = match (schema.get("properties"), schema.get("items")) {
                (Some(Value::Object(properties)), _) if properties.contains_key(segment) => {
                    data = data.and_then(|d| d.get(segment));
                    properties[segment].clone()
                }
                (_, Some(items)) => {
                    let Ok(index) = segment.parse::<usize>() else {
                        return Ok(None);
                    };
                    data = data.and_then(|d| d.get(index));
                    match items {
                        Value::Array(tuple) => match tuple.get(index) {
                            Some(item) => item.clone(),
                            None => return Ok(None),
                        },
                        item => item.clone(),
                    }
                }
                _ => return Ok(None),
            };
            schema = retrieve_schema(&cx, &child, data)?;
        }

        Ok(match SchemaKind::of(&schema) {
            SchemaKind::Polymorphic(options) => Some(get_matching_option(&cx, data, options)),
            _ => None,
        })
    }

    /// Validate the current data (`null` when there is none) against the schema.
    pub fn validate(&self) -> ValidationReport {
        let data = self.data.clone().unwrap_or(Value::Null);
        self.context().validator().validate(&data, &self.schema)
    }

    /// Top-level property names of the resolved schema, arranged by `order`.
    pub fn ordered_properties(&self, order: Option<&[String]>) -> Result<Vec<String>, SchemaError> {
        let resolved = self.resolved_schema()?;
        let properties: Vec<String> = resolved
            .get("properties")
            .and_then(Value::as_object)
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default();
        order_properties(&self.context(), &properties, order)
    }

    /// Replace the data with its default-filled form.
    ///
    /// Returns whether anything changed.
    pub fn fill_defaults(&mut self) -> Result<bool, SchemaError> {
        let filled = self.defaults(false)?;
        let changed = match (&self.data, &filled) {
            (Some(old), Some(new)) => !deep_equals(old, new),
            (None, None) => false,
            _ => true,
        };
        if changed {
            debug!("defaults changed the data of {}", self.data_path.display());
            self.data = filled;
            self.needs_save = true;
        }
        Ok(changed)
    }

    /// Write the data back in the data file's format.
    ///
    /// Does nothing unless the data changed. An existing file is first
    /// copied to `<stem>.bk-<unix seconds>.<ext>`.
    pub fn save(&mut self) -> anyhow::Result<()> {
        if !self.needs_save {
            return Ok(());
        }
        let ext = self
            .data_path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        let value = self.data.clone().unwrap_or_else(|| Value::Object(Default::default()));
        debug!("value to save: {value}");

        let s = match ext {
            "toml" | "tml" => toml::to_string_pretty(&value)?,
            "json" => serde_json::to_string_pretty(&value)?,
            _ => {
                bail!("Unsupported data file extension: {ext}");
            }
        };

        if self.data_path.exists() {
            let bk = format!(
                "bk-{}.{ext}",
                SystemTime::now()
                    .duration_since(SystemTime::UNIX_EPOCH)?
                    .as_secs()
            );

            let backup_path = self.data_path.with_extension(bk);
            fs::copy(&self.data_path, &backup_path)
                .with_context(|| format!("Failed to back up {}", self.data_path.display()))?;
        }
        fs::write(&self.data_path, s)
            .with_context(|| format!("Failed to write {}", self.data_path.display()))?;
        self.needs_save = false;
        Ok(())
    }
}
