// ABOUTME: Layered JSON configuration for connections and command templates
// ABOUTME: Later files shallow-merge over earlier ones; missing files are skipped

use crate::migration::IdentifierQuote;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Config files read when no `--config` is given, in merge order
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["./.config.json", "./.config.local.json"];

/// Intermediate file shared by export and import between two tables
pub const DEFAULT_TEMP_FILE: &str = "tmp.bcp";

/// Everything a transfer needs besides the endpoints
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferConfig {
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,
    #[serde(default)]
    pub commands: CommandTemplates,
    #[serde(default = "default_temp_file")]
    pub temp_file_name: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            connections: BTreeMap::new(),
            commands: CommandTemplates::default(),
            temp_file_name: default_temp_file(),
        }
    }
}

fn default_temp_file() -> String {
    DEFAULT_TEMP_FILE.to_string()
}

impl TransferConfig {
    pub fn connection(&self, name: &str) -> Result<&ConnectionConfig> {
        match self.connections.get(name) {
            Some(config) => Ok(config),
            None => bail!(
                "Connection '{}' is not defined in the configuration (known: {})",
                name,
                self.connections
                    .keys()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Bulk-copy command templates
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct CommandTemplates {
    pub download: Option<String>,
    pub upload: Option<String>,
}

impl CommandTemplates {
    pub fn download(&self) -> Result<&str> {
        self.download
            .as_deref()
            .context("commands.download is not configured")
    }

    pub fn upload(&self) -> Result<&str> {
        self.upload
            .as_deref()
            .context("commands.upload is not configured")
    }
}

/// Settings for one named connection
///
/// Kept as an open JSON object: every key is also exposed to command
/// templates as a tag.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ConnectionConfig {
    fields: Map<String, Value>,
}

impl ConnectionConfig {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// String value of a key; numbers are accepted and rendered as text
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Database name, used in progress messages
    pub fn database(&self) -> Option<String> {
        self.get_str("database")
    }

    pub fn identifier_quote(&self) -> Result<IdentifierQuote> {
        match self.fields.get("identifierQuote") {
            None => Ok(IdentifierQuote::default()),
            Some(value) => serde_json::from_value(value.clone())
                .with_context(|| format!("Invalid identifierQuote: {}", value)),
        }
    }
}

/// Shallow-merge JSON objects: top-level keys of `overlay` replace those in `base`
pub fn merge_shallow(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}

/// Load and merge the given config files in order
///
/// Files that do not exist are skipped. A file that exists but is not a
/// JSON object is an error.
pub fn load_config<P: AsRef<Path>>(paths: &[P]) -> Result<TransferConfig> {
    let mut merged = Map::new();

    for path in paths {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("Config file {} not found, skipping", path.display());
            continue;
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        let Value::Object(object) = value else {
            bail!("Config file {} must contain a JSON object", path.display());
        };

        tracing::debug!("Loaded config file {}", path.display());
        merge_shallow(&mut merged, object);
    }

    serde_json::from_value(Value::Object(merged)).context("Invalid configuration")
}

/// Default config search list
pub fn default_config_paths() -> Vec<PathBuf> {
    DEFAULT_CONFIG_FILES.iter().map(PathBuf::from).collect()
}
