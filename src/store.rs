//! Editor-native MCP config store.
//!
//! The store is abstracted behind an explicit "apply delta" operation. The
//! file-backed implementation re-reads the file immediately before every
//! write and reports when the store changed underneath it since it was
//! opened, instead of silently overwriting a concurrent change.

use crate::error::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreDelta {
    Upsert { name: String, entry: Value },
    Remove { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// The store content changed between open and this apply. The delta was
    /// still applied, onto the fresh state.
    pub conflicted: bool,
}

pub trait McpConfigStore {
    fn apply(&mut self, delta: StoreDelta) -> Result<ApplyOutcome>;
}

pub struct JsonFileStore {
    path: PathBuf,
    /// Raw content observed at open (None when the file did not exist).
    snapshot: Option<String>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = read_optional(&path)?;
        Ok(Self { path, snapshot })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn apply_delta(config: &mut Value, delta: &StoreDelta) {
    if !config.is_object() {
        *config = serde_json::json!({});
    }
    if config.get("servers").map_or(true, |s| !s.is_object()) {
        config["servers"] = serde_json::json!({});
    }
    if let Some(servers) = config["servers"].as_object_mut() {
        match delta {
            StoreDelta::Upsert { name, entry } => {
                servers.insert(name.clone(), entry.clone());
            }
            StoreDelta::Remove { name } => {
                servers.remove(name);
            }
        }
    }
}

impl McpConfigStore for JsonFileStore {
    fn apply(&mut self, delta: StoreDelta) -> Result<ApplyOutcome> {
        let current = read_optional(&self.path)?;
        let conflicted = current != self.snapshot;
        if conflicted {
            warn!(
                path = %self.path.display(),
                "config store changed since it was opened; applying onto fresh state"
            );
        }

        let mut config: Value = match current.as_deref() {
            Some(content) => serde_json::from_str(content).unwrap_or_else(|_| serde_json::json!({})),
            None => serde_json::json!({}),
        };
        apply_delta(&mut config, &delta);

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let output = serde_json::to_string_pretty(&config)?;
        std::fs::write(&self.path, &output)?;
        self.snapshot = Some(output);
        Ok(ApplyOutcome { conflicted })
    }
}
