//! Editor-native adapter: writes the payload into the host's own MCP config
//! store. The store entry keeps the unresolved placeholders and the `inputs`
//! list; the host prompts for them itself.

use super::{InstallOutcome, InstallRequest, TargetAdapter};
use crate::compiler::InstallCommandPayload;
use crate::error::Result;
use crate::store::{McpConfigStore, StoreDelta};
use serde_json::Value;

pub struct EditorAdapter {
    store: Box<dyn McpConfigStore>,
}

impl EditorAdapter {
    pub fn new(store: Box<dyn McpConfigStore>) -> Self {
        Self { store }
    }
}

/// The compiled payload serialized as-is, minus the name (the store keys on it).
fn store_entry(payload: &InstallCommandPayload) -> Result<Value> {
    let mut entry = serde_json::to_value(payload)?;
    if let Some(obj) = entry.as_object_mut() {
        obj.remove("name");
    }
    Ok(entry)
}

impl TargetAdapter for EditorAdapter {
    fn id(&self) -> &'static str {
        "editor"
    }

    fn install(&mut self, request: &InstallRequest) -> Result<InstallOutcome> {
        let payload = request.payload;
        payload.validate()?;
        let outcome = self.store.apply(StoreDelta::Upsert {
            name: payload.name.clone(),
            entry: store_entry(payload)?,
        })?;
        let _ = outcome.conflicted; // reported by the store itself
        Ok(InstallOutcome {
            success: true,
            manual_command: None,
        })
    }

    fn manual_command(&self, masked: &InstallCommandPayload) -> String {
        // no CLI involved; the closest manual step is the claude CLI command
        super::claude::ClaudeCliAdapter::default().manual_command(masked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_package;
    use crate::descriptor::normalize;
    use crate::store::JsonFileStore;
    use serde_json::json;

    #[test]
    fn test_editor_adapter_writes_store_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        let mut adapter =
            EditorAdapter::new(Box::new(JsonFileStore::open(&path).unwrap()));

        let server = normalize(&json!({
            "name": "gh",
            "packages": [{
                "identifier": "srv", "registry_type": "npm",
                "environment_variables": [{"name": "TOKEN", "is_secret": true}]
            }]
        }));
        let payload = compile_package(&server, &server.packages[0]).unwrap();
        let resolved = payload.clone();
        let masked = payload.masked();

        let outcome = adapter
            .install(&InstallRequest {
                payload: &payload,
                resolved: &resolved,
                masked: &masked,
            })
            .unwrap();
        assert!(outcome.success);

        let config: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &config["servers"]["gh"];
        assert_eq!(entry["command"], "npx");
        // placeholders and inputs are preserved for the host to resolve
        assert_eq!(entry["env"]["TOKEN"], "${input:TOKEN}");
        assert_eq!(entry["inputs"][0]["id"], "TOKEN");
        assert!(entry.get("name").is_none());
    }

    #[test]
    fn test_remote_entry_has_url_not_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        let mut adapter =
            EditorAdapter::new(Box::new(JsonFileStore::open(&path).unwrap()));

        let server = normalize(&json!({
            "name": "r",
            "remotes": [{"type": "http", "url": "https://x.test/mcp"}]
        }));
        let payload =
            crate::compiler::compile_remote(&server, &server.remotes[0]).unwrap();
        let masked = payload.masked();
        adapter
            .install(&InstallRequest {
                payload: &payload,
                resolved: &payload,
                masked: &masked,
            })
            .unwrap();

        let config: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &config["servers"]["r"];
        assert_eq!(entry["url"], "https://x.test/mcp");
        assert!(entry.get("command").is_none());
    }

    #[test]
    fn test_multiple_headers_accepted_here() {
        // the codex CLI adapter rejects this shape; the editor store does not
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");
        let mut adapter =
            EditorAdapter::new(Box::new(JsonFileStore::open(&path).unwrap()));

        let server = normalize(&json!({
            "name": "r",
            "remotes": [{
                "type": "http", "url": "https://x.test/mcp",
                "headers": [
                    {"name": "Authorization", "value": "Bearer a"},
                    {"name": "X-Extra", "value": "b"}
                ]
            }]
        }));
        let payload =
            crate::compiler::compile_remote(&server, &server.remotes[0]).unwrap();
        let masked = payload.masked();
        let outcome = adapter
            .install(&InstallRequest {
                payload: &payload,
                resolved: &payload,
                masked: &masked,
            })
            .unwrap();
        assert!(outcome.success);
    }
}
