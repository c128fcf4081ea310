//! External CLI adapter for `claude mcp add-json`.
//!
//! Builds one JSON blob and hands it to the binary as a single argument. A
//! best-effort `mcp remove` runs first so re-installs are idempotent.

use super::{sh_quote, InstallOutcome, InstallRequest, TargetAdapter};
use crate::compiler::InstallCommandPayload;
use crate::error::{Error, Result};
use crate::paths::probe_binary;
use colored::Colorize;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::{Command, Stdio};

const USER_LOCAL_BINARY: &str = "~/.claude/local/claude";
const BINARY_NAME: &str = "claude";

#[derive(Default)]
pub struct ClaudeCliAdapter;

/// `{"type", command?, args?, env?, url?, headers?}`: url/headers only in
/// remote mode, command/args/env only in local mode.
pub fn add_json_blob(payload: &InstallCommandPayload) -> Value {
    let mut blob = json!({"type": payload.kind.as_str()});
    if payload.is_remote() {
        blob["url"] = json!(payload.url);
        if !payload.headers.is_empty() {
            let headers: serde_json::Map<String, Value> = payload
                .headers
                .iter()
                .map(|h| (h.name.clone(), json!(h.value)))
                .collect();
            blob["headers"] = Value::Object(headers);
        }
    } else {
        blob["command"] = json!(payload.command);
        if !payload.args.is_empty() {
            blob["args"] = json!(payload.args);
        }
        if !payload.env.is_empty() {
            blob["env"] = json!(payload.env);
        }
    }
    blob
}

impl ClaudeCliAdapter {
    fn binary(&self) -> Option<PathBuf> {
        probe_binary(USER_LOCAL_BINARY, BINARY_NAME)
    }
}

impl TargetAdapter for ClaudeCliAdapter {
    fn id(&self) -> &'static str {
        "claude"
    }

    fn install(&mut self, request: &InstallRequest) -> Result<InstallOutcome> {
        let resolved = request.resolved;
        resolved.validate()?;
        let manual = self.manual_command(request.masked);

        let binary = self.binary().ok_or_else(|| Error::CliUnavailable {
            binary: BINARY_NAME.to_string(),
            manual_command: manual.clone(),
        })?;

        // idempotent re-install: drop any previous entry with this name
        let _ = Command::new(&binary)
            .args(["mcp", "remove", &resolved.name])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        let blob = serde_json::to_string(&add_json_blob(resolved))?;
        println!(
            "{} Registering {} via `claude mcp add-json`...",
            "→".blue().bold(),
            resolved.name.bold()
        );
        let status = Command::new(&binary)
            .args(["mcp", "add-json", &resolved.name, &blob])
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|_| Error::CliUnavailable {
                binary: BINARY_NAME.to_string(),
                manual_command: manual.clone(),
            })?;

        if status.success() {
            Ok(InstallOutcome {
                success: true,
                manual_command: None,
            })
        } else {
            Ok(InstallOutcome {
                success: false,
                manual_command: Some(manual),
            })
        }
    }

    fn manual_command(&self, masked: &InstallCommandPayload) -> String {
        let blob = serde_json::to_string(&add_json_blob(masked)).unwrap_or_default();
        format!(
            "claude mcp add-json {} {}",
            sh_quote(&masked.name),
            sh_quote(&blob)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile_package, compile_remote};
    use crate::descriptor::normalize;
    use serde_json::json;

    #[test]
    fn test_local_blob_shape() {
        let server = normalize(&json!({
            "name": "gh",
            "packages": [{
                "identifier": "foo", "version": "1.0", "registry_type": "npm",
                "environment_variables": [{"name": "K", "value": "v"}]
            }]
        }));
        let payload = compile_package(&server, &server.packages[0]).unwrap();
        let blob = add_json_blob(&payload);
        assert_eq!(blob["type"], "stdio");
        assert_eq!(blob["command"], "npx");
        assert_eq!(blob["args"][0], "foo@1.0");
        assert_eq!(blob["env"]["K"], "v");
        assert!(blob.get("url").is_none());
    }

    #[test]
    fn test_remote_blob_shape() {
        let server = normalize(&json!({
            "name": "r",
            "remotes": [{
                "type": "sse", "url": "https://x.test/sse",
                "headers": [{"name": "X-Key", "value": "abc"}]
            }]
        }));
        let payload = compile_remote(&server, &server.remotes[0]).unwrap();
        let blob = add_json_blob(&payload);
        assert_eq!(blob["type"], "sse");
        assert_eq!(blob["url"], "https://x.test/sse");
        assert_eq!(blob["headers"]["X-Key"], "abc");
        assert!(blob.get("command").is_none());
        // this adapter has no header-count restriction
    }

    #[test]
    fn test_manual_command_masks_inputs() {
        let server = normalize(&json!({
            "name": "gh",
            "packages": [{
                "identifier": "foo", "registry_type": "npm",
                "environment_variables": [{"name": "TOKEN", "is_secret": true}]
            }]
        }));
        let payload = compile_package(&server, &server.packages[0]).unwrap();
        let manual = ClaudeCliAdapter::default().manual_command(&payload.masked());
        assert!(manual.starts_with("claude mcp add-json gh "));
        assert!(manual.contains("<TOKEN>"));
        assert!(!manual.contains("${input:"));
    }
}
