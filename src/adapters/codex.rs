//! External CLI adapter for `codex mcp add`, which takes discrete flags.
//!
//! Local mode emits `--env K=V` pairs, a `--` separator, then the command and
//! its arguments. Remote mode is deliberately narrow: at most one header,
//! which must be `Authorization: Bearer <token>`; the token travels to the
//! child process through a generated environment variable referenced by
//! `--bearer-token-env-var`, never on the command line.

use super::{sh_quote, InstallOutcome, InstallRequest, TargetAdapter};
use crate::compiler::InstallCommandPayload;
use crate::error::{Error, Result};
use crate::paths::probe_binary;
use colored::Colorize;
use std::path::PathBuf;
use std::process::{Command, Stdio};

const USER_LOCAL_BINARY: &str = "~/.codex/bin/codex";
const BINARY_NAME: &str = "codex";
const BEARER_VAR_PREFIX: &str = "MCP";
const BEARER_VAR_SUFFIX: &str = "BEARER_TOKEN";

#[derive(Default)]
pub struct CodexCliAdapter;

/// Generated env var name: `MCP_<SANITIZED_UPPER_NAME>_BEARER_TOKEN`.
pub fn bearer_env_var(server_name: &str) -> String {
    let sanitized: String = server_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{BEARER_VAR_PREFIX}_{sanitized}_{BEARER_VAR_SUFFIX}")
}

/// Argument vector plus extra child environment for one payload.
pub fn build_invocation(
    resolved: &InstallCommandPayload,
) -> Result<(Vec<String>, Vec<(String, String)>)> {
    resolved.validate()?;
    let mut args = vec![
        "mcp".to_string(),
        "add".to_string(),
        resolved.name.clone(),
    ];
    let mut extra_env = Vec::new();

    if let Some(url) = &resolved.url {
        args.push("--url".to_string());
        args.push(url.clone());

        match resolved.headers.as_slice() {
            [] => {}
            [header] => {
                if !header.name.eq_ignore_ascii_case("authorization") {
                    return Err(Error::UnsupportedTransport(format!(
                        "this target only supports an Authorization header, got '{}'",
                        header.name
                    )));
                }
                let token = header
                    .value
                    .get(.."Bearer ".len())
                    .filter(|prefix| prefix.eq_ignore_ascii_case("Bearer "))
                    .map(|_| header.value["Bearer ".len()..].to_string())
                    .ok_or_else(|| {
                        Error::UnsupportedTransport(
                            "this target only supports 'Bearer <token>' Authorization values"
                                .to_string(),
                        )
                    })?;
                let var = bearer_env_var(&resolved.name);
                args.push("--bearer-token-env-var".to_string());
                args.push(var.clone());
                extra_env.push((var, token));
            }
            headers => {
                return Err(Error::UnsupportedTransport(format!(
                    "this target supports at most one header, got {}",
                    headers.len()
                )));
            }
        }
    } else {
        for (key, value) in &resolved.env {
            args.push("--env".to_string());
            args.push(format!("{key}={value}"));
        }
        args.push("--".to_string());
        args.push(resolved.command.clone().unwrap_or_default());
        args.extend(resolved.args.iter().cloned());
    }

    Ok((args, extra_env))
}

impl CodexCliAdapter {
    fn binary(&self) -> Option<PathBuf> {
        probe_binary(USER_LOCAL_BINARY, BINARY_NAME)
    }
}

impl TargetAdapter for CodexCliAdapter {
    fn id(&self) -> &'static str {
        "codex"
    }

    fn install(&mut self, request: &InstallRequest) -> Result<InstallOutcome> {
        let (args, extra_env) = build_invocation(request.resolved)?;
        let manual = self.manual_command(request.masked);

        let binary = self.binary().ok_or_else(|| Error::CliUnavailable {
            binary: BINARY_NAME.to_string(),
            manual_command: manual.clone(),
        })?;

        println!(
            "{} Registering {} via `codex mcp add`...",
            "→".blue().bold(),
            request.resolved.name.bold()
        );
        let status = Command::new(&binary)
            .args(&args)
            .envs(extra_env)
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
        match build_invocation(masked) {
            Ok((args, extra_env)) => {
                let mut parts: Vec<String> = extra_env
                    .iter()
                    .map(|(k, v)| format!("{k}={}", sh_quote(v)))
                    .collect();
                parts.push(BINARY_NAME.to_string());
                parts.extend(args.iter().map(|a| sh_quote(a)));
                parts.join(" ")
            }
            Err(e) => format!("# not installable via {BINARY_NAME}: {e}"),
        }
    }
}
