//! Compiles a canonical package or remote descriptor into an installable
//! command payload.
//!
//! Package mode resolves a launcher (`npx`/`uvx`/`docker` or an explicit
//! runtime hint), flattens arguments in declaration order, and appends the
//! package-identity argument. Remote mode validates the transport kind and
//! resolves header templates. Either way the payload ends up with exactly one
//! of `command` / `url` set and a deduplicated list of inputs still to be
//! collected before execution.

use crate::descriptor::{
    Argument, PackageDescriptor, RegistryKind, RemoteTransport, ServerDescriptor, TransportKind,
};
use crate::error::{Error, Result};
use crate::inputs::InstallInput;
use crate::placeholder;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// A compiled install invocation: either a local command or a remote
/// endpoint, never both, never neither.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstallCommandPayload {
    pub name: String,
    #[serde(skip)]
    pub kind: TransportKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Header>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InstallInput>,
}

impl InstallCommandPayload {
    /// Exactly one of `command` / `url` must be set.
    pub fn validate(&self) -> Result<()> {
        match (&self.command, &self.url) {
            (Some(_), None) | (None, Some(_)) => Ok(()),
            (Some(_), Some(_)) => Err(Error::Descriptor(
                "payload has both a command and a url".to_string(),
            )),
            (None, None) => Err(Error::Descriptor(
                "payload has neither a command nor a url".to_string(),
            )),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.url.is_some()
    }

    /// Substitute every `${input:id}` token with its collected value.
    pub fn resolved(&self, values: &HashMap<String, String>) -> Self {
        self.substituted(|id| values.get(id).cloned())
    }

    /// Render input placeholders as `<id>` for the copyable manual command,
    /// so secret values never appear in surfaced text.
    pub fn masked(&self) -> Self {
        self.substituted(|id| Some(format!("<{id}>")))
    }

    fn substituted<F>(&self, resolve: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let sub = |text: &str| placeholder::substitute_input_tokens(text, &resolve);
        InstallCommandPayload {
            name: self.name.clone(),
            kind: self.kind.clone(),
            command: self.command.clone(),
            args: self.args.iter().map(|a| sub(a)).collect(),
            env: self
                .env
                .iter()
                .map(|(k, v)| (k.clone(), sub(v)))
                .collect(),
            url: self.url.as_deref().map(sub),
            headers: self
                .headers
                .iter()
                .map(|h| Header {
                    name: h.name.clone(),
                    value: sub(&h.value),
                })
                .collect(),
            inputs: self.inputs.clone(),
        }
    }
}

/// Accumulates prompts while compiling; each id registered at most once,
/// first registration wins.
#[derive(Default)]
struct InputCollector {
    inputs: Vec<InstallInput>,
    seen: HashSet<String>,
}

impl InputCollector {
    fn register(&mut self, id: &str, description: Option<String>, password: bool) {
        if self.seen.insert(id.to_string()) {
            self.inputs.push(InstallInput {
                id: id.to_string(),
                description,
                password,
            });
        }
    }

    /// Register every id referenced by `text`, synthesizing a description
    /// from the surrounding field when none is known.
    fn register_from_text(&mut self, text: &str, context: &str, secret: bool) {
        for id in placeholder::scan_input_tokens(text) {
            self.register(&id, Some(format!("Value for {context}")), secret);
        }
    }
}

fn launcher_for(pkg: &PackageDescriptor) -> Result<String> {
    if let Some(hint) = pkg.runtime_hint.as_deref().filter(|h| !h.is_empty()) {
        return Ok(hint.to_string());
    }
    match &pkg.registry_type {
        RegistryKind::Npm => Ok("npx".to_string()),
        RegistryKind::Pypi => Ok("uvx".to_string()),
        RegistryKind::Oci => Ok("docker".to_string()),
        RegistryKind::Unknown(other) => Err(Error::UnsupportedTransport(format!(
            "no launcher for registry type '{other}'"
        ))),
    }
}

/// The final base argument identifying the package to its launcher.
fn package_spec(pkg: &PackageDescriptor) -> String {
    let version = pkg.version.as_deref().filter(|v| !v.is_empty());
    match (&pkg.registry_type, version) {
        (RegistryKind::Npm, Some(v)) => format!("{}@{}", pkg.identifier, v),
        (RegistryKind::Pypi, Some(v)) if v != "latest" => format!("{}=={}", pkg.identifier, v),
        _ => pkg.identifier.clone(),
    }
}

/// Flatten one argument: push the flag token for named arguments, then the
/// value token when one can be derived.
fn flatten_argument(
    arg: &Argument,
    position: usize,
    args: &mut Vec<String>,
    collector: &mut InputCollector,
) {
    let display = arg
        .name
        .as_deref()
        .or(arg.value_hint.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| format!("argument {}", position + 1));

    let token = if let Some(value) = arg.value.as_deref().filter(|v| !v.is_empty()) {
        collector.register_from_text(value, &display, arg.secret);
        Some(value.to_string())
    } else if let Some(default) = arg.default.as_deref().filter(|d| !d.is_empty()) {
        collector.register_from_text(default, &display, arg.secret);
        Some(default.to_string())
    } else if arg.required || arg.secret {
        // implicit placeholder: prompt instead of failing compilation
        let id = placeholder::sanitize_id(&display);
        let description = arg.description.clone().unwrap_or_else(|| {
            match arg.value_hint.as_deref() {
                Some(hint) if hint != display => format!("Value for {display} (e.g. {hint})"),
                _ => format!("Value for {display}"),
            }
        });
        collector.register(&id, Some(description), arg.secret);
        Some(placeholder::input_token(&id))
    } else {
        None
    };

    match arg.name.as_deref() {
        Some(flag) => {
            args.push(flag.to_string());
            if let Some(token) = token {
                args.push(token);
            }
        }
        None => {
            if let Some(token) = token {
                args.push(token);
            }
        }
    }
}

/// Compile a package descriptor into a local-process payload.
pub fn compile_package(
    server: &ServerDescriptor,
    pkg: &PackageDescriptor,
) -> Result<InstallCommandPayload> {
    if pkg.identifier.is_empty() {
        return Err(Error::Descriptor("package has no identifier".to_string()));
    }

    let command = launcher_for(pkg)?;
    let mut collector = InputCollector::default();
    let mut args = Vec::new();

    for (position, arg) in pkg
        .runtime_arguments
        .iter()
        .chain(pkg.package_arguments.iter())
        .enumerate()
    {
        flatten_argument(arg, position, &mut args, &mut collector);
    }

    // Skip the identity argument when the registry already encoded it.
    if !args.iter().any(|a| a.contains(&pkg.identifier)) {
        args.push(package_spec(pkg));
    }

    let mut env = BTreeMap::new();
    for var in &pkg.environment_variables {
        let value = if let Some(v) = var.value.as_deref().filter(|v| !v.is_empty()) {
            collector.register_from_text(v, &var.name, var.secret);
            v.to_string()
        } else if let Some(d) = var.default.as_deref().filter(|d| !d.is_empty()) {
            collector.register_from_text(d, &var.name, var.secret);
            d.to_string()
        } else if var.required || var.secret {
            let id = placeholder::sanitize_id(&var.name);
            let description = var
                .description
                .clone()
                .unwrap_or_else(|| format!("Value for {}", var.name));
            collector.register(&id, Some(description), var.secret);
            placeholder::input_token(&id)
        } else {
            continue;
        };
        env.insert(var.name.clone(), value);
    }

    let name = if server.name.is_empty() {
        pkg.identifier.clone()
    } else {
        server.name.clone()
    };

    let payload = InstallCommandPayload {
        name,
        kind: TransportKind::Stdio,
        command: Some(command),
        args,
        env,
        url: None,
        headers: Vec::new(),
        inputs: collector.inputs,
    };
    payload.validate()?;
    Ok(payload)
}

/// Compile a remote transport into a remote-endpoint payload.
pub fn compile_remote(
    server: &ServerDescriptor,
    remote: &RemoteTransport,
) -> Result<InstallCommandPayload> {
    match remote.kind {
        TransportKind::Http | TransportKind::Sse => {}
        ref other => {
            return Err(Error::UnsupportedTransport(format!(
                "remote transport kind '{}' cannot be installed",
                other.as_str()
            )));
        }
    }

    let url = remote
        .url
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::Descriptor("remote transport has no url".to_string()))?
        .to_string();

    let mut collector = InputCollector::default();
    let mut headers = Vec::new();
    for header in &remote.headers {
        let rewritten = placeholder::rewrite_header_vars(&header.value);
        let ids = placeholder::scan_input_tokens(&rewritten);
        for id in &ids {
            let (description, secret) = match header.variables.get(id) {
                Some(var) => (
                    var.description
                        .clone()
                        .unwrap_or_else(|| format!("Value for {} header", header.name)),
                    var.secret || header.secret,
                ),
                None => (
                    format!("Value for {} header", header.name),
                    header.secret,
                ),
            };
            collector.register(id, Some(description), secret);
        }

        let empty = rewritten.trim().is_empty();
        let value = if (header.secret && ids.is_empty()) || (empty && header.required) {
            // secret or required header with nothing to send: prompt for it
            let id = placeholder::sanitize_id(&header.name);
            collector.register(
                &id,
                Some(format!("Value for {} header", header.name)),
                header.secret,
            );
            placeholder::input_token(&id)
        } else {
            rewritten
        };

        headers.push(Header {
            name: header.name.clone(),
            value,
        });
    }

    let name = if server.name.is_empty() {
        "remote".to_string()
    } else {
        server.name.clone()
    };

    let payload = InstallCommandPayload {
        name,
        kind: remote.kind.clone(),
        command: None,
        args: Vec::new(),
        env: BTreeMap::new(),
        url: Some(url),
        headers,
        inputs: collector.inputs,
    };
    payload.validate()?;
    Ok(payload)
}

/// Pick a package or remote from a descriptor and compile it. Explicit
/// indices win; otherwise the first package, then the first remote.
pub fn compile_auto(
    server: &ServerDescriptor,
    package: Option<usize>,
    remote: Option<usize>,
) -> Result<InstallCommandPayload> {
    if let Some(idx) = remote {
        let transport = server.remotes.get(idx).ok_or_else(|| {
            Error::Descriptor(format!("descriptor has no remote at index {idx}"))
        })?;
        return compile_remote(server, transport);
    }
    if let Some(idx) = package {
        let pkg = server.packages.get(idx).ok_or_else(|| {
            Error::Descriptor(format!("descriptor has no package at index {idx}"))
        })?;
        return compile_package(server, pkg);
    }
    if let Some(pkg) = server.packages.first() {
        return compile_package(server, pkg);
    }
    if let Some(transport) = server.remotes.first() {
        return compile_remote(server, transport);
    }
    Err(Error::Descriptor(
        "descriptor has no installable packages or remotes".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{normalize, ArgKind, EnvVarSpec, HeaderSpec, HeaderVariable};
    use serde_json::json;

    fn server_with_package(pkg: serde_json::Value) -> ServerDescriptor {
        normalize(&json!({"name": "srv", "packages": [pkg]}))
    }

    fn server_with_remote(remote: serde_json::Value) -> ServerDescriptor {
        normalize(&json!({"name": "srv", "remotes": [remote]}))
    }

    #[test]
    fn test_npm_package_compiles_to_npx() {
        let server = server_with_package(json!({
            "identifier": "foo", "version": "1.2.3", "registry_type": "npm"
        }));
        let payload = compile_package(&server, &server.packages[0]).unwrap();
        assert_eq!(payload.command.as_deref(), Some("npx"));
        assert_eq!(payload.args, vec!["foo@1.2.3"]);
        assert!(payload.url.is_none());
    }

    #[test]
    fn test_pypi_version_handling() {
        let latest = server_with_package(json!({
            "identifier": "foo", "version": "latest", "registry_type": "pypi"
        }));
        let payload = compile_package(&latest, &latest.packages[0]).unwrap();
        assert_eq!(payload.command.as_deref(), Some("uvx"));
        assert_eq!(payload.args, vec!["foo"]);

        let pinned = server_with_package(json!({
            "identifier": "foo", "version": "2.0", "registry_type": "pypi"
        }));
        let payload = compile_package(&pinned, &pinned.packages[0]).unwrap();
        assert_eq!(payload.args, vec!["foo==2.0"]);
    }

    #[test]
    fn test_oci_uses_docker_and_bare_identifier() {
        let server = server_with_package(json!({
            "identifier": "ghcr.io/x/server", "version": "1.0", "registry_type": "oci"
        }));
        let payload = compile_package(&server, &server.packages[0]).unwrap();
        assert_eq!(payload.command.as_deref(), Some("docker"));
        assert_eq!(payload.args, vec!["ghcr.io/x/server"]);
    }

    #[test]
    fn test_unknown_registry_is_unsupported() {
        let server = server_with_package(json!({
            "identifier": "foo", "registry_type": "nuget"
        }));
        let err = compile_package(&server, &server.packages[0]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedTransport(_)));
    }

    #[test]
    fn test_runtime_hint_overrides_launcher_table() {
        let server = server_with_package(json!({
            "identifier": "foo", "registry_type": "nuget", "runtime_hint": "dotnet"
        }));
        let payload = compile_package(&server, &server.packages[0]).unwrap();
        assert_eq!(payload.command.as_deref(), Some("dotnet"));
    }

    #[test]
    fn test_runtime_args_precede_package_args() {
        let server = server_with_package(json!({
            "identifier": "foo", "registry_type": "npm",
            "runtime_arguments": [{"type": "named", "name": "-y"}],
            "package_arguments": [{"type": "positional", "value": "serve"}]
        }));
        let payload = compile_package(&server, &server.packages[0]).unwrap();
        assert_eq!(payload.args, vec!["-y", "serve", "foo"]);
    }

    #[test]
    fn test_identity_skipped_when_already_present() {
        let server = server_with_package(json!({
            "identifier": "foo", "version": "1.0", "registry_type": "npm",
            "package_arguments": [{"type": "positional", "value": "foo@1.0"}]
        }));
        let payload = compile_package(&server, &server.packages[0]).unwrap();
        assert_eq!(payload.args, vec!["foo@1.0"]);
    }

    #[test]
    fn test_required_arg_without_value_becomes_prompt() {
        let server = server_with_package(json!({
            "identifier": "foo", "registry_type": "npm",
            "package_arguments": [{
                "type": "named", "name": "--api-key", "is_required": true, "is_secret": true
            }]
        }));
        let payload = compile_package(&server, &server.packages[0]).unwrap();
        assert_eq!(payload.args[0], "--api-key");
        assert_eq!(payload.args[1], "${input:api_key}");
        assert_eq!(payload.inputs.len(), 1);
        assert_eq!(payload.inputs[0].id, "api_key");
        assert!(payload.inputs[0].password);
    }

    #[test]
    fn test_inputs_deduplicated_across_fields() {
        let mut server = server_with_package(json!({
            "identifier": "foo", "registry_type": "npm",
            "package_arguments": [{"type": "positional", "value": "${input:token}"}]
        }));
        server.packages[0].environment_variables.push(EnvVarSpec {
            name: "TOKEN".to_string(),
            value: Some("${input:token}".to_string()),
            default: None,
            description: None,
            required: true,
            secret: true,
        });
        let payload = compile_package(&server, &server.packages[0]).unwrap();
        let ids: Vec<_> = payload.inputs.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["token"]);
    }

    #[test]
    fn test_env_secret_without_value_becomes_prompt() {
        let server = server_with_package(json!({
            "identifier": "foo", "registry_type": "npm",
            "environment_variables": [{"name": "GITHUB_TOKEN", "is_secret": true}]
        }));
        let payload = compile_package(&server, &server.packages[0]).unwrap();
        assert_eq!(payload.env["GITHUB_TOKEN"], "${input:GITHUB_TOKEN}");
        assert!(payload.inputs[0].password);
    }

    #[test]
    fn test_remote_http_with_header_variables() {
        let server = server_with_remote(json!({
            "type": "http", "url": "https://x.test/mcp",
            "headers": [{
                "name": "Authorization",
                "value": "Bearer {token}",
                "variables": {"token": {"description": "API token", "is_secret": true}}
            }]
        }));
        let payload = compile_remote(&server, &server.remotes[0]).unwrap();
        assert_eq!(payload.url.as_deref(), Some("https://x.test/mcp"));
        assert_eq!(payload.headers[0].value, "Bearer ${input:token}");
        assert_eq!(payload.inputs[0].id, "token");
        assert_eq!(payload.inputs[0].description.as_deref(), Some("API token"));
        assert!(payload.inputs[0].password);
    }

    #[test]
    fn test_remote_stdio_is_unsupported() {
        let server = server_with_remote(json!({"type": "stdio", "url": "https://x.test"}));
        let err = compile_remote(&server, &server.remotes[0]).unwrap_err();
        assert!(matches!(err, Error::UnsupportedTransport(_)));
    }

    #[test]
    fn test_remote_requires_url() {
        let server = server_with_remote(json!({"type": "http"}));
        let err = compile_remote(&server, &server.remotes[0]).unwrap_err();
        assert!(matches!(err, Error::Descriptor(_)));
    }

    #[test]
    fn test_secret_header_without_placeholder_gets_fallback_prompt() {
        let server = ServerDescriptor {
            name: "srv".to_string(),
            description: String::new(),
            repository: None,
            packages: Vec::new(),
            remotes: vec![RemoteTransport {
                kind: TransportKind::Http,
                url: Some("https://x.test".to_string()),
                headers: vec![HeaderSpec {
                    name: "X-Api-Key".to_string(),
                    value: String::new(),
                    variables: std::collections::BTreeMap::new(),
                    required: true,
                    secret: true,
                }],
            }],
        };
        let payload = compile_remote(&server, &server.remotes[0]).unwrap();
        assert_eq!(payload.headers[0].value, "${input:X_Api_Key}");
        assert_eq!(payload.inputs[0].id, "X_Api_Key");
    }

    #[test]
    fn test_every_payload_has_exactly_one_of_command_or_url() {
        let pkg = server_with_package(json!({"identifier": "foo", "registry_type": "npm"}));
        let local = compile_package(&pkg, &pkg.packages[0]).unwrap();
        assert!(local.command.is_some() && local.url.is_none());
        local.validate().unwrap();

        let rem = server_with_remote(json!({"type": "sse", "url": "https://x.test/sse"}));
        let remote = compile_remote(&rem, &rem.remotes[0]).unwrap();
        assert!(remote.command.is_none() && remote.url.is_some());
        remote.validate().unwrap();
    }

    #[test]
    fn test_resolved_and_masked_substitution() {
        let server = server_with_package(json!({
            "identifier": "foo", "registry_type": "npm",
            "environment_variables": [{"name": "KEY", "is_secret": true}]
        }));
        let payload = compile_package(&server, &server.packages[0]).unwrap();

        let values = std::collections::HashMap::from([("KEY".to_string(), "abc".to_string())]);
        assert_eq!(payload.resolved(&values).env["KEY"], "abc");
        assert_eq!(payload.masked().env["KEY"], "<KEY>");
    }

    #[test]
    fn test_compile_auto_empty_descriptor_fails() {
        let server = normalize(&json!({}));
        let err = compile_auto(&server, None, None).unwrap_err();
        assert!(matches!(err, Error::Descriptor(_)));
    }

    #[test]
    fn test_positional_kind_default() {
        assert_eq!(ArgKind::parse("weird"), ArgKind::Positional);
    }

    #[test]
    fn test_header_variable_secrecy_inherited_from_header() {
        let mut variables = std::collections::BTreeMap::new();
        variables.insert(
            "v".to_string(),
            HeaderVariable {
                description: None,
                secret: false,
            },
        );
        let server = ServerDescriptor {
            name: "srv".to_string(),
            description: String::new(),
            repository: None,
            packages: Vec::new(),
            remotes: vec![RemoteTransport {
                kind: TransportKind::Http,
                url: Some("https://x.test".to_string()),
                headers: vec![HeaderSpec {
                    name: "Auth".to_string(),
                    value: "{v}".to_string(),
                    variables,
                    required: false,
                    secret: true,
                }],
            }],
        };
        let payload = compile_remote(&server, &server.remotes[0]).unwrap();
        assert!(payload.inputs[0].password);
    }
}
