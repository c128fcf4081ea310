//! Canonical server descriptors and the registry-response normalizer.
//!
//! Registry and search responses arrive weakly typed: field names vary between
//! `snake_case` and `camelCase`, array fields may be absent or `null`, and
//! scalar fields are sometimes numbers where strings are expected. The
//! normalizer maps every known key variant onto one canonical field and
//! defaults every optional array to empty, so downstream code never branches
//! on "missing vs empty". Normalization always succeeds; an empty descriptor
//! is rejected later by the command compiler, not here.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// One search result, normalized. Immutable once built; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerDescriptor {
    pub name: String,
    pub description: String,
    pub repository: Option<String>,
    pub packages: Vec<PackageDescriptor>,
    pub remotes: Vec<RemoteTransport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageDescriptor {
    pub identifier: String,
    pub version: Option<String>,
    pub registry_type: RegistryKind,
    pub runtime_hint: Option<String>,
    pub runtime_arguments: Vec<Argument>,
    pub package_arguments: Vec<Argument>,
    pub environment_variables: Vec<EnvVarSpec>,
    /// Some registries describe remote-shaped packages inline.
    pub transport: Option<RemoteTransport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryKind {
    Npm,
    Pypi,
    Oci,
    Unknown(String),
}

impl RegistryKind {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "npm" => Self::Npm,
            "pypi" => Self::Pypi,
            "oci" | "docker" => Self::Oci,
            _ => Self::Unknown(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Npm => "npm",
            Self::Pypi => "pypi",
            Self::Oci => "oci",
            Self::Unknown(s) => s,
        }
    }
}

impl Serialize for RegistryKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Positional,
    Named,
}

impl ArgKind {
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("named") {
            Self::Named
        } else {
            Self::Positional
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positional => "positional",
            Self::Named => "named",
        }
    }
}

impl Serialize for ArgKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Argument {
    pub kind: ArgKind,
    pub name: Option<String>,
    pub value: Option<String>,
    /// Suggested default shown to the user but never forced into the args.
    pub value_hint: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub secret: bool,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvVarSpec {
    pub name: String,
    pub value: Option<String>,
    pub default: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub secret: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportKind {
    Stdio,
    Http,
    Sse,
    Other(String),
}

impl TransportKind {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Self::Stdio,
            "http" | "streamable-http" | "streamable_http" => Self::Http,
            "sse" => Self::Sse,
            _ => Self::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
            Self::Sse => "sse",
            Self::Other(s) => s,
        }
    }
}

impl Serialize for TransportKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemoteTransport {
    pub kind: TransportKind,
    pub url: Option<String>,
    pub headers: Vec<HeaderSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderSpec {
    pub name: String,
    /// Template value; may embed `{var}` or `${var}` placeholders.
    pub value: String,
    pub variables: BTreeMap<String, HeaderVariable>,
    pub required: bool,
    pub secret: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderVariable {
    pub description: Option<String>,
    pub secret: bool,
}

// ---------------------------------------------------------------------------
// Raw decode shapes. Every field is optional; aliases absorb the snake/camel
// variance seen across registries. Entries that fail to decode are dropped
// rather than failing the whole descriptor.
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawServer {
    name: Option<String>,
    description: Option<String>,
    #[serde(alias = "repositoryUrl", alias = "repository_url", alias = "repo")]
    repository: Option<RawRepository>,
    packages: Option<Vec<Value>>,
    remotes: Option<Vec<Value>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRepository {
    Url(String),
    Object {
        #[serde(default)]
        url: Option<String>,
    },
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawPackage {
    #[serde(alias = "name")]
    identifier: Option<String>,
    version: Option<Value>,
    #[serde(
        alias = "registryType",
        alias = "registry_name",
        alias = "registryName"
    )]
    registry_type: Option<String>,
    #[serde(alias = "runtimeHint")]
    runtime_hint: Option<String>,
    #[serde(alias = "runtimeArguments")]
    runtime_arguments: Option<Vec<Value>>,
    #[serde(alias = "packageArguments")]
    package_arguments: Option<Vec<Value>>,
    #[serde(alias = "environmentVariables", alias = "env")]
    environment_variables: Option<Vec<Value>>,
    #[serde(alias = "remote")]
    transport: Option<Value>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawArgument {
    #[serde(alias = "type")]
    kind: Option<String>,
    name: Option<String>,
    value: Option<Value>,
    #[serde(alias = "valueHint")]
    value_hint: Option<String>,
    description: Option<String>,
    #[serde(alias = "isRequired", alias = "is_required")]
    required: Option<bool>,
    #[serde(alias = "isSecret", alias = "is_secret")]
    secret: Option<bool>,
    default: Option<Value>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawEnvVar {
    name: Option<String>,
    value: Option<Value>,
    default: Option<Value>,
    description: Option<String>,
    #[serde(alias = "isRequired", alias = "is_required")]
    required: Option<bool>,
    #[serde(alias = "isSecret", alias = "is_secret")]
    secret: Option<bool>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawRemote {
    #[serde(alias = "type", alias = "transportType", alias = "transport_type")]
    kind: Option<String>,
    url: Option<String>,
    headers: Option<Vec<Value>>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawHeader {
    name: Option<String>,
    value: Option<Value>,
    variables: Option<BTreeMap<String, RawHeaderVariable>>,
    #[serde(alias = "isRequired", alias = "is_required")]
    required: Option<bool>,
    #[serde(alias = "isSecret", alias = "is_secret")]
    secret: Option<bool>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawHeaderVariable {
    description: Option<String>,
    #[serde(alias = "isSecret", alias = "is_secret")]
    secret: Option<bool>,
}

/// Render a scalar JSON value as a string; arrays/objects/null are dropped.
fn scalar_to_string(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Normalize a raw registry/search response into a canonical descriptor.
///
/// Total: never fails. Unrecognized or undecodable pieces are dropped, and
/// `normalize(to_value(normalize(x))) == normalize(x)` holds.
pub fn normalize(raw: &Value) -> ServerDescriptor {
    let server: RawServer = serde_json::from_value(raw.clone()).unwrap_or_default();

    let repository = server.repository.and_then(|r| match r {
        RawRepository::Url(url) => Some(url),
        RawRepository::Object { url } => url,
    });

    let packages = server
        .packages
        .unwrap_or_default()
        .iter()
        .filter_map(normalize_package)
        .collect();

    let remotes = server
        .remotes
        .unwrap_or_default()
        .iter()
        .filter_map(normalize_remote)
        .collect();

    ServerDescriptor {
        name: server.name.unwrap_or_default(),
        description: server.description.unwrap_or_default(),
        repository,
        packages,
        remotes,
    }
}

fn normalize_package(raw: &Value) -> Option<PackageDescriptor> {
    let pkg: RawPackage = serde_json::from_value(raw.clone()).ok()?;
    let identifier = pkg.identifier.unwrap_or_default();

    let mut env = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for entry in pkg.environment_variables.unwrap_or_default() {
        if let Some(var) = normalize_env_var(&entry) {
            // env var names are unique within a package; first wins
            if seen.insert(var.name.clone()) {
                env.push(var);
            }
        }
    }

    Some(PackageDescriptor {
        identifier,
        version: scalar_to_string(pkg.version),
        registry_type: RegistryKind::parse(pkg.registry_type.as_deref().unwrap_or("")),
        runtime_hint: pkg.runtime_hint,
        runtime_arguments: normalize_arguments(pkg.runtime_arguments),
        package_arguments: normalize_arguments(pkg.package_arguments),
        environment_variables: env,
        transport: pkg.transport.as_ref().and_then(normalize_remote),
    })
}

fn normalize_arguments(raw: Option<Vec<Value>>) -> Vec<Argument> {
    raw.unwrap_or_default()
        .iter()
        .filter_map(|entry| {
            let arg: RawArgument = serde_json::from_value(entry.clone()).ok()?;
            Some(Argument {
                kind: ArgKind::parse(arg.kind.as_deref().unwrap_or("")),
                name: arg.name,
                value: scalar_to_string(arg.value),
                value_hint: arg.value_hint,
                description: arg.description,
                required: arg.required.unwrap_or(false),
                secret: arg.secret.unwrap_or(false),
                default: scalar_to_string(arg.default),
            })
        })
        .collect()
}

fn normalize_env_var(raw: &Value) -> Option<EnvVarSpec> {
    let var: RawEnvVar = serde_json::from_value(raw.clone()).ok()?;
    let name = var.name?;
    if name.is_empty() {
        return None;
    }
    Some(EnvVarSpec {
        name,
        value: scalar_to_string(var.value),
        default: scalar_to_string(var.default),
        description: var.description,
        required: var.required.unwrap_or(false),
        secret: var.secret.unwrap_or(false),
    })
}

fn normalize_remote(raw: &Value) -> Option<RemoteTransport> {
    let remote: RawRemote = serde_json::from_value(raw.clone()).ok()?;
    let headers = remote
        .headers
        .unwrap_or_default()
        .iter()
        .filter_map(normalize_header)
        .collect();
    Some(RemoteTransport {
        kind: TransportKind::parse(remote.kind.as_deref().unwrap_or("")),
        url: remote.url,
        headers,
    })
}

fn normalize_header(raw: &Value) -> Option<HeaderSpec> {
    let header: RawHeader = serde_json::from_value(raw.clone()).ok()?;
    let name = header.name?;
    let variables = header
        .variables
        .unwrap_or_default()
        .into_iter()
        .map(|(key, var)| {
            (
                key,
                HeaderVariable {
                    description: var.description,
                    secret: var.secret.unwrap_or(false),
                },
            )
        })
        .collect();
    Some(HeaderSpec {
        name,
        value: scalar_to_string(header.value).unwrap_or_default(),
        variables,
        required: header.required.unwrap_or(false),
        secret: header.secret.unwrap_or(false),
    })
}
