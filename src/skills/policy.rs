//! Installed-skill records and the uninstall policy.
//!
//! Records are derived by scanning the agents' skill directories at query
//! time; there is no persisted index. The policy decides whether the agents
//! sharing a skill can be uninstalled individually or only together, and is
//! recomputed from current on-disk reality at the moment of uninstall.

use crate::agents::{Scope, AGENTS};
use crate::skills::discovery::MANIFEST_FILE;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallPolicy {
    /// Each agent's copy can be removed independently.
    AgentSelect,
    /// The agents must be uninstalled together.
    AllAgents { reason: String },
}

#[derive(Debug, Clone)]
pub struct InstalledSkillRecord {
    pub name: String,
    pub description: String,
    /// Directory entry as found in the first agent's skills dir.
    pub path: PathBuf,
    /// Fully resolved real path; equal entries mean shared storage.
    pub canonical_path: PathBuf,
    pub scope: Scope,
    /// Agent ids whose directory currently contains this skill.
    pub agents: Vec<String>,
    pub policy: UninstallPolicy,
}

/// One agent's resolved skills directory, canonicalized for sharing checks.
#[derive(Debug, Clone)]
pub struct AgentDirEntry {
    pub agent_id: String,
    pub universal: bool,
    pub canonical_dir: PathBuf,
}

const UNIVERSAL_REASON: &str =
    "skills in the shared .agents/skills directory apply to every agent that reads it";

/// Decide the uninstall policy for one skill's agent set.
pub fn decide_policy(scope: Scope, entries: &[AgentDirEntry]) -> UninstallPolicy {
    if scope == Scope::Project && entries.iter().any(|entry| entry.universal) {
        return UninstallPolicy::AllAgents {
            reason: UNIVERSAL_REASON.to_string(),
        };
    }

    let mut by_dir: BTreeMap<&Path, usize> = BTreeMap::new();
    for entry in entries {
        *by_dir.entry(entry.canonical_dir.as_path()).or_default() += 1;
    }
    if let Some((shared, _)) = by_dir.iter().find(|(_, count)| **count >= 2) {
        return UninstallPolicy::AllAgents {
            reason: format!(
                "agents share the same skills directory: {}",
                shared.display()
            ),
        };
    }

    UninstallPolicy::AgentSelect
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Frontmatter {
    description: Option<String>,
}

fn skill_description(dir: &Path) -> String {
    let Ok(content) = std::fs::read_to_string(dir.join(MANIFEST_FILE)) else {
        return String::new();
    };
    content
        .strip_prefix("---")
        .and_then(|rest| rest.find("\n---").map(|end| &rest[..end]))
        .and_then(|fm| serde_yaml::from_str::<Frontmatter>(fm).ok())
        .and_then(|fm| fm.description)
        .unwrap_or_default()
}

struct FoundSkill {
    path: PathBuf,
    canonical: PathBuf,
    entries: Vec<AgentDirEntry>,
}

/// Scan every agent directory for the given scope and group what is found by
/// skill name. Unreadable agent directories are skipped.
pub fn scan_installed(scope: Scope, workspace: Option<&Path>) -> Vec<InstalledSkillRecord> {
    let mut found: BTreeMap<String, FoundSkill> = BTreeMap::new();

    for agent in AGENTS {
        let Ok(dir) = agent.dir_for(scope, workspace) else {
            continue;
        };
        let canonical_dir = match dir.canonicalize() {
            Ok(canonical) => canonical,
            Err(e) => {
                debug!(agent = agent.id, error = %e, "skipping unresolvable skills dir");
                continue;
            }
        };
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
            let agent_entry = AgentDirEntry {
                agent_id: agent.id.to_string(),
                universal: agent.universal,
                canonical_dir: canonical_dir.clone(),
            };
            found
                .entry(name)
                .and_modify(|skill| skill.entries.push(agent_entry.clone()))
                .or_insert_with(|| FoundSkill {
                    path,
                    canonical,
                    entries: vec![agent_entry],
                });
        }
    }

    found
        .into_iter()
        .map(|(name, skill)| {
            let policy = decide_policy(scope, &skill.entries);
            InstalledSkillRecord {
                description: skill_description(&skill.canonical),
                path: skill.path,
                canonical_path: skill.canonical,
                scope,
                agents: skill
                    .entries
                    .iter()
                    .map(|entry| entry.agent_id.clone())
                    .collect(),
                policy,
                name,
            }
        })
        .collect()
}

/// Current policy for one installed skill, recomputed from disk.
pub fn policy_for(
    name: &str,
    scope: Scope,
    workspace: Option<&Path>,
) -> Option<InstalledSkillRecord> {
    scan_installed(scope, workspace)
        .into_iter()
        .find(|record| record.name == name)
}
