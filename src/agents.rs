//! Registry of supported agent ecosystems and local detection.
//!
//! Detection is a cheap filesystem/PATH probe per agent, recomputed on
//! demand. The `agents` entry is the universal one: its project-scope
//! directory (`.agents/skills`) is shared by convention across agents.

use crate::error::{Error, Result};
use crate::paths::{binary_on_path, expand_tilde};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Scope {
    Project,
    Global,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Scope::Project => "project",
            Scope::Global => "global",
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Probe {
    /// Binary reachable on PATH.
    Binary(&'static str),
    /// Config directory in the home directory.
    ConfigDir(&'static str),
}

#[derive(Debug)]
pub struct AgentDefinition {
    pub id: &'static str,
    pub display_name: &'static str,
    /// Project-scope skills directory, relative to a workspace root.
    pub skills_dir: &'static str,
    /// Global-scope skills directory (home-relative). Agents without one
    /// cannot accept global installs.
    pub global_skills_dir: Option<&'static str>,
    pub probes: &'static [Probe],
    pub universal: bool,
}

pub const AGENTS: &[AgentDefinition] = &[
    AgentDefinition {
        id: "claude-code",
        display_name: "Claude Code",
        skills_dir: ".claude/skills",
        global_skills_dir: Some("~/.claude/skills"),
        probes: &[Probe::Binary("claude"), Probe::ConfigDir("~/.claude")],
        universal: false,
    },
    AgentDefinition {
        id: "codex",
        display_name: "Codex",
        skills_dir: ".codex/skills",
        global_skills_dir: Some("~/.codex/skills"),
        probes: &[Probe::Binary("codex"), Probe::ConfigDir("~/.codex")],
        universal: false,
    },
    AgentDefinition {
        id: "cursor",
        display_name: "Cursor",
        skills_dir: ".cursor/skills",
        global_skills_dir: Some("~/.cursor/skills"),
        probes: &[Probe::ConfigDir("~/.cursor")],
        universal: false,
    },
    AgentDefinition {
        id: "gemini-cli",
        display_name: "Gemini CLI",
        skills_dir: ".gemini/skills",
        global_skills_dir: Some("~/.gemini/skills"),
        probes: &[Probe::Binary("gemini"), Probe::ConfigDir("~/.gemini")],
        universal: false,
    },
    AgentDefinition {
        id: "agents",
        display_name: "Universal (.agents)",
        skills_dir: ".agents/skills",
        global_skills_dir: None,
        probes: &[],
        universal: true,
    },
];

impl AgentDefinition {
    /// Cheap local probe; never touches the network.
    pub fn detect(&self) -> bool {
        if self.universal {
            // a convention, not an installed tool
            return true;
        }
        self.probes.iter().any(|probe| match probe {
            Probe::Binary(name) => binary_on_path(name).is_some(),
            Probe::ConfigDir(dir) => expand_tilde(dir).is_dir(),
        })
    }

    /// Resolve this agent's skills directory for a scope.
    pub fn dir_for(&self, scope: Scope, workspace: Option<&Path>) -> Result<PathBuf> {
        match scope {
            Scope::Project => {
                let root = workspace.ok_or_else(|| {
                    Error::Skill(
                        "project-scope install requires a workspace root".to_string(),
                    )
                })?;
                Ok(root.join(self.skills_dir))
            }
            Scope::Global => {
                let dir = self.global_skills_dir.ok_or_else(|| {
                    Error::Skill(format!(
                        "{} has no global skills directory",
                        self.display_name
                    ))
                })?;
                Ok(expand_tilde(dir))
            }
        }
    }
}

pub fn by_id(id: &str) -> Option<&'static AgentDefinition> {
    AGENTS.iter().find(|agent| agent.id == id)
}

pub fn universal() -> &'static AgentDefinition {
    AGENTS
        .iter()
        .find(|agent| agent.universal)
        .expect("registry always has a universal agent")
}

/// Agents detected on this machine right now.
pub fn detected() -> Vec<&'static AgentDefinition> {
    AGENTS.iter().filter(|agent| agent.detect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_one_universal_agent() {
        assert_eq!(AGENTS.iter().filter(|a| a.universal).count(), 1);
        assert_eq!(universal().id, "agents");
        assert_eq!(universal().skills_dir, ".agents/skills");
    }

    #[test]
    fn test_project_dir_requires_workspace() {
        let agent = by_id("claude-code").unwrap();
        assert!(agent.dir_for(Scope::Project, None).is_err());
        let dir = agent
            .dir_for(Scope::Project, Some(Path::new("/ws")))
            .unwrap();
        assert_eq!(dir, PathBuf::from("/ws/.claude/skills"));
    }

    #[test]
    fn test_universal_agent_has_no_global_dir() {
        let err = universal().dir_for(Scope::Global, None).unwrap_err();
        assert!(matches!(err, Error::Skill(_)));
    }

    #[test]
    fn test_unknown_agent_id() {
        assert!(by_id("not-an-agent").is_none());
    }
}
