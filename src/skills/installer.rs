//! Multi-agent skill installer.
//!
//! Every (skill × agent) pair is attempted independently; one failure never
//! aborts the batch, and the aggregate separates installed from failed pairs.
//! The physical install goes through one strategy interface: symlink first,
//! recursive copy as fallback.

use crate::agents::{AgentDefinition, Scope};
use crate::error::{Error, Result};
use crate::paths::copy_dir_all;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    Symlink,
    Copy,
}

impl std::fmt::Display for InstallMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            InstallMode::Symlink => "symlink",
            InstallMode::Copy => "copy",
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InstallDisposition {
    pub mode: InstallMode,
    /// The symlink attempt failed even though the install succeeded by copy.
    pub symlink_failed: bool,
}

/// Uniform contract the batch installer calls for one pair.
pub trait InstallStrategy {
    fn install(&self, skill_dir: &Path, target: &Path) -> Result<InstallDisposition>;
}

pub struct SymlinkInstaller;

impl InstallStrategy for SymlinkInstaller {
    fn install(&self, skill_dir: &Path, target: &Path) -> Result<InstallDisposition> {
        #[cfg(unix)]
        std::os::unix::fs::symlink(skill_dir, target)?;
        #[cfg(windows)]
        std::os::windows::fs::symlink_dir(skill_dir, target)?;
        Ok(InstallDisposition {
            mode: InstallMode::Symlink,
            symlink_failed: false,
        })
    }
}

pub struct CopyInstaller;

impl InstallStrategy for CopyInstaller {
    fn install(&self, skill_dir: &Path, target: &Path) -> Result<InstallDisposition> {
        copy_dir_all(skill_dir, target)?;
        Ok(InstallDisposition {
            mode: InstallMode::Copy,
            symlink_failed: false,
        })
    }
}

/// Symlink first; on failure (unsupported filesystem, permissions) fall back
/// to a full copy and record that the symlink attempt failed.
pub struct SymlinkWithCopyFallback {
    primary: SymlinkInstaller,
    fallback: CopyInstaller,
}

impl Default for SymlinkWithCopyFallback {
    fn default() -> Self {
        Self {
            primary: SymlinkInstaller,
            fallback: CopyInstaller,
        }
    }
}

impl InstallStrategy for SymlinkWithCopyFallback {
    fn install(&self, skill_dir: &Path, target: &Path) -> Result<InstallDisposition> {
        match self.primary.install(skill_dir, target) {
            Ok(disposition) => Ok(disposition),
            Err(e) => {
                debug!(target = %target.display(), error = %e, "symlink failed; copying");
                let disposition = self.fallback.install(skill_dir, target)?;
                Ok(InstallDisposition {
                    symlink_failed: true,
                    ..disposition
                })
            }
        }
    }
}

/// A skill selected for installation: its name and canonical directory.
#[derive(Debug, Clone)]
pub struct SkillFiles {
    pub name: String,
    pub dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct InstalledPair {
    pub skill: String,
    pub agent: String,
    pub target: PathBuf,
    pub mode: InstallMode,
    pub symlink_failed: bool,
}

#[derive(Debug, Clone)]
pub struct FailedPair {
    pub skill: String,
    pub agent: String,
    pub error: String,
}

/// Aggregate batch result. Pair order never affects the outcome; the
/// installed/failed sets are a commutative union over pairs.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub installed: Vec<InstalledPair>,
    pub failed: Vec<FailedPair>,
}

impl BatchReport {
    /// At least one pair failed and at least one succeeded.
    pub fn is_partial_failure(&self) -> bool {
        !self.installed.is_empty() && !self.failed.is_empty()
    }
}

fn install_pair(
    skill: &SkillFiles,
    agent: &AgentDefinition,
    scope: Scope,
    workspace: Option<&Path>,
    strategy: &dyn InstallStrategy,
) -> Result<InstalledPair> {
    let base = agent.dir_for(scope, workspace)?;
    std::fs::create_dir_all(&base)?;
    let target = base.join(&skill.name);

    // re-install replaces whatever is there
    remove_entry(&target)?;

    let disposition = strategy.install(&skill.dir, &target)?;
    Ok(InstalledPair {
        skill: skill.name.clone(),
        agent: agent.id.to_string(),
        target,
        mode: disposition.mode,
        symlink_failed: disposition.symlink_failed,
    })
}

/// Install every skill into every agent. Never fails as a whole.
pub fn install_batch(
    skills: &[SkillFiles],
    agents: &[&AgentDefinition],
    scope: Scope,
    workspace: Option<&Path>,
    strategy: &dyn InstallStrategy,
) -> BatchReport {
    let mut report = BatchReport::default();
    for skill in skills {
        for agent in agents {
            match install_pair(skill, agent, scope, workspace, strategy) {
                Ok(pair) => report.installed.push(pair),
                Err(e) => report.failed.push(FailedPair {
                    skill: skill.name.clone(),
                    agent: agent.id.to_string(),
                    error: e.to_string(),
                }),
            }
        }
    }
    report
}

fn remove_entry(target: &Path) -> Result<()> {
    let meta = match std::fs::symlink_metadata(target) {
        Ok(meta) => meta,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    if meta.is_dir() {
        std::fs::remove_dir_all(target)?;
    } else {
        // symlinks (and stray files) are a single directory entry
        std::fs::remove_file(target)?;
    }
    Ok(())
}

fn uninstall_pair(
    skill: &str,
    agent: &AgentDefinition,
    scope: Scope,
    workspace: Option<&Path>,
    removed_targets: &mut HashSet<PathBuf>,
) -> Result<PathBuf> {
    let dir = agent.dir_for(scope, workspace)?;
    // agents can share one physical directory; key removals by the canonical
    // location so every agent pointing at it is credited with the removal
    let canonical = dir.canonicalize().unwrap_or_else(|_| dir.clone()).join(skill);
    let target = dir.join(skill);
    if std::fs::symlink_metadata(&target).is_err() {
        if removed_targets.contains(&canonical) {
            return Ok(target);
        }
        return Err(Error::Skill(format!(
            "'{skill}' is not installed for {}",
            agent.display_name
        )));
    }
    remove_entry(&target)?;
    removed_targets.insert(canonical);
    Ok(target)
}

#[derive(Debug, Clone)]
pub struct RemovedPair {
    pub skill: String,
    pub agent: String,
    pub target: PathBuf,
}

#[derive(Debug, Default)]
pub struct UninstallReport {
    pub removed: Vec<RemovedPair>,
    pub failed: Vec<FailedPair>,
}

/// Removal mode: mirrors install, independent per pair. When several agents
/// resolve to the same physical directory, the one removal counts for all of
/// them, so the aggregate does not depend on pair order.
pub fn uninstall_batch(
    skills: &[String],
    agents: &[&AgentDefinition],
    scope: Scope,
    workspace: Option<&Path>,
) -> UninstallReport {
    let mut report = UninstallReport::default();
    let mut removed_targets = HashSet::new();
    for skill in skills {
        for agent in agents {
            match uninstall_pair(skill, agent, scope, workspace, &mut removed_targets) {
                Ok(target) => report.removed.push(RemovedPair {
                    skill: skill.clone(),
                    agent: agent.id.to_string(),
                    target,
                }),
                Err(e) => report.failed.push(FailedPair {
                    skill: skill.clone(),
                    agent: agent.id.to_string(),
                    error: e.to_string(),
                }),
            }
        }
    }
    report
}
