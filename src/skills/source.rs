//! Skill source resolution: a source string becomes a local directory to
//! scan, cloning remote git sources into a self-cleaning temp directory.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillSource {
    Local(PathBuf),
    Git {
        url: String,
        reference: Option<String>,
        subpath: Option<String>,
    },
}

impl SkillSource {
    /// Parse a source reference. Existing local paths win; otherwise
    /// `owner/repo` shorthand (GitHub) or a full git URL, with an optional
    /// `#ref` and `#ref:subpath` suffix.
    pub fn parse(input: &str) -> Result<Self> {
        if Path::new(input).exists() {
            return Ok(SkillSource::Local(PathBuf::from(input)));
        }

        let (base, suffix) = match input.split_once('#') {
            Some((base, suffix)) => (base, Some(suffix)),
            None => (input, None),
        };
        let (reference, subpath) = match suffix {
            Some(s) => match s.split_once(':') {
                Some((r, p)) => (
                    (!r.is_empty()).then(|| r.to_string()),
                    (!p.is_empty()).then(|| p.to_string()),
                ),
                None => ((!s.is_empty()).then(|| s.to_string()), None),
            },
            None => (None, None),
        };

        let url = if base.starts_with("http://")
            || base.starts_with("https://")
            || base.starts_with("git@")
            || base.starts_with("ssh://")
        {
            base.to_string()
        } else if is_owner_repo(base) {
            format!("https://github.com/{base}.git")
        } else {
            return Err(Error::SourceResolution(format!(
                "'{input}' is neither an existing path nor a recognized git source"
            )));
        };

        Ok(SkillSource::Git {
            url,
            reference,
            subpath,
        })
    }
}

fn is_owner_repo(s: &str) -> bool {
    let mut parts = s.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(repo), None) => {
            !owner.is_empty()
                && !repo.is_empty()
                && [owner, repo].iter().all(|part| {
                    part.chars()
                        .all(|c| c.is_ascii_alphanumeric() || "-_.".contains(c))
                })
        }
        _ => false,
    }
}

/// A directory ready for discovery. Holds the clone's temp directory alive;
/// dropping the handle removes it, on success and failure paths alike.
pub struct ResolvedSource {
    root: PathBuf,
    subpath: Option<PathBuf>,
    temp: Option<TempDir>,
}

impl ResolvedSource {
    /// The directory skill discovery should walk.
    pub fn scan_root(&self) -> PathBuf {
        match &self.subpath {
            Some(sub) => self.root.join(sub),
            None => self.root.clone(),
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }
}

impl Drop for ResolvedSource {
    fn drop(&mut self) {
        if let Some(temp) = self.temp.take() {
            let path = temp.path().to_path_buf();
            if let Err(e) = temp.close() {
                // cleanup failures are logged, never surfaced
                warn!(path = %path.display(), error = %e, "failed to remove clone directory");
            }
        }
    }
}

/// Resolve a source to a scannable directory, cloning when remote.
pub fn resolve(source: &SkillSource) -> Result<ResolvedSource> {
    match source {
        SkillSource::Local(path) => {
            if !path.is_dir() {
                return Err(Error::SourceResolution(format!(
                    "'{}' is not a directory",
                    path.display()
                )));
            }
            Ok(ResolvedSource {
                root: path.clone(),
                subpath: None,
                temp: None,
            })
        }
        SkillSource::Git {
            url,
            reference,
            subpath,
        } => {
            let temp = tempfile::Builder::new()
                .prefix("agentry-clone-")
                .tempdir()
                .map_err(|e| Error::SourceResolution(format!("cannot create temp dir: {e}")))?;

            clone_into(url, reference.as_deref(), temp.path())?;

            let subpath = subpath.as_ref().map(PathBuf::from);
            if let Some(sub) = &subpath {
                if !temp.path().join(sub).is_dir() {
                    return Err(Error::SourceResolution(format!(
                        "subpath '{}' does not exist in {url}",
                        sub.display()
                    )));
                }
            }

            Ok(ResolvedSource {
                root: temp.path().to_path_buf(),
                subpath,
                temp: Some(temp),
            })
        }
    }
}

fn clone_into(url: &str, reference: Option<&str>, target: &Path) -> Result<()> {
    let mut args = vec!["clone", "--depth", "1"];
    if let Some(r) = reference {
        args.extend(["--branch", r]);
    }
    let status = Command::new("git")
        .args(&args)
        .arg(url)
        .arg(target)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| Error::SourceResolution(format!("cannot run git: {e}")))?;
    if status.success() {
        return Ok(());
    }

    // --branch only takes branches and tags; retry with a full clone and an
    // explicit checkout for commit refs
    if let Some(r) = reference {
        clear_dir(target)?;
        let status = Command::new("git")
            .args(["clone", url])
            .arg(target)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| Error::SourceResolution(format!("cannot run git: {e}")))?;
        if status.success() {
            let status = Command::new("git")
                .args(["-C"])
                .arg(target)
                .args(["checkout", r])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map_err(|e| Error::SourceResolution(format!("cannot run git: {e}")))?;
            if status.success() {
                return Ok(());
            }
        }
    }

    Err(Error::SourceResolution(format!("failed to clone {url}")))
}

fn clear_dir(dir: &Path) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(entry.path())?;
        } else {
            std::fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_path() {
        let dir = tempfile::tempdir().unwrap();
        let source = SkillSource::parse(dir.path().to_str().unwrap()).unwrap();
        assert!(matches!(source, SkillSource::Local(_)));
    }

    #[test]
    fn test_parse_owner_repo_shorthand() {
        let source = SkillSource::parse("acme/skills").unwrap();
        assert_eq!(
            source,
            SkillSource::Git {
                url: "https://github.com/acme/skills.git".to_string(),
                reference: None,
                subpath: None,
            }
        );
    }

    #[test]
    fn test_parse_url_with_ref_and_subpath() {
        let source = SkillSource::parse("https://git.test/r.git#v1.2:skills/core").unwrap();
        assert_eq!(
            source,
            SkillSource::Git {
                url: "https://git.test/r.git".to_string(),
                reference: Some("v1.2".to_string()),
                subpath: Some("skills/core".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_rejects_nonexistent_non_git() {
        let err = SkillSource::parse("/no/such/path/at/all").unwrap_err();
        assert!(matches!(err, Error::SourceResolution(_)));
    }

    #[test]
    fn test_resolve_local_requires_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let source = SkillSource::Local(file.path().to_path_buf());
        assert!(resolve(&source).is_err());
    }

    #[test]
    fn test_resolved_local_source_is_not_temporary() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve(&SkillSource::Local(dir.path().to_path_buf())).unwrap();
        assert!(!resolved.is_temporary());
        assert_eq!(resolved.scan_root(), dir.path());
    }

    #[test]
    fn test_temp_dir_removed_on_drop() {
        let temp = tempfile::Builder::new()
            .prefix("agentry-clone-")
            .tempdir()
            .unwrap();
        let path = temp.path().to_path_buf();
        let resolved = ResolvedSource {
            root: path.clone(),
            subpath: None,
            temp: Some(temp),
        };
        assert!(path.exists());
        drop(resolved);
        assert!(!path.exists());
    }
}
