//! Skill discovery: walk a resolved source directory for `SKILL.md`
//! manifests. Read-only; never mutates the source tree.

use crate::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const MANIFEST_FILE: &str = "SKILL.md";

/// Default walk depth: root, a skills dir, and one level of skill dirs.
const SHALLOW_DEPTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillManifest {
    /// Unique within one discovered source.
    pub name: String,
    pub description: String,
    /// Skill directory, relative to the scanned root.
    pub path: PathBuf,
    pub internal: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiscoveryOptions {
    /// Walk the whole tree instead of the shallow default.
    pub full_depth: bool,
    /// Include manifests marked internal/hidden. Implied when the caller
    /// already names the skills it wants.
    pub include_internal: bool,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Frontmatter {
    name: Option<String>,
    description: Option<String>,
    #[serde(alias = "private", alias = "hidden")]
    internal: bool,
}

/// Split a `---` delimited YAML frontmatter block off a markdown document.
fn extract_frontmatter(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix("---")?;
    let end = rest.find("\n---")?;
    let body = rest[end + 4..].trim_start_matches(['\r', '\n']);
    Some((&rest[..end], body))
}

/// First non-header paragraph line, used when the frontmatter carries no
/// description.
fn first_paragraph(body: &str) -> String {
    body.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .unwrap_or_default()
        .to_string()
}

fn read_manifest(manifest_path: &Path, root: &Path) -> Option<SkillManifest> {
    let content = std::fs::read_to_string(manifest_path).ok()?;
    let skill_dir = manifest_path.parent()?;

    let (frontmatter, body) = match extract_frontmatter(&content) {
        Some((fm, body)) => (serde_yaml::from_str::<Frontmatter>(fm).ok()?, body),
        // a bare SKILL.md still counts; the directory names the skill
        None => (Frontmatter::default(), content.as_str()),
    };

    let name = frontmatter
        .name
        .filter(|n| !n.is_empty())
        .or_else(|| skill_dir.file_name().map(|n| n.to_string_lossy().into_owned()))?;
    let description = frontmatter
        .description
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| first_paragraph(body));

    Some(SkillManifest {
        name,
        description,
        path: skill_dir.strip_prefix(root).ok()?.to_path_buf(),
        internal: frontmatter.internal,
    })
}

fn is_hidden_dir(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

/// Walk `root` and extract skill manifests. Names are unique in the result;
/// on a collision the first discovered manifest wins.
pub fn discover(root: &Path, options: &DiscoveryOptions) -> Result<Vec<SkillManifest>> {
    let max_depth = if options.full_depth {
        usize::MAX
    } else {
        SHALLOW_DEPTH
    };

    let mut skills: Vec<SkillManifest> = Vec::new();
    let walker = WalkDir::new(root)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden_dir(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || entry.file_name() != MANIFEST_FILE {
            continue;
        }
        let Some(manifest) = read_manifest(entry.path(), root) else {
            continue;
        };
        if manifest.internal && !options.include_internal {
            continue;
        }
        if skills.iter().any(|seen| seen.name == manifest.name) {
            debug!(name = %manifest.name, "duplicate skill name; keeping first");
            continue;
        }
        skills.push(manifest);
    }

    Ok(skills)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_skill(root: &Path, dir: &str, frontmatter: &str, body: &str) {
        let skill_dir = root.join(dir);
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(
            skill_dir.join(MANIFEST_FILE),
            format!("---\n{frontmatter}\n---\n\n{body}"),
        )
        .unwrap();
    }

    #[test]
    fn test_discover_reads_frontmatter() {
        let dir = tempfile::tempdir().unwrap();
        write_skill(
            dir.path(),
            "skills/review",
            "name: code-review\ndescription: Reviews diffs",
            "# Code Review\n",
        );
        let skills = discover(dir.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "code-review");
        assert_eq!(skills[0].description, "Reviews diffs");
        assert_eq!(skills[0].path, PathBuf::from("skills/review"));
    }

    #[test]
    fn test_discover_falls_back_to_directory_name() {
        let dir = tempfile::tempdir().unwrap();
        let skill_dir = dir.path().join("triage");
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(skill_dir.join(MANIFEST_FILE), "# Triage\n\nSorts issues.\n").unwrap();
        let skills = discover(dir.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(skills[0].name, "triage");
        assert_eq!(skills[0].description, "Sorts issues.");
    }

    #[test]
    fn test_internal_skills_excluded_by_default() {
        let dir = tempfile::tempdir().unwrap();
        write_skill(dir.path(), "pub", "name: visible", "");
        write_skill(dir.path(), "priv", "name: hidden-one\ninternal: true", "");
        let skills = discover(dir.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "visible");

        let all = discover(
            dir.path(),
            &DiscoveryOptions {
                include_internal: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_depth_bounding() {
        let dir = tempfile::tempdir().unwrap();
        write_skill(dir.path(), "a/b/c/deep", "name: deep", "");
        let shallow = discover(dir.path(), &DiscoveryOptions::default()).unwrap();
        assert!(shallow.is_empty());
        let full = discover(
            dir.path(),
            &DiscoveryOptions {
                full_depth: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(full.len(), 1);
    }

    #[test]
    fn test_duplicate_names_first_wins() {
        let dir = tempfile::tempdir().unwrap();
        write_skill(dir.path(), "one", "name: dup\ndescription: first", "");
        write_skill(dir.path(), "two", "name: dup\ndescription: second", "");
        let skills = discover(dir.path(), &DiscoveryOptions::default()).unwrap();
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].description, "first");
    }

    #[test]
    fn test_hidden_directories_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_skill(dir.path(), ".git/objects", "name: ghost", "");
        let skills = discover(dir.path(), &DiscoveryOptions::default()).unwrap();
        assert!(skills.is_empty());
    }
}
