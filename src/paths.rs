//! Path helpers: tilde expansion and binary probing.

use std::path::{Path, PathBuf};

/// Expand a leading `~` against the current home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

/// Look up a binary on PATH, returning its full path if found.
pub fn binary_on_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Probe a user-local install location before falling back to PATH.
pub fn probe_binary(user_local: &str, name: &str) -> Option<PathBuf> {
    let local = expand_tilde(user_local);
    if local.is_file() {
        return Some(local);
    }
    binary_on_path(name)
}

/// Default location of the editor-native MCP config store.
pub fn default_store_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".agentry")
        .join("mcp.json")
}

/// Copy directory contents recursively.
pub fn copy_dir_all(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}
