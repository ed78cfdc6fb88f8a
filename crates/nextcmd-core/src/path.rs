use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Resolve the daemon's data directory based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. `NEXTCMD_PATH` environment variable (with tilde expansion)
/// 3. System data directory (`$XDG_DATA_HOME` / platform equivalent)
/// 4. `~/.nextcmd` (fallback for systems without a standard data directory)
pub fn resolve_data_dir(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var("NEXTCMD_PATH") {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(data_dir) = dirs::data_dir() {
        return Ok(data_dir.join("nextcmd"));
    }

    if let Some(home) = std::env::var_os("HOME") {
        return Ok(PathBuf::from(home).join(".nextcmd"));
    }

    Err(Error::Config(
        "could not determine a data directory: no HOME or system data directory found".into(),
    ))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

/// Normalize a path for comparison: canonicalize when possible, else
/// join onto the cwd so relative paths still compare consistently.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}
