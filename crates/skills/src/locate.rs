//! Resolution of bare script filenames against the skill root.
//!
//! Skills may call helper scripts that live in another skill's directory, so resolution
//! looks through every skill directory rather than only the invoking one.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Resolve `script` to an absolute path.
///
/// Absolute input is returned unchanged without an existence check. Otherwise each
/// immediate subdirectory of `skill_root`, in file-name order, is checked for a regular
/// file named `script`; the first hit wins.
pub fn locate(script: &str, skill_root: &Path) -> Option<PathBuf> {
    let script_path = Path::new(script);
    if script_path.is_absolute() {
        return Some(script_path.to_path_buf());
    }

    if !skill_root.is_dir() {
        tracing::debug!(root = %skill_root.display(), "skill root missing, cannot locate {script}");
        return None;
    }

    let root = std::path::absolute(skill_root).unwrap_or_else(|_| skill_root.to_path_buf());

    WalkDir::new(&root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read skill root entry while locating {script}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.path().join(script_path))
        .find(|candidate| candidate.is_file())
}
