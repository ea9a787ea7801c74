use crate::dir_walk::{WalkError, walk_files};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("Error while walking project files: {0}")]
    Walk(#[from] WalkError),
}

/// Find the local file holding a script.
///
/// Walks `root` depth-first in file name order and returns the first file
/// whose name starts with `display_id` and ends with `suffix`. The walk stops
/// at the first match, so when several files could match, the one that sorts
/// first in traversal order wins.
///
/// Returns `Ok(None)` when the whole tree was walked without a match, and an
/// error only when the traversal itself failed.
pub fn locate(root: &Path, display_id: &str, suffix: &str) -> Result<Option<PathBuf>, LocateError> {
    for path in walk_files(root) {
        let path = path?;
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if file_name.starts_with(display_id) && file_name.ends_with(suffix) {
            debug!("Matched {} for {display_id} ({suffix})", path.display());
            return Ok(Some(path));
        }
    }
    Ok(None)
}
