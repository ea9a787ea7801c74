//! Lazy recursive file traversal for locating local script files.
//!
//! Directories are read one at a time as the walk reaches them, and the
//! entries of each directory are visited in file name order. This makes the
//! sequence of yielded paths deterministic for a fixed filesystem state, and
//! lets consumers stop early without reading the rest of the tree.
//!
//! Symlinks are yielded like files and never descended into.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
}

impl WalkError {
    fn from_io(path: &Path, e: std::io::Error) -> Self {
        if e.kind() == ErrorKind::PermissionDenied {
            WalkError::PermissionDenied(path.to_path_buf())
        } else {
            WalkError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    }
}

#[derive(Debug)]
struct WalkEntry {
    path: PathBuf,
    is_dir: bool,
}

/// Depth-first iterator over every non-directory entry below a root.
///
/// An unreadable directory yields one `Err` and is skipped; the walk can be
/// resumed by calling `next` again.
pub struct FileWalker {
    pending_dir: Option<PathBuf>,
    stack: Vec<std::vec::IntoIter<WalkEntry>>,
}

pub fn walk_files(root: &Path) -> FileWalker {
    FileWalker {
        pending_dir: Some(root.to_path_buf()),
        stack: Vec::new(),
    }
}

impl Iterator for FileWalker {
    type Item = Result<PathBuf, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(dir) = self.pending_dir.take() {
                match read_sorted(&dir) {
                    Ok(entries) => self.stack.push(entries.into_iter()),
                    Err(e) => return Some(Err(e)),
                }
            }

            let current = self.stack.last_mut()?;
            match current.next() {
                None => {
                    self.stack.pop();
                }
                Some(entry) if entry.is_dir => self.pending_dir = Some(entry.path),
                Some(entry) => return Some(Ok(entry.path)),
            }
        }
    }
}

fn read_sorted(dir: &Path) -> Result<Vec<WalkEntry>, WalkError> {
    let read_dir = std::fs::read_dir(dir).map_err(|e| WalkError::from_io(dir, e))?;

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| WalkError::from_io(dir, e))?;
        let path = entry.path();
        // DirEntry::file_type does not follow symlinks.
        let file_type = entry.file_type().map_err(|e| WalkError::from_io(&path, e))?;
        entries.push(WalkEntry {
            path,
            is_dir: file_type.is_dir(),
        });
    }

    entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));

    Ok(entries)
}
