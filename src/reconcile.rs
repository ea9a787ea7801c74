use crate::artifact::{Artifact, ScriptKind};
use crate::locate::locate;
use crate::remote::{RemoteStore, snippet};
use crate::text_diff::{DiffEngine, RenderedDiff};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("No actions or functions found in project {0}")]
    NoArtifacts(String),
    #[error("Cannot use {path} as project directory: {source}")]
    Root {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finding {
    /// The local file differs from the remote script.
    Different,
    /// The remote script has no local counterpart.
    LocalNotFound,
}

/// One line of the reconciliation summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub display_id: String,
    pub kind: ScriptKind,
    pub container: String,
    pub finding: Finding,
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.finding {
            Finding::Different => write!(
                f,
                "{} ({}) [{}]",
                self.display_id, self.kind, self.container
            ),
            Finding::LocalNotFound => write!(
                f,
                "**LOCAL NOT FOUND** {} ({}) [{}]",
                self.display_id, self.kind, self.container
            ),
        }
    }
}

/// Counters for the non-fatal error categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchErrors {
    pub local_not_found: usize,
    pub resp_unexpected: usize,
    pub walk_dir_err: usize,
}

impl SearchErrors {
    pub fn any(&self) -> bool {
        self.local_not_found > 0 || self.resp_unexpected > 0 || self.walk_dir_err > 0
    }
}

impl fmt::Display for SearchErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "local scripts not found: {}", self.local_not_found)?;
        writeln!(f, "unexpected API responses: {}", self.resp_unexpected)?;
        write!(f, "errors while walking project files: {}", self.walk_dir_err)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationSummary {
    /// Findings in processing order.
    pub lines: Vec<ReportLine>,
    pub errors: SearchErrors,
    /// Scripts present both remotely and locally that were diffed.
    pub scripts_compared: usize,
}

impl ReconciliationSummary {
    pub fn is_clean(&self) -> bool {
        self.lines.is_empty() && !self.errors.any()
    }
}

/// Receives every difference as soon as it is found.
///
/// The CLI prints the diff here and may block until the operator
/// acknowledges it; tests collect the calls.
pub trait DiffSink {
    fn on_difference(&mut self, line: &ReportLine, local_path: &Path, diff: &RenderedDiff);
}

impl<F> DiffSink for F
where
    F: FnMut(&ReportLine, &Path, &RenderedDiff),
{
    fn on_difference(&mut self, line: &ReportLine, local_path: &Path, diff: &RenderedDiff) {
        self(line, local_path, diff)
    }
}

/// Compare every script of `artifacts` against its local counterpart under `root`.
///
/// Artifacts are processed sequentially in the given order, `pre` before
/// `post`. Remote scripts that are absent are skipped silently. A failure on
/// one script is counted and never stops the run; the only errors returned
/// are an empty artifact list and an unusable root directory.
pub fn reconcile(
    store: &dyn RemoteStore,
    project_id: &str,
    artifacts: &[Artifact],
    root: &Path,
    engine: &DiffEngine,
    sink: &mut dyn DiffSink,
) -> Result<ReconciliationSummary, ReconcileError> {
    if artifacts.is_empty() {
        return Err(ReconcileError::NoArtifacts(project_id.to_string()));
    }
    let root = canonical_root(root)?;

    let mut summary = ReconciliationSummary::default();
    for artifact in artifacts {
        for &kind in artifact.script_kinds() {
            reconcile_script(store, artifact, kind, &root, engine, sink, &mut summary);
        }
    }

    info!(
        "Compared {} scripts across {} artifacts",
        summary.scripts_compared,
        artifacts.len()
    );
    Ok(summary)
}

fn canonical_root(root: &Path) -> Result<PathBuf, ReconcileError> {
    let canonical = root.canonicalize().map_err(|e| {
        if e.kind() == ErrorKind::PermissionDenied {
            ReconcileError::PermissionDenied(root.to_path_buf())
        } else {
            ReconcileError::Root {
                path: root.to_path_buf(),
                source: e,
            }
        }
    })?;
    if !canonical.is_dir() {
        return Err(ReconcileError::NotADirectory(canonical));
    }
    Ok(canonical)
}

fn reconcile_script(
    store: &dyn RemoteStore,
    artifact: &Artifact,
    kind: ScriptKind,
    root: &Path,
    engine: &DiffEngine,
    sink: &mut dyn DiffSink,
    summary: &mut ReconciliationSummary,
) {
    let remote = match store.fetch_script(artifact, kind) {
        Ok(Some(script)) => script,
        Ok(None) => {
            debug!("No {kind} script for {}", artifact.display_id);
            return;
        }
        Err(e) => {
            warn!("Failed to load {kind} script of {}: {e}", artifact.display_id);
            summary.errors.resp_unexpected += 1;
            return;
        }
    };

    let line = |finding| ReportLine {
        display_id: artifact.display_id.clone(),
        kind,
        container: artifact.container.clone(),
        finding,
    };

    let local_path = match locate(root, &artifact.display_id, kind.file_suffix()) {
        Ok(Some(path)) => path,
        Ok(None) => {
            info!(
                "Local {kind} script not found for {} ({}), remote starts with: {}",
                artifact.name,
                artifact.container,
                snippet_of(&remote)
            );
            summary.errors.local_not_found += 1;
            summary.lines.push(line(Finding::LocalNotFound));
            return;
        }
        Err(e) => {
            warn!("Failed to search for {} ({kind}): {e}", artifact.display_id);
            summary.errors.walk_dir_err += 1;
            return;
        }
    };

    let local = match std::fs::read(&local_path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!("Failed to read {}: {e}", local_path.display());
            summary.errors.walk_dir_err += 1;
            return;
        }
    };

    summary.scripts_compared += 1;
    if let Some(diff) = engine.compute(&local, &remote) {
        let line = line(Finding::Different);
        sink.on_difference(&line, &local_path, &diff);
        summary.lines.push(line);
    }
}

fn snippet_of(script: &str) -> String {
    snippet(script.lines().next().unwrap_or_default())
}

#[cfg(test)]
mod tests;
