use super::*;
use crate::remote::fake::FakeRemote;
use std::fs;
use tempfile::TempDir;

const PROJECT: &str = "p1";

/// Runs a reconciliation, returning the summary and the lines handed to the sink.
fn run(
    store: &FakeRemote,
    artifacts: &[Artifact],
    root: &Path,
) -> (ReconciliationSummary, Vec<(ReportLine, PathBuf, String)>) {
    let engine = DiffEngine::default();
    let mut seen = Vec::new();
    let mut sink = |line: &ReportLine, path: &Path, diff: &RenderedDiff| {
        seen.push((line.clone(), path.to_path_buf(), diff.to_string()));
    };
    let summary = reconcile(store, PROJECT, artifacts, root, &engine, &mut sink).unwrap();
    (summary, seen)
}

fn all_artifacts(store: &FakeRemote) -> Vec<Artifact> {
    let mut artifacts = store.list_actions(PROJECT).unwrap();
    artifacts.extend(store.list_functions(PROJECT).unwrap());
    artifacts
}

mod errors;
