use super::*;

#[test]
fn empty_artifact_list_is_fatal() {
    let temp = TempDir::new().unwrap();
    let store = FakeRemote::new();
    let engine = DiffEngine::default();
    let mut sink = |_: &ReportLine, _: &Path, _: &RenderedDiff| {};

    let result = reconcile(&store, PROJECT, &[], temp.path(), &engine, &mut sink);

    assert!(matches!(result, Err(ReconcileError::NoArtifacts(p)) if p == PROJECT));
}

#[test]
fn missing_root_is_fatal() {
    let temp = TempDir::new().unwrap();
    let mut store = FakeRemote::new();
    let action = store.add_action(PROJECT, "A", "act", Some("x"), None);
    let engine = DiffEngine::default();
    let mut sink = |_: &ReportLine, _: &Path, _: &RenderedDiff| {};

    let result = reconcile(
        &store,
        PROJECT,
        &[action],
        &temp.path().join("missing"),
        &engine,
        &mut sink,
    );

    assert!(matches!(result, Err(ReconcileError::Root { .. })));
}

#[test]
fn file_root_is_fatal() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("file.js");
    fs::write(&file, "x").unwrap();

    let mut store = FakeRemote::new();
    let action = store.add_action(PROJECT, "A", "act", Some("x"), None);
    let engine = DiffEngine::default();
    let mut sink = |_: &ReportLine, _: &Path, _: &RenderedDiff| {};

    let result = reconcile(&store, PROJECT, &[action], &file, &engine, &mut sink);

    assert!(matches!(result, Err(ReconcileError::NotADirectory(_))));
}

#[test]
fn unexpected_response_is_counted_and_run_continues() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::write(root.join("later-pre.js"), "old").unwrap();

    let mut store = FakeRemote::new();
    let broken = store.add_action(PROJECT, "A", "broken", Some("x"), Some("y"));
    store.break_script(&broken, ScriptKind::Pre);
    store.add_action(PROJECT, "A", "later", Some("new"), None);

    let (summary, seen) = run(&store, &all_artifacts(&store), root);

    assert_eq!(summary.errors.resp_unexpected, 1);
    // The broken action's post script and the later action are still checked.
    assert_eq!(summary.errors.local_not_found, 1);
    assert_eq!(summary.lines.len(), 2);
    assert_eq!(summary.lines[0].display_id, "broken");
    assert_eq!(summary.lines[0].kind, ScriptKind::Post);
    assert_eq!(summary.lines[1].display_id, "later");
    assert_eq!(seen.len(), 1);
    assert!(!summary.is_clean());
}

#[test]
#[cfg(unix)]
fn traversal_error_is_counted_separately_from_not_found() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let restricted = root.join("restricted");
    fs::create_dir(&restricted).unwrap();

    let mut perms = fs::metadata(&restricted).unwrap().permissions();
    perms.set_mode(0o000);
    fs::set_permissions(&restricted, perms.clone()).unwrap();
    let readable_anyway = fs::read_dir(&restricted).is_ok();

    let mut store = FakeRemote::new();
    store.add_action(PROJECT, "A", "act", Some("x"), None);
    let (summary, _) = run(&store, &all_artifacts(&store), root);

    perms.set_mode(0o755);
    fs::set_permissions(&restricted, perms).unwrap();

    if readable_anyway {
        return;
    }

    assert_eq!(
        summary.errors,
        SearchErrors {
            local_not_found: 0,
            resp_unexpected: 0,
            walk_dir_err: 1,
        }
    );
    assert!(summary.lines.is_empty());
}

#[test]
#[cfg(unix)]
fn unreadable_local_file_counts_as_walk_error() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let file = root.join("act-pre.js");
    fs::write(&file, "x").unwrap();
    fs::set_permissions(&file, fs::Permissions::from_mode(0o000)).unwrap();
    let readable_anyway = fs::read(&file).is_ok();

    let mut store = FakeRemote::new();
    store.add_action(PROJECT, "A", "act", Some("y"), None);
    let (summary, _) = run(&store, &all_artifacts(&store), root);

    fs::set_permissions(&file, fs::Permissions::from_mode(0o644)).unwrap();

    if readable_anyway {
        return;
    }

    assert_eq!(summary.errors.walk_dir_err, 1);
    assert_eq!(summary.scripts_compared, 0);
}
