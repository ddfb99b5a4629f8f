use std::fs;

use quill_core::{EditorCore, WorkspaceManager, WorkspaceState};
use tempfile::TempDir;

#[test]
fn test_scenario_workspace_roundtrip() {
    let config = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let a = workspace.path().join("a.txt");
    let b = workspace.path().join("b.txt");
    fs::write(&a, "a".repeat(40)).unwrap();
    fs::write(&b, "b".repeat(40)).unwrap();

    {
        let mut engine = EditorCore::new(config.path());
        engine.open_file(&a).unwrap();
        engine.open_file(&b).unwrap();

        engine.set_active_tab(1).unwrap();
        engine.move_cursor(10);
        engine.set_active_tab(2).unwrap();
        engine.move_cursor(20);

        engine.save_session(workspace.path()).unwrap();
    }

    let mut engine = EditorCore::new(config.path());
    engine.load_session(workspace.path()).unwrap();

    assert_eq!(engine.tabs().len(), 2);
    let first = engine.tabs().get(0).unwrap();
    let second = engine.tabs().get(1).unwrap();
    assert!(first.file_path.as_ref().unwrap().ends_with("a.txt"));
    assert!(second.file_path.as_ref().unwrap().ends_with("b.txt"));
    assert_eq!(first.cursors.primary(), 10);
    assert_eq!(second.cursors.primary(), 20);
    assert_eq!(engine.tabs().active_index(), 1);
}

#[test]
fn test_session_skips_deleted_files_and_clamps_active() {
    let config = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let keep = workspace.path().join("keep.txt");
    let gone = workspace.path().join("gone.txt");
    fs::write(&keep, "keep").unwrap();
    fs::write(&gone, "gone").unwrap();

    {
        let mut engine = EditorCore::new(config.path());
        engine.open_file(&keep).unwrap();
        engine.open_file(&gone).unwrap();
        // Leave the second (soon deleted) file active.
        engine.save_session(workspace.path()).unwrap();
    }

    fs::remove_file(&gone).unwrap();

    let mut engine = EditorCore::new(config.path());
    engine.load_session(workspace.path()).unwrap();

    assert_eq!(engine.tabs().len(), 1);
    assert!(engine
        .active_tab()
        .file_path
        .as_ref()
        .unwrap()
        .ends_with("keep.txt"));
}

#[test]
fn test_scroll_offset_survives_roundtrip() {
    let config = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let file = workspace.path().join("long.txt");
    let body: String = (0..200).map(|i| format!("line {}\n", i)).collect();
    fs::write(&file, body).unwrap();

    {
        let mut engine = EditorCore::new(config.path());
        engine.open_file(&file).unwrap();
        let tab = engine.active_tab_mut();
        tab.viewport.scroll_to(75, &tab.buffer);
        engine.save_session(workspace.path()).unwrap();
    }

    let mut engine = EditorCore::new(config.path());
    engine.load_session(workspace.path()).unwrap();
    assert_eq!(engine.active_tab().viewport.top_line(), 75);
}

#[test]
fn test_recent_files_follow_mru_order() {
    let config = TempDir::new().unwrap();
    let files = TempDir::new().unwrap();

    let a = files.path().join("a.txt");
    let b = files.path().join("b.txt");
    fs::write(&a, "a").unwrap();
    fs::write(&b, "b").unwrap();

    let mut engine = EditorCore::new(config.path());
    engine.open_file(&a).unwrap();
    engine.open_file(&b).unwrap();
    engine.open_file(&a).unwrap();

    let recents = engine.workspace().recent_files();
    assert_eq!(recents.len(), 2);
    assert!(recents[0].ends_with("a.txt"));
    assert!(recents[1].ends_with("b.txt"));
}

#[test]
fn test_recent_files_bounded() {
    let config = TempDir::new().unwrap();
    let files = TempDir::new().unwrap();

    let mut manager = WorkspaceManager::new(config.path());
    for i in 0..(WorkspaceManager::MAX_RECENT_FILES + 5) {
        let path = files.path().join(format!("f{}.txt", i));
        fs::write(&path, "x").unwrap();
        manager.add_recent_file(&path);
    }

    assert_eq!(
        manager.recent_files().len(),
        WorkspaceManager::MAX_RECENT_FILES
    );
}

#[test]
fn test_workspace_file_location_and_format() {
    let config = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let file = workspace.path().join("x.txt");
    fs::write(&file, "x").unwrap();

    let mut engine = EditorCore::new(config.path());
    engine.open_file(&file).unwrap();
    engine.save_session(workspace.path()).unwrap();

    let state_file = WorkspaceManager::workspace_file(workspace.path());
    assert!(state_file.exists());

    // The file is strict JSON with the documented field names.
    let text = fs::read_to_string(&state_file).unwrap();
    let state: WorkspaceState = serde_json::from_str(&text).unwrap();
    assert_eq!(state.open_files.len(), 1);
    assert!(state.open_files[0].path.ends_with("x.txt"));
    assert_eq!(state.root_directory, workspace.path().to_string_lossy());
}
