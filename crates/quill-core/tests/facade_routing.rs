use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use quill_core::{EditorCore, ProjectSearchConfig, WorkspaceSettings};
use tempfile::TempDir;

fn wait_for_search(engine: &mut EditorCore) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while engine.poll_project_search() {
        assert!(Instant::now() < deadline, "search did not complete in time");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn test_open_project_result_creates_tab_and_places_cursor() {
    let config = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("hits.txt"), "nothing\nthe marker here\n").unwrap();

    let mut engine = EditorCore::new(config.path());
    engine
        .start_project_search(ProjectSearchConfig {
            root: root.path().to_path_buf(),
            query: "marker".to_string(),
            include: String::new(),
            exclude: String::new(),
        })
        .unwrap();
    wait_for_search(&mut engine);

    let results = engine.project_results();
    assert_eq!(results.len(), 1);

    let index = engine.open_project_result(&results[0]).unwrap();
    assert_eq!(engine.tabs().active_index(), index);

    // Cursor sits on the start of "marker": line 1, column 4.
    let expected = "nothing\n".len() + 4;
    assert_eq!(engine.active_tab().cursors.primary(), expected);
}

#[test]
fn test_open_project_result_activates_existing_tab() {
    let config = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    let file = root.path().join("twice.txt");
    fs::write(&file, "marker\n").unwrap();

    let mut engine = EditorCore::new(config.path());
    let first_open = engine.open_file(&file).unwrap();
    engine.new_tab();

    engine
        .start_project_search(ProjectSearchConfig {
            root: root.path().to_path_buf(),
            query: "marker".to_string(),
            include: String::new(),
            exclude: String::new(),
        })
        .unwrap();
    wait_for_search(&mut engine);

    let results = engine.project_results();
    let index = engine.open_project_result(&results[0]).unwrap();
    assert_eq!(index, first_open);
    assert_eq!(engine.tabs().len(), 3);
}

#[test]
fn test_open_index_hit() {
    let config = TempDir::new().unwrap();
    let files = TempDir::new().unwrap();
    let file = files.path().join("sym.rs");
    fs::write(&file, "fn alpha() {}\nfn beta_symbol() {}\n").unwrap();

    let mut engine = EditorCore::new(config.path());
    engine
        .indexer()
        .index_file(&file, &fs::read_to_string(&file).unwrap());

    let hits = engine.indexer().search("beta_symbol", 10);
    assert_eq!(hits.len(), 1);

    engine.open_index_hit(&hits[0]).unwrap();
    let expected = "fn alpha() {}\n".len() + 3;
    assert_eq!(engine.active_tab().cursors.primary(), expected);
}

#[test]
fn test_find_and_select_walks_matches() {
    let config = TempDir::new().unwrap();
    let mut engine = EditorCore::new(config.path());
    engine.insert(b"hit miss hit miss hit").unwrap();
    engine.move_cursor(0);

    let first = engine.find_next_and_select(b"hit").unwrap().unwrap();
    assert_eq!(first.position, 0);
    let sel = engine.active_tab().cursors.selection().unwrap();
    assert_eq!((sel.start(), sel.end()), (0, 3));

    let second = engine.find_next_and_select(b"hit").unwrap().unwrap();
    assert_eq!(second.position, 9);

    let third = engine.find_next_and_select(b"hit").unwrap().unwrap();
    assert_eq!(third.position, 18);
    assert!(engine.find_next_and_select(b"hit").unwrap().is_none());

    let back = engine.find_previous_and_select(b"hit").unwrap().unwrap();
    assert_eq!(back.position, 9);
}

#[test]
fn test_workspace_settings_roundtrip_via_facade() {
    let config = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    {
        let mut engine = EditorCore::new(config.path());
        let mut settings = WorkspaceSettings::default();
        settings.tab_size = 2;
        settings.theme = "light".into();
        engine.set_settings(settings);
        engine.save_workspace_settings(workspace.path()).unwrap();
    }

    let mut engine = EditorCore::new(config.path());
    engine.load_workspace_settings(workspace.path()).unwrap();
    assert_eq!(engine.settings().tab_size, 2);
    assert_eq!(engine.settings().theme, "light");
}

#[test]
fn test_missing_settings_file_keeps_defaults() {
    let config = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let mut engine = EditorCore::new(config.path());
    engine.load_workspace_settings(workspace.path()).unwrap();
    assert_eq!(engine.settings().tab_size, 4);
    assert!(engine.settings().use_spaces);
}
