use std::path::Path;

use quill_core::BackgroundIndexer;

#[test]
fn test_every_long_token_is_findable() {
    let indexer = BackgroundIndexer::new();
    let content = "fn spawn_worker(pool_size: usize) -> WorkerPool {\n    WorkerPool::with_size(pool_size)\n}\n";
    indexer.index_file(Path::new("/src/pool.rs"), content);

    for token in ["spawn_worker", "pool_size", "usize", "workerpool", "with_size"] {
        let hits = indexer.search(token, usize::MAX);
        assert!(
            hits.iter().any(|h| h.file_path == Path::new("/src/pool.rs")),
            "token {:?} missing",
            token
        );
    }
}

#[test]
fn test_removed_file_never_appears() {
    let indexer = BackgroundIndexer::new();
    indexer.index_file(Path::new("/a.rs"), "shared unique_a");
    indexer.index_file(Path::new("/b.rs"), "shared unique_b");

    indexer.remove_file(Path::new("/a.rs"));

    assert!(indexer.search("unique_a", 100).is_empty());
    let shared = indexer.search("shared", 100);
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].file_path, Path::new("/b.rs"));
}

#[test]
fn test_hit_coordinates_point_at_token() {
    let indexer = BackgroundIndexer::new();
    indexer.index_file(Path::new("/x.rs"), "let total = subtotal + tax;\n");

    let hits = indexer.search("subtotal", 10);
    assert_eq!(hits.len(), 1);
    let hit = &hits[0];
    assert_eq!(hit.line, 0);
    assert_eq!(&hit.line_text[hit.column..hit.column + "subtotal".len()], "subtotal");
}

#[test]
fn test_index_is_case_folded() {
    let indexer = BackgroundIndexer::new();
    indexer.index_file(Path::new("/y.rs"), "CamelCaseName");
    assert_eq!(indexer.search("camelcasename", 10).len(), 1);
}

#[test]
fn test_indexed_file_count() {
    let indexer = BackgroundIndexer::new();
    assert_eq!(indexer.indexed_file_count(), 0);

    indexer.index_file(Path::new("/a.rs"), "alpha");
    indexer.index_file(Path::new("/b.rs"), "beta");
    assert_eq!(indexer.indexed_file_count(), 2);

    indexer.remove_file(Path::new("/a.rs"));
    assert_eq!(indexer.indexed_file_count(), 1);
}

#[test]
fn test_worker_lifecycle() {
    let mut indexer = BackgroundIndexer::new();
    indexer.start();
    assert!(indexer.is_indexing());

    // Public operations stay usable while the worker runs.
    indexer.index_file(Path::new("/live.rs"), "concurrent_token");
    assert_eq!(indexer.search("concurrent_token", 10).len(), 1);

    indexer.stop();
    assert!(!indexer.is_indexing());

    // Restart after stop.
    indexer.start();
    assert!(indexer.is_indexing());
    indexer.stop();
}
