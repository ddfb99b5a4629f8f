//! Background inverted index for instant symbol/token lookup.
//!
//! The index maps lowercased tokens (maximal `[A-Za-z0-9_]` runs of length
//! three or more) to their locations, plus a per-file line cache used to
//! reconstruct the matched line for display. One mutex guards both maps;
//! every public operation takes it, so `search` observes every
//! `index_file`/`remove_file` that returned before it acquired the lock.
//!
//! The worker thread currently only sleeps until stopped. It exists to keep
//! lifecycle symmetry for push-based reindexing later; the public operations
//! are already safe to call from the main thread without it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Minimum token length admitted into the index.
const MIN_TOKEN_LEN: usize = 3;

/// A search hit with the recovered line text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHit {
    /// File holding the token.
    pub file_path: PathBuf,
    /// Zero-based line of the token.
    pub line: usize,
    /// Byte column where the token starts.
    pub column: usize,
    /// The full line of text, for display.
    pub line_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Location {
    file_path: PathBuf,
    line: usize,
    column: usize,
}

#[derive(Default)]
struct IndexState {
    words: HashMap<String, Vec<Location>>,
    file_lines: HashMap<PathBuf, Vec<String>>,
}

impl IndexState {
    fn remove_path(&mut self, path: &Path) {
        for locations in self.words.values_mut() {
            locations.retain(|loc| loc.file_path != path);
        }
        self.words.retain(|_, locations| !locations.is_empty());
    }

    fn insert_file(&mut self, path: &Path, content: &str) {
        let lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();

        for (line_number, line) in lines.iter().enumerate() {
            let bytes = line.as_bytes();
            let mut word = String::new();
            let mut column = 0usize;

            for (i, &byte) in bytes.iter().enumerate() {
                if byte.is_ascii_alphanumeric() || byte == b'_' {
                    if word.is_empty() {
                        column = i;
                    }
                    word.push(byte.to_ascii_lowercase() as char);
                } else {
                    if word.len() >= MIN_TOKEN_LEN {
                        self.words.entry(word.clone()).or_default().push(Location {
                            file_path: path.to_path_buf(),
                            line: line_number,
                            column,
                        });
                    }
                    word.clear();
                }
            }

            if word.len() >= MIN_TOKEN_LEN {
                self.words.entry(word.clone()).or_default().push(Location {
                    file_path: path.to_path_buf(),
                    line: line_number,
                    column,
                });
            }
        }

        self.file_lines.insert(path.to_path_buf(), lines);
    }
}

/// The background indexer service.
pub struct BackgroundIndexer {
    state: Arc<Mutex<IndexState>>,
    should_stop: Arc<AtomicBool>,
    is_indexing: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundIndexer {
    /// A stopped indexer with an empty index.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(IndexState::default())),
            should_stop: Arc::new(AtomicBool::new(false)),
            is_indexing: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Start the worker thread. Calling while running is a no-op.
    pub fn start(&mut self) {
        if self.is_indexing.load(Ordering::SeqCst) {
            return;
        }

        self.should_stop.store(false, Ordering::SeqCst);
        self.is_indexing.store(true, Ordering::SeqCst);

        let should_stop = Arc::clone(&self.should_stop);
        self.worker = Some(thread::spawn(move || {
            while !should_stop.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(100));
            }
        }));
    }

    /// Stop and join the worker thread. Idempotent.
    pub fn stop(&mut self) {
        self.should_stop.store(true, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("indexer worker panicked");
            }
        }
        self.is_indexing.store(false, Ordering::SeqCst);
    }

    /// Whether the worker thread is running.
    pub fn is_indexing(&self) -> bool {
        self.is_indexing.load(Ordering::SeqCst)
    }

    /// (Re)index one file: every previous location for `path` is removed,
    /// then `content` is tokenised and inserted.
    pub fn index_file(&self, path: &Path, content: &str) {
        let mut state = self.state.lock().expect("index lock");
        state.remove_path(path);
        state.insert_file(path, content);
    }

    /// Drop every location and the cached lines for `path`.
    pub fn remove_file(&self, path: &Path) {
        let mut state = self.state.lock().expect("index lock");
        state.remove_path(path);
        state.file_lines.remove(path);
    }

    /// Look up `query` (case-insensitively) and return up to `max_results`
    /// hits with their recovered line text.
    pub fn search(&self, query: &str, max_results: usize) -> Vec<IndexHit> {
        let state = self.state.lock().expect("index lock");

        let lowered = query.to_ascii_lowercase();
        let Some(locations) = state.words.get(&lowered) else {
            return Vec::new();
        };

        locations
            .iter()
            .take(max_results)
            .map(|loc| {
                let line_text = state
                    .file_lines
                    .get(&loc.file_path)
                    .and_then(|lines| lines.get(loc.line))
                    .cloned()
                    .unwrap_or_default();
                IndexHit {
                    file_path: loc.file_path.clone(),
                    line: loc.line,
                    column: loc.column,
                    line_text,
                }
            })
            .collect()
    }

    /// Number of files currently held in the index.
    pub fn indexed_file_count(&self) -> usize {
        self.state.lock().expect("index lock").file_lines.len()
    }
}

impl Default for BackgroundIndexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BackgroundIndexer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_and_search() {
        let indexer = BackgroundIndexer::new();
        indexer.index_file(Path::new("/p/main.rs"), "fn main() {\n    render_frame();\n}\n");

        let hits = indexer.search("render_frame", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file_path, PathBuf::from("/p/main.rs"));
        assert_eq!(hits[0].line, 1);
        assert_eq!(hits[0].column, 4);
        assert_eq!(hits[0].line_text, "    render_frame();");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let indexer = BackgroundIndexer::new();
        indexer.index_file(Path::new("/p/a.rs"), "HelloWorld");
        assert_eq!(indexer.search("helloworld", 10).len(), 1);
        assert_eq!(indexer.search("HELLOWORLD", 10).len(), 1);
    }

    #[test]
    fn test_short_tokens_not_indexed() {
        let indexer = BackgroundIndexer::new();
        indexer.index_file(Path::new("/p/a.rs"), "an ab abc");
        assert!(indexer.search("ab", 10).is_empty());
        assert_eq!(indexer.search("abc", 10).len(), 1);
    }

    #[test]
    fn test_reindex_replaces_old_locations() {
        let indexer = BackgroundIndexer::new();
        indexer.index_file(Path::new("/p/a.rs"), "alpha beta");
        indexer.index_file(Path::new("/p/a.rs"), "gamma");

        assert!(indexer.search("alpha", 10).is_empty());
        assert_eq!(indexer.search("gamma", 10).len(), 1);
        assert_eq!(indexer.indexed_file_count(), 1);
    }

    #[test]
    fn test_remove_file() {
        let indexer = BackgroundIndexer::new();
        indexer.index_file(Path::new("/p/a.rs"), "alpha");
        indexer.index_file(Path::new("/p/b.rs"), "alpha");

        indexer.remove_file(Path::new("/p/a.rs"));
        let hits = indexer.search("alpha", 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file_path, PathBuf::from("/p/b.rs"));
        assert_eq!(indexer.indexed_file_count(), 1);
    }

    #[test]
    fn test_max_results_bound() {
        let indexer = BackgroundIndexer::new();
        indexer.index_file(Path::new("/p/a.rs"), "token token token token");
        assert_eq!(indexer.search("token", 2).len(), 2);
    }

    #[test]
    fn test_lifecycle_idempotent() {
        let mut indexer = BackgroundIndexer::new();
        assert!(!indexer.is_indexing());

        indexer.start();
        indexer.start();
        assert!(indexer.is_indexing());

        indexer.stop();
        indexer.stop();
        assert!(!indexer.is_indexing());
    }
}
