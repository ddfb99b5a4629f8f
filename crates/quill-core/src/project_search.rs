//! Project-wide search and replace.
//!
//! A job walks a filesystem tree on a producer thread, filters paths through
//! include/exclude globs, and fans the admitted files out to
//! `max(2, hardware_parallelism)` workers via an atomic cursor. Workers scan
//! each file for every non-overlapping occurrence of the query and append
//! results under one mutex; callers snapshot the shared list at any time
//! while the job runs.
//!
//! Cancellation is cooperative: the flag is checked between files and
//! between match iterations, already-appended results stay visible, and
//! in-flight file reads complete. Unreadable files are logged and skipped;
//! they never fail the job.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::error::{CoreError, CoreResult};
use crate::events::SearchJobId;

/// Parameters of one search job.
#[derive(Debug, Clone)]
pub struct ProjectSearchConfig {
    /// Directory tree to walk.
    pub root: PathBuf,
    /// Literal query to find (case-sensitive). Must be non-empty.
    pub query: String,
    /// Include patterns; empty admits everything.
    pub include: String,
    /// Exclude patterns; empty excludes nothing.
    pub exclude: String,
}

/// A located occurrence of the query in one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectResult {
    /// File holding the occurrence.
    pub file_path: PathBuf,
    /// Zero-based line of the occurrence.
    pub line: usize,
    /// Byte column of the occurrence within its line.
    pub column: usize,
    /// The full line of text, for display.
    pub line_text: String,
}

/// Outcome of a replace-in-files batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// Files rewritten with at least one change.
    pub files_touched: usize,
    /// Total occurrences replaced.
    pub occurrences: usize,
}

/// A glob list: semicolon- or comma-separated elements.
///
/// Elements with `*`/`?` wildcard-match either the basename or the full
/// path; other elements are substring matches on the lowercased full path.
#[derive(Debug, Clone, Default)]
pub struct GlobList {
    elements: Vec<String>,
}

impl GlobList {
    /// Parse a pattern list, trimming and lowercasing each element.
    pub fn parse(patterns: &str) -> Self {
        let elements = patterns
            .split(|c| c == ';' || c == ',')
            .map(|p| p.trim().to_ascii_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { elements }
    }

    /// Whether the list holds no patterns.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether any element matches `path`.
    pub fn matches(&self, path: &Path) -> bool {
        let full = path.to_string_lossy().to_ascii_lowercase();
        let base = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        self.elements.iter().any(|element| {
            if element.contains('*') || element.contains('?') {
                wildcard_match(element, &base) || wildcard_match(element, &full)
            } else {
                full.contains(element.as_str())
            }
        })
    }

    /// Admission rule: no exclude matches, and either no includes exist or
    /// at least one include matches.
    pub fn admits(include: &GlobList, exclude: &GlobList, path: &Path) -> bool {
        if exclude.matches(path) {
            return false;
        }
        include.is_empty() || include.matches(path)
    }
}

// Iterative `*`/`?` matcher with single-star backtracking.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();

    let mut pi = 0usize;
    let mut ti = 0usize;
    let mut star: Option<usize> = None;
    let mut mark = 0usize;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if let Some(star_pi) = star {
            pi = star_pi + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

struct JobShared {
    results: Mutex<Vec<ProjectResult>>,
    in_progress: AtomicBool,
    cancelled: AtomicBool,
}

/// Handle to the search engine: at most one running job at a time.
pub struct ProjectSearch {
    shared: Arc<JobShared>,
    producer: Option<JoinHandle<()>>,
    config: Option<ProjectSearchConfig>,
    next_job_id: SearchJobId,
    current_job: Option<SearchJobId>,
}

impl ProjectSearch {
    /// An idle engine.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(JobShared {
                results: Mutex::new(Vec::new()),
                in_progress: AtomicBool::new(false),
                cancelled: AtomicBool::new(false),
            }),
            producer: None,
            config: None,
            next_job_id: 0,
            current_job: None,
        }
    }

    /// Launch a job, cancelling any previous one. Returns the job id.
    ///
    /// Fails with `InvalidArgument` on an empty query.
    pub fn start(&mut self, config: ProjectSearchConfig) -> CoreResult<SearchJobId> {
        if config.query.is_empty() {
            return Err(CoreError::InvalidArgument(
                "project search query must not be empty".into(),
            ));
        }

        self.cancel();

        let shared = Arc::new(JobShared {
            results: Mutex::new(Vec::new()),
            in_progress: AtomicBool::new(true),
            cancelled: AtomicBool::new(false),
        });
        self.shared = shared.clone();
        self.config = Some(config.clone());

        let job_id = self.next_job_id;
        self.next_job_id += 1;
        self.current_job = Some(job_id);

        self.producer = Some(thread::spawn(move || run_job(shared, config)));
        Ok(job_id)
    }

    /// Id of the most recently launched job, if any.
    pub fn current_job(&self) -> Option<SearchJobId> {
        self.current_job
    }

    /// Whether the current job is still running.
    pub fn in_progress(&self) -> bool {
        self.shared.in_progress.load(Ordering::SeqCst)
    }

    /// Stop the current job and wait for its threads to exit. Results
    /// appended so far stay visible.
    pub fn cancel(&mut self) {
        self.shared.cancelled.store(true, Ordering::SeqCst);
        if let Some(handle) = self.producer.take() {
            let _ = handle.join();
        }
    }

    /// Snapshot of the results streamed so far, in append order.
    pub fn results(&self) -> Vec<ProjectResult> {
        self.shared.results.lock().expect("results lock").clone()
    }

    /// Results grouped by file, ordered within each file by (line, column).
    pub fn results_by_file(&self) -> BTreeMap<PathBuf, Vec<ProjectResult>> {
        let mut grouped: BTreeMap<PathBuf, Vec<ProjectResult>> = BTreeMap::new();
        for result in self.results() {
            grouped
                .entry(result.file_path.clone())
                .or_default()
                .push(result);
        }
        for results in grouped.values_mut() {
            results.sort_by_key(|r| (r.line, r.column));
        }
        grouped
    }

    /// Rewrite every file that currently holds at least one result,
    /// replacing occurrences of `query` with `replacement` left to right,
    /// then launch a refresh search with the previous configuration.
    ///
    /// Individual write failures are logged and skipped; they do not abort
    /// the batch.
    pub fn replace_in_files(
        &mut self,
        query: &str,
        replacement: &str,
    ) -> CoreResult<ReplaceOutcome> {
        if query.is_empty() {
            return Err(CoreError::InvalidArgument(
                "replace query must not be empty".into(),
            ));
        }

        self.cancel();

        let mut paths: Vec<PathBuf> = self
            .results()
            .into_iter()
            .map(|r| r.file_path)
            .collect();
        paths.sort();
        paths.dedup();

        let mut outcome = ReplaceOutcome {
            files_touched: 0,
            occurrences: 0,
        };

        for path in paths {
            let content = match fs::read(&path) {
                Ok(content) => content,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "skipping unreadable file");
                    continue;
                }
            };

            let (rewritten, count) =
                replace_bytes(&content, query.as_bytes(), replacement.as_bytes());
            if count == 0 {
                continue;
            }

            if let Err(err) = fs::write(&path, rewritten) {
                tracing::warn!(path = %path.display(), %err, "replace failed to write file");
                continue;
            }

            outcome.files_touched += 1;
            outcome.occurrences += count;
        }

        // Refresh so the result list reflects the rewritten tree.
        if let Some(mut config) = self.config.clone() {
            config.query = query.to_string();
            self.start(config)?;
        }

        Ok(outcome)
    }
}

impl Default for ProjectSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProjectSearch {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn run_job(shared: Arc<JobShared>, config: ProjectSearchConfig) {
    let include = GlobList::parse(&config.include);
    let exclude = GlobList::parse(&config.exclude);

    let mut files = Vec::new();
    collect_files(&config.root, &include, &exclude, &shared.cancelled, &mut files);

    let files = Arc::new(files);
    let query = Arc::new(config.query.into_bytes());
    let cursor = Arc::new(AtomicUsize::new(0));

    let worker_count = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(2);

    let mut workers = Vec::with_capacity(worker_count);
    for _ in 0..worker_count {
        let files = Arc::clone(&files);
        let query = Arc::clone(&query);
        let cursor = Arc::clone(&cursor);
        let shared = Arc::clone(&shared);

        workers.push(thread::spawn(move || loop {
            if shared.cancelled.load(Ordering::Relaxed) {
                break;
            }
            let index = cursor.fetch_add(1, Ordering::Relaxed);
            let Some(path) = files.get(index) else {
                break;
            };
            scan_file(path, &query, &shared);
        }));
    }

    for worker in workers {
        let _ = worker.join();
    }

    shared.in_progress.store(false, Ordering::SeqCst);
}

fn collect_files(
    dir: &Path,
    include: &GlobList,
    exclude: &GlobList,
    cancelled: &AtomicBool,
    out: &mut Vec<PathBuf>,
) {
    if cancelled.load(Ordering::Relaxed) {
        return;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(dir = %dir.display(), %err, "skipping unreadable directory");
            return;
        }
    };

    for entry in entries {
        if cancelled.load(Ordering::Relaxed) {
            return;
        }
        let Ok(entry) = entry else {
            continue;
        };
        let path = entry.path();

        if path.is_dir() {
            collect_files(&path, include, exclude, cancelled, out);
        } else if GlobList::admits(include, exclude, &path) {
            out.push(path);
        }
    }
}

fn scan_file(path: &Path, query: &[u8], shared: &JobShared) {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "skipping unreadable file");
            return;
        }
    };

    let mut found = Vec::new();
    let mut line = 0usize;
    let mut line_start = 0usize;
    let mut pos = 0usize;

    while pos < content.len() {
        if shared.cancelled.load(Ordering::Relaxed) {
            return;
        }

        if content[pos..].starts_with(query) {
            let line_end = content[line_start..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|i| line_start + i)
                .unwrap_or(content.len());

            found.push(ProjectResult {
                file_path: path.to_path_buf(),
                line,
                column: pos - line_start,
                line_text: String::from_utf8_lossy(&content[line_start..line_end]).into_owned(),
            });

            let end = pos + query.len();
            while pos < end {
                if content[pos] == b'\n' {
                    line += 1;
                    line_start = pos + 1;
                }
                pos += 1;
            }
        } else {
            if content[pos] == b'\n' {
                line += 1;
                line_start = pos + 1;
            }
            pos += 1;
        }
    }

    if !found.is_empty() {
        shared
            .results
            .lock()
            .expect("results lock")
            .append(&mut found);
    }
}

// Left-to-right literal replace; the cursor advances past each inserted
// replacement so self-matches do not cascade.
fn replace_bytes(content: &[u8], from: &[u8], to: &[u8]) -> (Vec<u8>, usize) {
    if from.is_empty() {
        return (content.to_vec(), 0);
    }

    let mut out = Vec::with_capacity(content.len());
    let mut count = 0usize;
    let mut pos = 0usize;

    while pos < content.len() {
        if content[pos..].starts_with(from) {
            out.extend_from_slice(to);
            pos += from.len();
            count += 1;
        } else {
            out.push(content[pos]);
            pos += 1;
        }
    }

    (out, count)
}
