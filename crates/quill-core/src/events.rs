//! Events the engine emits toward the presentation layer.
//!
//! The core displays nothing itself; every user-visible consequence of an
//! operation is either a return value or one of these events. Hosts
//! subscribe with a callback on the facade.

/// Identifier of a project-search job.
pub type SearchJobId = u64;

/// A state change observable by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreEvent {
    /// The buffer of `tab` changed.
    DocumentChanged {
        /// Index of the affected tab.
        tab: usize,
    },
    /// The selection set of `tab` changed.
    SelectionChanged {
        /// Index of the affected tab.
        tab: usize,
    },
    /// The primary cursor of `tab` moved.
    CursorMoved {
        /// Index of the affected tab.
        tab: usize,
    },
    /// A tab was opened and activated.
    TabOpened {
        /// Index of the new tab.
        tab: usize,
    },
    /// A tab was closed.
    TabClosed {
        /// Index the tab had before closing.
        tab: usize,
    },
    /// A project-search job was launched.
    SearchProgress {
        /// The job that made progress.
        job: SearchJobId,
    },
    /// A project-search job finished (including after cancellation).
    SearchCompleted {
        /// The finished job.
        job: SearchJobId,
    },
}

/// Host-installed event observer.
pub type EventCallback = Box<dyn FnMut(&CoreEvent) + Send>;
