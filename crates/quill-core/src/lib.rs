#![warn(missing_docs)]
//! Quill Core - Headless Editing Engine
//!
//! # Overview
//!
//! `quill-core` is the editing engine of a code editor, built so that
//! interactive editing of million-line files stays instantaneous. It is
//! driven by a thin presentation layer (windowing, input, rendering) that is
//! deliberately out of scope; the engine itself never draws anything.
//!
//! # Core Features
//!
//! - **Piece-table storage**: local edits cost work proportional to the
//!   pieces touched, never to the document size
//! - **Line cache**: lazily rebuilt byte offsets for O(1) line access
//! - **Command log**: linear undo/redo with composite multi-cursor steps
//! - **Virtual viewport**: materialises only the lines a renderer needs
//! - **Multi-tab sessions**: independent buffers, cursors, and histories
//! - **Find/replace**: literal and regex search over live buffer content
//! - **Project search**: parallel filesystem walk with glob filters and
//!   streamed, grouped results
//! - **Background indexer**: inverted token index for instant lookup
//! - **Session persistence**: workspace file and recent-file MRU stores
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  EditorCore (facade, events, errors)        │  ← Public API
//! ├──────────────┬──────────────┬───────────────┤
//! │  Tabs &      │  Project     │  Background   │
//! │  Session     │  Search      │  Indexer      │  ← Services
//! ├──────────────┴──────────────┴───────────────┤
//! │  Cursors · Finder · Viewport · Command Log  │  ← Editing model
//! ├─────────────────────────────────────────────┤
//! │  Piece Table Storage + Line Cache           │  ← Text storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use quill_core::{CommandLog, EditCommand, PieceTable};
//!
//! let mut doc = PieceTable::from_bytes(&b"Hello"[..]);
//! let mut log = CommandLog::new();
//!
//! log.execute(&mut doc, EditCommand::insert(5, &b", world"[..])).unwrap();
//! assert_eq!(doc.to_bytes(), b"Hello, world");
//!
//! log.undo(&mut doc).unwrap();
//! assert_eq!(doc.to_bytes(), b"Hello");
//! ```
//!
//! # Threading
//!
//! Everything except project search and the indexer is single-threaded and
//! belongs to the application's main thread. The two concurrent services
//! communicate only through their own locks and atomic flags; they never
//! touch buffers or tabs.

pub mod commands;
pub mod editor;
pub mod error;
pub mod events;
pub mod indexer;
pub mod project_search;
pub mod search;
pub mod selection_set;
pub mod session;
pub mod settings;
pub mod storage;
pub mod tabs;
pub mod viewport;

pub use commands::{CommandLog, EditCommand};
pub use editor::EditorCore;
pub use error::{CoreError, CoreResult};
pub use events::{CoreEvent, EventCallback, SearchJobId};
pub use indexer::{BackgroundIndexer, IndexHit};
pub use project_search::{
    GlobList, ProjectResult, ProjectSearch, ProjectSearchConfig, ReplaceOutcome,
};
pub use search::{SearchMatch, SearchOptions};
pub use selection_set::{Clipboard, CursorSet, InMemoryClipboard, Selection};
pub use session::{FileState, WorkspaceManager, WorkspaceState};
pub use settings::WorkspaceSettings;
pub use storage::{BufferKind, Piece, PieceTable};
pub use tabs::{CloseDecision, ClosePolicy, EditorTab, TabManager};
pub use viewport::Viewport;
