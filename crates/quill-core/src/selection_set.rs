//! Cursors, selections, and multi-cursor group mutation.
//!
//! A cursor set has one primary caret and any number of extra carets; each
//! caret may carry an anchor, making it a selection. Group mutations build a
//! single [`EditCommand::Composite`] over the sorted caret set, with children
//! formed from the highest position downward so each child's recorded
//! position is still valid when it executes. The whole group undoes as one
//! step.
//!
//! The clipboard is an external collaborator; an in-memory implementation is
//! provided for tests and headless use.

use crate::commands::{CommandLog, EditCommand};
use crate::error::CoreResult;
use crate::search::{self, SearchOptions};
use crate::storage::PieceTable;

/// An anchored selection. `head` is the cursor; `anchor` is where the
/// selection started. An empty selection (`anchor == head`) is a bare caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// The fixed end of the selection.
    pub anchor: usize,
    /// The moving end; always equal to the owning cursor position.
    pub head: usize,
}

impl Selection {
    /// Normalised start (minimum of anchor and head).
    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    /// Normalised end (maximum of anchor and head).
    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    /// Whether this selection covers no bytes.
    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }
}

/// Clipboard collaborator contract.
pub trait Clipboard {
    /// Current clipboard contents, if any.
    fn get_text(&mut self) -> Option<Vec<u8>>;
    /// Replace the clipboard contents.
    fn set_text(&mut self, bytes: &[u8]);
}

/// Process-local clipboard for tests and headless hosts.
#[derive(Debug, Default)]
pub struct InMemoryClipboard {
    contents: Option<Vec<u8>>,
}

impl Clipboard for InMemoryClipboard {
    fn get_text(&mut self) -> Option<Vec<u8>> {
        self.contents.clone()
    }

    fn set_text(&mut self, bytes: &[u8]) {
        self.contents = Some(bytes.to_vec());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Caret {
    position: usize,
    anchor: Option<usize>,
}

impl Caret {
    fn at(position: usize) -> Self {
        Self {
            position,
            anchor: None,
        }
    }

    fn selection(&self) -> Option<Selection> {
        self.anchor
            .filter(|&anchor| anchor != self.position)
            .map(|anchor| Selection {
                anchor,
                head: self.position,
            })
    }
}

/// One primary caret plus extra carets, with per-caret selections.
#[derive(Debug, Clone)]
pub struct CursorSet {
    primary: Caret,
    extras: Vec<Caret>,
}

impl CursorSet {
    /// A set with a single caret at offset 0.
    pub fn new() -> Self {
        Self {
            primary: Caret::at(0),
            extras: Vec::new(),
        }
    }

    /// Primary caret position.
    pub fn primary(&self) -> usize {
        self.primary.position
    }

    /// Extra caret positions, in insertion order.
    pub fn extras(&self) -> Vec<usize> {
        self.extras.iter().map(|c| c.position).collect()
    }

    /// Primary selection, if non-empty.
    pub fn selection(&self) -> Option<Selection> {
        self.primary.selection()
    }

    /// All non-empty selections (primary first, then extras).
    pub fn selections(&self) -> Vec<Selection> {
        self.primary
            .selection()
            .into_iter()
            .chain(self.extras.iter().filter_map(|c| c.selection()))
            .collect()
    }

    /// Move the primary caret, collapsing its selection.
    pub fn set_position(&mut self, position: usize) {
        self.primary = Caret::at(position);
    }

    /// Add an extra caret at `position`. Duplicate positions are ignored.
    pub fn add_cursor(&mut self, position: usize) {
        if self.primary.position == position
            || self.extras.iter().any(|c| c.position == position)
        {
            return;
        }
        self.extras.push(Caret::at(position));
    }

    /// Drop every extra caret, keeping the primary.
    pub fn clear_extras(&mut self) {
        self.extras.clear();
    }

    /// Set the primary selection.
    pub fn set_selection(&mut self, anchor: usize, head: usize) {
        self.primary = Caret {
            position: head,
            anchor: Some(anchor),
        };
    }

    /// Collapse every selection to its cursor.
    pub fn collapse(&mut self) {
        self.primary.anchor = None;
        for caret in &mut self.extras {
            caret.anchor = None;
        }
    }

    /// Select the whole document with the primary caret.
    pub fn select_all(&mut self, doc: &PieceTable) {
        self.extras.clear();
        self.set_selection(0, doc.len());
    }

    // Carets deduplicated by position and sorted ascending, for group
    // mutation. Selections are keyed by their normalised start.
    fn sorted_carets(&self) -> Vec<Caret> {
        let mut carets = Vec::with_capacity(1 + self.extras.len());
        carets.push(self.primary);
        for caret in &self.extras {
            if !carets.iter().any(|c| c.position == caret.position) {
                carets.push(*caret);
            }
        }
        carets.sort_by_key(|c| c.selection().map(|s| s.start()).unwrap_or(c.position));
        carets
    }

    fn rebuild(&mut self, carets: Vec<Caret>, primary_index: usize) {
        self.primary = carets[primary_index];
        self.extras = carets
            .into_iter()
            .enumerate()
            .filter_map(|(i, c)| (i != primary_index).then_some(c))
            .collect();
    }

    /// Insert `bytes` at every caret (replacing selections), as one undoable
    /// composite. Afterwards each caret sits after its inserted text with no
    /// selection.
    pub fn insert(
        &mut self,
        doc: &mut PieceTable,
        log: &mut CommandLog,
        bytes: &[u8],
    ) -> CoreResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }

        let carets = self.sorted_carets();
        let primary_index = carets
            .iter()
            .position(|c| *c == self.primary)
            .unwrap_or(0);

        let mut children = Vec::new();
        for caret in carets.iter().rev() {
            match caret.selection() {
                Some(sel) => {
                    children.push(EditCommand::delete(sel.start(), sel.len()));
                    children.push(EditCommand::insert(sel.start(), bytes));
                }
                None => children.push(EditCommand::insert(caret.position, bytes)),
            }
        }
        Self::run(doc, log, children)?;

        let shifted: Vec<Caret> = carets
            .iter()
            .map(|caret| {
                let landing = match caret.selection() {
                    Some(sel) => sel.start() + bytes.len(),
                    None => caret.position + bytes.len(),
                };
                Caret::at(landing)
            })
            .collect();
        self.rebuild(shifted, primary_index);
        Ok(())
    }

    /// Backspace at every caret: delete each selection, or the byte before
    /// each bare caret. One undoable composite.
    pub fn delete_left(&mut self, doc: &mut PieceTable, log: &mut CommandLog) -> CoreResult<()> {
        let carets = self.sorted_carets();
        let primary_index = carets
            .iter()
            .position(|c| *c == self.primary)
            .unwrap_or(0);

        let mut children = Vec::new();
        for caret in carets.iter().rev() {
            match caret.selection() {
                Some(sel) => children.push(EditCommand::delete(sel.start(), sel.len())),
                None if caret.position > 0 => {
                    children.push(EditCommand::delete(caret.position - 1, 1))
                }
                None => {}
            }
        }
        Self::run(doc, log, children)?;

        let shifted: Vec<Caret> = carets
            .iter()
            .map(|caret| {
                let landing = match caret.selection() {
                    Some(sel) => sel.start(),
                    None => caret.position.saturating_sub(1),
                };
                Caret::at(landing)
            })
            .collect();
        self.rebuild(shifted, primary_index);
        Ok(())
    }

    /// Forward delete at every caret: delete each selection, or the byte
    /// after each bare caret. One undoable composite.
    pub fn delete_right(&mut self, doc: &mut PieceTable, log: &mut CommandLog) -> CoreResult<()> {
        let doc_len = doc.len();
        let carets = self.sorted_carets();
        let primary_index = carets
            .iter()
            .position(|c| *c == self.primary)
            .unwrap_or(0);

        let mut children = Vec::new();
        for caret in carets.iter().rev() {
            match caret.selection() {
                Some(sel) => children.push(EditCommand::delete(sel.start(), sel.len())),
                None if caret.position < doc_len => {
                    children.push(EditCommand::delete(caret.position, 1))
                }
                None => {}
            }
        }
        Self::run(doc, log, children)?;

        let shifted: Vec<Caret> = carets
            .iter()
            .map(|caret| {
                let landing = match caret.selection() {
                    Some(sel) => sel.start(),
                    None => caret.position,
                };
                Caret::at(landing)
            })
            .collect();
        self.rebuild(shifted, primary_index);
        Ok(())
    }

    fn run(
        doc: &mut PieceTable,
        log: &mut CommandLog,
        mut children: Vec<EditCommand>,
    ) -> CoreResult<()> {
        match children.len() {
            0 => Ok(()),
            1 => log.execute(doc, children.pop().expect("checked")),
            _ => log.execute(doc, EditCommand::composite(children)),
        }
    }

    /// Copy the primary selection to the clipboard. No-op without a
    /// selection.
    pub fn copy(&self, doc: &PieceTable, clipboard: &mut dyn Clipboard) -> CoreResult<()> {
        let Some(sel) = self.primary.selection() else {
            return Ok(());
        };
        let bytes = doc.text(sel.start(), sel.len())?;
        clipboard.set_text(&bytes);
        Ok(())
    }

    /// Copy the primary selection, then delete it (undoable). No-op without
    /// a selection.
    pub fn cut(
        &mut self,
        doc: &mut PieceTable,
        log: &mut CommandLog,
        clipboard: &mut dyn Clipboard,
    ) -> CoreResult<()> {
        let Some(sel) = self.primary.selection() else {
            return Ok(());
        };
        self.copy(doc, clipboard)?;
        log.execute(doc, EditCommand::delete(sel.start(), sel.len()))?;
        self.primary = Caret::at(sel.start());
        Ok(())
    }

    /// Insert the clipboard contents at every caret. No-op on an empty
    /// clipboard.
    pub fn paste(
        &mut self,
        doc: &mut PieceTable,
        log: &mut CommandLog,
        clipboard: &mut dyn Clipboard,
    ) -> CoreResult<()> {
        let Some(bytes) = clipboard.get_text() else {
            return Ok(());
        };
        self.insert(doc, log, &bytes)
    }

    /// Multi-cursor growth: search forward from the primary selection's end
    /// for the next occurrence of the selected bytes; on a hit, keep the old
    /// primary as an extra and make a new primary selecting the occurrence.
    ///
    /// Returns `false` (and changes nothing) without a selection or a
    /// further occurrence.
    pub fn add_next_occurrence(&mut self, doc: &PieceTable) -> CoreResult<bool> {
        let Some(sel) = self.primary.selection() else {
            return Ok(false);
        };

        let needle = doc.text(sel.start(), sel.len())?;
        let haystack = doc.to_bytes();
        let options = SearchOptions {
            case_sensitive: true,
            use_regex: false,
        };

        let Some(found) = search::find_next(&haystack, &needle, sel.end(), options)? else {
            return Ok(false);
        };

        let previous = self.primary;
        self.extras.push(previous);
        self.primary = Caret {
            position: found.position + found.length,
            anchor: Some(found.position),
        };
        Ok(true)
    }
}

impl Default for CursorSet {
    fn default() -> Self {
        Self::new()
    }
}
