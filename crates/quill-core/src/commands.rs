//! Reversible edit commands and the linear undo/redo log.
//!
//! An [`EditCommand`] is a tagged record describing one reversible edit.
//! Commands are executed through a single dispatch function and owned by the
//! [`CommandLog`] that executed them; a `Delete` captures the exact bytes it
//! removes at execute time so undo restores the literal content even after
//! unrelated regions changed.
//!
//! The log is an ordered list plus an index `current` into it. Executing a
//! new command while `current` sits before the end truncates the undone tail;
//! a configured depth bound drops the oldest entries from the front.

use crate::error::CoreResult;
use crate::storage::PieceTable;

/// One reversible edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditCommand {
    /// Insert `text` at `position`.
    Insert {
        /// Byte offset the text is inserted at.
        position: usize,
        /// The inserted bytes.
        text: Vec<u8>,
    },
    /// Delete `length` bytes at `position`.
    Delete {
        /// Byte offset of the deletion start.
        position: usize,
        /// Number of bytes removed.
        length: usize,
        /// The removed bytes, captured when the command executes.
        captured: Vec<u8>,
    },
    /// A group of edits applied as one unit.
    ///
    /// Children replay in list order and reverse in the opposite order on
    /// undo. Multi-cursor edits build children from the highest position
    /// downward so each child's recorded position stays valid when it runs.
    Composite {
        /// The grouped edits.
        children: Vec<EditCommand>,
    },
}

impl EditCommand {
    /// An insert command.
    pub fn insert(position: usize, text: impl Into<Vec<u8>>) -> Self {
        Self::Insert {
            position,
            text: text.into(),
        }
    }

    /// A delete command. The removed bytes are captured at execution.
    pub fn delete(position: usize, length: usize) -> Self {
        Self::Delete {
            position,
            length,
            captured: Vec::new(),
        }
    }

    /// A composite command over `children`.
    pub fn composite(children: Vec<EditCommand>) -> Self {
        Self::Composite { children }
    }

    fn execute(&mut self, doc: &mut PieceTable) -> CoreResult<()> {
        match self {
            Self::Insert { position, text } => doc.insert(*position, text),
            Self::Delete {
                position,
                length,
                captured,
            } => {
                *captured = doc.text(*position, *length)?;
                doc.remove(*position, *length)
            }
            Self::Composite { children } => {
                for child in children.iter_mut() {
                    child.execute(doc)?;
                }
                Ok(())
            }
        }
    }

    fn undo(&self, doc: &mut PieceTable) -> CoreResult<()> {
        match self {
            Self::Insert { position, text } => doc.remove(*position, text.len()),
            Self::Delete {
                position, captured, ..
            } => doc.insert(*position, captured),
            Self::Composite { children } => {
                for child in children.iter().rev() {
                    child.undo(doc)?;
                }
                Ok(())
            }
        }
    }
}

/// Linear undo/redo history over one buffer.
#[derive(Debug)]
pub struct CommandLog {
    commands: Vec<EditCommand>,
    current: usize,
    max_depth: usize,
}

impl CommandLog {
    /// Default history bound.
    pub const DEFAULT_MAX_DEPTH: usize = 1000;

    /// A log with the default depth bound.
    pub fn new() -> Self {
        Self::with_max_depth(Self::DEFAULT_MAX_DEPTH)
    }

    /// A log retaining at most `max_depth` commands.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            commands: Vec::new(),
            current: 0,
            max_depth,
        }
    }

    /// Apply `command` to `doc` and record it.
    ///
    /// Any previously undone tail beyond `current` is discarded; the retained
    /// prefix is trimmed from the front when it exceeds the depth bound.
    pub fn execute(&mut self, doc: &mut PieceTable, mut command: EditCommand) -> CoreResult<()> {
        command.execute(doc)?;

        self.commands.truncate(self.current);
        self.commands.push(command);
        self.current = self.commands.len();
        self.trim_to_depth();
        Ok(())
    }

    /// Whether a command is available to undo.
    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    /// Whether an undone command is available to redo.
    pub fn can_redo(&self) -> bool {
        self.current < self.commands.len()
    }

    /// Revert the most recent command. Returns `false` when there is nothing
    /// to undo.
    pub fn undo(&mut self, doc: &mut PieceTable) -> CoreResult<bool> {
        if !self.can_undo() {
            return Ok(false);
        }

        self.current -= 1;
        self.commands[self.current].undo(doc)?;
        Ok(true)
    }

    /// Re-apply the most recently undone command. Returns `false` when there
    /// is nothing to redo.
    pub fn redo(&mut self, doc: &mut PieceTable) -> CoreResult<bool> {
        if !self.can_redo() {
            return Ok(false);
        }

        self.commands[self.current].execute(doc)?;
        self.current += 1;
        Ok(true)
    }

    /// Drop the whole history.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.current = 0;
    }

    /// Number of commands available to undo.
    pub fn undo_count(&self) -> usize {
        self.current
    }

    /// Number of commands available to redo.
    pub fn redo_count(&self) -> usize {
        self.commands.len() - self.current
    }

    fn trim_to_depth(&mut self) {
        if self.commands.len() > self.max_depth {
            let excess = self.commands.len() - self.max_depth;
            self.commands.drain(..excess);
            self.current -= excess;
        }
    }
}

impl Default for CommandLog {
    fn default() -> Self {
        Self::new()
    }
}
