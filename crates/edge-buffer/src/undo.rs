//! Undo/redo history for one buffer.
//!
//! Unlike a snapshot-based undo stack, entries here are reverse operations:
//! applying an edit produces an `UndoableEdit` capturing exactly how to
//! reverse it, and applying *that* produces the redo entry. This mirrors
//! the transformation/undo duality used by the editing engine (an insert's
//! undo is a delete of what was inserted; a delete's undo is an insert of
//! what was removed) instead of cloning the whole buffer on every edit.

use tracing::trace;

use crate::OpenBuffer;

/// Maximum number of entries retained per direction before the oldest is
/// dropped.
pub const UNDO_HISTORY_MAX: usize = 200;

/// One reversible edit. Implementors are produced by the editing engine
/// (see the `edge-transform` crate) alongside the edit they describe.
pub trait UndoableEdit: Send {
    /// Apply the reverse of this edit to `buffer`, returning an entry that
    /// would redo the original edit.
    fn undo(self: Box<Self>, buffer: &mut OpenBuffer) -> Box<dyn UndoableEdit>;

    /// Short tag for tracing output; not used for dispatch.
    fn label(&self) -> &'static str {
        "edit"
    }
}

#[derive(Default)]
pub struct UndoEngine {
    undo_stack: Vec<Box<dyn UndoableEdit>>,
    redo_stack: Vec<Box<dyn UndoableEdit>>,
}

impl UndoEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Record a freshly-applied edit. Clears the redo stack: redo only
    /// ever replays edits undone from the current history, never an
    /// abandoned branch.
    pub fn push(&mut self, edit: Box<dyn UndoableEdit>) {
        trace!(target: "buffer.undo", label = edit.label(), depth = self.undo_stack.len() + 1, "push");
        self.undo_stack.push(edit);
        if self.undo_stack.len() > UNDO_HISTORY_MAX {
            self.undo_stack.remove(0);
            trace!(target: "buffer.undo", "undo_stack_trimmed");
        }
        if !self.redo_stack.is_empty() {
            self.redo_stack.clear();
            trace!(target: "buffer.undo", "redo_stack_cleared_on_new_edit");
        }
    }

    pub fn undo(&mut self, buffer: &mut OpenBuffer) -> bool {
        let Some(entry) = self.undo_stack.pop() else {
            return false;
        };
        trace!(target: "buffer.undo", label = entry.label(), depth = self.undo_stack.len(), "undo");
        let redo_entry = entry.undo(buffer);
        self.redo_stack.push(redo_entry);
        true
    }

    pub fn redo(&mut self, buffer: &mut OpenBuffer) -> bool {
        let Some(entry) = self.redo_stack.pop() else {
            return false;
        };
        trace!(target: "buffer.undo", label = entry.label(), depth = self.redo_stack.len(), "redo");
        let undo_entry = entry.undo(buffer);
        self.undo_stack.push(undo_entry);
        true
    }
}
