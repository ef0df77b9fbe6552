//! Undo/redo management for editor operations.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `UndoableBuffer<T>` - wraps a RichTextBuffer and provides undo/redo
//!
//! Style changes are recorded the same way as text changes: a restyle is an
//! operation whose deleted and inserted text are equal but whose runs differ.

use std::ops::Range;

use smol_str::{SmolStr, ToSmolStr};

use crate::style::StyleRun;
use crate::text::{RichTextBuffer, TextBuffer};

/// Trait for managing undo/redo operations.
///
/// Implementations must actually perform the undo/redo, not just track state.
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Perform undo. Returns true if successful.
    fn undo(&mut self) -> bool;

    /// Perform redo. Returns true if successful.
    fn redo(&mut self) -> bool;

    /// Clear all undo/redo history.
    fn clear_history(&mut self);
}

/// A recorded edit operation for undo/redo.
#[derive(Debug, Clone)]
struct EditOperation {
    /// Character position where edit occurred
    pos: usize,
    /// Text that was deleted (empty for pure insertions)
    deleted: SmolStr,
    /// Styles of the deleted text
    deleted_runs: Vec<StyleRun>,
    /// Text that was inserted (empty for pure deletions)
    inserted: SmolStr,
    /// Styles of the inserted text
    inserted_runs: Vec<StyleRun>,
}

impl EditOperation {
    fn is_restyle(&self) -> bool {
        self.deleted == self.inserted
    }
}

/// A RichTextBuffer wrapper that tracks edits and provides undo/redo.
///
/// All mutations go through this wrapper, which records them for undo.
pub struct UndoableBuffer<T> {
    buffer: T,
    undo_stack: Vec<EditOperation>,
    redo_stack: Vec<EditOperation>,
    max_steps: usize,
}

impl<T: Clone> Clone for UndoableBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            undo_stack: self.undo_stack.clone(),
            redo_stack: self.redo_stack.clone(),
            max_steps: self.max_steps,
        }
    }
}

impl<T: RichTextBuffer + Default> Default for UndoableBuffer<T> {
    fn default() -> Self {
        Self::new(T::default(), 100)
    }
}

impl<T: RichTextBuffer> UndoableBuffer<T> {
    /// Create a new undoable buffer wrapping the given buffer.
    pub fn new(buffer: T, max_steps: usize) -> Self {
        Self {
            buffer,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Get a reference to the inner buffer.
    pub fn inner(&self) -> &T {
        &self.buffer
    }

    /// Get a mutable reference to the inner buffer.
    /// WARNING: Edits made directly bypass undo tracking!
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.buffer
    }

    fn record_op(&mut self, op: EditOperation) {
        // Clear redo stack on new edit
        self.redo_stack.clear();

        self.undo_stack.push(op);

        // Trim if over max
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }

    /// Swap `remove` out for `put` at `pos`, text and styles both.
    fn swap_content(&mut self, pos: usize, remove: &str, put: &str, put_runs: &[StyleRun]) {
        let remove_len = remove.chars().count();
        if remove == put {
            self.buffer.restyle(pos..pos + remove_len, put_runs);
            return;
        }
        if remove_len > 0 {
            self.buffer.delete(pos..pos + remove_len);
        }
        if !put.is_empty() {
            self.buffer.insert_styled(pos, put, put_runs);
        }
    }
}

// Implement TextBuffer by delegating to inner buffer + recording operations
impl<T: RichTextBuffer> TextBuffer for UndoableBuffer<T> {
    fn len_bytes(&self) -> usize {
        self.buffer.len_bytes()
    }

    fn len_chars(&self) -> usize {
        self.buffer.len_chars()
    }

    fn insert(&mut self, char_offset: usize, text: &str) {
        self.buffer.insert(char_offset, text);
        let len = text.chars().count();
        let inserted_runs = self.buffer.style_runs(char_offset..char_offset + len);
        self.record_op(EditOperation {
            pos: char_offset,
            deleted: SmolStr::default(),
            deleted_runs: Vec::new(),
            inserted: text.to_smolstr(),
            inserted_runs,
        });
    }

    fn delete(&mut self, char_range: Range<usize>) {
        // Get the text being deleted for undo
        let deleted = self.buffer.slice(char_range.clone()).unwrap_or_default();
        let deleted_runs = self.buffer.style_runs(char_range.clone());
        self.buffer.delete(char_range.clone());
        self.record_op(EditOperation {
            pos: char_range.start,
            deleted,
            deleted_runs,
            inserted: SmolStr::default(),
            inserted_runs: Vec::new(),
        });
    }

    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr> {
        self.buffer.slice(char_range)
    }

    fn char_at(&self, char_offset: usize) -> Option<char> {
        self.buffer.char_at(char_offset)
    }

    fn to_string(&self) -> String {
        self.buffer.to_string()
    }

    fn char_to_byte(&self, char_offset: usize) -> usize {
        self.buffer.char_to_byte(char_offset)
    }

    fn byte_to_char(&self, byte_offset: usize) -> usize {
        self.buffer.byte_to_char(byte_offset)
    }

    fn last_edit(&self) -> Option<crate::types::EditInfo> {
        self.buffer.last_edit()
    }
}

impl<T: RichTextBuffer> RichTextBuffer for UndoableBuffer<T> {
    fn insert_styled(&mut self, char_offset: usize, text: &str, runs: &[StyleRun]) {
        self.buffer.insert_styled(char_offset, text, runs);
        let len = text.chars().count();
        let inserted_runs = self.buffer.style_runs(char_offset..char_offset + len);
        self.record_op(EditOperation {
            pos: char_offset,
            deleted: SmolStr::default(),
            deleted_runs: Vec::new(),
            inserted: text.to_smolstr(),
            inserted_runs,
        });
    }

    fn style_runs(&self, char_range: Range<usize>) -> Vec<StyleRun> {
        self.buffer.style_runs(char_range)
    }

    /// Recorded as a single step, so one undo puts the old text back.
    fn replace_styled(&mut self, char_range: Range<usize>, text: &str, runs: &[StyleRun]) {
        let pos = char_range.start;
        let deleted = self.buffer.slice(char_range.clone()).unwrap_or_default();
        let deleted_runs = self.buffer.style_runs(char_range.clone());
        self.buffer.replace_styled(char_range, text, runs);

        let inserted_runs = self.buffer.style_runs(pos..pos + text.chars().count());
        if deleted.as_str() == text && deleted_runs == inserted_runs {
            return;
        }
        self.record_op(EditOperation {
            pos,
            deleted,
            deleted_runs,
            inserted: text.to_smolstr(),
            inserted_runs,
        });
    }

    fn restyle(&mut self, char_range: Range<usize>, runs: &[StyleRun]) {
        let Some(text) = self.buffer.slice(char_range.clone()) else {
            return;
        };
        let before = self.buffer.style_runs(char_range.clone());
        self.buffer.restyle(char_range.clone(), runs);
        let after = self.buffer.style_runs(char_range.clone());
        if before == after {
            return;
        }
        self.record_op(EditOperation {
            pos: char_range.start,
            deleted: text.clone(),
            deleted_runs: before,
            inserted: text,
            inserted_runs: after,
        });
    }
}

impl<T: RichTextBuffer> UndoManager for UndoableBuffer<T> {
    fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn undo(&mut self) -> bool {
        let Some(op) = self.undo_stack.pop() else {
            return false;
        };

        // Apply inverse: swap what was inserted for what was deleted
        self.swap_content(op.pos, &op.inserted, &op.deleted, &op.deleted_runs);

        tracing::trace!(
            target: "infinity::undo",
            pos = op.pos,
            restyle = op.is_restyle(),
            "undo"
        );
        self.redo_stack.push(op);
        true
    }

    fn redo(&mut self) -> bool {
        let Some(op) = self.redo_stack.pop() else {
            return false;
        };

        // Re-apply original: swap what was deleted for what was inserted
        self.swap_content(op.pos, &op.deleted, &op.inserted, &op.inserted_runs);

        self.undo_stack.push(op);
        true
    }

    fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::TextStyle;
    use crate::text::EditorRope;

    fn bold_run(len: usize) -> StyleRun {
        StyleRun::new(
            len,
            TextStyle {
                bold: true,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_undoable_buffer_insert_undo() {
        let rope = EditorRope::from_str("hello");
        let mut buf = UndoableBuffer::new(rope, 100);

        assert!(!buf.can_undo());

        buf.insert(5, " world");
        assert_eq!(buf.to_string(), "hello world");
        assert!(buf.can_undo());

        assert!(buf.undo());
        assert_eq!(buf.to_string(), "hello");
        assert!(!buf.can_undo());
        assert!(buf.can_redo());

        assert!(buf.redo());
        assert_eq!(buf.to_string(), "hello world");
        assert!(!buf.can_redo());
    }

    #[test]
    fn test_undo_delete_restores_styles() {
        let mut rope = EditorRope::from_str("hello world");
        rope.restyle(0..5, &[bold_run(5)]);
        let mut buf = UndoableBuffer::new(rope, 100);

        buf.delete(0..6);
        assert_eq!(buf.to_string(), "world");

        assert!(buf.undo());
        assert_eq!(buf.to_string(), "hello world");
        assert_eq!(buf.style_runs(0..5), vec![bold_run(5)]);
    }

    #[test]
    fn test_undo_restyle() {
        let rope = EditorRope::from_str("hello");
        let mut buf = UndoableBuffer::new(rope, 100);

        buf.restyle(0..5, &[bold_run(5)]);
        assert!(buf.style_runs(0..5)[0].style.bold);

        assert!(buf.undo());
        assert_eq!(buf.to_string(), "hello");
        assert!(!buf.style_runs(0..5)[0].style.bold);

        assert!(buf.redo());
        assert!(buf.style_runs(0..5)[0].style.bold);
    }

    #[test]
    fn test_noop_restyle_not_recorded() {
        let rope = EditorRope::from_str("hello");
        let mut buf = UndoableBuffer::new(rope, 100);

        buf.restyle(0..5, &[StyleRun::plain(5)]);
        assert!(!buf.can_undo());
    }

    #[test]
    fn test_replace_is_one_step() {
        let rope = EditorRope::from_str("hello world");
        let mut buf = UndoableBuffer::new(rope, 100);

        buf.replace_styled(6..11, "there", &[bold_run(5)]);
        assert_eq!(buf.to_string(), "hello there");

        assert!(buf.undo());
        assert_eq!(buf.to_string(), "hello world");
        assert!(!buf.can_undo());
        assert!(buf.redo());
        assert_eq!(buf.style_runs(6..11), vec![bold_run(5)]);
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let rope = EditorRope::from_str("abc");
        let mut buf = UndoableBuffer::new(rope, 100);

        buf.insert(3, "d");
        assert!(buf.undo());
        assert!(buf.can_redo());

        buf.insert(3, "e");
        assert!(!buf.can_redo());
    }

    #[test]
    fn test_max_steps() {
        let rope = EditorRope::from_str("");
        let mut buf = UndoableBuffer::new(rope, 3);

        buf.insert(0, "a");
        buf.insert(1, "b");
        buf.insert(2, "c");
        buf.insert(3, "d"); // should evict "a"

        assert!(buf.undo());
        assert!(buf.undo());
        assert!(buf.undo());
        assert!(!buf.undo()); // a was evicted

        assert_eq!(buf.to_string(), "a");
    }
}
