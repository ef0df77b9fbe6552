//! Core editor document trait and implementations.
//!
//! Defines the `EditorDocument` trait for abstracting editor behavior,
//! allowing different storage strategies while sharing the core editing
//! and formatting logic.

use std::ops::Range;

use smol_str::SmolStr;

use crate::html::{ParsedContent, parse_html, write_html};
use crate::style::{StyleRun, TextStyle};
use crate::text::{EditorRope, RichTextBuffer, TextBuffer};
use crate::types::{EditInfo, Selection};
use crate::undo::{UndoManager, UndoableBuffer};

/// Core trait for editor documents.
///
/// The trait is generic over the buffer type, which must implement both
/// `RichTextBuffer` (for text and style operations) and `UndoManager`.
pub trait EditorDocument {
    /// The buffer type used for text storage and undo.
    type Buffer: RichTextBuffer + UndoManager;

    // === Required: Buffer access ===

    /// Get a reference to the underlying buffer.
    fn buffer(&self) -> &Self::Buffer;

    /// Get a mutable reference to the underlying buffer.
    fn buffer_mut(&mut self) -> &mut Self::Buffer;

    // === Required: Cursor/selection state ===

    /// Get the caret offset.
    fn cursor_offset(&self) -> usize;

    /// Set the caret offset.
    fn set_cursor_offset(&mut self, offset: usize);

    /// Get the current selection, if any.
    fn selection(&self) -> Option<Selection>;

    /// Set the selection.
    fn set_selection(&mut self, selection: Option<Selection>);

    // === Required: Edit tracking ===

    /// Get the last edit info, if any.
    fn last_edit(&self) -> Option<EditInfo>;

    /// Set the last edit info.
    fn set_last_edit(&mut self, edit: Option<EditInfo>);

    // === Provided: Convenience accessors ===

    /// Get the plain text as a String.
    fn content_string(&self) -> String {
        self.buffer().to_string()
    }

    /// Serialize text and styles to markup.
    fn content_html(&self) -> String {
        write_html(self.buffer())
    }

    /// Get length in characters.
    fn len_chars(&self) -> usize {
        self.buffer().len_chars()
    }

    /// Check if document is empty.
    fn is_empty(&self) -> bool {
        self.buffer().len_chars() == 0
    }

    /// Get a slice of the content.
    fn slice(&self, range: Range<usize>) -> Option<SmolStr> {
        self.buffer().slice(range)
    }

    /// Get character at offset.
    fn char_at(&self, offset: usize) -> Option<char> {
        self.buffer().char_at(offset)
    }

    /// Get selected text, if any.
    fn selected_text(&self) -> Option<SmolStr> {
        self.selection()
            .and_then(|sel| self.buffer().slice(sel.to_range()))
    }

    /// Style runs over a char range.
    fn style_runs(&self, range: Range<usize>) -> Vec<StyleRun> {
        self.buffer().style_runs(range)
    }

    // === Provided: Text operations ===

    /// Insert text at char offset, returning edit info.
    fn insert(&mut self, offset: usize, text: &str) -> Option<EditInfo> {
        self.buffer_mut().insert(offset, text);
        self.set_cursor_offset(offset + text.chars().count());
        self.track_edit()
    }

    /// Delete char range, returning edit info.
    fn delete(&mut self, range: Range<usize>) -> Option<EditInfo> {
        let start = range.start;
        self.buffer_mut().delete(range);
        self.set_cursor_offset(start);
        self.track_edit()
    }

    /// Replace char range with text, returning edit info.
    ///
    /// The replacement types with the style of the replaced range's first char.
    fn replace(&mut self, range: Range<usize>, text: &str) -> Option<EditInfo> {
        let style = self
            .buffer()
            .style_runs(range.clone())
            .into_iter()
            .next()
            .map(|run| run.style)
            .unwrap_or_else(|| self.buffer().typing_style(range.start));
        let start = range.start;
        let len = text.chars().count();
        let runs = if len > 0 {
            vec![StyleRun::new(len, style)]
        } else {
            Vec::new()
        };
        self.buffer_mut().replace_styled(range, text, &runs);
        self.set_cursor_offset(start + len);
        self.track_edit()
    }

    /// Rewrite the style of every char in `range`.
    fn restyle(
        &mut self,
        range: Range<usize>,
        mut f: impl FnMut(&mut TextStyle),
    ) -> Option<EditInfo> {
        let runs: Vec<StyleRun> = self
            .buffer()
            .style_runs(range.clone())
            .into_iter()
            .map(|mut run| {
                f(&mut run.style);
                run
            })
            .collect();
        self.buffer_mut().restyle(range, &runs);
        self.track_edit()
    }

    /// Replace the whole document with parsed content as one undo step.
    fn replace_all(&mut self, content: &ParsedContent) -> Option<EditInfo> {
        let len = self.len_chars();
        self.buffer_mut()
            .replace_styled(0..len, &content.text, content.styles.runs());
        self.set_selection(None);
        self.set_cursor_offset(self.len_chars());
        self.track_edit()
    }

    /// Delete the current selection, if any.
    fn delete_selection(&mut self) -> Option<EditInfo> {
        let sel = self.selection()?;
        self.set_selection(None);
        if sel.is_collapsed() {
            return None;
        }
        self.delete(sel.to_range())
    }

    // === Provided: Undo/Redo ===

    fn undo(&mut self) -> bool {
        let undone = self.buffer_mut().undo();
        if undone {
            self.clamp_cursor();
        }
        undone
    }

    fn redo(&mut self) -> bool {
        let redone = self.buffer_mut().redo();
        if redone {
            self.clamp_cursor();
        }
        redone
    }

    fn can_undo(&self) -> bool {
        self.buffer().can_undo()
    }

    fn can_redo(&self) -> bool {
        self.buffer().can_redo()
    }

    fn clear_history(&mut self) {
        self.buffer_mut().clear_history();
    }

    // === Provided: Helpers ===

    /// Copy the buffer's last edit into the document's edit slot.
    fn track_edit(&mut self) -> Option<EditInfo> {
        let edit = self.buffer().last_edit();
        self.set_last_edit(edit.clone());
        edit
    }

    /// Keep cursor and selection inside the document after history moves.
    fn clamp_cursor(&mut self) {
        let len = self.len_chars();
        if self.cursor_offset() > len {
            self.set_cursor_offset(len);
        }
        if let Some(sel) = self.selection() {
            self.set_selection(Some(sel.clamp(len)));
        }
    }
}

/// `EditorDocument` over any styled buffer with undo.
///
/// Stores cursor, selection, and edit state as plain fields.
#[derive(Clone)]
pub struct RichEditor<T: RichTextBuffer + UndoManager> {
    buffer: T,
    cursor: usize,
    selection: Option<Selection>,
    last_edit: Option<EditInfo>,
}

impl<T: RichTextBuffer + UndoManager + Default> Default for RichEditor<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: RichTextBuffer + UndoManager> RichEditor<T> {
    /// Create a new editor with the given buffer.
    pub fn new(buffer: T) -> Self {
        Self {
            buffer,
            cursor: 0,
            selection: None,
            last_edit: None,
        }
    }

    /// Get direct access to the inner buffer (bypasses trait).
    pub fn inner(&self) -> &T {
        &self.buffer
    }
}

/// The document type the editor uses: a rope with undo history.
pub type RichDocument = RichEditor<UndoableBuffer<EditorRope>>;

impl RichDocument {
    /// Build a document from markup, with an undo history of `undo_depth` steps.
    pub fn from_html(markup: &str, undo_depth: usize) -> Self {
        let parsed = parse_html(markup);
        let rope = EditorRope::from_parts(&parsed.text, parsed.styles);
        RichEditor::new(UndoableBuffer::new(rope, undo_depth))
    }
}

impl<T: RichTextBuffer + UndoManager> EditorDocument for RichEditor<T> {
    type Buffer = T;

    fn buffer(&self) -> &Self::Buffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut Self::Buffer {
        &mut self.buffer
    }

    fn cursor_offset(&self) -> usize {
        self.cursor
    }

    fn set_cursor_offset(&mut self, offset: usize) {
        self.cursor = offset;
    }

    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    fn last_edit(&self) -> Option<EditInfo> {
        self.last_edit.clone()
    }

    fn set_last_edit(&mut self, edit: Option<EditInfo>) {
        self.last_edit = edit;
    }
}
