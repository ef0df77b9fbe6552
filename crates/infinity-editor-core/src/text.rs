//! Text buffer abstraction for editor storage.
//!
//! The `TextBuffer` trait provides a common interface for plain-text storage,
//! and `RichTextBuffer` layers inline styles on top of it. `EditorRope` is the
//! ropey-backed implementation used for local editing.

use smol_str::{SmolStr, ToSmolStr};
use std::ops::Range;
use web_time::Instant;

use crate::style::{StyleRun, StyleRuns, TextStyle};
use crate::types::EditInfo;

/// A text buffer that supports efficient editing and offset conversion.
///
/// All offsets are in Unicode scalar values (chars), not bytes or UTF-16.
pub trait TextBuffer {
    /// Total length in bytes (UTF-8).
    fn len_bytes(&self) -> usize;

    /// Total length in chars (Unicode scalar values).
    fn len_chars(&self) -> usize;

    /// Check if empty.
    fn is_empty(&self) -> bool {
        self.len_chars() == 0
    }

    /// Insert text at char offset.
    ///
    /// Rich buffers give the new text the style a caret at `char_offset`
    /// would type with.
    fn insert(&mut self, char_offset: usize, text: &str);

    /// Append text at end.
    fn push(&mut self, text: &str) {
        self.insert(self.len_chars(), text);
    }

    /// Delete char range.
    fn delete(&mut self, char_range: Range<usize>);

    /// Replace char range with text.
    fn replace(&mut self, char_range: Range<usize>, text: &str) {
        self.delete(char_range.clone());
        self.insert(char_range.start, text);
    }

    /// Get a slice as SmolStr. Returns None if range is invalid.
    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr>;

    /// Get character at offset. Returns None if out of bounds.
    fn char_at(&self, char_offset: usize) -> Option<char>;

    /// Convert entire buffer to String.
    fn to_string(&self) -> String;

    /// Convert char offset to byte offset.
    fn char_to_byte(&self, char_offset: usize) -> usize;

    /// Convert byte offset to char offset.
    fn byte_to_char(&self, byte_offset: usize) -> usize;

    /// Get info about the last edit operation, if any.
    fn last_edit(&self) -> Option<EditInfo>;
}

/// A text buffer that also stores inline styles.
pub trait RichTextBuffer: TextBuffer {
    /// Insert text with explicit runs. The runs must cover exactly the
    /// inserted text's char count.
    fn insert_styled(&mut self, char_offset: usize, text: &str, runs: &[StyleRun]);

    /// Style runs covering a char range.
    fn style_runs(&self, char_range: Range<usize>) -> Vec<StyleRun>;

    /// Replace the styles of a char range without touching its text.
    fn restyle(&mut self, char_range: Range<usize>, runs: &[StyleRun]);

    /// Replace a char range with styled text.
    fn replace_styled(&mut self, char_range: Range<usize>, text: &str, runs: &[StyleRun]) {
        let start = char_range.start;
        if !char_range.is_empty() {
            self.delete(char_range);
        }
        if !text.is_empty() {
            self.insert_styled(start, text, runs);
        }
    }

    /// The style a caret at `char_offset` types with.
    ///
    /// Inherits from the char before the caret, or the char after it when
    /// the caret sits at the start of a paragraph.
    fn typing_style(&self, char_offset: usize) -> TextStyle {
        let before = char_offset
            .checked_sub(1)
            .filter(|&prev| self.char_at(prev).is_some_and(|c| c != '\n'));
        let after = Some(char_offset).filter(|&next| self.char_at(next).is_some_and(|c| c != '\n'));
        before
            .or(after)
            .and_then(|at| self.style_runs(at..at + 1).into_iter().next())
            .map(|run| run.style)
            .unwrap_or_default()
    }
}

/// Ropey-backed rich text buffer for local editing.
///
/// Provides O(log n) text operations and offset conversions; styles are
/// kept in a run-length table next to the rope.
#[derive(Clone, Default)]
pub struct EditorRope {
    rope: ropey::Rope,
    styles: StyleRuns,
    last_edit: Option<EditInfo>,
}

impl EditorRope {
    /// Create a new empty rope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from unstyled text.
    pub fn from_str(s: &str) -> Self {
        let rope = ropey::Rope::from_str(s);
        let styles = StyleRuns::plain(rope.len_chars());
        Self {
            rope,
            styles,
            last_edit: None,
        }
    }

    /// Create from text and a matching style table.
    ///
    /// Falls back to unstyled text when the table does not cover the text.
    pub fn from_parts(text: &str, styles: StyleRuns) -> Self {
        let rope = ropey::Rope::from_str(text);
        let styles = if styles.len() == rope.len_chars() {
            styles
        } else {
            tracing::warn!(
                target: "infinity::text",
                text_len = rope.len_chars(),
                styles_len = styles.len(),
                "style table does not match text, dropping styles"
            );
            StyleRuns::plain(rope.len_chars())
        };
        Self {
            rope,
            styles,
            last_edit: None,
        }
    }

    /// Get a reference to the underlying rope (for advanced operations).
    pub fn rope(&self) -> &ropey::Rope {
        &self.rope
    }

    /// The full style table.
    pub fn styles(&self) -> &StyleRuns {
        &self.styles
    }

    fn record_edit(&mut self, pos: usize, inserted: usize, deleted: usize, newline: bool) {
        self.last_edit = Some(EditInfo {
            edit_char_pos: pos,
            inserted_len: inserted,
            deleted_len: deleted,
            contains_newline: newline,
            style_only: false,
            doc_len_after: self.rope.len_chars(),
            timestamp: Instant::now(),
        });
    }
}

impl TextBuffer for EditorRope {
    fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn insert(&mut self, char_offset: usize, text: &str) {
        let style = self.typing_style(char_offset);
        let len = text.chars().count();
        self.insert_styled(char_offset, text, &[StyleRun::new(len, style)]);
    }

    fn delete(&mut self, char_range: Range<usize>) {
        let contains_newline = self
            .slice(char_range.clone())
            .map(|s| s.contains('\n'))
            .unwrap_or(false);
        let deleted_len = char_range.len();

        self.rope.remove(char_range.clone());
        self.styles.remove(char_range.clone());

        self.record_edit(char_range.start, 0, deleted_len, contains_newline);
    }

    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr> {
        if char_range.end > self.len_chars() || char_range.start > char_range.end {
            return None;
        }
        Some(self.rope.slice(char_range).to_smolstr())
    }

    fn char_at(&self, char_offset: usize) -> Option<char> {
        if char_offset >= self.len_chars() {
            return None;
        }
        Some(self.rope.char(char_offset))
    }

    fn to_string(&self) -> String {
        self.rope.to_string()
    }

    fn char_to_byte(&self, char_offset: usize) -> usize {
        self.rope.char_to_byte(char_offset)
    }

    fn byte_to_char(&self, byte_offset: usize) -> usize {
        self.rope.byte_to_char(byte_offset)
    }

    fn last_edit(&self) -> Option<EditInfo> {
        self.last_edit.clone()
    }
}

impl RichTextBuffer for EditorRope {
    fn insert_styled(&mut self, char_offset: usize, text: &str, runs: &[StyleRun]) {
        let len = text.chars().count();
        self.rope.insert(char_offset, text);

        let covered: usize = runs.iter().map(|r| r.len).sum();
        if covered == len {
            self.styles.splice(char_offset..char_offset, runs);
        } else {
            self.styles.insert(char_offset, len, TextStyle::default());
        }

        self.record_edit(char_offset, len, 0, text.contains('\n'));
    }

    fn style_runs(&self, char_range: Range<usize>) -> Vec<StyleRun> {
        self.styles.slice(char_range)
    }

    fn restyle(&mut self, char_range: Range<usize>, runs: &[StyleRun]) {
        if char_range.is_empty() {
            return;
        }
        self.styles.splice(char_range.clone(), runs);
        self.last_edit = Some(EditInfo {
            edit_char_pos: char_range.start,
            inserted_len: char_range.len(),
            deleted_len: char_range.len(),
            contains_newline: false,
            style_only: true,
            doc_len_after: self.rope.len_chars(),
            timestamp: Instant::now(),
        });
    }
}

impl From<&str> for EditorRope {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for EditorRope {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}
