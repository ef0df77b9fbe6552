//! Action execution for editor documents.
//!
//! This module provides the `execute_action` function that applies `EditorAction`
//! operations to any type implementing `EditorDocument`. The logic is generic
//! and platform-agnostic.

use crate::actions::{EditorAction, Range};
use crate::document::EditorDocument;
use crate::format::execute_format;
use crate::text_helpers::{find_word_boundary_backward, find_word_boundary_forward};
use crate::types::Selection;

/// Execute an editor action on a document.
///
/// This is the central dispatch point for raw input. Returns true if the
/// document's text or styles changed.
pub fn execute_action<D: EditorDocument>(doc: &mut D, action: &EditorAction) -> bool {
    match action {
        EditorAction::Insert { text, range } => execute_insert(doc, text, *range),
        EditorAction::InsertParagraph { range } => execute_insert(doc, "\n", *range),
        EditorAction::DeleteBackward { range } => execute_delete_backward(doc, *range),
        EditorAction::DeleteForward { range } => execute_delete_forward(doc, *range),
        EditorAction::DeleteWordBackward { range } => execute_delete_word_backward(doc, *range),
        EditorAction::DeleteWordForward { range } => execute_delete_word_forward(doc, *range),
        EditorAction::Format(cmd) => {
            let selection = doc.selection();
            match execute_format(doc, cmd, selection) {
                Ok(changed) => changed,
                Err(e) => {
                    tracing::warn!(target: "infinity::execute", error = %e, "format action rejected");
                    false
                }
            }
        }
        EditorAction::MoveCursor { offset } => execute_move_cursor(doc, *offset),
        EditorAction::ExtendSelection { offset } => execute_extend_selection(doc, *offset),
    }
}

/// Clamp a range to the document and put start before end.
fn clamp_range<D: EditorDocument>(doc: &D, range: Range) -> Range {
    let len = doc.len_chars();
    let range = range.normalize();
    Range::new(range.start.min(len), range.end.min(len))
}

fn execute_insert<D: EditorDocument>(doc: &mut D, text: &str, range: Range) -> bool {
    let range = clamp_range(doc, range);
    if text.is_empty() && range.is_caret() {
        return false;
    }

    if range.is_caret() {
        doc.insert(range.start, text);
    } else {
        doc.replace(range.start..range.end, text);
    }

    doc.set_selection(None);
    true
}

fn execute_delete_backward<D: EditorDocument>(doc: &mut D, range: Range) -> bool {
    let range = clamp_range(doc, range);

    if !range.is_caret() {
        doc.delete(range.start..range.end);
        doc.set_selection(None);
        return true;
    }

    if range.start == 0 {
        return false;
    }

    // Deleting a newline merges the paragraph into the previous one.
    doc.delete(range.start - 1..range.start);
    doc.set_selection(None);
    true
}

fn execute_delete_forward<D: EditorDocument>(doc: &mut D, range: Range) -> bool {
    let range = clamp_range(doc, range);

    if !range.is_caret() {
        doc.delete(range.start..range.end);
        doc.set_selection(None);
        return true;
    }

    if range.start >= doc.len_chars() {
        return false;
    }

    doc.delete(range.start..range.start + 1);
    doc.set_selection(None);
    true
}

fn execute_delete_word_backward<D: EditorDocument>(doc: &mut D, range: Range) -> bool {
    let range = clamp_range(doc, range);

    if !range.is_caret() {
        return execute_delete_backward(doc, range);
    }

    let cursor = range.start;
    let word_start = find_word_boundary_backward(doc, cursor);
    if word_start >= cursor {
        return false;
    }
    doc.delete(word_start..cursor);
    doc.set_selection(None);
    true
}

fn execute_delete_word_forward<D: EditorDocument>(doc: &mut D, range: Range) -> bool {
    let range = clamp_range(doc, range);

    if !range.is_caret() {
        return execute_delete_forward(doc, range);
    }

    let cursor = range.start;
    let word_end = find_word_boundary_forward(doc, cursor);
    if word_end <= cursor {
        return false;
    }
    doc.delete(cursor..word_end);
    doc.set_selection(None);
    true
}

fn execute_move_cursor<D: EditorDocument>(doc: &mut D, offset: usize) -> bool {
    let offset = offset.min(doc.len_chars());
    doc.set_cursor_offset(offset);
    doc.set_selection(None);
    false
}

fn execute_extend_selection<D: EditorDocument>(doc: &mut D, offset: usize) -> bool {
    let offset = offset.min(doc.len_chars());
    let anchor = doc
        .selection()
        .map(|s| s.anchor)
        .unwrap_or_else(|| doc.cursor_offset());
    doc.set_selection(Some(Selection::new(anchor, offset)));
    doc.set_cursor_offset(offset);
    false
}
