//! Word boundary helpers for word-wise deletion.
//!
//! A word is a run of alphanumeric chars or `_`. Everything else, paragraph
//! breaks included, separates words.

use crate::document::EditorDocument;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Start of the word before `cursor`, skipping separators first.
pub fn find_word_boundary_backward<D: EditorDocument>(doc: &D, cursor: usize) -> usize {
    let mut pos = cursor.min(doc.len_chars());

    while pos > 0 && doc.char_at(pos - 1).is_some_and(|c| !is_word_char(c)) {
        pos -= 1;
    }
    while pos > 0 && doc.char_at(pos - 1).is_some_and(is_word_char) {
        pos -= 1;
    }

    pos
}

/// End of the separators following the word at `cursor`.
pub fn find_word_boundary_forward<D: EditorDocument>(doc: &D, cursor: usize) -> usize {
    let len = doc.len_chars();
    let mut pos = cursor.min(len);

    while pos < len && doc.char_at(pos).is_some_and(is_word_char) {
        pos += 1;
    }
    while pos < len && doc.char_at(pos).is_some_and(|c| !is_word_char(c)) {
        pos += 1;
    }

    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::RichDocument;

    fn make_doc(content: &str) -> RichDocument {
        RichDocument::from_html(content, 100)
    }

    #[test]
    fn test_find_word_boundary_backward() {
        let doc = make_doc("<p>hello world test</p>");

        assert_eq!(find_word_boundary_backward(&doc, 16), 12); // from end
        assert_eq!(find_word_boundary_backward(&doc, 12), 6); // from "test"
        assert_eq!(find_word_boundary_backward(&doc, 11), 6);
        assert_eq!(find_word_boundary_backward(&doc, 5), 0);
        assert_eq!(find_word_boundary_backward(&doc, 0), 0);
    }

    #[test]
    fn test_find_word_boundary_forward() {
        let doc = make_doc("<p>hello world test</p>");

        assert_eq!(find_word_boundary_forward(&doc, 0), 6);
        assert_eq!(find_word_boundary_forward(&doc, 6), 12);
        assert_eq!(find_word_boundary_forward(&doc, 12), 16);
        assert_eq!(find_word_boundary_forward(&doc, 99), 16);
    }

    #[test]
    fn test_paragraph_break_separates_words() {
        let doc = make_doc("<p>deal</p><p>closed</p>");

        // "deal\nclosed": the break is a separator.
        assert_eq!(find_word_boundary_backward(&doc, 5), 0);
        assert_eq!(find_word_boundary_forward(&doc, 0), 5);
        assert_eq!(find_word_boundary_backward(&doc, 11), 5);
    }
}
