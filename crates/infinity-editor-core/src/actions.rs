//! Editor actions and input types.
//!
//! Platform-agnostic definitions for editor operations. The `EditorAction` enum
//! represents semantic editing operations, while `InputType` represents the
//! semantic intent from input events (browser beforeinput, native input methods, etc.).

use serde::Deserialize;
use smol_str::SmolStr;

use crate::format::FormatCommand;

/// A range in the document, measured in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize range so start <= end.
    pub fn normalize(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

impl From<Range> for std::ops::Range<usize> {
    fn from(r: Range) -> Self {
        r.start..r.end
    }
}

impl From<crate::types::Selection> for Range {
    fn from(sel: crate::types::Selection) -> Self {
        Self::new(sel.start(), sel.end())
    }
}

/// Semantic input types from input events.
///
/// Based on the W3C Input Events specification, but usable across platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputType {
    /// Insert typed text.
    InsertText,
    /// Insert a line break (Shift+Enter).
    InsertLineBreak,
    /// Insert a paragraph break (Enter).
    InsertParagraph,
    /// Insert from paste operation.
    InsertFromPaste,
    /// Insert from drop operation.
    InsertFromDrop,
    /// Insert replacement text (e.g., spell check correction).
    InsertReplacementText,
    /// Delete content backward (Backspace).
    DeleteContentBackward,
    /// Delete content forward (Delete key).
    DeleteContentForward,
    /// Delete word backward (Ctrl/Alt+Backspace).
    DeleteWordBackward,
    /// Delete word forward (Ctrl/Alt+Delete).
    DeleteWordForward,
    /// Delete by cut operation.
    DeleteByCut,
    /// Undo.
    HistoryUndo,
    /// Redo.
    HistoryRedo,
    FormatBold,
    FormatItalic,
    FormatUnderline,
    FormatStrikethrough,
    /// Unrecognized input type.
    Unknown(String),
}

impl InputType {
    /// Parse a W3C `inputType` string.
    pub fn parse(s: &str) -> Self {
        match s {
            "insertText" => Self::InsertText,
            "insertLineBreak" => Self::InsertLineBreak,
            "insertParagraph" => Self::InsertParagraph,
            "insertFromPaste" => Self::InsertFromPaste,
            "insertFromDrop" => Self::InsertFromDrop,
            "insertReplacementText" => Self::InsertReplacementText,
            "deleteContentBackward" => Self::DeleteContentBackward,
            "deleteContentForward" => Self::DeleteContentForward,
            "deleteWordBackward" => Self::DeleteWordBackward,
            "deleteWordForward" => Self::DeleteWordForward,
            "deleteByCut" => Self::DeleteByCut,
            "historyUndo" => Self::HistoryUndo,
            "historyRedo" => Self::HistoryRedo,
            "formatBold" => Self::FormatBold,
            "formatItalic" => Self::FormatItalic,
            "formatUnderline" => Self::FormatUnderline,
            "formatStrikeThrough" => Self::FormatStrikethrough,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether this input type is a deletion operation.
    pub fn is_deletion(&self) -> bool {
        matches!(
            self,
            Self::DeleteContentBackward
                | Self::DeleteContentForward
                | Self::DeleteWordBackward
                | Self::DeleteWordForward
                | Self::DeleteByCut
        )
    }

    /// Whether this input type is an insertion operation.
    pub fn is_insertion(&self) -> bool {
        matches!(
            self,
            Self::InsertText
                | Self::InsertLineBreak
                | Self::InsertParagraph
                | Self::InsertFromPaste
                | Self::InsertFromDrop
                | Self::InsertReplacementText
        )
    }

    /// Translate into an editor action over `range`.
    ///
    /// Returns `None` for inputs the engine leaves to the platform.
    pub fn to_action(&self, data: Option<&str>, range: Range) -> Option<EditorAction> {
        let action = match self {
            Self::InsertText
            | Self::InsertFromPaste
            | Self::InsertFromDrop
            | Self::InsertReplacementText => EditorAction::Insert {
                text: data?.to_string(),
                range,
            },
            Self::InsertLineBreak | Self::InsertParagraph => {
                EditorAction::InsertParagraph { range }
            }
            Self::DeleteContentBackward => EditorAction::DeleteBackward { range },
            Self::DeleteContentForward | Self::DeleteByCut => EditorAction::DeleteForward { range },
            Self::DeleteWordBackward => EditorAction::DeleteWordBackward { range },
            Self::DeleteWordForward => EditorAction::DeleteWordForward { range },
            Self::HistoryUndo => EditorAction::Format(FormatCommand::Undo),
            Self::HistoryRedo => EditorAction::Format(FormatCommand::Redo),
            Self::FormatBold => EditorAction::Format(FormatCommand::Bold),
            Self::FormatItalic => EditorAction::Format(FormatCommand::Italic),
            Self::FormatUnderline => EditorAction::Format(FormatCommand::Underline),
            Self::FormatStrikethrough => EditorAction::Format(FormatCommand::Strikethrough),
            Self::Unknown(_) => return None,
        };
        Some(action)
    }
}

/// All possible editor actions.
///
/// These represent semantic operations on the document, decoupled from
/// how they're triggered (keyboard, mouse, touch, toolbar, etc.).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditorAction {
    /// Insert text at the given range (replacing any selected content).
    Insert { text: String, range: Range },

    /// Insert a paragraph break (Enter).
    InsertParagraph { range: Range },

    /// Delete content backward (Backspace).
    DeleteBackward { range: Range },

    /// Delete content forward (Delete key).
    DeleteForward { range: Range },

    /// Delete word backward (Ctrl/Alt+Backspace).
    DeleteWordBackward { range: Range },

    /// Delete word forward (Ctrl/Alt+Delete).
    DeleteWordForward { range: Range },

    /// Formatting and history, routed through the format dispatcher.
    #[serde(skip)]
    Format(FormatCommand),

    /// Move cursor to position.
    MoveCursor { offset: usize },

    /// Extend selection to position.
    ExtendSelection { offset: usize },
}

impl EditorAction {
    /// Update the range in actions that use one.
    pub fn with_range(self, range: Range) -> Self {
        match self {
            Self::Insert { text, .. } => Self::Insert { text, range },
            Self::InsertParagraph { .. } => Self::InsertParagraph { range },
            Self::DeleteBackward { .. } => Self::DeleteBackward { range },
            Self::DeleteForward { .. } => Self::DeleteForward { range },
            Self::DeleteWordBackward { .. } => Self::DeleteWordBackward { range },
            Self::DeleteWordForward { .. } => Self::DeleteWordForward { range },
            other => other,
        }
    }
}

/// Key values for keyboard input.
///
/// Platform-agnostic key representation. Platform-specific code converts
/// from native key events to this enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    /// Unknown/unidentified key.
    Unidentified,

    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,

    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,

    Alt,
    Control,
    Meta,
    Shift,
}

impl Key {
    /// Create a character key.
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Parse a DOM `KeyboardEvent.key` value.
    pub fn parse(s: &str) -> Self {
        match s {
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "Enter" => Self::Enter,
            "Tab" => Self::Tab,
            "Escape" => Self::Escape,
            "ArrowLeft" => Self::ArrowLeft,
            "ArrowRight" => Self::ArrowRight,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            "Home" => Self::Home,
            "End" => Self::End,
            "Alt" => Self::Alt,
            "Control" => Self::Control,
            "Meta" => Self::Meta,
            "Shift" => Self::Shift,
            "" | "Unidentified" => Self::Unidentified,
            other if other.chars().count() == 1 => Self::character(other),
            _ => Self::Unidentified,
        }
    }

    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
        )
    }

    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(self, Self::Alt | Self::Control | Self::Meta | Self::Shift)
    }

    /// The lowercased character for character keys.
    pub fn lower_char(&self) -> Option<char> {
        match self {
            Self::Character(s) => s.chars().next().map(|c| c.to_ascii_lowercase()),
            _ => None,
        }
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        ctrl: false,
        alt: false,
        shift: true,
        meta: false,
    };

    pub const META: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: true,
    };

    pub const CTRL_SHIFT: Self = Self {
        ctrl: true,
        alt: false,
        shift: true,
        meta: false,
    };

    /// Whether the platform's command modifier (Ctrl or Cmd) is held.
    pub fn primary(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// A keydown event as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Ctrl + a character key.
    pub fn ctrl(c: &str) -> Self {
        Self::with_modifiers(Key::character(c), Modifiers::CTRL)
    }

    /// Cmd + a character key.
    pub fn meta(c: &str) -> Self {
        Self::with_modifiers(Key::character(c), Modifiers::META)
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
    /// Platform handles it natively; content is resynced right after.
    NativeThenResync,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_normalize() {
        let r = Range::new(9, 3).normalize();
        assert_eq!(r, Range::new(3, 9));
        assert_eq!(r.len(), 6);
        assert!(Range::caret(4).is_caret());
    }

    #[test]
    fn test_input_type_parse() {
        assert_eq!(InputType::parse("insertText"), InputType::InsertText);
        assert!(InputType::parse("deleteByCut").is_deletion());
        assert_eq!(
            InputType::parse("insertOrderedList"),
            InputType::Unknown("insertOrderedList".into())
        );
    }

    #[test]
    fn test_input_to_action() {
        let range = Range::new(2, 4);
        assert_eq!(
            InputType::InsertText.to_action(Some("x"), range),
            Some(EditorAction::Insert {
                text: "x".into(),
                range
            })
        );
        assert_eq!(InputType::InsertText.to_action(None, range), None);
        assert_eq!(
            InputType::FormatBold.to_action(None, range),
            Some(EditorAction::Format(FormatCommand::Bold))
        );
    }

    #[test]
    fn test_key_parse() {
        assert_eq!(Key::parse("b"), Key::character("b"));
        assert_eq!(Key::parse("B").lower_char(), Some('b'));
        assert_eq!(Key::parse("Enter"), Key::Enter);
        assert_eq!(Key::parse("F13"), Key::Unidentified);
        assert!(Key::parse("Shift").is_modifier());
    }

    #[test]
    fn test_modifiers_primary() {
        assert!(Modifiers::CTRL.primary());
        assert!(Modifiers::META.primary());
        assert!(!Modifiers::SHIFT.primary());
    }
}
