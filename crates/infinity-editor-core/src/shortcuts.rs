//! Keyboard shortcut routing.
//!
//! A fixed table maps primary-modifier chords (Ctrl, or Cmd on macOS) to
//! formatting commands. Clipboard chords stay with the platform.

use crate::actions::{KeyEvent, KeydownResult};
use crate::format::FormatCommand;

/// What to do with a keydown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcutOutcome {
    /// Intercept and run a format command.
    Format(FormatCommand),
    /// Let the platform handle it (copy).
    Native,
    /// Let the platform handle it, then resync content from the surface on
    /// the next tick (cut, paste).
    NativeThenResync,
    /// Not a shortcut.
    PassThrough,
}

impl ShortcutOutcome {
    /// How the host should treat the event's default action.
    pub fn keydown_result(&self) -> KeydownResult {
        match self {
            Self::Format(_) => KeydownResult::Handled,
            Self::NativeThenResync => KeydownResult::NativeThenResync,
            Self::Native | Self::PassThrough => KeydownResult::NotHandled,
        }
    }
}

/// Stateless chord table.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyboardShortcutRouter;

impl KeyboardShortcutRouter {
    pub fn new() -> Self {
        Self
    }

    pub fn route(&self, event: &KeyEvent) -> ShortcutOutcome {
        let mods = event.modifiers;
        if !mods.primary() || mods.alt {
            return ShortcutOutcome::PassThrough;
        }
        let Some(c) = event.key.lower_char() else {
            return ShortcutOutcome::PassThrough;
        };
        match c {
            'b' => ShortcutOutcome::Format(FormatCommand::Bold),
            'i' => ShortcutOutcome::Format(FormatCommand::Italic),
            'u' => ShortcutOutcome::Format(FormatCommand::Underline),
            'z' if mods.shift => ShortcutOutcome::Format(FormatCommand::Redo),
            'z' => ShortcutOutcome::Format(FormatCommand::Undo),
            'y' => ShortcutOutcome::Format(FormatCommand::Redo),
            'c' => ShortcutOutcome::Native,
            'x' | 'v' => ShortcutOutcome::NativeThenResync,
            _ => ShortcutOutcome::PassThrough,
        }
    }
}
