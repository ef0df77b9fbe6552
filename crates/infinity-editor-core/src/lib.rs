//! infinity-editor-core: headless rich-text document editor engine.
//!
//! This crate provides:
//! - `TextBuffer` / `RichTextBuffer` traits and the ropey-backed `EditorRope`
//! - `EditorDocument` with undo support over text and inline styles
//! - Markup reading and writing (`parse_html`, `write_html`)
//! - Selection snapshots, formatting commands, debounced autosave, toolbar
//!   placement, shortcut routing and simulated collaborator presence
//! - `DocumentEditor`, which wires all of the above to a host `EditorSurface`

pub mod actions;
pub mod autosave;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod execute;
pub mod format;
pub mod html;
pub mod platform;
pub mod presence;
pub mod selection;
pub mod shortcuts;
pub mod style;
pub mod surface;
pub mod text;
pub mod text_helpers;
pub mod toolbar;
pub mod types;
pub mod undo;

pub use actions::{EditorAction, InputType, Key, KeyEvent, KeydownResult, Modifiers, Range};
pub use autosave::{AutosaveScheduler, ChangeLog, ContentSink, Notification, NotifyReason};
pub use config::EditorConfig;
pub use document::{EditorDocument, RichEditor, RichDocument};
pub use editor::{DocumentEditor, DropPayload, SelectionSubscription, TickReport};
pub use error::{ConfigError, FormatError, PlatformError};
pub use execute::execute_action;
pub use format::{FormatCommand, dispatch_format, execute_format};
pub use html::{ParsedContent, parse_html, write_html};
pub use platform::{Clock, EditorSurface, ManualClock, SubscriptionId, SystemClock};
pub use presence::{CollaboratorCursor, CollaboratorPresenceSimulator, PresenceBounds};
pub use selection::{SelectionChange, SelectionTracker};
pub use shortcuts::{KeyboardShortcutRouter, ShortcutOutcome};
pub use smol_str::SmolStr;
pub use style::{StyleFlag, StyleRun, StyleRuns, TextStyle};
pub use surface::MemorySurface;
pub use text::{EditorRope, RichTextBuffer, TextBuffer};
pub use toolbar::{FloatingToolbarPositioner, ToolbarState, compute_position};
pub use types::{EditInfo, Point, Rect, Selection, ToolbarPosition};
pub use undo::{UndoManager, UndoableBuffer};
