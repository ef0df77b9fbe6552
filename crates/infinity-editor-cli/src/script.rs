//! Replay scripts: a JSON list of timed editor events.
//!
//! ```json
//! {
//!   "initial": "<p>hello</p>",
//!   "events": [
//!     { "event": "select", "anchor": 0, "head": 5 },
//!     { "event": "key", "key": "b", "ctrl": true },
//!     { "event": "type", "text": "!", "interval_ms": 100 },
//!     { "event": "wait", "ms": 1500 }
//!   ]
//! }
//! ```

use std::time::Duration;

use infinity_editor_core::{
    Clock, ContentSink, DocumentEditor, DropPayload, EditorConfig, InputType, Key, KeyEvent, ManualClock,
    MemorySurface, Modifiers, NotifyReason, Selection,
};
use serde::{Deserialize, Serialize};
use web_time::Instant;

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    /// Content to mount with; `--initial` overrides it.
    #[serde(default)]
    pub initial: String,
    /// Inline config; `--config` overrides it.
    #[serde(default)]
    pub config: Option<EditorConfig>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// The user selects inside the surface.
    Select { anchor: usize, head: usize },
    /// The user selects somewhere else on the page.
    SelectOutside,
    /// Typed text, one keystroke per char.
    Type {
        text: String,
        #[serde(default)]
        interval_ms: u64,
    },
    Key {
        key: String,
        #[serde(flatten)]
        modifiers: Modifiers,
    },
    /// A toolbar action.
    Format {
        action: String,
        #[serde(default)]
        value: Option<String>,
    },
    /// A W3C input event.
    Input {
        input_type: String,
        #[serde(default)]
        data: Option<String>,
    },
    Focus,
    Blur,
    /// The platform rewrote the surface itself (cut, paste).
    NativeEdit { markup: String },
    Drop {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        files: Vec<String>,
    },
    Wait { ms: u64 },
    SetInitial { content: String },
    Unmount,
}

/// One sink call, stamped with script time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub at_ms: u64,
    pub reason: &'static str,
    pub content: String,
}

/// Sink that stamps and keeps every call, printing as it goes.
pub struct RecordingSink {
    clock: ManualClock,
    start: Instant,
    records: Vec<Record>,
    json: bool,
    echo: bool,
}

impl RecordingSink {
    pub fn new(clock: ManualClock, json: bool, echo: bool) -> Self {
        let start = clock.now();
        Self {
            clock,
            start,
            records: Vec::new(),
            json,
            echo,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }
}

impl ContentSink for RecordingSink {
    fn content_changed(&mut self, content: &str, reason: NotifyReason) {
        let at_ms = (self.clock.now() - self.start).as_millis() as u64;
        let record = Record {
            at_ms,
            reason: reason.as_str(),
            content: content.to_string(),
        };
        if self.echo {
            if self.json {
                match serde_json::to_string(&record) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::error!(error = %e, "failed to encode record"),
                }
            } else {
                println!("{:>7}ms  {:<9}  {}", record.at_ms, record.reason, record.content);
            }
        }
        self.records.push(record);
    }
}

/// Result of a replay.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub records: Vec<Record>,
    pub final_content: String,
    pub immediate: usize,
    pub debounced: usize,
    pub unmount: usize,
}

type ReplayEditor = DocumentEditor<MemorySurface, RecordingSink, ManualClock>;

/// Run `script` against a headless surface and a manual clock.
///
/// The editor is always unmounted at the end, so the summary includes the
/// final flush.
pub fn replay(script: &Script, initial: &str, config: EditorConfig, json: bool, echo: bool) -> Summary {
    let clock = ManualClock::new();
    let surface = MemorySurface::new();
    surface.set_focus(true);
    let sink = RecordingSink::new(clock.clone(), json, echo);
    let mut editor = DocumentEditor::mount(surface.clone(), initial, sink, config, clock.clone());

    for (index, event) in script.events.iter().enumerate() {
        tracing::debug!(index, ?event, "replaying event");
        apply(&mut editor, &surface, &clock, event);
    }

    editor.unmount();
    let final_content = editor.content().to_string();
    let records = editor.sink().records().to_vec();
    let count = |reason: NotifyReason| records.iter().filter(|r| r.reason == reason.as_str()).count();
    Summary {
        immediate: count(NotifyReason::Immediate),
        debounced: count(NotifyReason::Debounced),
        unmount: count(NotifyReason::Unmount),
        final_content,
        records,
    }
}

fn apply(editor: &mut ReplayEditor, surface: &MemorySurface, clock: &ManualClock, event: &Event) {
    match event {
        Event::Select { anchor, head } => {
            surface.select(*anchor, *head);
            editor.handle_selection_change();
        }
        Event::SelectOutside => {
            surface.select_outside();
            editor.handle_selection_change();
        }
        Event::Type { text, interval_ms } => {
            for c in text.chars() {
                let key = c.to_string();
                editor.handle_key_down(&KeyEvent::new(Key::character(key.as_str())));
                match c {
                    '\n' => editor.handle_input_event(&InputType::InsertParagraph, None),
                    _ => editor.type_text(&key),
                };
                if *interval_ms > 0 {
                    wait(editor, clock, *interval_ms);
                }
            }
        }
        Event::Key { key, modifiers } => {
            let event = KeyEvent::with_modifiers(Key::parse(key), *modifiers);
            editor.handle_key_down(&event);
        }
        Event::Format { action, value } => {
            editor.apply_format(action, value.as_deref());
        }
        Event::Input { input_type, data } => {
            editor.handle_input_event(&InputType::parse(input_type), data.as_deref());
        }
        Event::Focus => {
            surface.set_focus(true);
            editor.handle_focus();
        }
        Event::Blur => {
            surface.set_focus(false);
            editor.handle_blur();
        }
        Event::NativeEdit { markup } => {
            surface.native_edit(markup);
            editor.schedule_resync();
        }
        Event::Drop { text, files } => {
            let payload = match (text, files.is_empty()) {
                (Some(text), _) => DropPayload::Text {
                    text: text.clone(),
                    at: surface.live_selection().map(|s| Selection::collapsed(s.head)),
                },
                (None, false) => DropPayload::Files(files.clone()),
                (None, true) => DropPayload::Empty,
            };
            editor.handle_drop(payload);
        }
        Event::Wait { ms } => wait(editor, clock, *ms),
        Event::SetInitial { content } => {
            editor.set_initial_content(content);
        }
        Event::Unmount => {
            editor.unmount();
        }
    }
}

/// Advance the clock by `ms`, stopping at every timer deadline on the way.
fn wait(editor: &mut ReplayEditor, clock: &ManualClock, ms: u64) {
    let target = clock.now() + Duration::from_millis(ms);
    while let Some(deadline) = editor.next_deadline().filter(|d| *d <= target) {
        clock.advance_to(deadline);
        editor.tick();
    }
    clock.advance_to(target);
    editor.tick();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(json: &str) -> Summary {
        let script: Script = serde_json::from_str(json).expect("script");
        let config = EditorConfig {
            presence_seed: Some(1),
            ..script.config.clone().unwrap_or_default()
        };
        replay(&script, &script.initial, config, false, false)
    }

    #[test]
    fn test_select_all_bold() {
        let summary = run(r#"{
            "initial": "<p>hello</p>",
            "events": [
                { "event": "format", "action": "selectAll" },
                { "event": "format", "action": "bold" }
            ]
        }"#);
        assert_eq!(summary.final_content, "<p><b>hello</b></p>");
        assert_eq!(summary.immediate, 1);
        assert_eq!(summary.unmount, 1);
    }

    #[test]
    fn test_typing_with_intervals() {
        let summary = run(r#"{
            "events": [
                { "event": "type", "text": "abcdefghijklmnopqrstuvwxyz0123", "interval_ms": 100 },
                { "event": "wait", "ms": 2000 }
            ]
        }"#);
        assert_eq!(summary.immediate, 30);
        assert_eq!(summary.debounced, 3);
        let stamps: Vec<u64> = summary
            .records
            .iter()
            .filter(|r| r.reason == "debounced")
            .map(|r| r.at_ms)
            .collect();
        assert_eq!(stamps, vec![1000, 2000, 3000]);
    }

    #[test]
    fn test_shortcut_and_paste() {
        let summary = run(r#"{
            "initial": "<p>deal won</p>",
            "events": [
                { "event": "select", "anchor": 5, "head": 8 },
                { "event": "key", "key": "b", "meta": true },
                { "event": "key", "key": "v", "ctrl": true },
                { "event": "native_edit", "markup": "<p>deal <b>won</b> today</p>" },
                { "event": "wait", "ms": 10 }
            ]
        }"#);
        insta::assert_snapshot!(summary.final_content, @"<p>deal <b>won</b> today</p>");
        assert_eq!(summary.immediate, 2);
    }

    #[test]
    fn test_drop_events() {
        let summary = run(r#"{
            "initial": "<p>ab</p>",
            "events": [
                { "event": "select", "anchor": 1, "head": 1 },
                { "event": "drop", "text": "X" },
                { "event": "drop", "files": ["quote.pdf"] },
                { "event": "drop" }
            ]
        }"#);
        assert_eq!(summary.final_content, "<p>aXb</p>");
        assert_eq!(summary.immediate, 1);
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let err = serde_json::from_str::<Script>(r#"{ "events": [{ "event": "teleport" }] }"#);
        assert!(err.is_err());
    }
}
