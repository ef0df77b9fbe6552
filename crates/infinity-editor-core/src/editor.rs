//! The document editor: one mounted instance on one surface.
//!
//! `DocumentEditor` owns the document model and every helper around it. The
//! host forwards its events (selection changes, focus, keys, input, drops)
//! and calls [`DocumentEditor::tick`] regularly to drive the timers.

use crate::actions::{EditorAction, InputType, KeyEvent, KeydownResult, Range};
use crate::autosave::{AutosaveScheduler, ContentSink};
use crate::config::EditorConfig;
use crate::document::{EditorDocument, RichDocument};
use crate::execute::execute_action;
use crate::format::{FormatCommand, dispatch_format};
use crate::html::{parse_html, write_html};
use crate::platform::{Clock, EditorSurface, SubscriptionId};
use crate::presence::{CollaboratorCursor, CollaboratorPresenceSimulator};
use crate::selection::{SelectionChange, SelectionTracker};
use crate::shortcuts::{KeyboardShortcutRouter, ShortcutOutcome};
use crate::text::EditorRope;
use crate::toolbar::{FloatingToolbarPositioner, ToolbarState};
use crate::types::Selection;

use web_time::Instant;

/// The editor's selection-change listener registration.
///
/// Disposed on unmount so listeners never outlive their editor.
#[derive(Debug)]
pub struct SelectionSubscription {
    id: SubscriptionId,
}

impl SelectionSubscription {
    fn register<S: EditorSurface + ?Sized>(surface: &mut S) -> Self {
        Self {
            id: surface.subscribe_selection_changes(),
        }
    }

    fn dispose<S: EditorSurface + ?Sized>(self, surface: &mut S) {
        surface.unsubscribe(self.id);
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

/// Content dropped onto the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum DropPayload {
    /// Plain text, inserted at `at` (or the live selection when absent).
    Text { text: String, at: Option<Selection> },
    /// File names. File drops are not supported.
    Files(Vec<String>),
    /// Nothing usable.
    Empty,
}

/// What a call to [`DocumentEditor::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub resynced: bool,
    pub flushed: bool,
    pub toolbar_hidden: bool,
    pub presence_moved: bool,
}

pub struct DocumentEditor<S: EditorSurface, K: ContentSink, C: Clock> {
    doc: RichDocument,
    surface: S,
    clock: C,
    config: EditorConfig,
    tracker: SelectionTracker,
    autosave: AutosaveScheduler<K>,
    toolbar: FloatingToolbarPositioner,
    router: KeyboardShortcutRouter,
    presence: CollaboratorPresenceSimulator,
    subscription: Option<SelectionSubscription>,
    initial_content: String,
    resync_pending: bool,
    mounted: bool,
}

impl<S: EditorSurface, K: ContentSink, C: Clock> DocumentEditor<S, K, C> {
    /// Mount an editor on `surface` showing `initial_content`.
    ///
    /// Mounting does not notify the sink. A config that fails validation is
    /// replaced by the defaults.
    pub fn mount(
        mut surface: S,
        initial_content: &str,
        sink: K,
        config: EditorConfig,
        clock: C,
    ) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                tracing::warn!(target: "infinity::editor", error = %e, "invalid config, using defaults");
                EditorConfig::default()
            }
        };
        let doc = RichDocument::from_html(initial_content, config.undo_depth);
        let content = doc.content_html();
        if let Err(e) = surface.render(&content) {
            tracing::warn!(target: "infinity::editor", error = %e, "initial render failed");
        }
        let subscription = SelectionSubscription::register(&mut surface);
        let now = clock.now();
        let presence = CollaboratorPresenceSimulator::start(
            now,
            config.presence_period(),
            config.presence_jitter,
            config.presence_bounds,
            config.presence_seed,
        );
        tracing::debug!(
            target: "infinity::editor",
            chars = doc.len_chars(),
            subscription = subscription.id().0,
            "editor mounted"
        );

        Self {
            autosave: AutosaveScheduler::new(sink, config.debounce(), config.max_wait(), content),
            toolbar: FloatingToolbarPositioner::new(config.toolbar_offset, config.focus_grace()),
            tracker: SelectionTracker::new(),
            router: KeyboardShortcutRouter::new(),
            presence,
            subscription: Some(subscription),
            initial_content: initial_content.to_string(),
            resync_pending: false,
            mounted: true,
            doc,
            surface,
            clock,
            config,
        }
    }

    // === Accessors ===

    /// Current serialized content.
    pub fn content(&self) -> &str {
        self.autosave.latest()
    }

    pub fn toolbar(&self) -> ToolbarState {
        self.toolbar.state()
    }

    pub fn collaborators(&self) -> &[CollaboratorCursor] {
        self.presence.cursors()
    }

    pub fn document(&self) -> &RichDocument {
        &self.doc
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn sink(&self) -> &K {
        self.autosave.sink()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn saved_selection(&self) -> Option<Selection> {
        self.tracker.saved()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Earliest pending timer deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.autosave.next_deadline(),
            self.toolbar.next_deadline(),
            self.presence.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    // === Host events ===

    /// Adopt new initial content when it differs from the last one.
    ///
    /// Rebuilds the document, clears history and the saved selection, and
    /// does not notify the sink.
    pub fn set_initial_content(&mut self, initial_content: &str) -> bool {
        if !self.mounted || initial_content == self.initial_content {
            return false;
        }
        self.initial_content = initial_content.to_string();
        self.doc = RichDocument::from_html(initial_content, self.config.undo_depth);
        self.tracker.clear();
        self.toolbar.hide();
        self.resync_pending = false;
        let content = self.doc.content_html();
        self.render(&content);
        self.autosave.reset(content);
        tracing::debug!(target: "infinity::editor", "initial content replaced");
        true
    }

    pub fn handle_selection_change(&mut self) -> SelectionChange {
        if !self.mounted {
            return SelectionChange::Ignored;
        }
        let change = self.tracker.handle_selection_change(&self.surface);
        match change {
            SelectionChange::Selected {
                selection,
                selection_rect,
                surface_rect,
            } => {
                self.doc.set_selection(Some(selection.clamp(self.doc.len_chars())));
                self.toolbar.show(
                    selection,
                    selection_rect,
                    surface_rect,
                    self.surface.has_focus(),
                );
            }
            SelectionChange::Cleared => self.toolbar.hide(),
            SelectionChange::Ignored => {}
        }
        change
    }

    pub fn handle_focus(&mut self) {
        self.toolbar.on_focus_gained();
    }

    pub fn handle_blur(&mut self) {
        self.toolbar.on_focus_lost(self.clock.now());
    }

    /// Snapshot the selection, then route shortcut chords.
    pub fn handle_key_down(&mut self, event: &KeyEvent) -> KeydownResult {
        if !self.mounted {
            return KeydownResult::NotHandled;
        }
        self.tracker.save_current_selection(&self.surface);

        let outcome = self.router.route(event);
        match &outcome {
            ShortcutOutcome::Format(cmd) => {
                self.apply_format_command(cmd);
            }
            ShortcutOutcome::NativeThenResync => self.schedule_resync(),
            ShortcutOutcome::Native | ShortcutOutcome::PassThrough => {}
        }
        outcome.keydown_result()
    }

    /// Apply a formatting action by its legacy name.
    ///
    /// Never fails: unknown actions, bad values and missing selections are
    /// logged and leave the content unchanged. Returns whether it changed.
    pub fn apply_format(&mut self, action: &str, value: Option<&str>) -> bool {
        match FormatCommand::parse(action, value) {
            Ok(cmd) => self.apply_format_command(&cmd),
            Err(e) => {
                tracing::warn!(target: "infinity::editor", action, error = %e, "format rejected");
                false
            }
        }
    }

    pub fn apply_format_command(&mut self, cmd: &FormatCommand) -> bool {
        if !self.mounted {
            return false;
        }
        match dispatch_format(&mut self.doc, &mut self.tracker, &mut self.surface, cmd) {
            Ok(changed) => {
                if changed {
                    self.notify_mutation();
                }
                changed
            }
            Err(e) => {
                tracing::warn!(target: "infinity::editor", action = cmd.name(), error = %e, "format failed");
                false
            }
        }
    }

    /// Apply raw input (typing, Enter, deletions).
    pub fn handle_input(&mut self, action: EditorAction) -> bool {
        if !self.mounted {
            return false;
        }
        if let EditorAction::Format(cmd) = &action {
            return self.apply_format_command(cmd);
        }
        if !execute_action(&mut self.doc, &action) {
            return false;
        }
        self.after_input();
        true
    }

    /// Apply a W3C input event at the live selection.
    pub fn handle_input_event(&mut self, input_type: &InputType, data: Option<&str>) -> bool {
        let range = self.input_range();
        match input_type.to_action(data, range) {
            Some(action) => self.handle_input(action),
            None => {
                tracing::debug!(target: "infinity::editor", ?input_type, "input left to platform");
                false
            }
        }
    }

    /// Type `text` at the live selection, replacing it.
    pub fn type_text(&mut self, text: &str) -> bool {
        let range = self.input_range();
        self.handle_input(EditorAction::Insert {
            text: text.to_string(),
            range,
        })
    }

    pub fn handle_drop(&mut self, payload: DropPayload) -> bool {
        if !self.mounted {
            return false;
        }
        match payload {
            DropPayload::Text { text, .. } if text.is_empty() => {
                tracing::warn!(target: "infinity::editor", "empty text drop ignored");
                false
            }
            DropPayload::Text { text, at } => {
                let range = at.map(Range::from).unwrap_or_else(|| self.input_range());
                self.handle_input(EditorAction::Insert { text, range })
            }
            DropPayload::Files(names) => {
                tracing::info!(target: "infinity::editor", files = ?names, "file drop not supported");
                false
            }
            DropPayload::Empty => {
                tracing::warn!(target: "infinity::editor", "drop carried no usable data");
                false
            }
        }
    }

    /// Re-read the surface on the next tick, after a native edit.
    pub fn schedule_resync(&mut self) {
        if self.mounted {
            self.resync_pending = true;
        }
    }

    /// Drive timers: deferred resync, debounced flush, toolbar grace period,
    /// presence drift.
    pub fn tick(&mut self) -> TickReport {
        if !self.mounted {
            return TickReport::default();
        }
        let now = self.clock.now();
        let resynced = self.resync_pending && self.resync();
        TickReport {
            resynced,
            flushed: self.autosave.poll(now),
            toolbar_hidden: self.toolbar.poll(now),
            presence_moved: self.presence.poll(now),
        }
    }

    /// Tear down: final flush, stop presence, drop the listener.
    ///
    /// Only the first call does anything.
    pub fn unmount(&mut self) -> bool {
        if !self.mounted {
            return false;
        }
        self.mounted = false;
        self.resync_pending = false;
        self.toolbar.hide();
        self.autosave.flush_on_unmount();
        self.presence.stop();
        if let Some(subscription) = self.subscription.take() {
            subscription.dispose(&mut self.surface);
        }
        tracing::debug!(target: "infinity::editor", "editor unmounted");
        true
    }

    // === Internals ===

    fn input_range(&self) -> Range {
        let live = match self.surface.read_selection() {
            Ok(sel) => sel,
            Err(e) => {
                tracing::warn!(target: "infinity::editor", error = %e, "failed to read selection for input");
                None
            }
        };
        let len = self.doc.len_chars();
        live.or_else(|| self.doc.selection())
            .map(|sel| Range::from(sel.clamp(len)))
            .unwrap_or_else(|| Range::caret(self.doc.cursor_offset().min(len)))
    }

    fn after_input(&mut self) {
        let content = self.doc.content_html();
        self.render(&content);
        let caret = Selection::collapsed(self.doc.cursor_offset());
        if let Err(e) = self.surface.write_selection(caret) {
            tracing::warn!(target: "infinity::editor", error = %e, "failed to place caret");
        }
        self.autosave.record_change(content, self.clock.now());
    }

    fn resync(&mut self) -> bool {
        self.resync_pending = false;
        let markup = match self.surface.read_content() {
            Ok(markup) => markup,
            Err(e) => {
                tracing::warn!(target: "infinity::editor", error = %e, "resync read failed");
                return false;
            }
        };
        let parsed = parse_html(&markup);
        let incoming = write_html(&EditorRope::from_parts(&parsed.text, parsed.styles.clone()));
        if incoming == self.doc.content_html() {
            return false;
        }
        self.doc.replace_all(&parsed);
        tracing::debug!(target: "infinity::editor", chars = self.doc.len_chars(), "resynced from surface");
        self.notify_mutation();
        true
    }

    fn notify_mutation(&mut self) {
        let content = self.doc.content_html();
        self.autosave.record_change(content, self.clock.now());
    }

    fn render(&mut self, markup: &str) {
        if let Err(e) = self.surface.render(markup) {
            tracing::warn!(target: "infinity::editor", error = %e, "render failed");
        }
    }
}

impl<S: EditorSurface, K: ContentSink, C: Clock> Drop for DocumentEditor<S, K, C> {
    fn drop(&mut self) {
        self.unmount();
    }
}
