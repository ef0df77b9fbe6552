// End-to-end editor behaviour against a headless surface and a manual clock.
//
// Each test mounts a DocumentEditor the way a host would, drives it with
// surface events and clock advances, and checks the notifications the sink
// received.

use infinity_editor_core::{
    ChangeLog, DocumentEditor, EditorConfig, KeyEvent, KeydownResult, ManualClock, MemorySurface,
    NotifyReason, PresenceBounds, SelectionChange,
};

type Editor = DocumentEditor<MemorySurface, ChangeLog, ManualClock>;

struct Harness {
    editor: Editor,
    surface: MemorySurface,
    log: ChangeLog,
    clock: ManualClock,
}

fn mount_with(content: &str, config: EditorConfig) -> Harness {
    let surface = MemorySurface::new();
    surface.set_focus(true);
    let log = ChangeLog::new();
    let clock = ManualClock::new();
    let editor = DocumentEditor::mount(surface.clone(), content, log.clone(), config, clock.clone());
    Harness {
        editor,
        surface,
        log,
        clock,
    }
}

fn mount(content: &str) -> Harness {
    mount_with(
        content,
        EditorConfig {
            presence_seed: Some(2024),
            ..Default::default()
        },
    )
}

impl Harness {
    fn select(&mut self, anchor: usize, head: usize) -> SelectionChange {
        self.surface.select(anchor, head);
        self.editor.handle_selection_change()
    }

    fn wait(&mut self, ms: u64) {
        self.clock.advance_ms(ms);
        self.editor.tick();
    }
}

#[test]
fn format_applies_to_selection_saved_before_toolbar_click() {
    let mut h = mount("<p>hello world</p>");
    h.select(6, 11);

    // Clicking the toolbar moves focus and the live selection away.
    h.surface.select_outside();
    assert_eq!(h.editor.handle_selection_change(), SelectionChange::Cleared);
    h.surface.set_focus(false);
    h.editor.handle_blur();

    assert!(h.editor.apply_format("bold", None));
    assert_eq!(h.editor.content(), "<p>hello <b>world</b></p>");
}

#[test]
fn bold_twice_toggles_back() {
    let mut h = mount("<p>hello</p>");
    h.select(0, 5);

    h.editor.apply_format("bold", None);
    let once = h.editor.content().to_string();
    h.editor.apply_format("bold", None);
    let twice = h.editor.content().to_string();

    assert_ne!(once, twice);
    assert_eq!(once, "<p><b>hello</b></p>");
    assert_eq!(twice, "<p>hello</p>");
}

#[test]
fn chained_formats_keep_the_selection() {
    let mut h = mount("<p>renewal due friday</p>");
    h.select(12, 15);

    assert!(h.editor.apply_format("italic", None));
    assert!(h.editor.apply_format("foreColor", Some("#dc2626")));
    assert!(h.editor.apply_format("fontSize", Some("7")));
    assert_eq!(
        h.editor.content(),
        "<p>renewal due <i><span style=\"font-size: 48px; color: #dc2626\">fri</span></i>day</p>"
    );
}

#[test]
fn select_all_then_bold_notifies_once() {
    let mut h = mount("<p>hello</p>");

    assert!(!h.editor.apply_format("selectAll", None));
    assert!(h.editor.apply_format("bold", None));

    assert_eq!(h.editor.content(), "<p><b>hello</b></p>");
    assert_eq!(
        h.log.contents(NotifyReason::Immediate),
        vec!["<p><b>hello</b></p>"]
    );
}

#[test]
fn burst_within_window_gives_one_debounced_call() {
    let mut h = mount("");
    for _ in 0..5 {
        h.editor.type_text("a");
        h.wait(100);
    }
    assert_eq!(h.log.count(NotifyReason::Immediate), 5);
    assert_eq!(h.log.count(NotifyReason::Debounced), 0);

    h.wait(1000);
    h.wait(5000);
    assert_eq!(
        h.log.contents(NotifyReason::Debounced),
        vec!["<p>aaaaa</p>"]
    );
}

#[test]
fn three_seconds_of_typing_gives_three_debounced_calls() {
    let mut h = mount("");
    for _ in 0..30 {
        h.editor.type_text("x");
        h.wait(100);
    }
    h.wait(2000);

    assert_eq!(h.log.count(NotifyReason::Immediate), 30);
    let flushed = h.log.contents(NotifyReason::Debounced);
    assert_eq!(
        flushed,
        vec![
            format!("<p>{}</p>", "x".repeat(10)),
            format!("<p>{}</p>", "x".repeat(20)),
            format!("<p>{}</p>", "x".repeat(30)),
        ]
    );
}

#[test]
fn pure_debounce_waits_for_a_quiet_window() {
    let mut h = mount_with(
        "",
        EditorConfig {
            max_wait_ms: None,
            presence_seed: Some(1),
            ..Default::default()
        },
    );
    for _ in 0..30 {
        h.editor.type_text("x");
        h.wait(100);
    }
    assert_eq!(h.log.count(NotifyReason::Debounced), 0);

    h.wait(1000);
    assert_eq!(h.log.count(NotifyReason::Debounced), 1);
}

#[test]
fn unmount_right_after_mutation_flushes_latest_once() {
    let mut h = mount("<p>draft</p>");
    h.surface.select(5, 5);
    h.editor.type_text("!");

    assert!(h.editor.unmount());
    assert!(!h.editor.unmount());
    h.wait(5000);

    assert_eq!(
        h.log.contents(NotifyReason::Unmount),
        vec!["<p>draft!</p>"]
    );
    assert_eq!(h.log.count(NotifyReason::Debounced), 0);
}

#[test]
fn caret_never_shows_toolbar() {
    let mut h = mount("<p>first line</p><p>second</p>");
    for offset in 0..=17 {
        h.select(offset, offset);
        assert!(!h.editor.toolbar().visible, "caret at {offset}");
    }

    h.select(0, 5);
    assert!(h.editor.toolbar().visible);
    h.select(3, 3);
    assert!(!h.editor.toolbar().visible);
    assert_eq!(h.editor.toolbar().position, None);
}

#[test]
fn toolbar_sits_above_selection_midpoint() {
    let mut h = mount("<p>one</p><p>call the client</p>");
    // "client" on the second line: columns 9..15.
    h.select(13, 19);

    let pos = h.editor.toolbar().position.expect("toolbar position");
    assert_eq!(pos.top, 20.0 - 40.0);
    assert_eq!(pos.left, 9.0 * 8.0 + 6.0 * 8.0 / 2.0);
}

#[test]
fn toolbar_survives_quick_refocus() {
    let mut h = mount("<p>hello</p>");
    h.select(0, 5);

    h.editor.handle_blur();
    h.wait(60);
    h.editor.handle_focus();
    h.wait(500);
    assert!(h.editor.toolbar().visible);

    h.editor.handle_blur();
    h.wait(100);
    assert!(!h.editor.toolbar().visible);
}

#[test]
fn keyboard_shortcuts_format_and_undo() {
    let mut h = mount("<p>hello</p>");
    h.surface.select(0, 5);

    assert_eq!(
        h.editor.handle_key_down(&KeyEvent::meta("u")),
        KeydownResult::Handled
    );
    assert_eq!(h.editor.content(), "<p><u>hello</u></p>");

    h.editor.handle_key_down(&KeyEvent::ctrl("z"));
    assert_eq!(h.editor.content(), "<p>hello</p>");

    h.editor.handle_key_down(&KeyEvent::ctrl("y"));
    assert_eq!(h.editor.content(), "<p><u>hello</u></p>");
    assert_eq!(h.log.count(NotifyReason::Immediate), 3);
}

#[test]
fn paste_is_resynced_from_the_surface() {
    let mut h = mount("<p>hello</p>");
    h.surface.select(5, 5);

    let result = h.editor.handle_key_down(&KeyEvent::ctrl("v"));
    assert_eq!(result, KeydownResult::NativeThenResync);
    h.surface.native_edit("<p>hello <b>world</b></p>");
    h.wait(0);

    assert_eq!(h.editor.content(), "<p>hello <b>world</b></p>");
    assert_eq!(
        h.log.contents(NotifyReason::Immediate),
        vec!["<p>hello <b>world</b></p>"]
    );
}

#[test]
fn platform_failures_are_absorbed() {
    let mut h = mount("<p>hello</p>");
    h.surface.select(0, 5);
    h.surface.fail_geometry(true);
    assert_eq!(h.editor.handle_selection_change(), SelectionChange::Cleared);
    assert!(!h.editor.toolbar().visible);

    h.surface.fail_geometry(false);
    h.select(0, 5);
    h.surface.fail_render(true);
    assert!(h.editor.apply_format("italic", None));
    assert_eq!(h.editor.content(), "<p><i>hello</i></p>");

    h.surface.fail_selection(true);
    assert_eq!(
        h.editor.handle_key_down(&KeyEvent::ctrl("b")),
        KeydownResult::Handled
    );
    // The snapshot was unreadable, so nothing is formatted.
    assert_eq!(h.editor.content(), "<p><i>hello</i></p>");
}

#[test]
fn new_initial_content_resets_without_notifying() {
    let mut h = mount("<p>v1</p>");
    h.surface.select(2, 2);
    h.editor.type_text("!");
    h.log.clear();

    assert!(h.editor.set_initial_content("<p>v2</p>"));
    h.wait(2000);
    assert!(h.log.is_empty());

    h.surface.select(2, 2);
    h.editor.type_text("?");
    assert_eq!(h.log.contents(NotifyReason::Immediate), vec!["<p>v2?</p>"]);
}

#[test]
fn collaborators_stay_in_bounds_and_stop_once() {
    let mut h = mount("<p>x</p>");
    let bounds = PresenceBounds::default();
    let start: Vec<_> = h.editor.collaborators().to_vec();
    assert_eq!(start.len(), 3);

    for _ in 0..500 {
        h.wait(3000);
        assert!(
            h.editor
                .collaborators()
                .iter()
                .all(|c| bounds.contains(c.position))
        );
    }
    assert_ne!(h.editor.collaborators(), start.as_slice());

    assert!(h.editor.unmount());
    let frozen = h.editor.collaborators().to_vec();
    h.wait(30_000);
    assert_eq!(h.editor.collaborators(), frozen.as_slice());
    assert_eq!(h.editor.next_deadline(), None);
    assert!(!h.editor.unmount());
}

#[test]
fn editors_sharing_a_page_do_not_leak_listeners() {
    let page = MemorySurface::new();
    let clock = ManualClock::new();
    let logs: Vec<ChangeLog> = (0..3).map(|_| ChangeLog::new()).collect();

    let mut editors: Vec<Editor> = logs
        .iter()
        .map(|log| {
            DocumentEditor::mount(
                page.clone(),
                "<p>note</p>",
                log.clone(),
                EditorConfig::default(),
                clock.clone(),
            )
        })
        .collect();
    assert_eq!(page.listener_count(), 3);

    editors[0].unmount();
    assert_eq!(page.listener_count(), 2);
    drop(editors);
    assert_eq!(page.listener_count(), 0);

    for log in &logs {
        assert_eq!(log.count(NotifyReason::Unmount), 1);
    }
}
