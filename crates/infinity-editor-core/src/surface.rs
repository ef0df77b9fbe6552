//! Headless editor surface.
//!
//! `MemorySurface` stands in for a content-editable view: it keeps the last
//! rendered markup, a live selection, focus, and a fixed-grid layout where
//! every char is [`CHAR_WIDTH`] wide and every paragraph is one
//! [`LINE_HEIGHT`] tall line. Failures can be injected per concern.
//!
//! Clones share state, like several handles onto one DOM node.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::error::PlatformError;
use crate::html::parse_html;
use crate::platform::{EditorSurface, SubscriptionId};
use crate::types::{Rect, Selection};

/// Width of one char cell, in pixels.
pub const CHAR_WIDTH: f64 = 8.0;
/// Height of one paragraph line, in pixels.
pub const LINE_HEIGHT: f64 = 20.0;

#[derive(Debug)]
struct SurfaceState {
    mounted: bool,
    focused: bool,
    origin: Rect,
    markup: String,
    text: String,
    selection: Option<Selection>,
    selection_outside: bool,
    render_count: usize,
    next_listener: u64,
    listeners: BTreeSet<u64>,
    fail_selection: bool,
    fail_geometry: bool,
    fail_render: bool,
}

/// In-memory [`EditorSurface`].
#[derive(Debug, Clone)]
pub struct MemorySurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    /// A mounted, unfocused surface at (100, 200), 800x600.
    pub fn new() -> Self {
        Self::with_rect(Rect::new(100.0, 200.0, 800.0, 600.0))
    }

    pub fn with_rect(origin: Rect) -> Self {
        Self {
            state: Rc::new(RefCell::new(SurfaceState {
                mounted: true,
                focused: false,
                origin,
                markup: String::new(),
                text: String::new(),
                selection: None,
                selection_outside: false,
                render_count: 0,
                next_listener: 0,
                listeners: BTreeSet::new(),
                fail_selection: false,
                fail_geometry: false,
                fail_render: false,
            })),
        }
    }

    pub fn set_mounted(&self, mounted: bool) {
        self.state.borrow_mut().mounted = mounted;
    }

    pub fn set_focus(&self, focused: bool) {
        self.state.borrow_mut().focused = focused;
    }

    /// Simulate the user selecting `anchor..head` inside the surface.
    pub fn select(&self, anchor: usize, head: usize) {
        let mut state = self.state.borrow_mut();
        state.selection = Some(Selection::new(anchor, head));
        state.selection_outside = false;
    }

    /// Simulate the user selecting text somewhere else on the page.
    pub fn select_outside(&self) {
        let mut state = self.state.borrow_mut();
        state.selection = None;
        state.selection_outside = true;
    }

    /// Drop the live selection entirely.
    pub fn clear_selection(&self) {
        let mut state = self.state.borrow_mut();
        state.selection = None;
        state.selection_outside = false;
    }

    /// The live selection as the surface sees it.
    pub fn live_selection(&self) -> Option<Selection> {
        self.state.borrow().selection
    }

    /// Replace the content the way a native cut or paste would, without a
    /// render from the editor.
    pub fn native_edit(&self, markup: &str) {
        let mut state = self.state.borrow_mut();
        state.text = parse_html(markup).text;
        state.markup = markup.to_string();
    }

    /// Last markup rendered or natively edited into the surface.
    pub fn markup(&self) -> String {
        self.state.borrow().markup.clone()
    }

    /// Number of successful renders.
    pub fn render_count(&self) -> usize {
        self.state.borrow().render_count
    }

    /// Number of selection-change listeners still registered.
    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn fail_selection(&self, fail: bool) {
        self.state.borrow_mut().fail_selection = fail;
    }

    pub fn fail_geometry(&self, fail: bool) {
        self.state.borrow_mut().fail_geometry = fail;
    }

    pub fn fail_render(&self, fail: bool) {
        self.state.borrow_mut().fail_render = fail;
    }
}

impl SurfaceState {
    /// Paragraph index and column of a char offset.
    fn position(&self, offset: usize) -> (usize, usize) {
        let mut line = 0;
        let mut col = 0;
        for c in self.text.chars().take(offset) {
            if c == '\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    fn line_lengths(&self) -> Vec<usize> {
        self.text.split('\n').map(|l| l.chars().count()).collect()
    }

    fn cell_rect(&self, line: usize, col_start: usize, col_end: usize) -> Rect {
        Rect::new(
            self.origin.x + col_start as f64 * CHAR_WIDTH,
            self.origin.y + line as f64 * LINE_HEIGHT,
            (col_end - col_start) as f64 * CHAR_WIDTH,
            LINE_HEIGHT,
        )
    }
}

impl EditorSurface for MemorySurface {
    fn is_mounted(&self) -> bool {
        self.state.borrow().mounted
    }

    fn has_focus(&self) -> bool {
        let state = self.state.borrow();
        state.mounted && state.focused
    }

    fn read_selection(&self) -> Result<Option<Selection>, PlatformError> {
        let state = self.state.borrow();
        if state.fail_selection {
            return Err(PlatformError::Selection("injected read failure".into()));
        }
        if state.selection_outside {
            return Ok(None);
        }
        Ok(state.selection)
    }

    fn write_selection(&mut self, selection: Selection) -> Result<(), PlatformError> {
        let mut state = self.state.borrow_mut();
        if !state.mounted {
            return Err(PlatformError::NotMounted);
        }
        if state.fail_selection {
            return Err(PlatformError::Selection("injected write failure".into()));
        }
        state.selection = Some(selection);
        state.selection_outside = false;
        Ok(())
    }

    fn selection_rect(&self, selection: Selection) -> Result<Rect, PlatformError> {
        let state = self.state.borrow();
        if state.fail_geometry {
            return Err(PlatformError::Geometry("injected geometry failure".into()));
        }
        let (start_line, start_col) = state.position(selection.start());
        let (end_line, end_col) = state.position(selection.end());
        if start_line == end_line {
            return Ok(state.cell_rect(start_line, start_col, end_col));
        }

        let lengths = state.line_lengths();
        let line_len = |line: usize| lengths.get(line).copied().unwrap_or(0);
        let mut rect = state.cell_rect(start_line, start_col, line_len(start_line).max(start_col));
        for line in start_line + 1..end_line {
            rect = rect.union(&state.cell_rect(line, 0, line_len(line)));
        }
        Ok(rect.union(&state.cell_rect(end_line, 0, end_col)))
    }

    fn surface_rect(&self) -> Result<Rect, PlatformError> {
        let state = self.state.borrow();
        if state.fail_geometry {
            return Err(PlatformError::Geometry("injected geometry failure".into()));
        }
        Ok(state.origin)
    }

    fn render(&mut self, markup: &str) -> Result<(), PlatformError> {
        let mut state = self.state.borrow_mut();
        if !state.mounted {
            return Err(PlatformError::NotMounted);
        }
        if state.fail_render {
            return Err(PlatformError::Render("injected render failure".into()));
        }
        state.text = parse_html(markup).text;
        state.markup = markup.to_string();
        state.render_count += 1;
        Ok(())
    }

    fn read_content(&self) -> Result<String, PlatformError> {
        let state = self.state.borrow();
        if !state.mounted {
            return Err(PlatformError::NotMounted);
        }
        Ok(state.markup.clone())
    }

    fn subscribe_selection_changes(&mut self) -> SubscriptionId {
        let mut state = self.state.borrow_mut();
        let id = state.next_listener;
        state.next_listener += 1;
        state.listeners.insert(id);
        SubscriptionId(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.state.borrow_mut().listeners.remove(&id.0);
    }
}
