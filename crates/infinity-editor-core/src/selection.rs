//! Selection snapshots across focus changes.
//!
//! Clicking a toolbar control moves focus out of the surface and takes the
//! live selection with it. `SelectionTracker` keeps the user's last real
//! selection so formatting can put it back right before it runs.

use crate::platform::EditorSurface;
use crate::types::{Rect, Selection};

/// Outcome of a selection-change notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionChange {
    /// A ranged selection inside the surface, with its geometry.
    Selected {
        selection: Selection,
        selection_rect: Rect,
        surface_rect: Rect,
    },
    /// Caret, no selection, selection elsewhere, or an unreadable one.
    Cleared,
    /// The surface is gone; nothing was read.
    Ignored,
}

/// Holds at most one saved selection.
#[derive(Debug, Clone, Default)]
pub struct SelectionTracker {
    saved: Option<Selection>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored snapshot, if any.
    pub fn saved(&self) -> Option<Selection> {
        self.saved
    }

    /// Store a snapshot computed by the editor itself (e.g. after a format
    /// shifted offsets). Collapsed selections clear it.
    pub fn store(&mut self, selection: Option<Selection>) {
        self.saved = selection.filter(|s| !s.is_collapsed());
    }

    pub fn clear(&mut self) {
        self.saved = None;
    }

    /// Snapshot the live selection.
    ///
    /// Keeps it when it is ranged and inside the surface, otherwise clears
    /// the snapshot. Read failures count as "no selection".
    pub fn save_current_selection<S: EditorSurface + ?Sized>(
        &mut self,
        surface: &S,
    ) -> Option<Selection> {
        if !surface.is_mounted() {
            return self.saved;
        }
        self.saved = read_ranged(surface);
        self.saved
    }

    /// Put the snapshot back on the surface.
    ///
    /// Returns the snapshot whether or not the write succeeded; formatting
    /// targets the document model, the write only keeps the view in step.
    pub fn restore_selection<S: EditorSurface + ?Sized>(&self, surface: &mut S) -> Option<Selection> {
        let saved = self.saved?;
        if !surface.is_mounted() {
            tracing::debug!(target: "infinity::selection", "restore skipped, surface unmounted");
            return Some(saved);
        }
        if let Err(e) = surface.write_selection(saved) {
            tracing::warn!(target: "infinity::selection", error = %e, "failed to restore selection");
        }
        Some(saved)
    }

    /// React to a selection-change notification.
    ///
    /// A ranged selection inside the surface is stored and measured. Anything
    /// else leaves the snapshot alone so a later toolbar action can still use
    /// it; the caller hides the toolbar.
    pub fn handle_selection_change<S: EditorSurface + ?Sized>(
        &mut self,
        surface: &S,
    ) -> SelectionChange {
        if !surface.is_mounted() {
            return SelectionChange::Ignored;
        }
        let Some(selection) = read_ranged(surface) else {
            return SelectionChange::Cleared;
        };

        let geometry = surface
            .selection_rect(selection)
            .and_then(|sel| surface.surface_rect().map(|surf| (sel, surf)));
        match geometry {
            Ok((selection_rect, surface_rect)) => {
                self.saved = Some(selection);
                SelectionChange::Selected {
                    selection,
                    selection_rect,
                    surface_rect,
                }
            }
            Err(e) => {
                tracing::warn!(target: "infinity::selection", error = %e, "failed to measure selection");
                SelectionChange::Cleared
            }
        }
    }
}

fn read_ranged<S: EditorSurface + ?Sized>(surface: &S) -> Option<Selection> {
    match surface.read_selection() {
        Ok(sel) => sel.filter(|s| !s.is_collapsed()),
        Err(e) => {
            tracing::warn!(target: "infinity::selection", error = %e, "failed to read selection");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;

    fn surface_with(markup: &str) -> MemorySurface {
        let mut surface = MemorySurface::new();
        surface.render(markup).expect("render");
        surface
    }

    #[test]
    fn test_save_ranged_selection() {
        let surface = surface_with("<p>hello world</p>");
        let mut tracker = SelectionTracker::new();

        surface.select(0, 5);
        assert_eq!(
            tracker.save_current_selection(&surface),
            Some(Selection::new(0, 5))
        );
    }

    #[test]
    fn test_save_caret_clears_snapshot() {
        let surface = surface_with("<p>hello world</p>");
        let mut tracker = SelectionTracker::new();

        surface.select(0, 5);
        tracker.save_current_selection(&surface);
        surface.select(3, 3);
        assert_eq!(tracker.save_current_selection(&surface), None);
        assert_eq!(tracker.saved(), None);
    }

    #[test]
    fn test_read_failure_is_no_selection() {
        let surface = surface_with("<p>hello</p>");
        let mut tracker = SelectionTracker::new();
        surface.select(0, 5);
        surface.fail_selection(true);

        assert_eq!(tracker.save_current_selection(&surface), None);
        assert_eq!(
            tracker.handle_selection_change(&surface),
            SelectionChange::Cleared
        );
    }

    #[test]
    fn test_restore_writes_snapshot_back() {
        let mut surface = surface_with("<p>hello world</p>");
        let mut tracker = SelectionTracker::new();

        surface.select(6, 11);
        tracker.save_current_selection(&surface);
        surface.select_outside();

        assert_eq!(
            tracker.restore_selection(&mut surface),
            Some(Selection::new(6, 11))
        );
        assert_eq!(surface.live_selection(), Some(Selection::new(6, 11)));
    }

    #[test]
    fn test_change_measures_geometry() {
        let surface = surface_with("<p>hello world</p>");
        let mut tracker = SelectionTracker::new();
        surface.select(6, 11);

        match tracker.handle_selection_change(&surface) {
            SelectionChange::Selected {
                selection,
                selection_rect,
                surface_rect,
            } => {
                assert_eq!(selection, Selection::new(6, 11));
                assert_eq!(selection_rect.left(), 148.0);
                assert_eq!(surface_rect.top(), 200.0);
            }
            other => panic!("expected selection, got {other:?}"),
        }
    }

    #[test]
    fn test_caret_change_keeps_snapshot() {
        let surface = surface_with("<p>hello world</p>");
        let mut tracker = SelectionTracker::new();
        surface.select(0, 5);
        tracker.handle_selection_change(&surface);

        surface.select(2, 2);
        assert_eq!(
            tracker.handle_selection_change(&surface),
            SelectionChange::Cleared
        );
        assert_eq!(tracker.saved(), Some(Selection::new(0, 5)));
    }

    #[test]
    fn test_change_while_unmounted_is_ignored() {
        let surface = surface_with("<p>hello</p>");
        let mut tracker = SelectionTracker::new();
        surface.select(0, 5);
        surface.set_mounted(false);

        assert_eq!(
            tracker.handle_selection_change(&surface),
            SelectionChange::Ignored
        );
        assert_eq!(tracker.saved(), None);
    }
}
