//! Floating formatting toolbar placement and visibility.

use std::time::Duration;

use web_time::Instant;

use crate::types::{Rect, Selection, ToolbarPosition};

/// Vertical offset from the selection's top edge; negative is above.
pub const DEFAULT_TOOLBAR_OFFSET: f64 = -40.0;

/// How long the toolbar survives a focus loss.
pub const DEFAULT_FOCUS_GRACE: Duration = Duration::from_millis(100);

/// Toolbar anchor above the midpoint of the selection, relative to the surface.
pub fn compute_position(selection_rect: Rect, surface_rect: Rect, offset: f64) -> ToolbarPosition {
    ToolbarPosition {
        top: selection_rect.top() - surface_rect.top() + offset,
        left: selection_rect.left() - surface_rect.left() + selection_rect.width / 2.0,
    }
}

/// What a host needs to draw the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ToolbarState {
    pub visible: bool,
    pub position: Option<ToolbarPosition>,
}

#[derive(Debug, Clone)]
pub struct FloatingToolbarPositioner {
    offset: f64,
    grace: Duration,
    state: ToolbarState,
    hide_at: Option<Instant>,
}

impl Default for FloatingToolbarPositioner {
    fn default() -> Self {
        Self::new(DEFAULT_TOOLBAR_OFFSET, DEFAULT_FOCUS_GRACE)
    }
}

impl FloatingToolbarPositioner {
    pub fn new(offset: f64, grace: Duration) -> Self {
        Self {
            offset,
            grace,
            state: ToolbarState::default(),
            hide_at: None,
        }
    }

    pub fn state(&self) -> ToolbarState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    pub fn position(&self) -> Option<ToolbarPosition> {
        self.state.position
    }

    /// Show the toolbar for `selection`.
    ///
    /// Only a ranged selection in a focused surface shows it; anything else
    /// hides it. Returns the resulting visibility.
    pub fn show(
        &mut self,
        selection: Selection,
        selection_rect: Rect,
        surface_rect: Rect,
        surface_focused: bool,
    ) -> bool {
        if selection.is_collapsed() || !surface_focused {
            self.hide();
            return false;
        }
        self.hide_at = None;
        self.state = ToolbarState {
            visible: true,
            position: Some(compute_position(selection_rect, surface_rect, self.offset)),
        };
        true
    }

    /// Hide now and forget the position.
    pub fn hide(&mut self) {
        self.state = ToolbarState::default();
        self.hide_at = None;
    }

    /// Start the grace period; the toolbar hides at `now + grace` unless
    /// focus comes back first.
    pub fn on_focus_lost(&mut self, now: Instant) {
        if self.state.visible && self.hide_at.is_none() {
            self.hide_at = Some(now + self.grace);
        }
    }

    pub fn on_focus_gained(&mut self) {
        self.hide_at = None;
    }

    /// Apply a due hide. Returns whether visibility changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.hide_at {
            Some(at) if at <= now => {
                tracing::trace!(target: "infinity::toolbar", "grace period over, hiding");
                self.hide();
                true
            }
            _ => false,
        }
    }

    /// When the pending hide fires, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.hide_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> Rect {
        Rect::new(100.0, 200.0, 800.0, 600.0)
    }

    #[test]
    fn test_compute_position() {
        let sel = Rect::new(148.0, 220.0, 40.0, 20.0);
        let pos = compute_position(sel, surface(), DEFAULT_TOOLBAR_OFFSET);
        assert_eq!(pos, ToolbarPosition { top: -20.0, left: 68.0 });
    }

    #[test]
    fn test_collapsed_selection_never_shows() {
        let mut toolbar = FloatingToolbarPositioner::default();
        let shown = toolbar.show(
            Selection::collapsed(3),
            Rect::new(124.0, 200.0, 0.0, 20.0),
            surface(),
            true,
        );
        assert!(!shown);
        assert!(!toolbar.is_visible());
        assert_eq!(toolbar.position(), None);
    }

    #[test]
    fn test_unfocused_surface_never_shows() {
        let mut toolbar = FloatingToolbarPositioner::default();
        assert!(!toolbar.show(
            Selection::new(0, 4),
            Rect::new(100.0, 200.0, 32.0, 20.0),
            surface(),
            false,
        ));
    }

    #[test]
    fn test_grace_period() {
        let mut toolbar = FloatingToolbarPositioner::default();
        let t0 = Instant::now();
        toolbar.show(
            Selection::new(0, 4),
            Rect::new(100.0, 200.0, 32.0, 20.0),
            surface(),
            true,
        );

        toolbar.on_focus_lost(t0);
        assert!(!toolbar.poll(t0 + Duration::from_millis(99)));
        assert!(toolbar.is_visible());
        assert!(toolbar.poll(t0 + Duration::from_millis(100)));
        assert!(!toolbar.is_visible());
    }

    #[test]
    fn test_focus_regained_cancels_hide() {
        let mut toolbar = FloatingToolbarPositioner::default();
        let t0 = Instant::now();
        toolbar.show(
            Selection::new(0, 4),
            Rect::new(100.0, 200.0, 32.0, 20.0),
            surface(),
            true,
        );

        toolbar.on_focus_lost(t0);
        toolbar.on_focus_gained();
        assert!(!toolbar.poll(t0 + Duration::from_secs(1)));
        assert!(toolbar.is_visible());
    }
}
