//! Platform abstraction traits for editor operations.
//!
//! These traits define the interface between the editor logic and the host
//! that actually shows the document (browser DOM, native UI, a test double).
//! The editor never touches a view directly: it reads the live selection and
//! element geometry, pushes rendered markup and reads back native edits
//! through [`EditorSurface`], and reads time through [`Clock`].

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

use crate::error::PlatformError;
use crate::types::{Rect, Selection};

/// Handle for a selection-change listener registered with a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// The host view an editor is mounted on.
///
/// Selections are expressed in char offsets of the document model; the
/// implementation maps them to whatever its view uses.
pub trait EditorSurface {
    /// Whether the view is still attached.
    fn is_mounted(&self) -> bool;

    /// Whether the view (or something inside it) holds input focus.
    fn has_focus(&self) -> bool;

    /// Read the live selection.
    ///
    /// Returns `None` when there is no selection, or when it lies outside
    /// this surface.
    fn read_selection(&self) -> Result<Option<Selection>, PlatformError>;

    /// Replace the live selection.
    fn write_selection(&mut self, selection: Selection) -> Result<(), PlatformError>;

    /// Bounding rectangle of a selection, in viewport coordinates.
    fn selection_rect(&self, selection: Selection) -> Result<Rect, PlatformError>;

    /// Bounding rectangle of the surface itself, in viewport coordinates.
    fn surface_rect(&self) -> Result<Rect, PlatformError>;

    /// Replace the view's content with serialized markup.
    fn render(&mut self, markup: &str) -> Result<(), PlatformError>;

    /// Read the view's current markup, including edits the platform made
    /// natively (cut, paste).
    fn read_content(&self) -> Result<String, PlatformError>;

    /// Register a selection-change listener.
    fn subscribe_selection_changes(&mut self) -> SubscriptionId;

    /// Remove a listener. Unknown ids are ignored.
    fn unsubscribe(&mut self, id: SubscriptionId);
}

/// Source of the current time for timers.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the editor.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Jump to `at`. Never moves backwards.
    pub fn advance_to(&self, at: Instant) {
        if at > self.now.get() {
            self.now.set(at);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        let start = clock.now();

        handle.advance_ms(250);
        assert_eq!(clock.now() - start, Duration::from_millis(250));
    }

    #[test]
    fn test_platform_error_from_str() {
        let err: PlatformError = "detached node".into();
        assert_eq!(err.to_string(), "detached node");
    }
}
