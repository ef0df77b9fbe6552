//! Content-change notifications with a debounced follow-up.
//!
//! Every mutation is reported to the sink right away. A second, debounced
//! report follows once the document has been quiet for a window, or once a
//! burst has been running for `max_wait`, whichever is first. Unmount reports
//! one last time.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use web_time::Instant;

/// Default debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Why the sink is being called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyReason {
    /// Synchronously after a mutation.
    Immediate,
    /// After the debounce window elapsed.
    Debounced,
    /// Final flush when the editor goes away.
    Unmount,
}

impl NotifyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Debounced => "debounced",
            Self::Unmount => "unmount",
        }
    }
}

/// Receiver for serialized content.
///
/// Any `FnMut(&str)` closure is a sink that ignores the reason.
pub trait ContentSink {
    fn content_changed(&mut self, content: &str, reason: NotifyReason);
}

impl<F: FnMut(&str)> ContentSink for F {
    fn content_changed(&mut self, content: &str, _reason: NotifyReason) {
        self(content)
    }
}

/// One recorded sink call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub content: String,
    pub reason: NotifyReason,
}

/// A sink that records every call. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct ChangeLog {
    entries: Rc<RefCell<Vec<Notification>>>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Number of calls made for `reason`.
    pub fn count(&self, reason: NotifyReason) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|n| n.reason == reason)
            .count()
    }

    /// Content of the calls made for `reason`, in order.
    pub fn contents(&self, reason: NotifyReason) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|n| n.reason == reason)
            .map(|n| n.content.clone())
            .collect()
    }

    pub fn last(&self) -> Option<Notification> {
        self.entries.borrow().last().cloned()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl ContentSink for ChangeLog {
    fn content_changed(&mut self, content: &str, reason: NotifyReason) {
        self.entries.borrow_mut().push(Notification {
            content: content.to_string(),
            reason,
        });
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingFlush {
    due: Instant,
    window_start: Instant,
}

/// Debounces content notifications to a sink.
///
/// Holds at most one pending flush; scheduling replaces it.
pub struct AutosaveScheduler<K> {
    sink: K,
    window: Duration,
    max_wait: Option<Duration>,
    latest: String,
    pending: Option<PendingFlush>,
    unmounted: bool,
}

impl<K: ContentSink> AutosaveScheduler<K> {
    /// `max_wait` bounds how long a continuous burst can postpone the
    /// debounced call. `None` is a pure trailing debounce.
    pub fn new(sink: K, window: Duration, max_wait: Option<Duration>, content: impl Into<String>) -> Self {
        Self {
            sink,
            window,
            max_wait,
            latest: content.into(),
            pending: None,
            unmounted: false,
        }
    }

    /// Last content seen.
    pub fn latest(&self) -> &str {
        &self.latest
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending flush fires, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.due)
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Report a mutation: notify now and (re)schedule the debounced call.
    pub fn record_change(&mut self, content: impl Into<String>, now: Instant) {
        if self.unmounted {
            return;
        }
        self.latest = content.into();
        self.sink
            .content_changed(&self.latest, NotifyReason::Immediate);

        let window_start = self.pending.map(|p| p.window_start).unwrap_or(now);
        let mut due = now + self.window;
        if let Some(max_wait) = self.max_wait {
            due = due.min(window_start + max_wait);
        }
        self.pending = Some(PendingFlush { due, window_start });
    }

    /// Fire the pending call if its deadline passed. Returns whether it fired.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(p) if p.due <= now => {
                self.pending = None;
                tracing::trace!(target: "infinity::autosave", "debounced flush");
                self.sink
                    .content_changed(&self.latest, NotifyReason::Debounced);
                true
            }
            _ => false,
        }
    }

    /// Adopt new base content without notifying; drops any pending call.
    pub fn reset(&mut self, content: impl Into<String>) {
        self.latest = content.into();
        self.pending = None;
    }

    /// Cancel the pending call and notify one last time.
    ///
    /// Only the first call does anything.
    pub fn flush_on_unmount(&mut self) -> bool {
        if self.unmounted {
            return false;
        }
        self.unmounted = true;
        if self.pending.take().is_some() {
            tracing::debug!(target: "infinity::autosave", "cancelled pending flush on unmount");
        }
        self.sink.content_changed(&self.latest, NotifyReason::Unmount);
        true
    }
}
