//! # Runtime events emitted by the widget engine.
//!
//! [`EventKind`] classifies events across four categories:
//! - **Render lifecycle**: registration, replacement, unregistration, render
//!   failures.
//! - **Health signals**: staleness flags, lost host surfaces.
//! - **Recovery**: scheduled/completed passes, per-widget outcomes.
//! - **Persistence & shutdown**: snapshot save/load/discard, engine teardown.
//!
//! The [`Event`] struct carries optional metadata (widget id, surface id,
//! reason, delays/ages in ms, counts).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore exact order when events are consumed
//! out of band.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Render lifecycle ===
    /// A widget instance was created and stored in the registry.
    ///
    /// Sets: `widget`, `surface`.
    WidgetRegistered,

    /// `register` found and disposed a live predecessor under the same id.
    ///
    /// Sets: `widget`.
    InstanceReplaced,

    /// A widget was explicitly unregistered (single or process-wide clear).
    ///
    /// Sets: `widget`.
    WidgetUnregistered,

    /// A render request failed (validation, missing surface, backend).
    ///
    /// Sets: `widget`, `reason`.
    RenderFailed,

    // === Health signals ===
    /// A widget has not been seen within the staleness window.
    ///
    /// Logging only; never mutates the record. Sets: `widget`, `stale_ms`.
    WidgetStale,

    /// A protected host surface was removed from the content tree.
    ///
    /// The record is flagged inactive. Sets: `widget`, `surface`.
    SurfaceLost,

    // === Recovery ===
    /// A debounced recovery execution was scheduled.
    ///
    /// Sets: `delay_ms` (the debounce window).
    RecoveryScheduled,

    /// An on-demand recovery execution began.
    ///
    /// Published for triggered passes only, not periodic ticks.
    /// Sets: `reason` (trigger label).
    RecoveryStarted,

    /// A widget instance was rebuilt from its stored configuration.
    ///
    /// Sets: `widget`, `surface`.
    WidgetRecovered,

    /// Recovery of a single widget failed; iteration continues.
    ///
    /// Sets: `widget`, `reason`.
    RecoveryFailed,

    /// A recovery pass finished with at least one rebuild or failure.
    ///
    /// Sets: `count` (widgets rebuilt).
    RecoveryCompleted,

    // === Persistence & shutdown ===
    /// Registry records were serialized to the durable store.
    ///
    /// Sets: `count`.
    SnapshotSaved,

    /// A durable snapshot was restored into the registry.
    ///
    /// Sets: `count`.
    SnapshotLoaded,

    /// A durable snapshot was rejected (expired or corrupt).
    ///
    /// Sets: `reason`.
    SnapshotDiscarded,

    /// The engine is shutting down; loops are being cancelled.
    EngineShutdown,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Widget id, if applicable.
    pub widget: Option<Arc<str>>,
    /// Host surface id, if applicable.
    pub surface: Option<Arc<str>>,
    /// Human-readable reason (errors, discard causes, etc.).
    pub reason: Option<Arc<str>>,
    /// Scheduling delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Staleness age in milliseconds (compact).
    pub stale_ms: Option<u32>,
    /// Item count (snapshot records, recovered widgets).
    pub count: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// the next global sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            widget: None,
            surface: None,
            reason: None,
            delay_ms: None,
            stale_ms: None,
            count: None,
        }
    }

    /// Attaches a widget id.
    #[inline]
    pub fn with_widget(mut self, widget: impl Into<Arc<str>>) -> Self {
        self.widget = Some(widget.into());
        self
    }

    /// Attaches a host surface id.
    #[inline]
    pub fn with_surface(mut self, surface: impl Into<Arc<str>>) -> Self {
        self.surface = Some(surface.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a scheduling delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u32::MAX)) as u32);
        self
    }

    /// Attaches a staleness age (stored as milliseconds).
    #[inline]
    pub fn with_stale_age(mut self, ms: u64) -> Self {
        self.stale_ms = Some(ms.min(u64::from(u32::MAX)) as u32);
        self
    }

    /// Attaches an item count.
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(n.min(u32::MAX as usize) as u32);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::WidgetRegistered);
        let b = Event::new(EventKind::WidgetRegistered);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_set_fields() {
        let ev = Event::new(EventKind::RecoveryFailed)
            .with_widget("c1")
            .with_surface("msg-4")
            .with_reason("backend unavailable")
            .with_count(3);
        assert_eq!(ev.widget.as_deref(), Some("c1"));
        assert_eq!(ev.surface.as_deref(), Some("msg-4"));
        assert_eq!(ev.reason.as_deref(), Some("backend unavailable"));
        assert_eq!(ev.count, Some(3));
    }
}
