//! # Global engine configuration.
//!
//! [`EngineConfig`] centralizes the timing knobs of the runtime: loop
//! cadences, the render deferral, staleness and snapshot windows.
//!
//! ## Field semantics
//! - `render_defer`: settle window before the coordinator's race-closing
//!   re-check (`0` = re-check immediately)
//! - `health_interval` / `recovery_interval`: cadence of the periodic loops
//! - `debounce_window`: minimum spacing between mutation-triggered recovery
//!   executions
//! - `stale_after`: age after which an unseen widget is flagged stale
//!   (logging only — staleness never deletes a record)
//! - `snapshot_ttl`: snapshots older than this are discarded on load
//! - `bus_capacity`: event bus ring buffer size (min 1; clamped)

use std::borrow::Cow;
use std::time::Duration;

/// Global configuration for the widget engine runtime.
///
/// All fields are public for flexibility. Prefer the helper accessors over
/// sprinkling clamping logic across the codebase.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Settle window the render coordinator waits before its second
    /// existence check.
    ///
    /// Lets the host surface settle after whatever tree mutation triggered
    /// the render call. In-flight deferred renders become no-ops through the
    /// re-check, so a larger value only delays first paint.
    pub render_defer: Duration,

    /// Cadence of the health monitor sweep.
    ///
    /// Each sweep touches every widget whose surface is present and still
    /// carries its protection marker.
    pub health_interval: Duration,

    /// Cadence of the periodic recovery pass.
    ///
    /// On-demand triggers (mutation debounce, visibility/focus, explicit
    /// calls) run the same pass between ticks.
    pub recovery_interval: Duration,

    /// Minimum spacing between mutation-triggered recovery executions.
    ///
    /// A flag arriving inside the window pushes the pending execution out
    /// rather than running twice.
    pub debounce_window: Duration,

    /// Age of `last_seen_at` after which a widget is flagged stale.
    ///
    /// Staleness is reported (event + log) but never mutates `is_active`;
    /// only the mutation observer and the recovery engine do that.
    pub stale_after: Duration,

    /// Maximum age of a durable snapshot accepted on startup.
    pub snapshot_ttl: Duration,

    /// Key under which the snapshot is stored in the durable store.
    pub snapshot_key: Cow<'static, str>,

    /// Capacity of the event bus broadcast ring buffer.
    ///
    /// Slow subscribers lagging by more than `bus_capacity` events observe
    /// `Lagged` and skip the oldest items. Minimum value is 1 (clamped).
    pub bus_capacity: usize,
}

impl EngineConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns `stale_after` in whole milliseconds.
    #[inline]
    pub fn stale_after_ms(&self) -> u64 {
        self.stale_after.as_millis().min(u128::from(u64::MAX)) as u64
    }

    /// Returns `snapshot_ttl` in whole milliseconds.
    #[inline]
    pub fn snapshot_ttl_ms(&self) -> u64 {
        self.snapshot_ttl.as_millis().min(u128::from(u64::MAX)) as u64
    }
}

impl Default for EngineConfig {
    /// Default configuration:
    ///
    /// - `render_defer = 100ms` (short settle before the re-check)
    /// - `health_interval = 2s`
    /// - `recovery_interval = 3s`
    /// - `debounce_window = 2s`
    /// - `stale_after = 30s`
    /// - `snapshot_ttl = 24h`
    /// - `snapshot_key = "widgetvisor.snapshot"`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            render_defer: Duration::from_millis(100),
            health_interval: Duration::from_secs(2),
            recovery_interval: Duration::from_secs(3),
            debounce_window: Duration::from_secs(2),
            stale_after: Duration::from_secs(30),
            snapshot_ttl: Duration::from_secs(24 * 60 * 60),
            snapshot_key: Cow::Borrowed("widgetvisor.snapshot"),
            bus_capacity: 1024,
        }
    }
}
