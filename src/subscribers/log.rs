//! # Structured-log subscriber.
//!
//! [`LogWriter`] translates engine events into `tracing` records. Attach it
//! through [`EngineBuilder::with_subscribers`](crate::EngineBuilder::with_subscribers)
//! to get a readable lifecycle trace:
//!
//! ```text
//! INFO widget registered widget=c1 surface=msg-17
//! WARN widget recovery failed widget=c1 reason="backend unavailable: not mounted"
//! INFO snapshot restored records=2
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Built-in subscriber emitting one `tracing` record per event.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, event: &Event) {
        let widget = event.widget.as_deref().unwrap_or("-");
        match event.kind {
            EventKind::WidgetRegistered => {
                tracing::info!(widget, surface = event.surface.as_deref().unwrap_or("-"), "widget registered");
            }
            EventKind::InstanceReplaced => {
                tracing::debug!(widget, "live instance replaced");
            }
            EventKind::WidgetUnregistered => {
                tracing::info!(widget, "widget unregistered");
            }
            EventKind::RenderFailed => {
                tracing::warn!(widget, reason = event.reason.as_deref().unwrap_or("-"), "render failed");
            }
            EventKind::WidgetStale => {
                tracing::warn!(widget, stale_ms = event.stale_ms.unwrap_or(0), "widget stale");
            }
            EventKind::SurfaceLost => {
                tracing::warn!(widget, surface = event.surface.as_deref().unwrap_or("-"), "host surface lost");
            }
            EventKind::RecoveryScheduled => {
                tracing::debug!(delay_ms = event.delay_ms.unwrap_or(0), "recovery scheduled");
            }
            EventKind::RecoveryStarted => {
                tracing::debug!(trigger = event.reason.as_deref().unwrap_or("-"), "recovery started");
            }
            EventKind::WidgetRecovered => {
                tracing::info!(widget, surface = event.surface.as_deref().unwrap_or("-"), "widget recovered");
            }
            EventKind::RecoveryFailed => {
                tracing::warn!(widget, reason = event.reason.as_deref().unwrap_or("-"), "widget recovery failed");
            }
            EventKind::RecoveryCompleted => {
                tracing::info!(recovered = event.count.unwrap_or(0), "recovery pass completed");
            }
            EventKind::SnapshotSaved => {
                tracing::info!(records = event.count.unwrap_or(0), "snapshot saved");
            }
            EventKind::SnapshotLoaded => {
                tracing::info!(records = event.count.unwrap_or(0), "snapshot restored");
            }
            EventKind::SnapshotDiscarded => {
                tracing::warn!(reason = event.reason.as_deref().unwrap_or("-"), "snapshot discarded");
            }
            EventKind::EngineShutdown => {
                tracing::info!("engine shutdown");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
