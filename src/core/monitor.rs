//! # Health monitor: periodic liveness sweep.
//!
//! Every `health_interval` the monitor walks the registry: widgets whose
//! surface is present and still protected get `touch`ed; widgets unseen for
//! longer than `stale_after` are flagged stale.
//!
//! ## Rules
//! - Staleness is reported (event + log) but never mutates the record —
//!   only the mutation observer and the recovery engine change `is_active`,
//!   and nothing here deletes anything.
//! - Per-widget isolation: the sweep continues over the remaining widgets
//!   regardless of what it finds.

use std::sync::Arc;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::core::registry::WidgetRegistry;
use crate::events::{Bus, Event, EventKind};
use crate::host::SurfaceTree;
use crate::widgets::now_ms;

/// Periodic liveness sweep over all registered widgets.
pub(crate) struct HealthMonitor {
    registry: Arc<WidgetRegistry>,
    tree: Arc<dyn SurfaceTree>,
    bus: Bus,
    interval: std::time::Duration,
    stale_after_ms: u64,
}

impl HealthMonitor {
    pub(crate) fn new(
        registry: Arc<WidgetRegistry>,
        tree: Arc<dyn SurfaceTree>,
        bus: Bus,
        cfg: &EngineConfig,
    ) -> Self {
        Self {
            registry,
            tree,
            bus,
            interval: cfg.health_interval,
            stale_after_ms: cfg.stale_after_ms(),
        }
    }

    /// Spawns the sweep loop; exits when `token` is cancelled.
    pub(crate) fn spawn(self, token: CancellationToken) {
        tokio::spawn(async move {
            let mut ticker = time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => self.sweep().await,
                }
            }
        });
    }

    /// One sweep over all records.
    pub(crate) async fn sweep(&self) {
        for record in self.registry.records().await {
            let protected = self
                .tree
                .get(&record.host_surface_id)
                .and_then(|surface| self.tree.marker(&surface))
                .is_some_and(|marker| marker.covers(&record.id));

            if protected {
                self.registry.touch(&record.id).await;
                continue;
            }

            let age_ms = now_ms().saturating_sub(record.last_seen_at);
            if age_ms > self.stale_after_ms {
                tracing::debug!(widget = %record.id, age_ms, "widget stale");
                self.bus.publish(
                    Event::new(EventKind::WidgetStale)
                        .with_widget(record.id.as_str())
                        .with_stale_age(age_ms),
                );
            }
        }
    }
}
