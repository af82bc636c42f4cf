//! # Tree mutation observer and recovery debouncer.
//!
//! The observer consumes host-pushed [`TreeMutation`] batches:
//! - **Removals** of a surface carrying a protection marker flag the owning
//!   record inactive, publish `SurfaceLost`, and kick the debouncer.
//! - **Additions** are bookkeeping only; the next recovery pass picks up
//!   re-mounted surfaces on its own.
//!
//! The debouncer enforces a minimum spacing between mutation-triggered
//! recovery executions: a kick inside the window pushes the pending
//! execution out rather than running twice.
//!
//! ```text
//! host ──batches──► Observer ──kick──► Debouncer ──(window elapsed)──► trigger
//!                                          ▲  │
//!                                          └──┘ new kick: deadline pushed out
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, mpsc};
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::recovery::RecoveryTrigger;
use crate::core::registry::WidgetRegistry;
use crate::events::{Bus, Event, EventKind};
use crate::host::TreeMutation;

/// Pushes mutation-triggered recovery executions apart by a fixed window.
pub(crate) struct Debouncer {
    notify: Notify,
    window: Duration,
}

impl Debouncer {
    pub(crate) fn new(window: Duration) -> Arc<Self> {
        Arc::new(Self { notify: Notify::new(), window })
    }

    /// Requests a recovery execution; coalesces with pending requests.
    pub(crate) fn kick(&self) {
        self.notify.notify_one();
    }

    /// Spawns the debounce task; it emits one [`RecoveryTrigger::Mutation`]
    /// per quiet window.
    pub(crate) fn spawn(
        self: Arc<Self>,
        tx: mpsc::UnboundedSender<RecoveryTrigger>,
        bus: Bus,
        token: CancellationToken,
    ) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = self.notify.notified() => {}
                }

                bus.publish(Event::new(EventKind::RecoveryScheduled).with_delay(self.window));
                let mut deadline = Instant::now() + self.window;
                loop {
                    tokio::select! {
                        _ = token.cancelled() => return,
                        _ = time::sleep_until(deadline) => break,
                        _ = self.notify.notified() => {
                            deadline = Instant::now() + self.window;
                        }
                    }
                }

                if tx.send(RecoveryTrigger::Mutation).is_err() {
                    break;
                }
            }
        });
    }
}

/// Applies structural tree changes to registry health flags.
pub(crate) struct MutationObserver {
    registry: Arc<WidgetRegistry>,
    bus: Bus,
    debounce: Arc<Debouncer>,
}

impl MutationObserver {
    pub(crate) fn new(registry: Arc<WidgetRegistry>, bus: Bus, debounce: Arc<Debouncer>) -> Self {
        Self { registry, bus, debounce }
    }

    /// Spawns the intake loop; exits on cancellation or when the host drops
    /// its sender (the periodic loops then carry recovery alone).
    pub(crate) fn spawn(self, mut rx: mpsc::UnboundedReceiver<TreeMutation>, token: CancellationToken) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    batch = rx.recv() => match batch {
                        Some(batch) => self.apply(batch).await,
                        None => break,
                    },
                }
            }
        });
    }

    async fn apply(&self, batch: TreeMutation) {
        for surface_id in &batch.added {
            tracing::trace!(surface = %surface_id, "surface added");
        }

        for removed in batch.removed {
            let Some(marker) = removed.marker else { continue };
            if self.registry.mark_inactive(&marker.widget_id).await {
                tracing::debug!(widget = %marker.widget_id, surface = %removed.surface_id, "protected surface removed");
                self.bus.publish(
                    Event::new(EventKind::SurfaceLost)
                        .with_widget(marker.widget_id.clone())
                        .with_surface(removed.surface_id.clone()),
                );
                self.debounce.kick();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::harness::{MockBackend, harness_adapters, sample_record};
    use crate::host::RemovedSurface;

    #[tokio::test]
    async fn removal_of_protected_surface_flags_inactive() {
        let backend = Arc::new(MockBackend::new());
        let bus = Bus::new(16);
        let registry = WidgetRegistry::new(harness_adapters(backend), bus.clone());
        let record = sample_record("c1", "s1");
        let marker = record.marker();
        registry.restore(vec![("c1".into(), record)]).await;

        let observer = MutationObserver::new(registry.clone(), bus.clone(), Debouncer::new(Duration::from_secs(2)));
        let mut rx = bus.subscribe();

        observer
            .apply(TreeMutation {
                added: vec![],
                removed: vec![RemovedSurface { surface_id: "s1".into(), marker: Some(marker) }],
            })
            .await;

        assert!(!registry.get_record("c1").await.unwrap().is_active);
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::SurfaceLost);
    }

    #[tokio::test]
    async fn unmarked_removal_is_ignored() {
        let backend = Arc::new(MockBackend::new());
        let bus = Bus::new(16);
        let registry = WidgetRegistry::new(harness_adapters(backend), bus.clone());
        registry.restore(vec![("c1".into(), sample_record("c1", "s1"))]).await;

        let observer = MutationObserver::new(registry.clone(), bus.clone(), Debouncer::new(Duration::from_secs(2)));
        observer
            .apply(TreeMutation {
                added: vec!["s9".into()],
                removed: vec![RemovedSurface { surface_id: "s1".into(), marker: None }],
            })
            .await;

        assert!(registry.get_record("c1").await.unwrap().is_active);
    }
}
