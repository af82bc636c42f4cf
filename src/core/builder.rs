//! # Engine builder: wires components and spawns the loops.
//!
//! Construction order matters: bus first (everything publishes), then the
//! registry (everything else reads it), warm-start restore, then the three
//! loops under child tokens of one runtime [`CancellationToken`] so that a
//! single `cleanup()` tears everything down.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::core::coordinator::Coordinator;
use crate::core::engine::WidgetEngine;
use crate::core::monitor::HealthMonitor;
use crate::core::observer::{Debouncer, MutationObserver};
use crate::core::recovery::{RecoveryEngine, RecoveryTrigger};
use crate::core::registry::WidgetRegistry;
use crate::core::snapshot;
use crate::events::{Bus, Event, EventKind};
use crate::host::{AdapterSet, SnapshotStore, SurfaceTree, TreeMutation, WakeSignal};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`WidgetEngine`] with optional collaborators.
pub struct EngineBuilder {
    cfg: EngineConfig,
    adapters: AdapterSet,
    tree: Arc<dyn SurfaceTree>,
    store: Option<Arc<dyn SnapshotStore>>,
    mutations: Option<mpsc::UnboundedReceiver<TreeMutation>>,
    wake: Option<mpsc::UnboundedReceiver<WakeSignal>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl EngineBuilder {
    /// Creates a builder from the required collaborators.
    pub fn new(cfg: EngineConfig, adapters: AdapterSet, tree: Arc<dyn SurfaceTree>) -> Self {
        Self {
            cfg,
            adapters,
            tree,
            store: None,
            mutations: None,
            wake: None,
            subscribers: Vec::new(),
        }
    }

    /// Attaches a durable store; enables warm-start restore and snapshots.
    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Attaches the host's structural tree-change stream.
    ///
    /// Without it the engine is polling-only: the health and recovery timers
    /// keep correctness, event-driven immediacy is lost.
    pub fn with_mutations(mut self, rx: mpsc::UnboundedReceiver<TreeMutation>) -> Self {
        self.mutations = Some(rx);
        self
    }

    /// Attaches the host's visibility/focus wake stream.
    pub fn with_wake_signals(mut self, rx: mpsc::UnboundedReceiver<WakeSignal>) -> Self {
        self.wake = Some(rx);
        self
    }

    /// Sets event subscribers for observability.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the engine: restores the snapshot and spawns all loops.
    pub async fn build(self) -> Arc<WidgetEngine> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime_token = CancellationToken::new();
        let registry = WidgetRegistry::new(self.adapters.clone(), bus.clone());

        let subs = if self.subscribers.is_empty() {
            None
        } else {
            let set = Arc::new(SubscriberSet::new(self.subscribers));
            spawn_subscriber_listener(&bus, &set, runtime_token.child_token());
            Some(set)
        };

        if let Some(store) = &self.store {
            let records = snapshot::load(
                store.as_ref(),
                &self.cfg.snapshot_key,
                self.cfg.snapshot_ttl_ms(),
                &bus,
            );
            if !records.is_empty() {
                let restored = registry.restore(records).await;
                tracing::info!(records = restored, "snapshot restored");
                bus.publish(Event::new(EventKind::SnapshotLoaded).with_count(restored));
            }
        }

        let coordinator = Arc::new(Coordinator::new(
            registry.clone(),
            self.tree.clone(),
            self.adapters.clone(),
            bus.clone(),
            self.cfg.render_defer,
        ));

        let recovery = RecoveryEngine::new(
            registry.clone(),
            self.tree.clone(),
            self.adapters.clone(),
            coordinator.clone(),
            bus.clone(),
            self.cfg.recovery_interval,
        );

        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel::<RecoveryTrigger>();
        recovery.spawn(trigger_rx, runtime_token.child_token());

        HealthMonitor::new(registry.clone(), self.tree.clone(), bus.clone(), &self.cfg)
            .spawn(runtime_token.child_token());

        if let Some(rx) = self.mutations {
            let debouncer = Debouncer::new(self.cfg.debounce_window);
            debouncer
                .clone()
                .spawn(trigger_tx.clone(), bus.clone(), runtime_token.child_token());
            MutationObserver::new(registry.clone(), bus.clone(), debouncer)
                .spawn(rx, runtime_token.child_token());
        }

        if let Some(mut rx) = self.wake {
            let tx = trigger_tx.clone();
            let token = runtime_token.child_token();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        signal = rx.recv() => match signal {
                            Some(signal) => {
                                let _ = tx.send(RecoveryTrigger::Wake(signal));
                            }
                            None => break,
                        },
                    }
                }
            });
        }

        Arc::new(WidgetEngine::new_internal(
            self.cfg,
            bus,
            registry,
            coordinator,
            recovery,
            self.store,
            subs,
            trigger_tx,
            runtime_token,
        ))
    }
}

/// Subscribes to the bus and forwards events to the subscriber set
/// (fire-and-forget).
fn spawn_subscriber_listener(bus: &Bus, set: &Arc<SubscriberSet>, token: CancellationToken) {
    let mut rx = bus.subscribe();
    let set = Arc::clone(set);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged");
                        continue;
                    }
                },
            }
        }
    });
}
