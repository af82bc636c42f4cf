//! # WidgetEngine: the injectable engine facade.
//!
//! One engine instance per process owns the registry, the render
//! coordinator, and the three loops (health, recovery, debounce). It is an
//! explicit service passed by reference to all consumers — "one instance
//! per process" without a hidden language-level global.
//!
//! ## High-level architecture
//! ```text
//! caller ──► render_widget() ──► Coordinator ──► AdapterSet.create()
//!                                    │                  │
//!                                    ▼                  ▼
//!                              WidgetRegistry ◄── register(record, instance)
//!                                    ▲
//!          ┌─────────────────────────┼──────────────────────────┐
//!          │                         │                          │
//!   HealthMonitor             MutationObserver           RecoveryEngine
//!   (touch / stale,           (mark_inactive,            (periodic + triggered
//!    every 2s)                 kick debouncer)            rebuild, every 3s)
//!          │                         │                          ▲
//!          │                    Debouncer ──RecoveryTrigger─────┤
//!          │                                                    │
//!   wake signals (visibility/focus) ────────────────────────────┘
//!
//! events: every component ──► Bus ──► subscriber listener ──► SubscriberSet
//! snapshot: registry records ◄──► SnapshotStore (TTL-guarded warm start)
//! ```
//!
//! ## Lifecycle
//! [`WidgetEngine::builder`] → `build().await` (restores the snapshot,
//! spawns loops) → operations → [`WidgetEngine::cleanup`] (best-effort
//! snapshot save, cancels every loop; in-flight deferred renders become
//! no-ops through the coordinator's idempotent re-check).

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::core::builder::EngineBuilder;
use crate::core::coordinator::{Coordinator, RenderOutcome};
use crate::core::recovery::{PassScope, RecoveryEngine, RecoveryReport, RecoveryTrigger};
use crate::core::registry::{RegistryStatus, WidgetRegistry};
use crate::core::snapshot;
use crate::error::{EngineError, RenderError};
use crate::events::{Bus, Event, EventKind};
use crate::host::{AdapterSet, SnapshotStore, SurfaceTree};
use crate::subscribers::SubscriberSet;
use crate::widgets::{WidgetSpec, WidgetStatus};

/// Process-wide widget persistence and recovery engine.
///
/// See the [module documentation](self) for the component wiring.
pub struct WidgetEngine {
    cfg: EngineConfig,
    bus: Bus,
    registry: Arc<WidgetRegistry>,
    coordinator: Arc<Coordinator>,
    recovery: Arc<RecoveryEngine>,
    store: Option<Arc<dyn SnapshotStore>>,
    /// Keeps subscriber workers owned for the engine's lifetime.
    _subs: Option<Arc<SubscriberSet>>,
    /// Keeps the trigger channel open even when no observer/wake stream is
    /// attached, so the recovery loop never sees a closed channel.
    _trigger_tx: mpsc::UnboundedSender<RecoveryTrigger>,
    runtime_token: CancellationToken,
}

impl WidgetEngine {
    /// Starts building an engine from the required collaborators.
    pub fn builder(cfg: EngineConfig, adapters: AdapterSet, tree: Arc<dyn SurfaceTree>) -> EngineBuilder {
        EngineBuilder::new(cfg, adapters, tree)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_internal(
        cfg: EngineConfig,
        bus: Bus,
        registry: Arc<WidgetRegistry>,
        coordinator: Arc<Coordinator>,
        recovery: Arc<RecoveryEngine>,
        store: Option<Arc<dyn SnapshotStore>>,
        subs: Option<Arc<SubscriberSet>>,
        trigger_tx: mpsc::UnboundedSender<RecoveryTrigger>,
        runtime_token: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            bus,
            registry,
            coordinator,
            recovery,
            store,
            _subs: subs,
            _trigger_tx: trigger_tx,
            runtime_token,
        }
    }

    /// Renders one widget request.
    ///
    /// Idempotent for repeated calls with an unchanged
    /// `(id, surface, config)`; never leaves two live instances per id.
    /// Failures are returned, never panicked.
    pub async fn render_widget(&self, spec: &WidgetSpec) -> Result<RenderOutcome, RenderError> {
        self.coordinator.render(spec).await
    }

    /// True if a record exists for `id`.
    pub async fn is_registered(&self, id: &str) -> bool {
        self.registry.is_registered(id).await
    }

    /// Destroys one widget: live instance and record.
    ///
    /// Returns `false` when the id was not registered.
    pub async fn destroy_widget(&self, id: &str) -> bool {
        self.registry.unregister(id).await
    }

    /// Destroys every widget (process-wide clear). Returns the count.
    pub async fn destroy_all(&self) -> usize {
        self.registry.clear_all().await
    }

    /// Runs one conditional recovery pass over all records, immediately.
    ///
    /// This is the same pass the periodic timer runs.
    pub async fn run_recovery_pass(&self) -> RecoveryReport {
        self.recovery.run_pass(PassScope::All).await
    }

    /// Unconditionally rebuilds every registered widget.
    pub async fn force_recover_all(&self) -> RecoveryReport {
        self.recovery.run_pass(PassScope::Forced).await
    }

    /// Runs an immediate conditional pass limited to records flagged active.
    pub async fn recover_active(&self) -> RecoveryReport {
        self.recovery.run_pass(PassScope::ActiveOnly).await
    }

    /// Diagnostic counts and registered ids.
    pub async fn status(&self) -> RegistryStatus {
        self.registry.status().await
    }

    /// Diagnostic per-widget view, sorted by id.
    pub async fn registered_widgets(&self) -> Vec<WidgetStatus> {
        self.registry.statuses().await
    }

    /// Serializes all records to the durable store.
    pub async fn save_snapshot(&self) -> Result<usize, EngineError> {
        let Some(store) = &self.store else {
            return Err(EngineError::StoreUnavailable);
        };
        snapshot::save(store.as_ref(), &self.cfg.snapshot_key, &self.registry, &self.bus).await
    }

    /// Subscribes directly to the engine's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Tears the engine down: best-effort snapshot save, then cancels every
    /// loop and the observer.
    ///
    /// Live instances are **not** destroyed — use
    /// [`destroy_all`](Self::destroy_all) for that. In-flight deferred
    /// renders become no-ops through the coordinator's re-check.
    pub async fn cleanup(&self) {
        if self.store.is_some()
            && let Err(err) = self.save_snapshot().await
        {
            tracing::warn!(error = %err, "snapshot save failed during cleanup");
        }
        self.bus.publish(Event::new(EventKind::EngineShutdown));
        self.runtime_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::harness::{MemoryStore, MockBackend, MockTree, harness_adapters, sample_spec};
    use crate::core::snapshot::Snapshot;
    use crate::host::{RemovedSurface, TreeMutation, WakeSignal};
    use crate::widgets::now_ms;
    use std::time::Duration;

    struct Rig {
        engine: Arc<WidgetEngine>,
        tree: Arc<MockTree>,
        backend: Arc<MockBackend>,
        store: Arc<MemoryStore>,
        mutations: mpsc::UnboundedSender<TreeMutation>,
        wake: mpsc::UnboundedSender<WakeSignal>,
    }

    async fn rig_with_store(cfg: EngineConfig, store: Arc<MemoryStore>) -> Rig {
        let backend = Arc::new(MockBackend::new());
        let tree = MockTree::new();
        let (mutation_tx, mutation_rx) = mpsc::unbounded_channel();
        let (wake_tx, wake_rx) = mpsc::unbounded_channel();

        let engine = WidgetEngine::builder(cfg, harness_adapters(backend.clone()), tree.clone())
            .with_store(store.clone())
            .with_mutations(mutation_rx)
            .with_wake_signals(wake_rx)
            .build()
            .await;

        Rig { engine, tree, backend, store, mutations: mutation_tx, wake: wake_tx }
    }

    async fn rig(cfg: EngineConfig) -> Rig {
        rig_with_store(cfg, Arc::new(MemoryStore::new())).await
    }

    /// Long periodic intervals so tests drive recovery explicitly.
    fn quiet_cfg() -> EngineConfig {
        let mut cfg = EngineConfig::default();
        cfg.health_interval = Duration::from_secs(600);
        cfg.recovery_interval = Duration::from_secs(600);
        cfg
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn render_creates_and_registers() {
        let rig = rig(quiet_cfg()).await;
        rig.tree.add_surface("s1");

        let outcome = rig.engine.render_widget(&sample_spec("c1", "s1")).await.unwrap();

        assert_eq!(outcome, RenderOutcome::Created);
        assert!(rig.engine.is_registered("c1").await);
        assert_eq!(rig.backend.live_count(), 1);

        let widgets = rig.engine.registered_widgets().await;
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0].id, "c1");
        assert!(widgets[0].is_active);
        assert!(widgets[0].live);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_render_is_idempotent() {
        let rig = rig(quiet_cfg()).await;
        rig.tree.add_surface("s1");
        let spec = sample_spec("c1", "s1");

        assert_eq!(rig.engine.render_widget(&spec).await.unwrap(), RenderOutcome::Created);
        assert_eq!(rig.engine.render_widget(&spec).await.unwrap(), RenderOutcome::AlreadyLive);
        assert_eq!(rig.backend.created_count(), 1);
        assert_eq!(rig.backend.live_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_renders_leave_single_instance() {
        let rig = rig(quiet_cfg()).await;
        rig.tree.add_surface("s2");
        let spec = sample_spec("c2", "s2");

        let (a, b) = tokio::join!(rig.engine.render_widget(&spec), rig.engine.render_widget(&spec));

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(rig.backend.live_count(), 1);
        assert!(rig.engine.is_registered("c2").await);
    }

    #[tokio::test(start_paused = true)]
    async fn unsupported_kind_never_touches_registry() {
        let rig = rig(quiet_cfg()).await;
        rig.tree.add_surface("s1");
        let mut spec = sample_spec("c1", "s1");
        spec.kind = "heatmap".into();

        let err = rig.engine.render_widget(&spec).await.unwrap_err();

        assert_eq!(err.as_label(), "unsupported_type");
        assert_eq!(rig.engine.status().await.total, 0);
        assert_eq!(rig.backend.created_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_surface_is_retryable_host_not_found() {
        let rig = rig(quiet_cfg()).await;

        let err = rig.engine.render_widget(&sample_spec("c1", "nowhere")).await.unwrap_err();

        assert_eq!(err.as_label(), "host_not_found");
        assert!(err.is_retryable());
        assert_eq!(rig.engine.status().await.total, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn removed_surface_is_recovered_by_next_cycle() {
        let mut cfg = quiet_cfg();
        cfg.recovery_interval = Duration::from_secs(3);
        let rig = rig(cfg).await;
        rig.tree.add_surface("s1");
        rig.engine.render_widget(&sample_spec("c1", "s1")).await.unwrap();

        // Host tears the node down; the observer flags the record inactive.
        let marker = rig.tree.remove_surface("s1").expect("marker present");
        rig.mutations
            .send(TreeMutation {
                added: vec![],
                removed: vec![RemovedSurface { surface_id: "s1".into(), marker: Some(marker) }],
            })
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!rig.engine.registered_widgets().await[0].is_active);

        // The tree re-renders a node carrying the same surface id; the next
        // recovery cycle rebinds the widget to it.
        rig.tree.add_surface("s1");
        tokio::time::sleep(Duration::from_secs(4)).await;

        let widgets = rig.engine.registered_widgets().await;
        assert_eq!(widgets.len(), 1);
        assert!(widgets[0].is_active);
        assert!(widgets[0].live);
        assert_eq!(rig.backend.live_count(), 1);
        assert_eq!(rig.backend.created_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn recovery_of_healthy_widget_is_noop() {
        let rig = rig(quiet_cfg()).await;
        rig.tree.add_surface("s1");
        rig.engine.render_widget(&sample_spec("c1", "s1")).await.unwrap();
        let (handle, _) = rig.engine.registry.binding("c1").await.unwrap();

        let first = rig.engine.run_recovery_pass().await;
        let second = rig.engine.run_recovery_pass().await;

        assert_eq!(first.healthy, 1);
        assert_eq!(second.healthy, 1);
        assert_eq!(first.recovered + second.recovered, 0);
        assert_eq!(rig.engine.registry.binding("c1").await.unwrap().0, handle);
        assert_eq!(rig.backend.created_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn force_recover_all_rebuilds_every_instance() {
        let rig = rig(quiet_cfg()).await;
        rig.tree.add_surface("s1");
        rig.engine.render_widget(&sample_spec("c1", "s1")).await.unwrap();
        let (old_handle, _) = rig.engine.registry.binding("c1").await.unwrap();

        let report = rig.engine.force_recover_all().await;

        assert_eq!(report.recovered, 1);
        assert_ne!(rig.engine.registry.binding("c1").await.unwrap().0, old_handle);
        assert_eq!(rig.backend.live_count(), 1);
        assert_eq!(rig.backend.created_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn recover_active_skips_inactive_records() {
        let rig = rig(quiet_cfg()).await;
        rig.tree.add_surface("s1");
        rig.tree.add_surface("s2");
        rig.engine.render_widget(&sample_spec("c1", "s1")).await.unwrap();
        rig.engine.render_widget(&sample_spec("c2", "s2")).await.unwrap();
        rig.engine.registry.mark_inactive("c2").await;

        let report = rig.engine.recover_active().await;

        assert_eq!(report.examined, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.healthy, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn destroy_operations_release_instances() {
        let rig = rig(quiet_cfg()).await;
        rig.tree.add_surface("s1");
        rig.tree.add_surface("s2");
        rig.engine.render_widget(&sample_spec("c1", "s1")).await.unwrap();
        rig.engine.render_widget(&sample_spec("c2", "s2")).await.unwrap();

        assert!(rig.engine.destroy_widget("c1").await);
        assert!(!rig.engine.destroy_widget("c1").await);
        assert_eq!(rig.backend.live_count(), 1);

        assert_eq!(rig.engine.destroy_all().await, 1);
        assert_eq!(rig.engine.status().await.total, 0);
        assert_eq!(rig.backend.live_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn backend_failure_is_isolated_and_retried() {
        let rig = rig(quiet_cfg()).await;
        rig.tree.add_surface("s1");
        rig.engine.render_widget(&sample_spec("c1", "s1")).await.unwrap();

        // Node rebuilt without protection; the rebuild attempt fails first.
        rig.tree.remove_surface("s1");
        rig.tree.add_surface("s1");
        rig.backend.set_failing(true);

        let failed = rig.engine.run_recovery_pass().await;
        assert_eq!(failed.failed, 1);
        assert!(rig.engine.is_registered("c1").await);

        rig.backend.set_failing(false);
        let recovered = rig.engine.run_recovery_pass().await;
        assert_eq!(recovered.recovered, 1);
        assert_eq!(rig.backend.live_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn wake_signal_triggers_immediate_pass() {
        let rig = rig(quiet_cfg()).await;
        let mut rx = rig.engine.subscribe();

        rig.wake.send(WakeSignal::BecameVisible).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let started: Vec<Event> = drain(&mut rx)
            .into_iter()
            .filter(|ev| ev.kind == EventKind::RecoveryStarted)
            .collect();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].reason.as_deref(), Some("became_visible"));
    }

    #[tokio::test(start_paused = true)]
    async fn mutation_bursts_debounce_to_one_execution() {
        let rig = rig(quiet_cfg()).await;
        rig.tree.add_surface("s1");
        rig.engine.render_widget(&sample_spec("c1", "s1")).await.unwrap();
        let mut rx = rig.engine.subscribe();

        let marker = rig.tree.remove_surface("s1").expect("marker present");
        rig.tree.add_surface("s1");

        // Two flags inside the 2s window: the pending execution is pushed
        // out, not run twice.
        for _ in 0..2 {
            rig.mutations
                .send(TreeMutation {
                    added: vec![],
                    removed: vec![RemovedSurface {
                        surface_id: "s1".into(),
                        marker: Some(marker.clone()),
                    }],
                })
                .unwrap();
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        tokio::time::sleep(Duration::from_secs(3)).await;

        let executions = drain(&mut rx)
            .into_iter()
            .filter(|ev| ev.kind == EventKind::RecoveryStarted)
            .count();
        assert_eq!(executions, 1);
        assert!(rig.engine.registered_widgets().await[0].is_active);
        assert_eq!(rig.backend.live_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_round_trip_restores_records() {
        let store = Arc::new(MemoryStore::new());
        let rig1 = rig_with_store(quiet_cfg(), store.clone()).await;
        rig1.tree.add_surface("s3");
        rig1.tree.add_surface("s4");
        rig1.engine.render_widget(&sample_spec("c3", "s3")).await.unwrap();
        rig1.engine.render_widget(&sample_spec("c4", "s4")).await.unwrap();
        assert_eq!(rig1.engine.save_snapshot().await.unwrap(), 2);

        // Cold start: records come back without instances, then recovery
        // rebuilds them once the surfaces exist.
        let rig2 = rig_with_store(quiet_cfg(), store).await;
        let status = rig2.engine.status().await;
        assert_eq!(status.total, 2);
        assert_eq!(status.live, 0);
        assert_eq!(status.ids, vec!["c3".to_string(), "c4".to_string()]);

        rig2.tree.add_surface("s3");
        rig2.tree.add_surface("s4");
        let report = rig2.engine.run_recovery_pass().await;
        assert_eq!(report.recovered, 2);
        assert_eq!(rig2.backend.live_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_snapshot_leaves_registry_empty() {
        let store = Arc::new(MemoryStore::new());
        {
            let seed = rig_with_store(quiet_cfg(), store.clone()).await;
            seed.tree.add_surface("s1");
            seed.engine.render_widget(&sample_spec("c1", "s1")).await.unwrap();
            seed.engine.save_snapshot().await.unwrap();
        }

        // Age the stored snapshot past the 24h TTL.
        let payload = store.get("widgetvisor.snapshot").unwrap();
        let mut snapshot: Snapshot = serde_json::from_str(&payload).unwrap();
        snapshot.timestamp = now_ms() - 25 * 60 * 60 * 1000;
        store.set("widgetvisor.snapshot", serde_json::to_string(&snapshot).unwrap());

        let rig = rig_with_store(quiet_cfg(), store).await;
        assert_eq!(rig.engine.status().await.total, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_saves_snapshot_and_stops_loops() {
        let mut cfg = quiet_cfg();
        cfg.recovery_interval = Duration::from_secs(3);
        let rig = rig(cfg).await;
        rig.tree.add_surface("s1");
        rig.engine.render_widget(&sample_spec("c1", "s1")).await.unwrap();
        let mut rx = rig.engine.subscribe();

        rig.engine.cleanup().await;

        assert!(rig.store.get("widgetvisor.snapshot").is_some());
        let kinds: Vec<EventKind> = drain(&mut rx).into_iter().map(|ev| ev.kind).collect();
        assert!(kinds.contains(&EventKind::EngineShutdown));

        // Loops are gone: an unprotected rebuilt node is no longer recovered.
        let created = rig.backend.created_count();
        rig.tree.remove_surface("s1");
        rig.tree.add_surface("s1");
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(rig.backend.created_count(), created);
    }
}
