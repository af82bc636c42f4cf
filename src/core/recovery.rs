//! # Recovery engine: rebuilds widgets from stored configuration.
//!
//! Runs on a periodic timer and on demand (debounced mutation trigger,
//! visibility/focus wake signals, explicit calls). Each pass walks the
//! registry and rebuilds every widget whose host surface is present but no
//! longer protected, or whose instance is stale — through the same
//! instantiation path the render coordinator uses.
//!
//! ## Rules
//! - A surface that genuinely doesn't exist yet defers the widget to the
//!   next cycle; nothing is disposed.
//! - Recovery of a healthy widget is a no-op (instance identity unchanged).
//! - Per-widget isolation: one widget's failure publishes `RecoveryFailed`
//!   and iteration continues.
//! - Rebuilt records come back with `is_active = true`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::coordinator::Coordinator;
use crate::core::registry::WidgetRegistry;
use crate::events::{Bus, Event, EventKind};
use crate::host::{AdapterSet, SurfaceTree, WakeSignal};
use crate::widgets::{WidgetRecord, now_ms};

/// On-demand reason for an immediate recovery pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RecoveryTrigger {
    /// Debounced tree-mutation signal.
    Mutation,
    /// The presentation surface is live again.
    Wake(WakeSignal),
}

impl RecoveryTrigger {
    /// Stable label for logs and events.
    pub(crate) fn label(&self) -> &'static str {
        match self {
            RecoveryTrigger::Mutation => "mutation",
            RecoveryTrigger::Wake(WakeSignal::BecameVisible) => "became_visible",
            RecoveryTrigger::Wake(WakeSignal::GainedFocus) => "gained_focus",
        }
    }
}

/// Which records a pass considers, and how aggressively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PassScope {
    /// Conditional pass over all records (the periodic pass).
    All,
    /// Conditional pass limited to records flagged active.
    ActiveOnly,
    /// Unconditional rebuild of every record.
    Forced,
}

/// Outcome counts of one recovery pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Records examined.
    pub examined: usize,
    /// Records found healthy (no action).
    pub healthy: usize,
    /// Instances rebuilt.
    pub recovered: usize,
    /// Records deferred because their surface doesn't exist yet.
    pub deferred: usize,
    /// Records skipped by pass scope.
    pub skipped: usize,
    /// Rebuild attempts that failed.
    pub failed: usize,
}

enum Outcome {
    Healthy,
    Recovered,
    Deferred,
    Failed,
}

/// Periodic + on-demand widget reconstruction.
pub(crate) struct RecoveryEngine {
    registry: Arc<WidgetRegistry>,
    tree: Arc<dyn SurfaceTree>,
    adapters: AdapterSet,
    coordinator: Arc<Coordinator>,
    bus: Bus,
    interval: Duration,
}

impl RecoveryEngine {
    pub(crate) fn new(
        registry: Arc<WidgetRegistry>,
        tree: Arc<dyn SurfaceTree>,
        adapters: AdapterSet,
        coordinator: Arc<Coordinator>,
        bus: Bus,
        interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self { registry, tree, adapters, coordinator, bus, interval })
    }

    /// Spawns the recovery loop: periodic ticks plus on-demand triggers.
    pub(crate) fn spawn(
        self: &Arc<Self>,
        mut triggers: mpsc::UnboundedReceiver<RecoveryTrigger>,
        token: CancellationToken,
    ) {
        let me = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = time::interval(me.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        me.run_pass(PassScope::All).await;
                    }
                    trigger = triggers.recv() => match trigger {
                        Some(trigger) => {
                            tracing::debug!(trigger = trigger.label(), "recovery triggered");
                            me.bus.publish(
                                Event::new(EventKind::RecoveryStarted).with_reason(trigger.label()),
                            );
                            me.run_pass(PassScope::All).await;
                        }
                        None => break,
                    },
                }
            }
        });
    }

    /// Runs one recovery pass over the registry.
    pub(crate) async fn run_pass(&self, scope: PassScope) -> RecoveryReport {
        let mut report = RecoveryReport::default();
        for record in self.registry.records().await {
            report.examined += 1;
            if scope == PassScope::ActiveOnly && !record.is_active {
                report.skipped += 1;
                continue;
            }
            match self.recover_one(record, scope == PassScope::Forced).await {
                Outcome::Healthy => report.healthy += 1,
                Outcome::Recovered => report.recovered += 1,
                Outcome::Deferred => report.deferred += 1,
                Outcome::Failed => report.failed += 1,
            }
        }

        if report.recovered > 0 || report.failed > 0 {
            self.bus.publish(Event::new(EventKind::RecoveryCompleted).with_count(report.recovered));
        }
        report
    }

    async fn recover_one(&self, record: WidgetRecord, force: bool) -> Outcome {
        // Surface not mounted yet: retry next cycle, dispose nothing.
        let Some(surface) = self.tree.get(&record.host_surface_id) else {
            return Outcome::Deferred;
        };

        let protected = self.tree.marker(&surface).is_some_and(|m| m.covers(&record.id));
        let binding = self.registry.binding(&record.id).await;
        let adapter = self.adapters.for_kind(record.kind);
        let bound_live = binding.as_ref().is_some_and(|(handle, bound)| {
            *bound == surface
                && self.tree.contains(bound)
                && adapter.bound_handle(&bound.surface_id) == Some(*handle)
        });

        if protected && bound_live && !force {
            return Outcome::Healthy;
        }

        if binding.is_some() {
            self.registry.drop_instance(&record.id).await;
        }

        let mut record = record;
        record.is_active = true;
        record.last_seen_at = now_ms();
        let id = record.id.clone();
        let surface_id = record.host_surface_id.clone();

        match self.coordinator.instantiate(record, &surface).await {
            Ok(_) => {
                self.bus.publish(
                    Event::new(EventKind::WidgetRecovered)
                        .with_widget(id)
                        .with_surface(surface_id),
                );
                Outcome::Recovered
            }
            Err(err) => {
                tracing::warn!(widget = %id, error = %err, "widget recovery failed");
                self.bus.publish(
                    Event::new(EventKind::RecoveryFailed)
                        .with_widget(id)
                        .with_reason(err.as_message()),
                );
                Outcome::Failed
            }
        }
    }
}
