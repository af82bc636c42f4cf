//! # Widget registry - authoritative id → (record, instance) map.
//!
//! The registry is the only shared mutable state in the engine. Every other
//! component reads it or calls its operations; none mutate the map directly.
//!
//! ## Architecture
//! ```text
//! Coordinator ──► register / drop_instance / binding
//! Monitor     ──► records / touch
//! Observer    ──► mark_inactive
//! Recovery    ──► records / binding / drop_instance / register
//! Persistence ──► export / restore
//! ```
//!
//! ## Rules
//! - `register` always destroys any pre-existing live instance under the
//!   same id before storing the new one. This is the sole place duplicate
//!   instance leakage is prevented structurally.
//! - Mutations run under the write lock with no await on external work
//!   inside the critical section, so two `register` calls for the same id
//!   cannot interleave and leave two live instances.
//! - A record survives losing its instance; an instance never exists
//!   without a record.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::events::{Bus, Event, EventKind};
use crate::host::{AdapterSet, BackendHandle, SurfaceRef};
use crate::widgets::{WidgetInstance, WidgetRecord, WidgetStatus, now_ms};

/// Stored state of one widget id.
struct Entry {
    record: WidgetRecord,
    instance: Option<WidgetInstance>,
}

/// Diagnostic counts and ids, as returned by [`WidgetRegistry::status`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryStatus {
    /// Number of registered records.
    pub total: usize,
    /// Number of records with a live backend instance.
    pub live: usize,
    /// Number of records flagged active.
    pub active: usize,
    /// Sorted registered widget ids.
    pub ids: Vec<String>,
}

/// Authoritative map of widget id → (durable record, live instance).
pub struct WidgetRegistry {
    entries: RwLock<HashMap<String, Entry>>,
    adapters: AdapterSet,
    bus: Bus,
}

impl WidgetRegistry {
    /// Creates an empty registry.
    pub(crate) fn new(adapters: AdapterSet, bus: Bus) -> Arc<Self> {
        Arc::new(Self {
            entries: RwLock::new(HashMap::new()),
            adapters,
            bus,
        })
    }

    /// Stores a record with its freshly created live instance.
    ///
    /// Any pre-existing instance under the same id is destroyed through its
    /// adapter first; the predecessor record's `created_at` is preserved so
    /// re-renders do not reset widget age.
    pub(crate) async fn register(&self, mut record: WidgetRecord, instance: WidgetInstance) {
        let id = record.id.clone();
        let surface = record.host_surface_id.clone();

        let mut entries = self.entries.write().await;
        if let Some(prev) = entries.remove(&id) {
            record.created_at = prev.record.created_at;
            if let Some(old) = prev.instance {
                self.adapters.for_kind(prev.record.kind).destroy(old.handle);
                self.bus.publish(Event::new(EventKind::InstanceReplaced).with_widget(id.as_str()));
            }
        }
        entries.insert(id.clone(), Entry { record, instance: Some(instance) });
        drop(entries);

        self.bus.publish(
            Event::new(EventKind::WidgetRegistered)
                .with_widget(id)
                .with_surface(surface),
        );
    }

    /// Removes a widget, destroying its live instance if present.
    ///
    /// Returns `false` when the id was not registered.
    pub(crate) async fn unregister(&self, id: &str) -> bool {
        let removed = self.entries.write().await.remove(id);
        match removed {
            Some(entry) => {
                if let Some(instance) = entry.instance {
                    self.adapters.for_kind(entry.record.kind).destroy(instance.handle);
                }
                self.bus.publish(Event::new(EventKind::WidgetUnregistered).with_widget(id));
                true
            }
            None => false,
        }
    }

    /// Process-wide clear: destroys every live instance and drops all
    /// records. Returns the number of widgets removed.
    pub(crate) async fn clear_all(&self) -> usize {
        let drained: Vec<(String, Entry)> = {
            let mut entries = self.entries.write().await;
            entries.drain().collect()
        };

        let count = drained.len();
        for (id, entry) in drained {
            if let Some(instance) = entry.instance {
                self.adapters.for_kind(entry.record.kind).destroy(instance.handle);
            }
            self.bus.publish(Event::new(EventKind::WidgetUnregistered).with_widget(id));
        }
        count
    }

    /// Destroys the live instance of `id`, keeping the record recoverable.
    pub(crate) async fn drop_instance(&self, id: &str) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(id)
            && let Some(instance) = entry.instance.take()
        {
            self.adapters.for_kind(entry.record.kind).destroy(instance.handle);
        }
    }

    /// True if a record exists under `id`.
    pub(crate) async fn is_registered(&self, id: &str) -> bool {
        self.entries.read().await.contains_key(id)
    }

    /// Returns a clone of the record under `id`.
    pub(crate) async fn get_record(&self, id: &str) -> Option<WidgetRecord> {
        self.entries.read().await.get(id).map(|e| e.record.clone())
    }

    /// Bumps `last_seen_at` for `id`. Returns `false` if unregistered.
    pub(crate) async fn touch(&self, id: &str) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(id) {
            Some(entry) => {
                entry.record.last_seen_at = now_ms();
                true
            }
            None => false,
        }
    }

    /// Clears the health flag for `id` (host surface lost).
    pub(crate) async fn mark_inactive(&self, id: &str) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(id) {
            Some(entry) => {
                entry.record.is_active = false;
                true
            }
            None => false,
        }
    }

    /// Returns the live binding (handle + bound surface) of `id`, if any.
    pub(crate) async fn binding(&self, id: &str) -> Option<(BackendHandle, SurfaceRef)> {
        self.entries
            .read()
            .await
            .get(id)
            .and_then(|e| e.instance.as_ref())
            .map(|i| (i.handle, i.surface.clone()))
    }

    /// Returns sorted registered widget ids.
    pub(crate) async fn list_ids(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut ids: Vec<String> = entries.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Returns clones of all records (iteration basis for the loops).
    pub(crate) async fn records(&self) -> Vec<WidgetRecord> {
        self.entries.read().await.values().map(|e| e.record.clone()).collect()
    }

    /// Diagnostic counts and ids.
    pub(crate) async fn status(&self) -> RegistryStatus {
        let entries = self.entries.read().await;
        let mut ids: Vec<String> = entries.keys().cloned().collect();
        ids.sort_unstable();
        RegistryStatus {
            total: entries.len(),
            live: entries.values().filter(|e| e.instance.is_some()).count(),
            active: entries.values().filter(|e| e.record.is_active).count(),
            ids,
        }
    }

    /// Diagnostic per-widget view, sorted by id.
    pub(crate) async fn statuses(&self) -> Vec<WidgetStatus> {
        let entries = self.entries.read().await;
        let mut out: Vec<WidgetStatus> = entries
            .values()
            .map(|e| WidgetStatus {
                id: e.record.id.clone(),
                owner_id: e.record.owner_id.clone(),
                kind: e.record.kind,
                is_active: e.record.is_active,
                live: e.instance.is_some(),
            })
            .collect();
        out.sort_unstable_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Exports all records for snapshotting (instances are never exported).
    pub(crate) async fn export(&self) -> Vec<(String, WidgetRecord)> {
        let entries = self.entries.read().await;
        let mut out: Vec<(String, WidgetRecord)> = entries
            .iter()
            .map(|(id, e)| (id.clone(), e.record.clone()))
            .collect();
        out.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Restores records from a snapshot, without instances.
    ///
    /// Ids already present are left untouched: live state always wins over
    /// warm-start data.
    pub(crate) async fn restore(&self, records: Vec<(String, WidgetRecord)>) -> usize {
        let mut entries = self.entries.write().await;
        let mut restored = 0;
        for (id, record) in records {
            entries.entry(id).or_insert_with(|| {
                restored += 1;
                Entry { record, instance: None }
            });
        }
        restored
    }

    /// True if no records are registered.
    pub(crate) async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::harness::{MockBackend, harness_adapters, sample_record};
    use crate::events::Bus;
    use std::sync::Arc;

    fn registry() -> (Arc<WidgetRegistry>, Arc<MockBackend>) {
        let backend = Arc::new(MockBackend::new());
        let adapters = harness_adapters(backend.clone());
        (WidgetRegistry::new(adapters, Bus::new(16)), backend)
    }

    fn instance(backend: &MockBackend, surface_id: &str) -> WidgetInstance {
        let surface = SurfaceRef { surface_id: surface_id.into(), node: 1 };
        let handle = backend.issue(surface_id);
        WidgetInstance { handle, surface }
    }

    #[tokio::test]
    async fn register_disposes_predecessor_instance() {
        let (registry, backend) = registry();
        let record = sample_record("c1", "s1");

        registry.register(record.clone(), instance(&backend, "s1")).await;
        registry.register(record, instance(&backend, "s1")).await;

        assert_eq!(backend.live_count(), 1);
        assert_eq!(registry.status().await.total, 1);
    }

    #[tokio::test]
    async fn reregister_preserves_created_at() {
        let (registry, backend) = registry();
        let mut record = sample_record("c1", "s1");
        record.created_at = 42;

        registry.register(record.clone(), instance(&backend, "s1")).await;
        record.created_at = now_ms();
        registry.register(record, instance(&backend, "s1")).await;

        assert_eq!(registry.get_record("c1").await.unwrap().created_at, 42);
    }

    #[tokio::test]
    async fn unregister_destroys_instance_and_record() {
        let (registry, backend) = registry();
        registry.register(sample_record("c1", "s1"), instance(&backend, "s1")).await;

        assert!(registry.unregister("c1").await);
        assert!(!registry.unregister("c1").await);
        assert_eq!(backend.live_count(), 0);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn drop_instance_keeps_record_recoverable() {
        let (registry, backend) = registry();
        registry.register(sample_record("c1", "s1"), instance(&backend, "s1")).await;

        registry.drop_instance("c1").await;

        assert_eq!(backend.live_count(), 0);
        assert!(registry.is_registered("c1").await);
        assert!(registry.binding("c1").await.is_none());
    }

    #[tokio::test]
    async fn restore_never_clobbers_live_entries() {
        let (registry, backend) = registry();
        registry.register(sample_record("c1", "s1"), instance(&backend, "s1")).await;

        let mut stale = sample_record("c1", "s1");
        stale.is_active = false;
        let restored = registry
            .restore(vec![("c1".into(), stale), ("c2".into(), sample_record("c2", "s2"))])
            .await;

        assert_eq!(restored, 1);
        assert!(registry.get_record("c1").await.unwrap().is_active);
        assert!(registry.binding("c1").await.is_some());
        assert!(registry.binding("c2").await.is_none());
    }

    #[tokio::test]
    async fn status_counts_live_and_active() {
        let (registry, backend) = registry();
        registry.register(sample_record("c1", "s1"), instance(&backend, "s1")).await;
        registry.restore(vec![("c2".into(), sample_record("c2", "s2"))]).await;
        registry.mark_inactive("c2").await;

        let status = registry.status().await;
        assert_eq!(status.total, 2);
        assert_eq!(status.live, 1);
        assert_eq!(status.active, 1);
        assert_eq!(status.ids, vec!["c1".to_string(), "c2".to_string()]);
    }
}
