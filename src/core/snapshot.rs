//! # Durable snapshot persistence.
//!
//! Serializes registry **records** (never instances) to the host's
//! key/value store, and restores them on startup when young enough.
//! Warm-start data only: it reduces cold-start flicker, while in-page
//! recovery remains the correctness mechanism — corrupt or expired
//! snapshots are discarded with a warning, never an error.

use serde::{Deserialize, Serialize};

use crate::core::registry::WidgetRegistry;
use crate::error::EngineError;
use crate::events::{Bus, Event, EventKind};
use crate::host::SnapshotStore;
use crate::widgets::{WidgetRecord, now_ms};

/// Persisted snapshot payload: records plus the save timestamp (ms).
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    pub(crate) records: Vec<(String, WidgetRecord)>,
    pub(crate) timestamp: u64,
}

/// Serializes all registry records under `key`.
pub(crate) async fn save(
    store: &dyn SnapshotStore,
    key: &str,
    registry: &WidgetRegistry,
    bus: &Bus,
) -> Result<usize, EngineError> {
    let records = registry.export().await;
    let count = records.len();
    let payload = serde_json::to_string(&Snapshot { records, timestamp: now_ms() })?;
    store.set(key, payload);

    tracing::debug!(records = count, "snapshot saved");
    bus.publish(Event::new(EventKind::SnapshotSaved).with_count(count));
    Ok(count)
}

/// Loads records stored under `key`, discarding expired or corrupt data.
pub(crate) fn load(
    store: &dyn SnapshotStore,
    key: &str,
    ttl_ms: u64,
    bus: &Bus,
) -> Vec<(String, WidgetRecord)> {
    let Some(payload) = store.get(key) else {
        return Vec::new();
    };

    let snapshot: Snapshot = match serde_json::from_str(&payload) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            tracing::warn!(error = %err, "discarding corrupt snapshot");
            bus.publish(Event::new(EventKind::SnapshotDiscarded).with_reason("corrupt"));
            return Vec::new();
        }
    };

    let age_ms = now_ms().saturating_sub(snapshot.timestamp);
    if age_ms > ttl_ms {
        tracing::info!(age_ms, "discarding expired snapshot");
        bus.publish(Event::new(EventKind::SnapshotDiscarded).with_reason("expired"));
        return Vec::new();
    }

    snapshot.records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::harness::{MemoryStore, MockBackend, harness_adapters, sample_record};
    use std::sync::Arc;

    const KEY: &str = "widgetvisor.snapshot";
    const DAY_MS: u64 = 24 * 60 * 60 * 1000;

    fn registry() -> Arc<WidgetRegistry> {
        WidgetRegistry::new(harness_adapters(Arc::new(MockBackend::new())), Bus::new(16))
    }

    #[tokio::test]
    async fn save_then_load_round_trips_records() {
        let store = MemoryStore::new();
        let bus = Bus::new(16);
        let registry = registry();
        registry
            .restore(vec![
                ("c3".into(), sample_record("c3", "s3")),
                ("c4".into(), sample_record("c4", "s4")),
            ])
            .await;

        let saved = save(&store, KEY, &registry, &bus).await.unwrap();
        assert_eq!(saved, 2);

        let records = load(&store, KEY, DAY_MS, &bus);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].0, "c3");
        assert_eq!(records[1].1.host_surface_id, "s4");
    }

    #[tokio::test]
    async fn expired_snapshot_is_dropped() {
        let store = MemoryStore::new();
        let bus = Bus::new(16);
        let snapshot = Snapshot {
            records: vec![("c1".into(), sample_record("c1", "s1"))],
            timestamp: now_ms() - 25 * 60 * 60 * 1000,
        };
        store.set(KEY, serde_json::to_string(&snapshot).unwrap());

        assert!(load(&store, KEY, DAY_MS, &bus).is_empty());
    }

    #[tokio::test]
    async fn hour_old_snapshot_survives() {
        let store = MemoryStore::new();
        let bus = Bus::new(16);
        let snapshot = Snapshot {
            records: vec![("c1".into(), sample_record("c1", "s1"))],
            timestamp: now_ms() - 60 * 60 * 1000,
        };
        store.set(KEY, serde_json::to_string(&snapshot).unwrap());

        assert_eq!(load(&store, KEY, DAY_MS, &bus).len(), 1);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_dropped() {
        let store = MemoryStore::new();
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        store.set(KEY, "{not json".to_string());

        assert!(load(&store, KEY, DAY_MS, &bus).is_empty());
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::SnapshotDiscarded);
    }

    #[tokio::test]
    async fn missing_snapshot_yields_nothing() {
        let store = MemoryStore::new();
        let bus = Bus::new(16);
        assert!(load(&store, KEY, DAY_MS, &bus).is_empty());
    }
}
