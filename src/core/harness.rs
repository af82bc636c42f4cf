//! Test-only host doubles: a content tree, a counting backend, and an
//! in-memory store.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use crate::error::RenderError;
use crate::host::{
    AdapterSet, BackendHandle, ProtectionMarker, RenderBackend, SnapshotStore, SurfaceRef,
    SurfaceTree,
};
use crate::widgets::{SeriesData, SeriesInput, WidgetConfig, WidgetRecord, WidgetSpec, validate};

/// Builds a bar-chart render request for tests.
pub(crate) fn sample_spec(id: &str, surface_id: &str) -> WidgetSpec {
    WidgetSpec::series(
        id,
        "owner-1",
        surface_id,
        "bar",
        SeriesData {
            labels: vec!["Q1".into(), "Q2".into(), "Q3".into()],
            series: vec![SeriesInput::new("revenue", vec![10.0, 20.0, 30.0])],
        },
    )
}

/// Builds a validated bar-chart record for tests.
pub(crate) fn sample_record(id: &str, surface_id: &str) -> WidgetRecord {
    let spec = sample_spec(id, surface_id);
    let config: WidgetConfig = validate(&spec).unwrap();
    WidgetRecord::new(id, "owner-1", config, surface_id)
}

/// Wraps one mock backend as both adapters.
pub(crate) fn harness_adapters(backend: std::sync::Arc<MockBackend>) -> AdapterSet {
    AdapterSet::new(backend.clone(), backend)
}

/// Counting backend double with controllable availability.
pub(crate) struct MockBackend {
    next: AtomicU64,
    created: AtomicUsize,
    failing: AtomicBool,
    live: Mutex<HashSet<u64>>,
    bindings: Mutex<HashMap<String, u64>>,
}

impl MockBackend {
    pub(crate) fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
            created: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            live: Mutex::new(HashSet::new()),
            bindings: Mutex::new(HashMap::new()),
        }
    }

    /// Issues a live handle bound to `surface_id` (bypasses `create`).
    pub(crate) fn issue(&self, surface_id: &str) -> BackendHandle {
        let raw = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        self.created.fetch_add(1, Ordering::Relaxed);
        self.live.lock().unwrap().insert(raw);
        self.bindings.lock().unwrap().insert(surface_id.to_string(), raw);
        BackendHandle(raw)
    }

    pub(crate) fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    pub(crate) fn created_count(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }
}

impl RenderBackend for MockBackend {
    fn create(&self, surface: &SurfaceRef, _config: &WidgetConfig) -> Result<BackendHandle, RenderError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(RenderError::BackendUnavailable { detail: "backend offline".into() });
        }
        Ok(self.issue(&surface.surface_id))
    }

    fn destroy(&self, handle: BackendHandle) {
        self.live.lock().unwrap().remove(&handle.0);
        self.bindings.lock().unwrap().retain(|_, raw| *raw != handle.0);
    }

    fn bound_handle(&self, surface_id: &str) -> Option<BackendHandle> {
        let raw = *self.bindings.lock().unwrap().get(surface_id)?;
        self.live.lock().unwrap().contains(&raw).then_some(BackendHandle(raw))
    }
}

struct Node {
    node: u64,
    marker: Option<ProtectionMarker>,
}

/// Content tree double. Surfaces are added/removed by tests; node identity
/// tokens change on re-add, modelling torn-down-and-rebuilt tree nodes.
pub(crate) struct MockTree {
    surfaces: Mutex<HashMap<String, Node>>,
    next_node: AtomicU64,
}

impl MockTree {
    pub(crate) fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            surfaces: Mutex::new(HashMap::new()),
            next_node: AtomicU64::new(0),
        })
    }

    /// Mounts (or re-mounts) a surface; returns its node token.
    pub(crate) fn add_surface(&self, surface_id: &str) -> u64 {
        let node = self.next_node.fetch_add(1, Ordering::Relaxed) + 1;
        self.surfaces
            .lock()
            .unwrap()
            .insert(surface_id.to_string(), Node { node, marker: None });
        node
    }

    /// Unmounts a surface; returns the marker it carried.
    pub(crate) fn remove_surface(&self, surface_id: &str) -> Option<ProtectionMarker> {
        self.surfaces.lock().unwrap().remove(surface_id).and_then(|n| n.marker)
    }
}

impl SurfaceTree for MockTree {
    fn get(&self, surface_id: &str) -> Option<SurfaceRef> {
        self.surfaces.lock().unwrap().get(surface_id).map(|n| SurfaceRef {
            surface_id: surface_id.into(),
            node: n.node,
        })
    }

    fn contains(&self, surface: &SurfaceRef) -> bool {
        self.surfaces
            .lock()
            .unwrap()
            .get(&*surface.surface_id)
            .is_some_and(|n| n.node == surface.node)
    }

    fn marker(&self, surface: &SurfaceRef) -> Option<ProtectionMarker> {
        let surfaces = self.surfaces.lock().unwrap();
        let node = surfaces.get(&*surface.surface_id)?;
        (node.node == surface.node).then(|| node.marker.clone()).flatten()
    }

    fn protect(&self, surface: &SurfaceRef, marker: ProtectionMarker) -> bool {
        let mut surfaces = self.surfaces.lock().unwrap();
        match surfaces.get_mut(&*surface.surface_id) {
            Some(node) if node.node == surface.node => {
                node.marker = Some(marker);
                true
            }
            _ => false,
        }
    }
}

/// In-memory snapshot store.
pub(crate) struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self { map: Mutex::new(HashMap::new()) }
    }
}

impl SnapshotStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.map.lock().unwrap().insert(key.to_string(), value);
    }
}
