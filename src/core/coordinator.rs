//! # Render coordinator: the single instantiation path.
//!
//! Every widget instance — first render or recovery rebuild — is created
//! here. The coordinator defends against re-render storms from unrelated
//! tree churn with a fast existence check, a short settle deferral, and a
//! race-closing re-check before it touches the backend.
//!
//! ## Flow
//! ```text
//! render(spec)
//!   ├─► validate(spec)                 (reject before any registry access)
//!   ├─► settled?      ──► yes ──► Ok(AlreadyLive)        (fast path)
//!   ├─► sleep(render_defer)
//!   ├─► settled?      ──► yes ──► Ok(AlreadyLive)        (re-check)
//!   ├─► tree.get(surface)  ──► None ──► Err(HostNotFound)
//!   ├─► dispose instance bound to a different/stale surface
//!   └─► instantiate(record, surface)
//!          ├─► adapter.create ──► Err ──► Err(BackendUnavailable)
//!          ├─► tree.protect(surface, marker)
//!          └─► registry.register(record, instance)
//! ```
//!
//! ## Rules
//! - Idempotent for repeated calls with an unchanged `(id, surface, config)`.
//! - Never two live instances per id: `register` disposes the predecessor.
//! - Failures are returned, never panicked; every failure also publishes a
//!   `RenderFailed` event.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use crate::core::registry::WidgetRegistry;
use crate::error::RenderError;
use crate::events::{Bus, Event, EventKind};
use crate::host::{AdapterSet, BackendHandle, SurfaceRef, SurfaceTree};
use crate::widgets::{self, WidgetInstance, WidgetRecord, WidgetSpec};

/// Result of a successful render request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderOutcome {
    /// A new backend instance was created and registered.
    Created,
    /// The widget was already live on its protected surface; no action.
    AlreadyLive,
}

/// Per-request render entry point; shared by the engine facade and the
/// recovery engine (which reuses [`Coordinator::instantiate`]).
pub(crate) struct Coordinator {
    registry: Arc<WidgetRegistry>,
    tree: Arc<dyn SurfaceTree>,
    adapters: AdapterSet,
    bus: Bus,
    defer: Duration,
}

impl Coordinator {
    pub(crate) fn new(
        registry: Arc<WidgetRegistry>,
        tree: Arc<dyn SurfaceTree>,
        adapters: AdapterSet,
        bus: Bus,
        defer: Duration,
    ) -> Self {
        Self { registry, tree, adapters, bus, defer }
    }

    /// Validates and renders one widget request.
    pub(crate) async fn render(&self, spec: &WidgetSpec) -> Result<RenderOutcome, RenderError> {
        let result = self.try_render(spec).await;
        if let Err(err) = &result {
            self.bus.publish(
                Event::new(EventKind::RenderFailed)
                    .with_widget(spec.id.as_str())
                    .with_reason(err.as_message()),
            );
        }
        result
    }

    async fn try_render(&self, spec: &WidgetSpec) -> Result<RenderOutcome, RenderError> {
        let config = widgets::validate(spec)?;

        if self.is_settled(&spec.id, &spec.host_surface_id).await {
            return Ok(RenderOutcome::AlreadyLive);
        }

        // Let the host surface settle after whatever mutation triggered this
        // call, then close the race window with a second check.
        time::sleep(self.defer).await;
        if self.is_settled(&spec.id, &spec.host_surface_id).await {
            return Ok(RenderOutcome::AlreadyLive);
        }

        let surface = self.tree.get(&spec.host_surface_id).ok_or_else(|| RenderError::HostNotFound {
            surface: spec.host_surface_id.clone(),
        })?;

        if let Some((handle, bound)) = self.registry.binding(&spec.id).await {
            let adapter = self.adapters.for_kind(config.kind());
            let backend_live = adapter.bound_handle(&bound.surface_id) == Some(handle);
            if bound != surface || !self.tree.contains(&bound) || !backend_live {
                self.registry.drop_instance(&spec.id).await;
            }
        }

        let record = WidgetRecord::new(
            spec.id.clone(),
            spec.owner_id.clone(),
            config,
            spec.host_surface_id.clone(),
        );
        self.instantiate(record, &surface).await?;
        Ok(RenderOutcome::Created)
    }

    /// Creates a backend instance for `record` on `surface`, protects the
    /// surface, and registers the pair. Recovery uses this same path.
    pub(crate) async fn instantiate(
        &self,
        record: WidgetRecord,
        surface: &SurfaceRef,
    ) -> Result<BackendHandle, RenderError> {
        let adapter = self.adapters.for_kind(record.kind);
        let handle = adapter.create(surface, &record.config)?;

        if !self.tree.protect(surface, record.marker()) {
            // Node vanished between lookup and protect; roll back the create.
            adapter.destroy(handle);
            return Err(RenderError::HostNotFound {
                surface: surface.surface_id.to_string(),
            });
        }

        let instance = WidgetInstance { handle, surface: surface.clone() };
        self.registry.register(record, instance).await;
        Ok(handle)
    }

    /// True when `id` is registered with a live instance and the surface
    /// currently carrying `surface_id` is protected for it.
    async fn is_settled(&self, id: &str, surface_id: &str) -> bool {
        if self.registry.binding(id).await.is_none() {
            return false;
        }
        match self.tree.get(surface_id) {
            Some(surface) => self.tree.marker(&surface).is_some_and(|m| m.covers(id)),
            None => false,
        }
    }
}
