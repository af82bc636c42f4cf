//! # Rendering backend capability.
//!
//! The engine never talks to a concrete chart or timeline library; it only
//! requires `create`/`destroy`/`bound_handle` of whatever the host plugs in.
//! Two adapters exist — one for the series kinds, one for the timeline — and
//! [`AdapterSet`] dispatches on [`WidgetKind`] so call sites never branch on
//! kind inline.

use std::sync::Arc;

use crate::error::RenderError;
use crate::host::tree::SurfaceRef;
use crate::widgets::{WidgetConfig, WidgetKind};

/// Opaque, comparable token identifying one live backend object.
///
/// Issued by [`RenderBackend::create`]; the engine never looks inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BackendHandle(pub u64);

/// Contract for a rendering backend adapter.
///
/// Implementations wrap a concrete rendering library. All methods are
/// synchronous: the engine calls them from inside registry critical
/// sections and expects no internal suspension.
pub trait RenderBackend: Send + Sync + 'static {
    /// Creates a live instance bound to `surface` from a validated config.
    ///
    /// Returns [`RenderError::BackendUnavailable`] when the backend cannot
    /// currently instantiate (not mounted, library not loaded); the recovery
    /// engine retries such failures.
    fn create(&self, surface: &SurfaceRef, config: &WidgetConfig) -> Result<BackendHandle, RenderError>;

    /// Destroys a live instance. Must tolerate already-destroyed handles.
    fn destroy(&self, handle: BackendHandle);

    /// Returns the handle currently bound to `surface_id`, if the backend
    /// still considers it live and undestroyed.
    fn bound_handle(&self, surface_id: &str) -> Option<BackendHandle>;
}

/// Tagged-variant dispatch over the two backend adapters.
#[derive(Clone)]
pub struct AdapterSet {
    series: Arc<dyn RenderBackend>,
    timeline: Arc<dyn RenderBackend>,
}

impl AdapterSet {
    /// Creates the adapter set from the two concrete backends.
    pub fn new(series: Arc<dyn RenderBackend>, timeline: Arc<dyn RenderBackend>) -> Self {
        Self { series, timeline }
    }

    /// Selects the adapter responsible for `kind`.
    pub fn for_kind(&self, kind: WidgetKind) -> &Arc<dyn RenderBackend> {
        if kind.is_timeline() { &self.timeline } else { &self.series }
    }
}
