//! # Content tree capability.
//!
//! The host exposes its content tree through [`SurfaceTree`]: lookup by
//! surface id, liveness of a previously obtained [`SurfaceRef`], and the
//! protection marker metadata the engine stamps on surfaces it renders into.
//!
//! Structural changes arrive as [`TreeMutation`] batches over a channel the
//! host feeds (see [`EngineBuilder::with_mutations`](crate::EngineBuilder::with_mutations)).
//! Hosts without such a primitive simply omit the channel; the engine then
//! degrades to polling-only recovery.

use std::sync::Arc;

/// Reference to one concrete node in the content tree.
///
/// `node` is a host-assigned identity token: when a surface id is torn down
/// and re-created, the new node carries a different token, which is how the
/// engine detects stale bindings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurfaceRef {
    /// Stable surface id this node carries.
    pub surface_id: Arc<str>,
    /// Host-assigned node identity.
    pub node: u64,
}

/// Marker metadata recording which widget currently owns a surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtectionMarker {
    /// Owning widget id.
    pub widget_id: Arc<str>,
    /// Logical owner of the widget (diagnostics/grouping).
    pub owner_id: Arc<str>,
}

impl ProtectionMarker {
    /// Creates a marker for the given widget and owner.
    pub fn new(widget_id: impl Into<Arc<str>>, owner_id: impl Into<Arc<str>>) -> Self {
        Self {
            widget_id: widget_id.into(),
            owner_id: owner_id.into(),
        }
    }

    /// True if this marker protects the given widget id.
    #[inline]
    pub fn covers(&self, widget_id: &str) -> bool {
        &*self.widget_id == widget_id
    }
}

/// Contract for querying the host content tree.
///
/// All methods are synchronous; implementations must not block.
pub trait SurfaceTree: Send + Sync + 'static {
    /// Looks up the node currently carrying `surface_id`.
    fn get(&self, surface_id: &str) -> Option<SurfaceRef>;

    /// True if `surface` (that exact node, not just its id) is still in the
    /// tree.
    fn contains(&self, surface: &SurfaceRef) -> bool;

    /// Returns the protection marker stamped on `surface`, if any.
    fn marker(&self, surface: &SurfaceRef) -> Option<ProtectionMarker>;

    /// Stamps a protection marker on `surface`.
    ///
    /// Returns `false` if the node is gone and the marker could not be set.
    fn protect(&self, surface: &SurfaceRef, marker: ProtectionMarker) -> bool;
}

/// One batch of structural tree changes, as delivered by the host.
#[derive(Clone, Debug, Default)]
pub struct TreeMutation {
    /// Surface ids that appeared in the tree.
    pub added: Vec<Arc<str>>,
    /// Surfaces removed from the tree, with the marker each carried.
    pub removed: Vec<RemovedSurface>,
}

/// A removed surface and the protection marker it carried, if any.
#[derive(Clone, Debug)]
pub struct RemovedSurface {
    /// Surface id of the removed node.
    pub surface_id: Arc<str>,
    /// Marker the node carried at removal time.
    pub marker: Option<ProtectionMarker>,
}
