//! Capability traits for the engine's external collaborators.
//!
//! The engine is backend- and host-agnostic: everything it needs from the
//! outside world is expressed here as small, object-safe traits plus plain
//! data types. The hosting application implements these once and injects
//! them through the [`EngineBuilder`](crate::EngineBuilder).
//!
//! ## Contents
//! - [`RenderBackend`] / [`AdapterSet`] / [`BackendHandle`] rendering seam
//! - [`SurfaceTree`] / [`SurfaceRef`] / [`ProtectionMarker`] tree queries
//! - [`TreeMutation`] / [`RemovedSurface`] structural change batches
//! - [`SnapshotStore`] durable key/value storage
//! - [`WakeSignal`] visibility/focus events

mod backend;
mod signals;
mod store;
mod tree;

pub use backend::{AdapterSet, BackendHandle, RenderBackend};
pub use signals::WakeSignal;
pub use store::SnapshotStore;
pub use tree::{ProtectionMarker, RemovedSurface, SurfaceRef, SurfaceTree, TreeMutation};
