//! # widgetvisor
//!
//! **Widgetvisor** keeps rendered chart and timeline widgets alive and
//! correct across a constantly mutating content tree. It is a persistence
//! and recovery runtime: widgets are registered with their validated
//! configuration, watched for health, flagged when their host surface
//! disappears, and rebuilt from stored configuration — independent of, and
//! surviving, unrelated application state churn.
//!
//! The crate is host-agnostic. Rendering backends, the content tree,
//! durable storage and visibility signals are injected through small
//! capability traits; the engine only requires `create`/`destroy`/"is this
//! handle still bound" of its backends.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     caller ──► render_widget(spec)
//!                     │ validate (reject unsupported/malformed)
//!                     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  WidgetEngine (injectable, one per process)                       │
//! │  - Bus (broadcast events)                                         │
//! │  - WidgetRegistry (id → record + live instance)                   │
//! │  - Coordinator (defensive single instantiation path)              │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │HealthMonitor │   │ Mutation     │   │ Recovery     │
//! │ (touch/stale │   │ Observer     │   │ Engine       │
//! │  every ≈2s)  │   │ (+ debounce) │   │ (≈3s + waked)│
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        │                  │ mark_inactive    │ rebuild via Coordinator
//!        ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │ WidgetRegistry — the only shared mutable state                    │
//! │ register() disposes any predecessor instance under the same id    │
//! └───────────────────────────────────────────────────────────────────┘
//!                     │                          ▲
//!                     ▼ records only             │ TTL ≤ 24h
//!               SnapshotStore  ────────────────── warm start
//! ```
//!
//! ### Lifecycle
//! ```text
//! WidgetEngine::builder(cfg, adapters, tree)
//!   .with_store(..) .with_mutations(..) .with_wake_signals(..)
//!   .build().await            ──► snapshot restored, loops spawned
//!
//! render_widget(spec)
//!   ├─► settled? fast path    ──► AlreadyLive
//!   ├─► defer + re-check      ──► AlreadyLive   (race closing)
//!   └─► create + protect + register ──► Created
//!
//! surface removed ──► observer flags inactive ──► debounced recovery
//! recovery pass   ──► unprotected/stale widgets rebuilt from config
//! cleanup()       ──► best-effort snapshot save, all loops cancelled
//! ```
//!
//! ## Features
//! | Area             | Description                                             | Key types / traits                         |
//! |------------------|---------------------------------------------------------|--------------------------------------------|
//! | **Rendering**    | Validated configs, palette/theme resolution.            | [`WidgetSpec`], [`WidgetConfig`], [`Theme`] |
//! | **Registry**     | One live instance per id, structurally enforced.        | [`WidgetEngine`], [`RegistryStatus`]        |
//! | **Recovery**     | Periodic + event-triggered rebuilds, per-widget isolation. | [`RecoveryReport`]                       |
//! | **Host seams**   | Backend, tree, storage and wake-signal capabilities.    | [`RenderBackend`], [`SurfaceTree`], [`SnapshotStore`] |
//! | **Observability**| Broadcast events, pluggable subscribers, tracing logs.  | [`Event`], [`Subscribe`], [`LogWriter`]     |
//! | **Errors**       | Typed per-widget and engine errors.                     | [`RenderError`], [`EngineError`]            |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use widgetvisor::{
//!     AdapterSet, BackendHandle, EngineConfig, ProtectionMarker, RenderBackend, RenderError,
//!     SeriesData, SeriesInput, SurfaceRef, SurfaceTree, WidgetConfig, WidgetEngine, WidgetSpec,
//! };
//!
//! // Host adapters; real implementations wrap a chart/timeline library.
//! struct Backend;
//! impl RenderBackend for Backend {
//!     fn create(&self, _surface: &SurfaceRef, _config: &WidgetConfig) -> Result<BackendHandle, RenderError> {
//!         Ok(BackendHandle(1))
//!     }
//!     fn destroy(&self, _handle: BackendHandle) {}
//!     fn bound_handle(&self, _surface_id: &str) -> Option<BackendHandle> {
//!         Some(BackendHandle(1))
//!     }
//! }
//!
//! struct Tree;
//! impl SurfaceTree for Tree {
//!     fn get(&self, surface_id: &str) -> Option<SurfaceRef> {
//!         Some(SurfaceRef { surface_id: surface_id.into(), node: 1 })
//!     }
//!     fn contains(&self, _surface: &SurfaceRef) -> bool { true }
//!     fn marker(&self, _surface: &SurfaceRef) -> Option<ProtectionMarker> { None }
//!     fn protect(&self, _surface: &SurfaceRef, _marker: ProtectionMarker) -> bool { true }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let adapters = AdapterSet::new(Arc::new(Backend), Arc::new(Backend));
//!     let engine = WidgetEngine::builder(EngineConfig::default(), adapters, Arc::new(Tree))
//!         .build()
//!         .await;
//!
//!     let spec = WidgetSpec::series(
//!         "c1",
//!         "msg-17",
//!         "surface-17",
//!         "bar",
//!         SeriesData {
//!             labels: vec!["Q1".into(), "Q2".into(), "Q3".into()],
//!             series: vec![SeriesInput::new("revenue", vec![10.0, 20.0, 30.0])],
//!         },
//!     );
//!     engine.render_widget(&spec).await.unwrap();
//!     assert!(engine.is_registered("c1").await);
//!
//!     engine.cleanup().await;
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod host;
mod subscribers;
mod widgets;

// ---- Public re-exports ----

pub use config::EngineConfig;
pub use core::{EngineBuilder, RecoveryReport, RegistryStatus, RenderOutcome, WidgetEngine};
pub use error::{EngineError, RenderError};
pub use events::{Bus, Event, EventKind};
pub use host::{
    AdapterSet, BackendHandle, ProtectionMarker, RemovedSurface, RenderBackend, SnapshotStore,
    SurfaceRef, SurfaceTree, TreeMutation, WakeSignal,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use widgets::{
    AxisStyle, Dataset, SeriesConfig, SeriesData, SeriesInput, TaskInput, Theme, TimelineConfig,
    TimelineData, TimelineTask, WidgetConfig, WidgetData, WidgetKind, WidgetRecord, WidgetSpec,
    WidgetStatus, validate,
};
