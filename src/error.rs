//! Error types used by the widgetvisor runtime.
//!
//! This module defines two error enums:
//!
//! - [`RenderError`] — failures scoped to a single widget (validation,
//!   missing host surface, backend refusal).
//! - [`EngineError`] — failures of the engine's own machinery (snapshot
//!   serialization, missing store).
//!
//! Both types provide helper methods (`as_label`, `as_message`) for
//! logging/metrics, and [`RenderError::is_retryable`] tells the recovery
//! engine whether a failed widget is worth another pass.

use thiserror::Error;

/// # Errors scoped to a single widget.
///
/// A `RenderError` never aborts the engine; it is returned to the caller of
/// [`render_widget`](crate::WidgetEngine::render_widget) or converted into a
/// `RecoveryFailed` event during recovery passes. One widget's failure must
/// not interrupt iteration over the others.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RenderError {
    /// The requested host surface is not present in the content tree.
    ///
    /// Non-fatal: the surface may simply not be mounted yet. Callers and the
    /// recovery engine retry on a later pass.
    #[error("host surface not found: {surface}")]
    HostNotFound {
        /// Identifier of the missing surface.
        surface: String,
    },

    /// The widget kind is not part of the supported set.
    ///
    /// Fatal for this widget: the request is rejected at validation time and
    /// never touches the registry.
    #[error("unsupported widget kind: {kind:?}")]
    UnsupportedType {
        /// The kind name as received from the caller.
        kind: String,
    },

    /// The widget data does not match the shape its kind requires.
    ///
    /// Fatal for this widget: rejected at validation time, never registered.
    #[error("malformed widget config: {detail}")]
    MalformedConfig {
        /// What exactly was wrong with the payload.
        detail: String,
    },

    /// The rendering backend refused or failed to create an instance.
    ///
    /// Non-fatal: the backend may not be ready yet; recovery retries.
    #[error("rendering backend unavailable: {detail}")]
    BackendUnavailable {
        /// Backend-provided failure detail.
        detail: String,
    },
}

impl RenderError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use widgetvisor::RenderError;
    ///
    /// let err = RenderError::HostNotFound { surface: "msg-17".into() };
    /// assert_eq!(err.as_label(), "host_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RenderError::HostNotFound { .. } => "host_not_found",
            RenderError::UnsupportedType { .. } => "unsupported_type",
            RenderError::MalformedConfig { .. } => "malformed_config",
            RenderError::BackendUnavailable { .. } => "backend_unavailable",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RenderError::HostNotFound { surface } => format!("surface missing: {surface}"),
            RenderError::UnsupportedType { kind } => format!("unsupported kind: {kind:?}"),
            RenderError::MalformedConfig { detail } => format!("malformed config: {detail}"),
            RenderError::BackendUnavailable { detail } => format!("backend unavailable: {detail}"),
        }
    }

    /// Indicates whether a later recovery pass may succeed for this widget.
    ///
    /// Returns `true` for [`RenderError::HostNotFound`] and
    /// [`RenderError::BackendUnavailable`]; validation failures are permanent
    /// for the offending request.
    ///
    /// # Example
    /// ```
    /// use widgetvisor::RenderError;
    ///
    /// let retryable = RenderError::BackendUnavailable { detail: "not mounted".into() };
    /// assert!(retryable.is_retryable());
    ///
    /// let fatal = RenderError::UnsupportedType { kind: "heatmap".into() };
    /// assert!(!fatal.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RenderError::HostNotFound { .. } | RenderError::BackendUnavailable { .. }
        )
    }
}

/// # Errors produced by the engine's own machinery.
///
/// Snapshot persistence is best-effort warm-start data, so these errors are
/// reported to the caller of [`save_snapshot`](crate::WidgetEngine::save_snapshot)
/// but never crash a loop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum EngineError {
    /// Snapshot (de)serialization failed.
    #[error("snapshot serialization failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// No durable store was configured at build time.
    #[error("snapshot store not configured")]
    StoreUnavailable,
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::Snapshot(_) => "snapshot_serde",
            EngineError::StoreUnavailable => "store_unavailable",
        }
    }
}
