//! # Durable widget records and runtime instances.
//!
//! The registry stores two halves per widget id:
//!
//! - [`WidgetRecord`] — durable, serializable; everything needed to rebuild
//!   the widget (kind, validated config, host surface binding, health flags).
//! - [`WidgetInstance`] — runtime only; the live backend handle and the
//!   surface it is currently bound to. Never serialized: snapshots carry
//!   records, instances are rebuilt.
//!
//! ## Rules
//! - A record may exist with no live instance (recoverable state); a live
//!   instance never exists without a record.
//! - `host_surface_id` is stable for the record's lifetime; recovery rebinds
//!   the same id to whatever node currently carries it.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::host::{BackendHandle, ProtectionMarker, SurfaceRef};
use crate::widgets::config::WidgetConfig;
use crate::widgets::kind::WidgetKind;

/// Current wall-clock time as milliseconds since the Unix epoch.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().min(u128::from(u64::MAX)) as u64)
        .unwrap_or(0)
}

/// Durable, serializable state of one widget.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WidgetRecord {
    /// Stable opaque widget id, unique per widget.
    pub id: String,
    /// Logical owner id (diagnostics/grouping only).
    pub owner_id: String,
    /// Widget kind; selects the backend adapter.
    pub kind: WidgetKind,
    /// Validated, backend-ready configuration.
    pub config: WidgetConfig,
    /// Tree node id this widget is bound to; stable for the record.
    pub host_surface_id: String,
    /// Creation timestamp (ms since epoch).
    pub created_at: u64,
    /// Last health-confirmed timestamp (ms since epoch).
    pub last_seen_at: u64,
    /// Health flag; cleared by the mutation observer, restored by recovery.
    pub is_active: bool,
}

impl WidgetRecord {
    /// Creates a fresh record for a first successful render.
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        config: WidgetConfig,
        host_surface_id: impl Into<String>,
    ) -> Self {
        let now = now_ms();
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            kind: config.kind(),
            config,
            host_surface_id: host_surface_id.into(),
            created_at: now,
            last_seen_at: now,
            is_active: true,
        }
    }

    /// Builds the protection marker this record stamps on its host surface.
    pub fn marker(&self) -> ProtectionMarker {
        ProtectionMarker::new(self.id.as_str(), self.owner_id.as_str())
    }
}

/// Runtime half of a widget: the live backend handle and its binding.
///
/// Never serialized.
#[derive(Clone, Debug)]
pub struct WidgetInstance {
    /// Opaque handle returned by the backend's `create`.
    pub handle: BackendHandle,
    /// The host surface the handle is currently bound to.
    pub surface: SurfaceRef,
}

/// Diagnostic view of one registered widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WidgetStatus {
    /// Widget id.
    pub id: String,
    /// Logical owner id.
    pub owner_id: String,
    /// Widget kind.
    pub kind: WidgetKind,
    /// Health flag.
    pub is_active: bool,
    /// Whether a live backend instance currently exists.
    pub live: bool,
}
