//! # Render request specification.
//!
//! [`WidgetSpec`] bundles everything a caller hands to
//! [`render_widget`](crate::WidgetEngine::render_widget): the widget id, its
//! logical owner, the target host surface, the kind **name** (unvalidated —
//! validation happens in [`widgets::validate`](crate::widgets::validate)),
//! the raw data payload, and the display theme.

use crate::widgets::config::Theme;

/// Specification of a single render request (untrusted input).
#[derive(Clone, Debug)]
pub struct WidgetSpec {
    /// Stable opaque widget id, unique per widget.
    pub id: String,
    /// Identifier of the logical owner (diagnostics/grouping only).
    pub owner_id: String,
    /// Identifier of the tree node the widget binds to.
    pub host_surface_id: String,
    /// Kind name as provided by the caller; unknown names are rejected.
    pub kind: String,
    /// Raw data payload, matched against the kind during validation.
    pub data: WidgetData,
    /// Binary display theme.
    pub theme: Theme,
}

impl WidgetSpec {
    /// Creates a series-widget request.
    pub fn series(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        host_surface_id: impl Into<String>,
        kind: impl Into<String>,
        data: SeriesData,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            host_surface_id: host_surface_id.into(),
            kind: kind.into(),
            data: WidgetData::Series(data),
            theme: Theme::default(),
        }
    }

    /// Creates a timeline-widget request.
    pub fn timeline(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        host_surface_id: impl Into<String>,
        data: TimelineData,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            host_surface_id: host_surface_id.into(),
            kind: "timeline".into(),
            data: WidgetData::Timeline(data),
            theme: Theme::default(),
        }
    }

    /// Overrides the display theme.
    #[inline]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }
}

/// Raw data payload of a render request.
#[derive(Clone, Debug)]
pub enum WidgetData {
    /// Labeled-category axis plus named data series.
    Series(SeriesData),
    /// Task list for the timeline kind.
    Timeline(TimelineData),
}

/// Data shape shared by the eight series kinds.
#[derive(Clone, Debug, Default)]
pub struct SeriesData {
    /// Category axis labels.
    pub labels: Vec<String>,
    /// Named data series.
    pub series: Vec<SeriesInput>,
}

/// One named data series, with optional caller display overrides.
///
/// The configuration builder only fills gaps: an explicit `color`, `fill`
/// or `tension` survives into the built config unchanged.
#[derive(Clone, Debug)]
pub struct SeriesInput {
    /// Series name (legend label). Must be non-empty.
    pub name: String,
    /// Data points, one per category label.
    pub values: Vec<f64>,
    /// Optional explicit color; defaults to the palette.
    pub color: Option<String>,
    /// Optional fill override (line kinds default to unfilled).
    pub fill: Option<bool>,
    /// Optional curve tension override (line kinds default to 0.4).
    pub tension: Option<f32>,
}

impl SeriesInput {
    /// Creates a series with default display options.
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
            color: None,
            fill: None,
            tension: None,
        }
    }
}

/// Data shape of the timeline kind.
#[derive(Clone, Debug, Default)]
pub struct TimelineData {
    /// Tasks to render; each must carry an id and a name.
    pub tasks: Vec<TaskInput>,
}

/// One timeline task. `start`/`end`/`progress`/`parent` are optional.
#[derive(Clone, Debug)]
pub struct TaskInput {
    /// Stable task id. Must be non-empty.
    pub id: String,
    /// Task display name. Must be non-empty.
    pub name: String,
    /// Optional ISO-8601 start date.
    pub start: Option<String>,
    /// Optional ISO-8601 end date.
    pub end: Option<String>,
    /// Optional completion ratio in `[0, 1]`.
    pub progress: Option<f32>,
    /// Optional parent task id (grouping).
    pub parent: Option<String>,
}

impl TaskInput {
    /// Creates a task with only the required fields set.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start: None,
            end: None,
            progress: None,
            parent: None,
        }
    }
}
