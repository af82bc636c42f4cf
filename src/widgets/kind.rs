//! # Widget kind enumeration.
//!
//! [`WidgetKind`] is the closed set of renderable widget types. Eight series
//! kinds share the category-axis data shape and the series backend adapter;
//! [`WidgetKind::Timeline`] carries a task list and renders through the
//! timeline adapter.
//!
//! Parsing an unknown kind name fails with
//! [`RenderError::UnsupportedType`](crate::RenderError::UnsupportedType) —
//! kinds are never coerced.

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Closed enumeration of supported widget kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetKind {
    /// Line chart (series).
    Line,
    /// Bar chart (series).
    Bar,
    /// Radar chart (series).
    Radar,
    /// Doughnut chart (series).
    Doughnut,
    /// Pie chart (series).
    Pie,
    /// Polar-area chart (series).
    PolarArea,
    /// Bubble chart (series).
    Bubble,
    /// Scatter chart (series).
    Scatter,
    /// Task timeline (gantt-style).
    Timeline,
}

impl WidgetKind {
    /// Parses a kind name as received from a caller.
    ///
    /// # Example
    /// ```
    /// use widgetvisor::WidgetKind;
    ///
    /// assert_eq!(WidgetKind::parse("polarArea").unwrap(), WidgetKind::PolarArea);
    /// assert!(WidgetKind::parse("heatmap").is_err());
    /// ```
    pub fn parse(name: &str) -> Result<Self, RenderError> {
        match name {
            "line" => Ok(WidgetKind::Line),
            "bar" => Ok(WidgetKind::Bar),
            "radar" => Ok(WidgetKind::Radar),
            "doughnut" => Ok(WidgetKind::Doughnut),
            "pie" => Ok(WidgetKind::Pie),
            "polarArea" => Ok(WidgetKind::PolarArea),
            "bubble" => Ok(WidgetKind::Bubble),
            "scatter" => Ok(WidgetKind::Scatter),
            "timeline" => Ok(WidgetKind::Timeline),
            other => Err(RenderError::UnsupportedType { kind: other.to_string() }),
        }
    }

    /// Returns the stable kind name.
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Line => "line",
            WidgetKind::Bar => "bar",
            WidgetKind::Radar => "radar",
            WidgetKind::Doughnut => "doughnut",
            WidgetKind::Pie => "pie",
            WidgetKind::PolarArea => "polarArea",
            WidgetKind::Bubble => "bubble",
            WidgetKind::Scatter => "scatter",
            WidgetKind::Timeline => "timeline",
        }
    }

    /// True for the timeline kind (task-list data shape, timeline adapter).
    #[inline]
    pub fn is_timeline(&self) -> bool {
        matches!(self, WidgetKind::Timeline)
    }
}

impl std::fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
