//! # Configuration builder and validator.
//!
//! Turns a [`WidgetSpec`] into a backend-ready [`WidgetConfig`].
//!
//! ## Rules
//! - Unknown kind names → [`RenderError::UnsupportedType`]; never coerced.
//! - Data shape mismatches → [`RenderError::MalformedConfig`].
//! - Series kinds require a non-empty category axis plus ≥ 1 named series.
//! - Timeline requires ≥ 1 task, each carrying a non-empty id and name
//!   (start/end/progress/parent optional).
//! - Colors are deterministic: series `i` gets `PALETTE[i % PALETTE.len()]`
//!   unless the caller supplied one. Axis/legend text and grid colors come
//!   from the binary theme flag.
//! - Line-kind series default to unfilled with a fixed curve tension unless
//!   the caller overrides either.

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::widgets::kind::WidgetKind;
use crate::widgets::spec::{SeriesData, TimelineData, WidgetData, WidgetSpec};

/// Fixed series color palette, indexed by `series_index % len`.
pub const PALETTE: [&str; 8] = [
    "#36a2eb", "#ff6384", "#4bc0c0", "#ff9f40", "#9966ff", "#ffcd56", "#c9cbcf", "#2ecc71",
];

/// Default curve tension for line-kind series.
pub const LINE_TENSION: f32 = 0.4;

/// Binary display theme selecting text and grid colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Theme {
    /// Dark text on light background.
    #[default]
    Light,
    /// Light text on dark background.
    Dark,
}

impl Theme {
    /// Axis/legend text color for this theme.
    pub fn text_color(&self) -> &'static str {
        match self {
            Theme::Light => "#0c1625",
            Theme::Dark => "#e6edf7",
        }
    }

    /// Grid line color for this theme.
    pub fn grid_color(&self) -> &'static str {
        match self {
            Theme::Light => "rgba(0, 0, 0, 0.06)",
            Theme::Dark => "rgba(255, 255, 255, 0.08)",
        }
    }
}

/// Validated, backend-ready widget configuration.
///
/// Stored inside [`WidgetRecord`](crate::WidgetRecord) and serialized into
/// durable snapshots; recovery rebuilds instances from this value alone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum WidgetConfig {
    /// Configuration for the eight series kinds.
    Series(SeriesConfig),
    /// Configuration for the timeline kind.
    Timeline(TimelineConfig),
}

impl WidgetConfig {
    /// Returns the widget kind this configuration renders as.
    pub fn kind(&self) -> WidgetKind {
        match self {
            WidgetConfig::Series(cfg) => cfg.kind,
            WidgetConfig::Timeline(_) => WidgetKind::Timeline,
        }
    }
}

/// Backend-ready configuration of a series widget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Concrete series kind (line, bar, …).
    pub kind: WidgetKind,
    /// Category axis labels.
    pub labels: Vec<String>,
    /// Fully resolved datasets (name, values, display options).
    pub datasets: Vec<Dataset>,
    /// Theme-derived axis/legend/grid colors.
    pub style: AxisStyle,
}

/// One resolved dataset of a series widget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Legend label.
    pub label: String,
    /// Data points.
    pub values: Vec<f64>,
    /// Resolved series color.
    pub color: String,
    /// Fill under the line (line kinds only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fill: Option<bool>,
    /// Curve tension (line kinds only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tension: Option<f32>,
}

/// Theme-derived display colors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisStyle {
    /// Axis and legend text color.
    pub text_color: String,
    /// Grid line color.
    pub grid_color: String,
}

impl AxisStyle {
    fn from_theme(theme: Theme) -> Self {
        Self {
            text_color: theme.text_color().to_string(),
            grid_color: theme.grid_color().to_string(),
        }
    }
}

/// Backend-ready configuration of a timeline widget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Validated task list.
    pub tasks: Vec<TimelineTask>,
}

/// One validated timeline task.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineTask {
    /// Stable task id.
    pub id: String,
    /// Task display name.
    pub name: String,
    /// Optional ISO-8601 start date.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub start: Option<String>,
    /// Optional ISO-8601 end date.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub end: Option<String>,
    /// Optional completion ratio.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub progress: Option<f32>,
    /// Optional parent task id.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<String>,
}

/// Validates a render request and builds its backend-ready configuration.
///
/// The two validation branches match the two data shapes: series widgets
/// require a labeled category axis plus at least one named series; timeline
/// widgets require a task list where every task carries an id and a name.
pub fn validate(spec: &WidgetSpec) -> Result<WidgetConfig, RenderError> {
    let kind = WidgetKind::parse(&spec.kind)?;
    match (&spec.data, kind.is_timeline()) {
        (WidgetData::Series(data), false) => build_series(kind, data, spec.theme),
        (WidgetData::Timeline(data), true) => build_timeline(data),
        (WidgetData::Series(_), true) => Err(RenderError::MalformedConfig {
            detail: "timeline kind requires a task list payload".into(),
        }),
        (WidgetData::Timeline(_), false) => Err(RenderError::MalformedConfig {
            detail: format!("kind {kind} requires a series payload"),
        }),
    }
}

fn build_series(kind: WidgetKind, data: &SeriesData, theme: Theme) -> Result<WidgetConfig, RenderError> {
    if data.labels.is_empty() {
        return Err(RenderError::MalformedConfig {
            detail: "series widget requires at least one category label".into(),
        });
    }
    if data.series.is_empty() {
        return Err(RenderError::MalformedConfig {
            detail: "series widget requires at least one data series".into(),
        });
    }

    let mut datasets = Vec::with_capacity(data.series.len());
    for (index, series) in data.series.iter().enumerate() {
        if series.name.trim().is_empty() {
            return Err(RenderError::MalformedConfig {
                detail: format!("series #{index} is missing a name"),
            });
        }
        let color = series
            .color
            .clone()
            .unwrap_or_else(|| PALETTE[index % PALETTE.len()].to_string());
        let (fill, tension) = if kind == WidgetKind::Line {
            (Some(series.fill.unwrap_or(false)), Some(series.tension.unwrap_or(LINE_TENSION)))
        } else {
            (series.fill, series.tension)
        };
        datasets.push(Dataset {
            label: series.name.clone(),
            values: series.values.clone(),
            color,
            fill,
            tension,
        });
    }

    Ok(WidgetConfig::Series(SeriesConfig {
        kind,
        labels: data.labels.clone(),
        datasets,
        style: AxisStyle::from_theme(theme),
    }))
}

fn build_timeline(data: &TimelineData) -> Result<WidgetConfig, RenderError> {
    if data.tasks.is_empty() {
        return Err(RenderError::MalformedConfig {
            detail: "timeline widget requires at least one task".into(),
        });
    }

    let mut tasks = Vec::with_capacity(data.tasks.len());
    for (index, task) in data.tasks.iter().enumerate() {
        if task.id.trim().is_empty() || task.name.trim().is_empty() {
            return Err(RenderError::MalformedConfig {
                detail: format!("task #{index} is missing an id or name"),
            });
        }
        tasks.push(TimelineTask {
            id: task.id.clone(),
            name: task.name.clone(),
            start: task.start.clone(),
            end: task.end.clone(),
            progress: task.progress,
            parent: task.parent.clone(),
        });
    }

    Ok(WidgetConfig::Timeline(TimelineConfig { tasks }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::spec::{SeriesInput, TaskInput};

    fn series_spec(kind: &str, labels: &[&str], series: Vec<SeriesInput>) -> WidgetSpec {
        WidgetSpec::series(
            "w1",
            "owner-1",
            "surface-1",
            kind,
            SeriesData {
                labels: labels.iter().map(|s| s.to_string()).collect(),
                series,
            },
        )
    }

    #[test]
    fn unsupported_kind_is_rejected() {
        let spec = series_spec("heatmap", &["a"], vec![SeriesInput::new("s", vec![1.0])]);
        let err = validate(&spec).unwrap_err();
        assert_eq!(err.as_label(), "unsupported_type");
    }

    #[test]
    fn empty_labels_are_malformed() {
        let spec = series_spec("bar", &[], vec![SeriesInput::new("s", vec![1.0])]);
        assert_eq!(validate(&spec).unwrap_err().as_label(), "malformed_config");
    }

    #[test]
    fn unnamed_series_is_malformed() {
        let spec = series_spec("bar", &["a"], vec![SeriesInput::new("  ", vec![1.0])]);
        assert_eq!(validate(&spec).unwrap_err().as_label(), "malformed_config");
    }

    #[test]
    fn payload_kind_mismatch_is_malformed() {
        let spec = WidgetSpec::series(
            "w1",
            "owner-1",
            "surface-1",
            "timeline",
            SeriesData {
                labels: vec!["a".into()],
                series: vec![SeriesInput::new("s", vec![1.0])],
            },
        );
        assert_eq!(validate(&spec).unwrap_err().as_label(), "malformed_config");
    }

    #[test]
    fn palette_assignment_is_deterministic_and_wraps() {
        let series: Vec<SeriesInput> = (0..PALETTE.len() + 1)
            .map(|i| SeriesInput::new(format!("s{i}"), vec![1.0]))
            .collect();
        let spec = series_spec("bar", &["a"], series);
        let WidgetConfig::Series(cfg) = validate(&spec).unwrap() else {
            panic!("expected series config");
        };
        assert_eq!(cfg.datasets[0].color, PALETTE[0]);
        assert_eq!(cfg.datasets[PALETTE.len()].color, PALETTE[0]);
        assert_eq!(cfg.datasets[3].color, PALETTE[3]);
    }

    #[test]
    fn caller_color_override_survives() {
        let mut series = SeriesInput::new("s", vec![1.0]);
        series.color = Some("#123456".into());
        let spec = series_spec("bar", &["a"], vec![series]);
        let WidgetConfig::Series(cfg) = validate(&spec).unwrap() else {
            panic!("expected series config");
        };
        assert_eq!(cfg.datasets[0].color, "#123456");
    }

    #[test]
    fn line_defaults_unfilled_with_tension() {
        let spec = series_spec("line", &["a", "b"], vec![SeriesInput::new("s", vec![1.0, 2.0])]);
        let WidgetConfig::Series(cfg) = validate(&spec).unwrap() else {
            panic!("expected series config");
        };
        assert_eq!(cfg.datasets[0].fill, Some(false));
        assert_eq!(cfg.datasets[0].tension, Some(LINE_TENSION));
    }

    #[test]
    fn line_overrides_are_respected() {
        let mut series = SeriesInput::new("s", vec![1.0]);
        series.fill = Some(true);
        series.tension = Some(0.0);
        let spec = series_spec("line", &["a"], vec![series]);
        let WidgetConfig::Series(cfg) = validate(&spec).unwrap() else {
            panic!("expected series config");
        };
        assert_eq!(cfg.datasets[0].fill, Some(true));
        assert_eq!(cfg.datasets[0].tension, Some(0.0));
    }

    #[test]
    fn bar_leaves_line_options_unset() {
        let spec = series_spec("bar", &["a"], vec![SeriesInput::new("s", vec![1.0])]);
        let WidgetConfig::Series(cfg) = validate(&spec).unwrap() else {
            panic!("expected series config");
        };
        assert_eq!(cfg.datasets[0].fill, None);
        assert_eq!(cfg.datasets[0].tension, None);
    }

    #[test]
    fn themes_select_distinct_colors() {
        let light = series_spec("bar", &["a"], vec![SeriesInput::new("s", vec![1.0])]);
        let dark = light.clone().with_theme(Theme::Dark);
        let (WidgetConfig::Series(l), WidgetConfig::Series(d)) =
            (validate(&light).unwrap(), validate(&dark).unwrap())
        else {
            panic!("expected series configs");
        };
        assert_ne!(l.style.text_color, d.style.text_color);
        assert_ne!(l.style.grid_color, d.style.grid_color);
    }

    #[test]
    fn timeline_requires_task_identity() {
        let spec = WidgetSpec::timeline(
            "t1",
            "owner-1",
            "surface-1",
            TimelineData { tasks: vec![TaskInput::new("", "design")] },
        );
        assert_eq!(validate(&spec).unwrap_err().as_label(), "malformed_config");

        let ok = WidgetSpec::timeline(
            "t1",
            "owner-1",
            "surface-1",
            TimelineData {
                tasks: vec![TaskInput::new("a", "design"), TaskInput::new("b", "build")],
            },
        );
        let WidgetConfig::Timeline(cfg) = validate(&ok).unwrap() else {
            panic!("expected timeline config");
        };
        assert_eq!(cfg.tasks.len(), 2);
        assert!(cfg.tasks[0].start.is_none());
    }

    #[test]
    fn config_serde_round_trip() {
        let spec = series_spec("line", &["a", "b"], vec![SeriesInput::new("s", vec![1.0, 2.0])]);
        let config = validate(&spec).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: WidgetConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.kind(), WidgetKind::Line);
    }
}
