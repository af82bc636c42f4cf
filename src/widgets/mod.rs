//! Widget data model: kinds, render requests, validated configurations,
//! durable records.
//!
//! ## Contents
//! - [`WidgetKind`] closed enumeration of renderable kinds
//! - [`WidgetSpec`] / [`WidgetData`] untrusted render request payloads
//! - [`validate`] / [`WidgetConfig`] the configuration builder/validator
//! - [`WidgetRecord`] / [`WidgetInstance`] the durable/runtime split the
//!   registry stores per id

mod config;
mod kind;
mod record;
mod spec;

pub use config::{
    AxisStyle, Dataset, LINE_TENSION, PALETTE, SeriesConfig, Theme, TimelineConfig, TimelineTask,
    WidgetConfig, validate,
};
pub use kind::WidgetKind;
pub use record::{WidgetInstance, WidgetRecord, WidgetStatus};
pub use spec::{SeriesData, SeriesInput, TaskInput, TimelineData, WidgetData, WidgetSpec};

pub(crate) use record::now_ms;
