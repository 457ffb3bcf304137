// Host map module
// The map viewer is an injected collaborator; the controller only talks to
// it through `HostMapAdapter`.

pub mod projection;
pub mod terminal;

use std::fmt;

use crate::domain::GeoPoint;
use crate::timeseries::TimeSeriesChart;

pub use projection::{MapPoint, MapProjection};
pub use terminal::TerminalMap;

/// Handle the host map returns for an added tile layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerHandle(pub u64);

impl fmt::Display for LayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ce-layer-{}", self.0)
    }
}

/// Identifies a registered click listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Raster tile layer sourced from a templated `{z}/{x}/{y}` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayerConfig {
    pub name: String,
    pub url_template: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Info,
    Warning,
    Error,
}

/// Transient message shown by the host (a snackbar)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

/// Capabilities the explorer needs from the map viewer it is embedded in
pub trait HostMapAdapter {
    /// Projection of the points delivered to click listeners
    fn projection(&self) -> MapProjection;

    fn add_tile_layer(&mut self, config: TileLayerConfig) -> LayerHandle;

    /// Returns false when the handle was not on the map
    fn remove_layer(&mut self, handle: LayerHandle) -> bool;

    fn register_click_listener(&mut self) -> ListenerId;

    fn unregister_click_listener(&mut self, id: ListenerId) -> bool;

    fn add_marker(&mut self, point: GeoPoint);

    fn clear_markers(&mut self);

    fn show_loading_indicator(&mut self);

    fn hide_loading_indicator(&mut self);

    fn has_loading_indicator(&self) -> bool;

    /// Opens the chart modal, or refreshes it with a brand new chart
    fn open_chart_modal(&mut self, chart: TimeSeriesChart);

    fn close_modal(&mut self);

    fn notify(&mut self, notification: Notification);
}
