use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use throbber_widgets_tui::ThrobberState;
use tracing::debug;

use super::projection::{resolve_tile_url, tile_for, MapPoint, MapProjection};
use super::{HostMapAdapter, LayerHandle, ListenerId, Notification, TileLayerConfig};
use crate::domain::GeoPoint;
use crate::timeseries::TimeSeriesChart;

/// How long a notification stays on screen
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);
const MAX_NOTIFICATIONS: usize = 4;

/// Narrowest longitude span the map zooms in to
const MIN_LNG_SPAN: f64 = 5.0;

/// Visible extent of the terminal map, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl Viewport {
    pub const WORLD: Self = Self {
        west: -180.0,
        east: 180.0,
        south: -90.0,
        north: 90.0,
    };

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// Scales the extent by `factor` around `focus`, staying inside the world
    pub fn zoomed(&self, factor: f64, focus: GeoPoint) -> Self {
        let lng_span = ((self.east - self.west) * factor).clamp(MIN_LNG_SPAN, 360.0);
        let lat_span = ((self.north - self.south) * factor).clamp(MIN_LNG_SPAN / 2.0, 180.0);

        let west = (focus.lng - lng_span / 2.0).clamp(-180.0, 180.0 - lng_span);
        let south = (focus.lat - lat_span / 2.0).clamp(-90.0, 90.0 - lat_span);

        Self {
            west,
            east: west + lng_span,
            south,
            north: south + lat_span,
        }
    }

    /// Slippy-map zoom level showing roughly the same longitude span
    pub fn tile_zoom(&self) -> u8 {
        let span = (self.east - self.west).max(MIN_LNG_SPAN);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let zoom = (360.0 / span).log2().round().clamp(0.0, 18.0) as u8;
        zoom
    }
}

#[derive(Debug, Clone)]
pub struct ActiveLayer {
    pub handle: LayerHandle,
    pub config: TileLayerConfig,
}

/// Chart modal contents. A new `canvas_id` is issued for every chart so a
/// refreshed modal never reuses the previous chart.
#[derive(Debug, Clone)]
pub struct ChartModal {
    pub canvas_id: u64,
    pub chart: TimeSeriesChart,
}

#[derive(Debug, Clone)]
pub struct ActiveNotification {
    pub notification: Notification,
    pub shown_at: Instant,
}

/// Terminal rendition of the host map: a world canvas in geographic
/// coordinates plus the modal and snackbar chrome the explorer drives.
#[derive(Debug)]
pub struct TerminalMap {
    viewport: Viewport,
    layers: Vec<ActiveLayer>,
    next_layer_id: u64,
    listener: Option<ListenerId>,
    next_listener_id: u64,
    markers: Vec<GeoPoint>,
    loading: bool,
    throbber: ThrobberState,
    chart: Option<ChartModal>,
    next_canvas_id: u64,
    notifications: VecDeque<ActiveNotification>,
}

impl TerminalMap {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::WORLD,
            layers: Vec::new(),
            next_layer_id: 1,
            listener: None,
            next_listener_id: 1,
            markers: Vec::new(),
            loading: false,
            throbber: ThrobberState::default(),
            chart: None,
            next_canvas_id: 1,
            notifications: VecDeque::new(),
        }
    }

    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn layers(&self) -> &[ActiveLayer] {
        &self.layers
    }

    pub fn markers(&self) -> &[GeoPoint] {
        &self.markers
    }

    pub const fn chart(&self) -> Option<&ChartModal> {
        self.chart.as_ref()
    }

    pub const fn click_listener(&self) -> Option<ListenerId> {
        self.listener
    }

    pub const fn throbber_state(&self) -> &ThrobberState {
        &self.throbber
    }

    pub fn notifications(&self) -> impl Iterator<Item = &ActiveNotification> {
        self.notifications.iter()
    }

    /// Advances animations and expires old notifications
    pub fn tick(&mut self, now: Instant) {
        if self.loading {
            self.throbber.calc_next();
        }
        while self
            .notifications
            .front()
            .is_some_and(|active| now.duration_since(active.shown_at) >= NOTIFICATION_TTL)
        {
            self.notifications.pop_front();
        }
    }

    pub fn zoom_in(&mut self) {
        let focus = self
            .markers
            .last()
            .copied()
            .unwrap_or_else(|| self.viewport.center());
        self.viewport = self.viewport.zoomed(0.5, focus);
    }

    pub fn zoom_out(&mut self) {
        self.viewport = self.viewport.zoomed(2.0, self.viewport.center());
    }

    pub fn reset_view(&mut self) {
        self.viewport = Viewport::WORLD;
    }

    /// Tile URL of the active layer at the centre of the view
    pub fn sample_tile_url(&self) -> Option<String> {
        let layer = self.layers.last()?;
        let zoom = self.viewport.tile_zoom();
        let (x, y) = tile_for(self.viewport.center(), zoom);
        Some(resolve_tile_url(&layer.config.url_template, zoom, x, y))
    }

    /// Maps a terminal cell inside `area` to native map coordinates, for the
    /// registered click listener only
    pub fn click_point(&self, area: Rect, column: u16, row: u16) -> Option<(ListenerId, MapPoint)> {
        let listener = self.listener?;
        if area.width == 0
            || area.height == 0
            || column < area.x
            || row < area.y
            || column >= area.x + area.width
            || row >= area.y + area.height
        {
            return None;
        }

        let fx = (f64::from(column - area.x) + 0.5) / f64::from(area.width);
        let fy = (f64::from(row - area.y) + 0.5) / f64::from(area.height);
        let lng = fx.mul_add(self.viewport.east - self.viewport.west, self.viewport.west);
        let lat = fy.mul_add(-(self.viewport.north - self.viewport.south), self.viewport.north);

        Some((listener, MapPoint::new(lng, lat)))
    }
}

impl Default for TerminalMap {
    fn default() -> Self {
        Self::new()
    }
}

impl HostMapAdapter for TerminalMap {
    fn projection(&self) -> MapProjection {
        MapProjection::Geographic
    }

    fn add_tile_layer(&mut self, config: TileLayerConfig) -> LayerHandle {
        let handle = LayerHandle(self.next_layer_id);
        self.next_layer_id += 1;
        debug!(%handle, url = %config.url_template, "adding tile layer");
        self.layers.push(ActiveLayer { handle, config });
        handle
    }

    fn remove_layer(&mut self, handle: LayerHandle) -> bool {
        let before = self.layers.len();
        self.layers.retain(|layer| layer.handle != handle);
        self.layers.len() != before
    }

    fn register_click_listener(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listener = Some(id);
        id
    }

    fn unregister_click_listener(&mut self, id: ListenerId) -> bool {
        if self.listener == Some(id) {
            self.listener = None;
            return true;
        }
        false
    }

    fn add_marker(&mut self, point: GeoPoint) {
        self.markers.push(point);
    }

    fn clear_markers(&mut self) {
        self.markers.clear();
    }

    fn show_loading_indicator(&mut self) {
        self.loading = true;
    }

    fn hide_loading_indicator(&mut self) {
        self.loading = false;
    }

    fn has_loading_indicator(&self) -> bool {
        self.loading
    }

    fn open_chart_modal(&mut self, chart: TimeSeriesChart) {
        let canvas_id = self.next_canvas_id;
        self.next_canvas_id += 1;
        self.chart = Some(ChartModal { canvas_id, chart });
    }

    fn close_modal(&mut self) {
        self.chart = None;
    }

    fn notify(&mut self, notification: Notification) {
        if self.notifications.len() == MAX_NOTIFICATIONS {
            self.notifications.pop_front();
        }
        self.notifications.push_back(ActiveNotification {
            notification,
            shown_at: Instant::now(),
        });
    }
}
