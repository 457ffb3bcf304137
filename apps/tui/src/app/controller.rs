use std::convert::TryFrom;
use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{
    ApiError, ApiPayload, DatasetVariables, DateRangePayload, MapLayerPayload, TimeSeriesPayload,
};
use crate::app::actions::RequestDispatcher;
use crate::app::events::{ApiEvent, RequestToken};
use crate::app::selection::DatasetSelectionState;
use crate::domain::{DateBounds, LayerQuery, PointQuery};
use crate::map::{HostMapAdapter, LayerHandle, ListenerId, MapPoint, Notification, TileLayerConfig};
use crate::timeseries::{build_series, TimeSeriesChart};

// Layer lifecycle states
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LayerState {
    Uninitialized,
    AwaitingBounds,
    Idle,
    Loading,
    Displayed,
}

impl fmt::Display for LayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::AwaitingBounds => write!(f, "AwaitingBounds"),
            Self::Idle => write!(f, "Idle"),
            Self::Loading => write!(f, "Loading"),
            Self::Displayed => write!(f, "Displayed"),
        }
    }
}

// Events driving the layer lifecycle
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LayerEvent {
    Mount,
    DatasetChanged,
    BoundsReceived,
    RefreshRequested,
    LayerReady,
    LayerFailed,
    Unmount,
}

impl fmt::Display for LayerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mount => write!(f, "Mount"),
            Self::DatasetChanged => write!(f, "DatasetChanged"),
            Self::BoundsReceived => write!(f, "BoundsReceived"),
            Self::RefreshRequested => write!(f, "RefreshRequested"),
            Self::LayerReady => write!(f, "LayerReady"),
            Self::LayerFailed => write!(f, "LayerFailed"),
            Self::Unmount => write!(f, "Unmount"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid transition from {from} with event {event}")]
pub struct StateTransitionError {
    pub from: LayerState,
    pub event: LayerEvent,
}

// Helper struct for state transitions
struct NextState(LayerState);

impl TryFrom<(LayerState, LayerEvent)> for NextState {
    type Error = StateTransitionError;

    fn try_from(value: (LayerState, LayerEvent)) -> Result<Self, Self::Error> {
        use LayerEvent as E;
        use LayerState as S;

        let (current, event) = value;
        let next = match (current, event) {
            (S::Uninitialized, E::Mount) => S::AwaitingBounds,
            (S::AwaitingBounds | S::Idle | S::Loading | S::Displayed, E::DatasetChanged) => {
                S::AwaitingBounds
            }
            (S::AwaitingBounds, E::BoundsReceived) => S::Idle,
            // A refresh while loading supersedes the request in flight
            (S::Idle | S::Loading | S::Displayed, E::RefreshRequested) => S::Loading,
            (S::Loading, E::LayerReady) => S::Displayed,
            (S::Loading, E::LayerFailed) => S::Idle,
            (S::AwaitingBounds | S::Idle | S::Loading | S::Displayed, E::Unmount) => {
                S::Uninitialized
            }
            _ => {
                return Err(StateTransitionError {
                    from: current,
                    event,
                })
            }
        };
        Ok(Self(next))
    }
}

/// Latest request issued for each kind of response the controller applies
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct PendingRequests {
    variables: Option<RequestToken>,
    /// Whether the pending variable fetch is a dataset switch, which is
    /// followed by a bounds fetch once it succeeds
    switching_dataset: bool,
    bounds: Option<RequestToken>,
    layer: Option<RequestToken>,
    time_series: Option<RequestToken>,
}

impl PendingRequests {
    const fn any(&self) -> bool {
        self.variables.is_some()
            || self.bounds.is_some()
            || self.layer.is_some()
            || self.time_series.is_some()
    }
}

/// Variables of a dataset being switched to, held back until its date
/// bounds arrive so the selection never mixes two datasets
#[derive(Debug, Clone, PartialEq, Eq)]
struct StagedSwitch {
    dataset: String,
    variables: Vec<String>,
}

/// Everything the controller works on, borrowed for one operation
pub struct ControllerContext<'a> {
    pub selection: &'a mut DatasetSelectionState,
    pub dispatcher: &'a RequestDispatcher,
    pub map: &'a mut dyn HostMapAdapter,
    pub credential: &'a str,
}

/// Keeps the host map's tile layer in sync with the dataset selection and
/// turns map clicks into time series charts.
#[derive(Debug)]
pub struct LayerRefreshController {
    state: LayerState,
    layer: Option<LayerHandle>,
    listener: Option<ListenerId>,
    pending: PendingRequests,
    staged: Option<StagedSwitch>,
}

impl Default for LayerRefreshController {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerRefreshController {
    pub const fn new() -> Self {
        Self {
            state: LayerState::Uninitialized,
            layer: None,
            listener: None,
            pending: PendingRequests {
                variables: None,
                switching_dataset: false,
                bounds: None,
                layer: None,
                time_series: None,
            },
            staged: None,
        }
    }

    pub const fn state(&self) -> LayerState {
        self.state
    }

    pub const fn layer(&self) -> Option<LayerHandle> {
        self.layer
    }

    pub const fn click_listener(&self) -> Option<ListenerId> {
        self.listener
    }

    pub const fn is_mounted(&self) -> bool {
        !matches!(self.state, LayerState::Uninitialized)
    }

    /// Whether any response is still expected
    pub const fn has_pending(&self) -> bool {
        self.pending.any()
    }

    pub const fn is_fetching_series(&self) -> bool {
        self.pending.time_series.is_some()
    }

    /// Dataset whose variables arrived and whose dates are still loading
    pub fn switching_to(&self) -> Option<&str> {
        self.staged.as_ref().map(|staged| staged.dataset.as_str())
    }

    fn transition(&mut self, event: LayerEvent) -> Result<LayerState, StateTransitionError> {
        let NextState(next) = NextState::try_from((self.state, event))?;
        debug!(from = %self.state, to = %next, %event, "layer state transition");
        self.state = next;
        Ok(next)
    }

    /// Binds the controller to the map and starts loading the current
    /// dataset's variables and date bounds
    pub fn mount(&mut self, ctx: &mut ControllerContext<'_>) {
        if let Err(e) = self.transition(LayerEvent::Mount) {
            debug!("{e}");
            return;
        }

        self.listener = Some(ctx.map.register_click_listener());

        let dataset = ctx.selection.dataset().to_string();
        info!(%dataset, "explorer mounted");
        self.pending.variables = Some(ctx.dispatcher.dataset_variables(&dataset, ctx.credential));
        self.pending.switching_dataset = false;
        self.pending.bounds = Some(ctx.dispatcher.date_bounds(&dataset, ctx.credential));
    }

    /// Releases everything the controller put on the map. Outstanding
    /// responses are forgotten and ignored when they arrive.
    pub fn unmount(&mut self, map: &mut dyn HostMapAdapter) {
        if let Err(e) = self.transition(LayerEvent::Unmount) {
            debug!("{e}");
            return;
        }

        if let Some(handle) = self.layer.take() {
            map.remove_layer(handle);
        }
        if let Some(listener) = self.listener.take() {
            map.unregister_click_listener(listener);
        }
        map.hide_loading_indicator();
        map.close_modal();
        map.clear_markers();
        self.pending = PendingRequests::default();
        self.staged = None;
        info!("explorer unmounted");
    }

    /// Fetches the variables and then the date bounds of `dataset`. The
    /// selection switches only once both have arrived.
    pub fn select_dataset(&mut self, dataset: &str, ctx: &mut ControllerContext<'_>) {
        if !self.is_mounted() {
            return;
        }
        if self.staged.take().is_some() {
            // Dates of the abandoned switch
            self.pending.bounds = None;
        }
        self.pending.variables = Some(ctx.dispatcher.dataset_variables(dataset, ctx.credential));
        self.pending.switching_dataset = true;
    }

    pub fn select_variable(&mut self, variable: &str, ctx: &mut ControllerContext<'_>) -> bool {
        if !ctx.selection.select_variable(variable) {
            return false;
        }
        self.selection_changed(ctx);
        true
    }

    /// Steps through the variable list
    pub fn cycle_variable(&mut self, forward: bool, ctx: &mut ControllerContext<'_>) -> bool {
        if !ctx.selection.cycle_variable(forward) {
            return false;
        }
        self.selection_changed(ctx);
        true
    }

    pub fn select_date_range(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        ctx: &mut ControllerContext<'_>,
    ) -> bool {
        if ctx.selection.select_date_range(start, end).is_none() {
            return false;
        }
        self.selection_changed(ctx);
        true
    }

    fn selection_changed(&mut self, ctx: &mut ControllerContext<'_>) {
        if !self.is_mounted() {
            return;
        }
        self.rebind_click_listener(ctx.map);
        self.reload(ctx);
    }

    /// Requests the layer again, first re-fetching whatever metadata of the
    /// current dataset failed to load. Returns whether anything was requested.
    pub fn reload(&mut self, ctx: &mut ControllerContext<'_>) -> bool {
        if !self.is_mounted() {
            return false;
        }
        self.fetch_missing_metadata(ctx) || self.refresh(ctx)
    }

    /// Re-issues the variable and bounds fetches the current dataset still
    /// lacks, unless one is already in flight or a switch is staged
    fn fetch_missing_metadata(&mut self, ctx: &mut ControllerContext<'_>) -> bool {
        if self.staged.is_some() {
            return false;
        }
        let dataset = ctx.selection.dataset().to_string();
        let mut issued = false;

        if ctx.selection.variables().is_empty() && self.pending.variables.is_none() {
            info!(%dataset, "fetching missing variables");
            self.pending.variables =
                Some(ctx.dispatcher.dataset_variables(&dataset, ctx.credential));
            self.pending.switching_dataset = false;
            issued = true;
        }
        if self.state == LayerState::AwaitingBounds && self.pending.bounds.is_none() {
            info!(%dataset, "fetching missing date bounds");
            self.pending.bounds = Some(ctx.dispatcher.date_bounds(&dataset, ctx.credential));
            issued = true;
        }
        issued
    }

    /// Requests a layer for the current selection. Needs bounds to have
    /// arrived and a complete selection.
    pub fn refresh(&mut self, ctx: &mut ControllerContext<'_>) -> bool {
        let Some(query) = ctx.selection.layer_query() else {
            debug!("selection incomplete, not refreshing");
            return false;
        };
        if let Err(e) = self.transition(LayerEvent::RefreshRequested) {
            debug!("{e}");
            return false;
        }

        ctx.map.hide_loading_indicator();
        self.pending.layer = Some(ctx.dispatcher.map_layer(query, ctx.credential));
        true
    }

    /// Replaces the click listener so exactly one stays bound
    pub fn rebind_click_listener(&mut self, map: &mut dyn HostMapAdapter) {
        if let Some(listener) = self.listener.take() {
            map.unregister_click_listener(listener);
        }
        self.listener = Some(map.register_click_listener());
    }

    /// Handles a click delivered to `listener` at `point`, given in the
    /// map's native projection
    pub fn handle_click(
        &mut self,
        listener: ListenerId,
        point: MapPoint,
        ctx: &mut ControllerContext<'_>,
    ) {
        if self.listener != Some(listener) {
            debug!(?listener, "click from an unbound listener");
            return;
        }

        let location = ctx.map.projection().to_geographic(point);
        ctx.map.clear_markers();
        ctx.map.add_marker(location);

        let Some(layer) = ctx.selection.layer_query() else {
            ctx.map
                .notify(Notification::info("Dates are still loading, try again shortly"));
            return;
        };

        let query = PointQuery {
            point: location,
            layer,
        };
        self.pending.time_series = Some(ctx.dispatcher.time_series(query, ctx.credential));
    }

    /// Applies a remote response if it answers the latest request of its
    /// kind. Token validation is handled by the session, not here.
    pub fn handle_event(&mut self, event: ApiEvent, ctx: &mut ControllerContext<'_>) {
        match event {
            ApiEvent::VariablesLoaded {
                request,
                dataset,
                result,
            } => {
                if !Self::is_current(&mut self.pending.variables, request) {
                    return;
                }
                self.on_variables(&dataset, result, ctx);
            }
            ApiEvent::BoundsLoaded {
                request,
                dataset,
                result,
            } => {
                if !Self::is_current(&mut self.pending.bounds, request) {
                    return;
                }
                self.on_bounds(&dataset, result, ctx);
            }
            ApiEvent::LayerLoaded {
                request,
                query,
                result,
            } => {
                if !Self::is_current(&mut self.pending.layer, request) {
                    return;
                }
                self.on_layer(&query, result, ctx);
            }
            ApiEvent::TimeSeriesLoaded {
                request,
                query,
                result,
            } => {
                if !Self::is_current(&mut self.pending.time_series, request) {
                    return;
                }
                Self::on_time_series(&query, result, ctx.map);
            }
            ApiEvent::TokenValidated { request, .. } => {
                debug!(%request, "token validation is not a layer event");
            }
        }
    }

    /// Clears the slot when `request` is the one it holds
    fn is_current(slot: &mut Option<RequestToken>, request: RequestToken) -> bool {
        if *slot == Some(request) {
            *slot = None;
            return true;
        }
        debug!(%request, latest = ?slot, "ignoring stale response");
        false
    }

    fn on_variables(
        &mut self,
        dataset: &str,
        result: Result<ApiPayload<DatasetVariables>, ApiError>,
        ctx: &mut ControllerContext<'_>,
    ) {
        let switching = std::mem::take(&mut self.pending.switching_dataset);
        let variables = match result.map(ApiPayload::into_result) {
            Ok(Ok(payload)) if !payload.variables.is_empty() => payload.variables,
            Ok(Ok(_)) => {
                warn!(%dataset, "empty variable list");
                self.variables_failed(
                    switching,
                    Notification::warning(format!("No variables available for {dataset}")),
                    ctx,
                );
                return;
            }
            Ok(Err(failure)) => {
                warn!(%dataset, detail = %failure.message(), "variables unavailable");
                self.variables_failed(
                    switching,
                    Notification::error(format!(
                        "Could not load variables for {dataset}: {}",
                        failure.message()
                    )),
                    ctx,
                );
                return;
            }
            Err(e) => {
                warn!(%dataset, error = %e, "variables request failed");
                self.variables_failed(
                    switching,
                    Notification::error(format!("Could not load variables: {e}")),
                    ctx,
                );
                return;
            }
        };

        if switching {
            info!(%dataset, count = variables.len(), "variables loaded, waiting for dates");
            self.staged = Some(StagedSwitch {
                dataset: dataset.to_string(),
                variables,
            });
            self.pending.bounds = Some(ctx.dispatcher.date_bounds(dataset, ctx.credential));
            return;
        }

        ctx.selection.apply_variables(dataset, variables);
        info!(%dataset, variable = ?ctx.selection.variable(), "variables loaded");
        if matches!(self.state, LayerState::Idle | LayerState::Displayed) {
            // Bounds won the race on mount
            if !self.refresh(ctx) {
                ctx.map.hide_loading_indicator();
            }
        }
    }

    fn variables_failed(
        &mut self,
        switching: bool,
        notification: Notification,
        ctx: &mut ControllerContext<'_>,
    ) {
        ctx.map.notify(notification);
        if switching {
            // The switch may have superseded fetches for the current dataset
            self.fetch_missing_metadata(ctx);
        } else if self.state == LayerState::Idle && self.pending.layer.is_none() {
            // Nothing can load until the variables are fetched again
            ctx.map.hide_loading_indicator();
        }
    }

    fn on_bounds(
        &mut self,
        dataset: &str,
        result: Result<ApiPayload<DateRangePayload>, ApiError>,
        ctx: &mut ControllerContext<'_>,
    ) {
        let staged = self.staged.take();
        let Some(bounds) = Self::parse_bounds(dataset, result, ctx.map) else {
            if staged.is_some() {
                info!(%dataset, current = %ctx.selection.dataset(), "dataset switch abandoned");
                self.fetch_missing_metadata(ctx);
            }
            return;
        };

        if let Some(switch) = staged {
            if let Err(e) = self.transition(LayerEvent::DatasetChanged) {
                debug!("{e}");
                return;
            }
            ctx.selection.apply_variables(&switch.dataset, switch.variables);
            // Anything still loading belongs to the previous dataset
            self.pending.layer = None;
            self.rebind_click_listener(ctx.map);
            info!(dataset = %switch.dataset, "dataset switched");
        }

        if let Err(e) = self.transition(LayerEvent::BoundsReceived) {
            debug!("{e}");
            return;
        }
        ctx.selection.apply_bounds(bounds);
        ctx.map.show_loading_indicator();
        info!(%dataset, min = %bounds.min, max = %bounds.max, "date bounds loaded");

        // The default dates count as a date change
        if !self.refresh(ctx) && self.pending.variables.is_none() {
            ctx.map.hide_loading_indicator();
        }
    }

    fn parse_bounds(
        dataset: &str,
        result: Result<ApiPayload<DateRangePayload>, ApiError>,
        map: &mut dyn HostMapAdapter,
    ) -> Option<DateBounds> {
        let range = match result.map(ApiPayload::into_result) {
            Ok(Ok(range)) => range,
            Ok(Err(failure)) => {
                warn!(%dataset, detail = %failure.message(), "date bounds unavailable");
                map.notify(Notification::error(format!(
                    "Could not load dates for {dataset}: {}",
                    failure.message()
                )));
                return None;
            }
            Err(e) => {
                warn!(%dataset, error = %e, "date bounds request failed");
                map.notify(Notification::error(format!("Could not load dates: {e}")));
                return None;
            }
        };

        let bounds = DateBounds::parse(&range.min, &range.max);
        if bounds.is_none() {
            warn!(%dataset, min = %range.min, max = %range.max, "unparseable date bounds");
            map.notify(Notification::error(format!(
                "{dataset} reported an invalid date range"
            )));
        }
        bounds
    }

    fn on_layer(
        &mut self,
        query: &LayerQuery,
        result: Result<ApiPayload<MapLayerPayload>, ApiError>,
        ctx: &mut ControllerContext<'_>,
    ) {
        let failure = match result.map(ApiPayload::into_result) {
            Ok(Ok(payload)) => {
                if let Some(previous) = self.layer.take() {
                    ctx.map.remove_layer(previous);
                }
                let handle = ctx.map.add_tile_layer(TileLayerConfig {
                    name: query.describe(),
                    url_template: payload.tile_fetcher,
                });
                self.layer = Some(handle);

                if let Err(e) = self.transition(LayerEvent::LayerReady) {
                    debug!("{e}");
                }
                info!(%handle, layer = %query.describe(), "layer displayed");
                ctx.map.notify(Notification::success(format!(
                    "Layer loaded: {}",
                    query.describe()
                )));
                return;
            }
            Ok(Err(failure)) => failure.message(),
            Err(e) => e.to_string(),
        };

        warn!(layer = %query.describe(), error = %failure, "layer request failed");
        if let Err(e) = self.transition(LayerEvent::LayerFailed) {
            debug!("{e}");
        }
        ctx.map
            .notify(Notification::error(format!("Could not load layer: {failure}")));
    }

    fn on_time_series(
        query: &PointQuery,
        result: Result<TimeSeriesPayload, ApiError>,
        map: &mut dyn HostMapAdapter,
    ) {
        let payload = match result {
            Ok(payload) => payload,
            Err(e) => {
                warn!(point = %query.point.label(), error = %e, "time series request failed");
                map.notify(Notification::error(format!("Could not load time series: {e}")));
                return;
            }
        };

        match build_series(&payload, &query.layer.variable) {
            Some(points) if !points.is_empty() => {
                debug!(points = points.len(), "opening time series chart");
                map.open_chart_modal(TimeSeriesChart::new(query, points));
            }
            _ => {
                info!(point = %query.point.label(), "no time series points");
                map.notify(Notification::warning(format!(
                    "No points found at {}",
                    query.point.label()
                )));
            }
        }
    }
}
