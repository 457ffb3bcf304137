use std::fmt;

use crate::api::{
    ApiError, ApiPayload, DatasetVariables, DateRangePayload, MapLayerPayload, TimeSeriesPayload,
    TokenCheck,
};
use crate::domain::{LayerQuery, PointQuery};

/// Identifies one remote request. Tokens only ever increase, so a response
/// is current only if its token is the latest one issued for its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of a remote call, posted back to the UI loop
#[derive(Debug)]
pub enum ApiEvent {
    TokenValidated {
        request: RequestToken,
        token: String,
        result: Result<ApiPayload<TokenCheck>, ApiError>,
    },
    VariablesLoaded {
        request: RequestToken,
        dataset: String,
        result: Result<ApiPayload<DatasetVariables>, ApiError>,
    },
    BoundsLoaded {
        request: RequestToken,
        dataset: String,
        result: Result<ApiPayload<DateRangePayload>, ApiError>,
    },
    LayerLoaded {
        request: RequestToken,
        query: LayerQuery,
        result: Result<ApiPayload<MapLayerPayload>, ApiError>,
    },
    TimeSeriesLoaded {
        request: RequestToken,
        query: PointQuery,
        result: Result<TimeSeriesPayload, ApiError>,
    },
}

impl ApiEvent {
    pub const fn request(&self) -> RequestToken {
        match self {
            Self::TokenValidated { request, .. }
            | Self::VariablesLoaded { request, .. }
            | Self::BoundsLoaded { request, .. }
            | Self::LayerLoaded { request, .. }
            | Self::TimeSeriesLoaded { request, .. } => *request,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TokenValidated { .. } => "validate_key",
            Self::VariablesLoaded { .. } => "dataset_variables",
            Self::BoundsLoaded { .. } => "dataset_dates",
            Self::LayerLoaded { .. } => "map_layer",
            Self::TimeSeriesLoaded { .. } => "time_series",
        }
    }
}
