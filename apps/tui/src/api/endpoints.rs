use crate::domain::{format_api_date, LayerQuery, PointQuery};

/// Production endpoint of the climate data service
pub const DEFAULT_API_URL: &str = "https://geodata.dri.edu";

/// Every layer and point request is aggregated with the mean
const TEMPORAL_STATISTIC: &str = "mean";
const AREA_REDUCER: &str = "mean";

/// End points of the climate data API used by the explorer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ValidateKey,
    DatasetVariables,
    DatasetDates,
    RasterMapId,
    TimeseriesPoints,
}

impl Endpoint {
    pub const fn path(self) -> &'static str {
        match self {
            Self::ValidateKey => "/home/validate_key",
            Self::DatasetVariables => "/metadata/dataset_variables",
            Self::DatasetDates => "/metadata/dataset_dates",
            Self::RasterMapId => "/raster/mapid/values",
            Self::TimeseriesPoints => "/timeseries/native/points",
        }
    }
}

pub type QueryParams = Vec<(&'static str, String)>;

pub fn dataset_query(dataset: &str) -> QueryParams {
    vec![("dataset", dataset.to_string())]
}

pub fn map_layer_query(query: &LayerQuery) -> QueryParams {
    vec![
        ("dataset", query.dataset.clone()),
        ("variable", query.variable.clone()),
        ("temporal_statistic", TEMPORAL_STATISTIC.to_string()),
        ("start_date", format_api_date(query.start)),
        ("end_date", format_api_date(query.end)),
    ]
}

/// Coordinates go out as `[[lng,lat]]`, longitude first
pub fn time_series_query(query: &PointQuery) -> QueryParams {
    vec![
        ("dataset", query.layer.dataset.clone()),
        ("variable", query.layer.variable.clone()),
        ("area_reducer", AREA_REDUCER.to_string()),
        ("start_date", format_api_date(query.layer.start)),
        ("end_date", format_api_date(query.layer.end)),
        (
            "coordinates",
            format!("[[{},{}]]", query.point.lng, query.point.lat),
        ),
    ]
}

/// Joins the base URL and an endpoint path without doubling the slash
pub fn endpoint_url(base_url: &str, endpoint: Endpoint) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), endpoint.path())
}
