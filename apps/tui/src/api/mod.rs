// Climate data API module
// Thin request layer over the remote climate data service

pub mod client;
pub mod endpoints;
pub mod error;
pub mod payloads;

pub use client::{ClimateApi, ClimateClient};
pub use error::ApiError;
pub use payloads::{
    ApiFailure, ApiPayload, DatasetVariables, DateRangePayload, MapLayerPayload, TimeSeriesPayload,
    TokenCheck,
};
