use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::endpoints::{
    dataset_query, endpoint_url, map_layer_query, time_series_query, Endpoint, QueryParams,
};
use super::error::ApiError;
use super::payloads::{
    ApiPayload, DatasetVariables, DateRangePayload, MapLayerPayload, TimeSeriesPayload, TokenCheck,
};
use crate::domain::{LayerQuery, PointQuery};

/// Operations the explorer needs from the climate data service.
///
/// Every call is a single authenticated GET. Errors reported by the service
/// itself come back inside the payload; only transport and decoding
/// problems are `Err`.
#[async_trait]
pub trait ClimateApi: Send + Sync {
    async fn validate_token(&self, token: &str) -> Result<ApiPayload<TokenCheck>, ApiError>;

    async fn get_time_period_range(
        &self,
        dataset: &str,
        token: &str,
    ) -> Result<ApiPayload<DateRangePayload>, ApiError>;

    async fn get_dataset_variables(
        &self,
        dataset: &str,
        token: &str,
    ) -> Result<ApiPayload<DatasetVariables>, ApiError>;

    async fn get_map_layer(
        &self,
        query: &LayerQuery,
        token: &str,
    ) -> Result<ApiPayload<MapLayerPayload>, ApiError>;

    async fn get_time_series(
        &self,
        query: &PointQuery,
        token: &str,
    ) -> Result<TimeSeriesPayload, ApiError>;
}

/// HTTP implementation of [`ClimateApi`]
#[derive(Debug, Clone)]
pub struct ClimateClient {
    http: reqwest::Client,
    base_url: String,
}

impl ClimateClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &QueryParams,
        token: &str,
    ) -> Result<T, ApiError> {
        let url = endpoint_url(&self.base_url, endpoint);
        debug!(%url, ?query, "GET climate api");

        let response = self
            .http
            .get(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, token)
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                endpoint: endpoint.path(),
                source,
            })?;

        // The service signals failures in the body, so the status is only logged
        debug!(status = %response.status(), endpoint = endpoint.path(), "climate api responded");

        response.json::<T>().await.map_err(|source| ApiError::Decode {
            endpoint: endpoint.path(),
            source,
        })
    }
}

#[async_trait]
impl ClimateApi for ClimateClient {
    async fn validate_token(&self, token: &str) -> Result<ApiPayload<TokenCheck>, ApiError> {
        self.get(Endpoint::ValidateKey, &Vec::new(), token).await
    }

    async fn get_time_period_range(
        &self,
        dataset: &str,
        token: &str,
    ) -> Result<ApiPayload<DateRangePayload>, ApiError> {
        self.get(Endpoint::DatasetDates, &dataset_query(dataset), token)
            .await
    }

    async fn get_dataset_variables(
        &self,
        dataset: &str,
        token: &str,
    ) -> Result<ApiPayload<DatasetVariables>, ApiError> {
        self.get(Endpoint::DatasetVariables, &dataset_query(dataset), token)
            .await
    }

    async fn get_map_layer(
        &self,
        query: &LayerQuery,
        token: &str,
    ) -> Result<ApiPayload<MapLayerPayload>, ApiError> {
        self.get(Endpoint::RasterMapId, &map_layer_query(query), token)
            .await
    }

    async fn get_time_series(
        &self,
        query: &PointQuery,
        token: &str,
    ) -> Result<TimeSeriesPayload, ApiError> {
        self.get(Endpoint::TimeseriesPoints, &time_series_query(query), token)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_rejects_non_http_base_url() {
        let result = ClimateClient::new("geodata.dri.edu", Duration::from_secs(5));
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_client_normalises_base_url() -> Result<(), ApiError> {
        let client = ClimateClient::new(" http://127.0.0.1:6000/ ", Duration::from_secs(5))?;
        assert_eq!(client.base_url(), "http://127.0.0.1:6000");
        Ok(())
    }
}
