use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::api::ClimateApi;
use crate::app::events::{ApiEvent, RequestToken};
use crate::domain::{LayerQuery, PointQuery};

/// Runs remote calls off the UI loop.
///
/// Each call is spawned on the tokio runtime and its outcome is sent back as
/// an [`ApiEvent`] tagged with the token returned here. Calls are fire-once:
/// nothing is retried, deduplicated or cancelled.
#[derive(Clone)]
pub struct RequestDispatcher {
    api: Arc<dyn ClimateApi>,
    events: UnboundedSender<ApiEvent>,
    next_token: Arc<AtomicU64>,
}

impl RequestDispatcher {
    pub fn new(api: Arc<dyn ClimateApi>, events: UnboundedSender<ApiEvent>) -> Self {
        Self {
            api,
            events,
            next_token: Arc::new(AtomicU64::new(1)),
        }
    }

    fn issue(&self) -> RequestToken {
        RequestToken(self.next_token.fetch_add(1, Ordering::Relaxed))
    }

    fn post(events: &UnboundedSender<ApiEvent>, event: ApiEvent) {
        let (kind, request) = (event.kind(), event.request());
        if events.send(event).is_err() {
            // UI loop is gone, nobody is waiting for the answer
            warn!(kind, %request, "dropping response, event channel closed");
        }
    }

    pub fn validate_token(&self, token: &str) -> RequestToken {
        let request = self.issue();
        let (api, events, token) = (Arc::clone(&self.api), self.events.clone(), token.to_string());
        debug!(%request, "validating API key");

        tokio::spawn(async move {
            let result = api.validate_token(&token).await;
            Self::post(&events, ApiEvent::TokenValidated { request, token, result });
        });
        request
    }

    pub fn dataset_variables(&self, dataset: &str, token: &str) -> RequestToken {
        let request = self.issue();
        let (api, events) = (Arc::clone(&self.api), self.events.clone());
        let (dataset, token) = (dataset.to_string(), token.to_string());
        debug!(%request, %dataset, "fetching dataset variables");

        tokio::spawn(async move {
            let result = api.get_dataset_variables(&dataset, &token).await;
            Self::post(&events, ApiEvent::VariablesLoaded { request, dataset, result });
        });
        request
    }

    pub fn date_bounds(&self, dataset: &str, token: &str) -> RequestToken {
        let request = self.issue();
        let (api, events) = (Arc::clone(&self.api), self.events.clone());
        let (dataset, token) = (dataset.to_string(), token.to_string());
        debug!(%request, %dataset, "fetching date bounds");

        tokio::spawn(async move {
            let result = api.get_time_period_range(&dataset, &token).await;
            Self::post(&events, ApiEvent::BoundsLoaded { request, dataset, result });
        });
        request
    }

    pub fn map_layer(&self, query: LayerQuery, token: &str) -> RequestToken {
        let request = self.issue();
        let (api, events, token) = (Arc::clone(&self.api), self.events.clone(), token.to_string());
        debug!(%request, layer = %query.describe(), "requesting map layer");

        tokio::spawn(async move {
            let result = api.get_map_layer(&query, &token).await;
            Self::post(&events, ApiEvent::LayerLoaded { request, query, result });
        });
        request
    }

    pub fn time_series(&self, query: PointQuery, token: &str) -> RequestToken {
        let request = self.issue();
        let (api, events, token) = (Arc::clone(&self.api), self.events.clone(), token.to_string());
        debug!(%request, point = %query.point.label(), "requesting time series");

        tokio::spawn(async move {
            let result = api.get_time_series(&query, &token).await;
            Self::post(&events, ApiEvent::TimeSeriesLoaded { request, query, result });
        });
        request
    }
}

#[cfg(test)]
pub mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::api::{
        ApiError, ApiPayload, DatasetVariables, DateRangePayload, MapLayerPayload,
        TimeSeriesPayload, TokenCheck,
    };

    /// Canned responses keyed by dataset, shared by the app and controller tests
    #[derive(Default)]
    pub struct FakeApi {
        pub valid_keys: Vec<String>,
        pub variables: HashMap<String, Vec<String>>,
        pub bounds: HashMap<String, (String, String)>,
        pub layer_failure: Mutex<Option<String>>,
        pub time_series: Mutex<Option<serde_json::Value>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        pub fn landsat() -> Self {
            let mut api = Self {
                valid_keys: vec!["good-key".to_string()],
                ..Self::default()
            };
            api.variables.insert(
                "LANDSAT8_SR".to_string(),
                vec!["NDVI".to_string(), "NDWI".to_string()],
            );
            api.bounds.insert(
                "LANDSAT8_SR".to_string(),
                ("2013-01-01".to_string(), "2023-01-01".to_string()),
            );
            api.variables.insert(
                "GRIDMET".to_string(),
                vec!["pr".to_string(), "tmmx".to_string()],
            );
            api.bounds.insert(
                "GRIDMET".to_string(),
                ("1979-01-01".to_string(), "2024-06-30T00:00:00".to_string()),
            );
            api
        }

        pub fn record(&self, call: String) {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call);
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
        }

        fn failure<T>(detail: &str) -> Result<ApiPayload<T>, ApiError> {
            Ok(ApiPayload::Failure(crate::api::ApiFailure {
                detail: json!(detail),
            }))
        }
    }

    #[async_trait]
    impl ClimateApi for FakeApi {
        async fn validate_token(&self, token: &str) -> Result<ApiPayload<TokenCheck>, ApiError> {
            self.record(format!("validate_key {token}"));
            if self.valid_keys.iter().any(|key| key == token) {
                Ok(ApiPayload::Success(json!({"valid": true})))
            } else {
                Self::failure("Invalid API key")
            }
        }

        async fn get_time_period_range(
            &self,
            dataset: &str,
            _token: &str,
        ) -> Result<ApiPayload<DateRangePayload>, ApiError> {
            self.record(format!("dataset_dates {dataset}"));
            match self.bounds.get(dataset) {
                Some((min, max)) => Ok(ApiPayload::Success(DateRangePayload {
                    min: min.clone(),
                    max: max.clone(),
                })),
                None => Self::failure("Dataset not found"),
            }
        }

        async fn get_dataset_variables(
            &self,
            dataset: &str,
            _token: &str,
        ) -> Result<ApiPayload<DatasetVariables>, ApiError> {
            self.record(format!("dataset_variables {dataset}"));
            match self.variables.get(dataset) {
                Some(variables) => Ok(ApiPayload::Success(DatasetVariables {
                    variables: variables.clone(),
                })),
                None => Self::failure("Dataset not found"),
            }
        }

        async fn get_map_layer(
            &self,
            query: &LayerQuery,
            _token: &str,
        ) -> Result<ApiPayload<MapLayerPayload>, ApiError> {
            self.record(format!("map_layer {}", query.describe()));
            let failure = self.layer_failure.lock().ok().and_then(|f| f.clone());
            match failure {
                Some(detail) => Self::failure(&detail),
                None => Ok(ApiPayload::Success(MapLayerPayload {
                    tile_fetcher: format!(
                        "https://tiles.example/{}/{}/{}/{{z}}/{{x}}/{{y}}",
                        query.dataset,
                        query.variable,
                        crate::domain::format_api_date(query.end)
                    ),
                })),
            }
        }

        async fn get_time_series(
            &self,
            query: &PointQuery,
            _token: &str,
        ) -> Result<TimeSeriesPayload, ApiError> {
            self.record(format!("time_series {}", query.point.label()));
            let body = self
                .time_series
                .lock()
                .ok()
                .and_then(|body| body.clone())
                .unwrap_or_else(|| json!({"detail": "No data"}));
            Ok(serde_json::from_value(body.clone()).unwrap_or(TimeSeriesPayload::Other(body)))
        }
    }

    #[tokio::test]
    async fn test_tokens_increase_and_tag_responses() -> Result<(), Box<dyn std::error::Error>> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = RequestDispatcher::new(Arc::new(FakeApi::landsat()), tx);

        let first = dispatcher.dataset_variables("LANDSAT8_SR", "good-key");
        let second = dispatcher.date_bounds("LANDSAT8_SR", "good-key");
        assert!(second > first);

        let mut seen = Vec::new();
        for _ in 0..2 {
            let event = rx.recv().await.ok_or("channel closed")?;
            seen.push((event.kind(), event.request()));
        }
        seen.sort_by_key(|(_, request)| *request);
        assert_eq!(seen, vec![("dataset_variables", first), ("dataset_dates", second)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_closed_channel_drops_response_quietly() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let api = Arc::new(FakeApi::landsat());
        let dispatcher = RequestDispatcher::new(Arc::clone(&api) as Arc<dyn ClimateApi>, tx);

        dispatcher.validate_token("good-key");
        tokio::task::yield_now().await;
        for _ in 0..10 {
            if !api.calls().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(api.calls(), vec!["validate_key good-key".to_string()]);
    }
}
