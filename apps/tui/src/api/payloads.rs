use serde::Deserialize;
use serde_json::{Map, Value};

/// Error shape the API returns in-band, usually with a 2xx status
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiFailure {
    #[serde(alias = "details")]
    pub detail: Value,
}

impl ApiFailure {
    pub fn message(&self) -> String {
        match &self.detail {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Either the expected payload or the in-band failure.
///
/// The failure arm is tried first, so any body carrying `detail`/`details`
/// is a failure regardless of what else it contains.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ApiPayload<T> {
    Failure(ApiFailure),
    Success(T),
}

impl<T> ApiPayload<T> {
    pub fn into_result(self) -> Result<T, ApiFailure> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(failure) => Err(failure),
        }
    }
}

/// Any body without a `detail` field means the key was accepted
pub type TokenCheck = Value;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DateRangePayload {
    pub min: String,
    pub max: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatasetVariables {
    #[serde(default)]
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MapLayerPayload {
    pub tile_fetcher: String,
}

/// Time series responses are a list of per-coordinate lists of records.
/// Anything else (including an in-band failure) means no points.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TimeSeriesPayload {
    Points(Vec<Vec<Map<String, Value>>>),
    Other(Value),
}
