use thiserror::Error;

/// Transport-level failures of the climate API.
///
/// In-band failures (a `detail` field in the body) are not errors at this
/// level; they arrive as [`super::ApiPayload::Failure`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not decode response from {endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}
