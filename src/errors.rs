use hyper::StatusCode;
use thiserror::Error;

/// Failure of a single upstream call. Rate-gate waits never produce one of these.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-success status.
    #[error("upstream responded with {status}: {status_text}")]
    Http { status: StatusCode, status_text: String },
    /// Upstream could not be reached (DNS, connect, TLS, broken stream).
    #[error("upstream transport failure")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
    #[error("upstream request timed out")]
    Timeout,
    /// Success status but the body is not JSON.
    #[error("upstream payload is not valid JSON")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
}

impl UpstreamError {
    /// Status code the caller sees for this failure.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Http { status, .. } => *status,
            Self::Transport { .. } => StatusCode::BAD_GATEWAY,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Parse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body text the caller sees for this failure.
    pub fn message(&self) -> String {
        match self {
            Self::Http { status_text, .. } => status_text.clone(),
            Self::Transport { .. } => "Bad gateway".to_string(),
            Self::Timeout => "Gateway timeout".to_string(),
            Self::Parse { .. } => "Internal server error".to_string(),
        }
    }
}

impl warp::reject::Reject for UpstreamError {}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("failed to build upstream HTTP client")]
    HttpClient(#[from] reqwest::Error),
}
