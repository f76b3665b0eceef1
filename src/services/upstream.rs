use std::time::Duration;

use hyper::ext::ReasonPhrase;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use tokio::time::timeout;

use crate::errors::{ConfigError, UpstreamError};
use crate::models::UpstreamRequest;

/// Issues authenticated calls against the upstream REST root.
#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    root: String,
    timeout: Duration,
}

impl UpstreamClient {
    pub fn new(root: &str, request_timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            root: root.to_string(),
            timeout: request_timeout,
        })
    }

    /// `root + path`, then the query parameters, then the auth parameter last.
    /// The auth parameter follows `?` when there are no other parameters and
    /// `&` otherwise.
    pub fn build_url(&self, request: &UpstreamRequest) -> String {
        let mut url = format!("{}{}", self.root, request.path);
        url.push('?');
        let mut pairs: Vec<String> = request
            .query
            .iter()
            .map(|(name, value)| format!("{}={}", encode_component(name), encode_component(value)))
            .collect();
        let (auth_name, auth_value) = request.credential.query_param();
        pairs.push(format!("{}={}", auth_name, encode_component(auth_value)));
        url.push_str(&pairs.join("&"));
        url
    }

    pub async fn call(&self, request: &UpstreamRequest) -> Result<Value, UpstreamError> {
        let url = self.build_url(request);
        let response = match timeout(
            self.timeout,
            self.client.request(request.method.clone(), &url).send(),
        )
        .await
        {
            Ok(result) => result.map_err(|e| {
                // The URL carries the credential; keep it out of logs and errors.
                let source = e.without_url();
                tracing::warn!(path = %request.path, error = %source, "upstream unreachable");
                UpstreamError::Transport { source }
            })?,
            Err(_) => {
                tracing::warn!(path = %request.path, "upstream call timed out");
                return Err(UpstreamError::Timeout);
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(path = %request.path, status = status.as_u16(), "upstream rejected call");
            return Err(UpstreamError::Http {
                status,
                status_text: status_text(&response),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport { source: e.without_url() })?;
        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(path = %request.path, error = %e, "upstream sent malformed JSON");
            UpstreamError::Parse { source: e }
        })
    }
}

/// Query component escapes: everything but unreserved characters and `,`, so
/// list values like `past,upcoming,draft` read as sent.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b',');

fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_COMPONENT).to_string()
}

/// The upstream's own reason phrase when it sent a non-canonical one.
fn status_text(response: &reqwest::Response) -> String {
    response
        .extensions()
        .get::<ReasonPhrase>()
        .and_then(|reason| std::str::from_utf8(reason.as_bytes()).ok())
        .or_else(|| response.status().canonical_reason())
        .unwrap_or_default()
        .to_string()
}
