use hyper::{HeaderMap, header::{HeaderName, HeaderValue}};
use std::convert::Infallible;
use warp::Filter;

use crate::config::ACCESS_TOKEN_HEADER;
use crate::models::{AppState, Credential};
use crate::services::select_credential;

#[cfg(test)]
mod tests;

pub fn add_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("Content-Type, X-Access-Token"),
    );
}

/// Resolves the credential for the inbound request from the optional
/// access-token header, honouring the minimal (application key only) variant.
pub fn with_credential(
    state: AppState,
) -> impl Filter<Extract = (Credential,), Error = Infallible> + Clone {
    warp::header::optional::<String>(ACCESS_TOKEN_HEADER)
        .or(warp::any().map(|| None))
        .unify()
        .map(move |supplied: Option<String>| {
            let supplied = supplied.filter(|_| state.config.allow_user_tokens);
            select_credential(supplied.as_deref(), &state.config.app_key)
        })
}
