use std::convert::Infallible;
use http::Method;
use hyper::{Body, Response, StatusCode, header::{CONTENT_TYPE, HeaderValue}};
use serde::{Deserialize, Serialize};
use warp::{Filter, Rejection, Reply, path::FullPath};
use crate::errors::UpstreamError;
use crate::middleware::{add_cors_headers, with_credential};
use crate::models::{AppState, CachePolicy, Credential, UpstreamRequest};


const EVENT_STATUSES: &str = "past,upcoming,draft";

#[derive(Debug, Deserialize)]
pub struct RsvpParams {
    pub response: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentParams {
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    cached_entries: usize,
}

/// Full route table: health probe, pre-flight responder and the relayed routes,
/// with CORS headers and a request log line on every response.
pub fn routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let preflight = warp::options().map(|| Response::new(Body::empty()));

    let health = warp::path!("health")
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(health);

    let group = warp::path!("group")
        .and(warp::get())
        .and(inbound_key())
        .and(with_credential(state.clone()))
        .and(with_state(state.clone()))
        .and_then(get_group);

    let events = warp::path!("events")
        .and(warp::get())
        .and(inbound_key())
        .and(with_credential(state.clone()))
        .and(with_state(state.clone()))
        .and_then(get_events);

    let event = warp::path!("events" / String)
        .and(warp::get())
        .and(inbound_key())
        .and(with_credential(state.clone()))
        .and(with_state(state.clone()))
        .and_then(get_event);

    let rsvps = warp::path!("events" / String / "rsvps")
        .and(warp::get())
        .and(with_credential(state.clone()))
        .and(with_state(state.clone()))
        .and_then(get_rsvps);

    let rsvp = warp::path!("events" / String / "rsvps")
        .and(warp::post())
        .and(warp::query::<RsvpParams>())
        .and(with_credential(state.clone()))
        .and(with_state(state.clone()))
        .and_then(post_rsvp);

    let comments = warp::path!("events" / String / "comments")
        .and(warp::get())
        .and(with_credential(state.clone()))
        .and(with_state(state.clone()))
        .and_then(get_comments);

    let comment = warp::path!("events" / String / "comments")
        .and(warp::post())
        .and(warp::query::<CommentParams>())
        .and(with_credential(state.clone()))
        .and(with_state(state.clone()))
        .and_then(post_comment);

    let member = warp::path!("members" / "self")
        .and(warp::get())
        .and(with_credential(state.clone()))
        .and(with_state(state))
        .and_then(get_member);

    preflight
        .or(health)
        .or(group)
        .or(events)
        .or(event)
        .or(rsvps)
        .or(rsvp)
        .or(comments)
        .or(comment)
        .or(member)
        .recover(handle_rejection)
        .map(|reply| {
            let mut response = warp::reply::Reply::into_response(reply);
            add_cors_headers(response.headers_mut());
            response
        })
        .with(warp::log::custom(|info| {
            tracing::info!(
                method = %info.method(),
                path = info.path(),
                status = info.status().as_u16(),
                latency_ms = info.elapsed().as_millis() as u64,
                "request"
            );
        }))
}

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Inbound path plus raw query string, the cache key source.
fn inbound_key() -> impl Filter<Extract = (FullPath, String), Error = Infallible> + Clone {
    warp::path::full().and(
        warp::query::raw()
            .or(warp::any().map(String::new))
            .unify(),
    )
}

async fn health(state: AppState) -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&HealthStatus {
        status: "ok",
        cached_entries: state.cache.len().await,
    }))
}

async fn get_group(
    path: FullPath,
    query: String,
    credential: Credential,
    state: AppState,
) -> Result<Response<Body>, Rejection> {
    let policy = CachePolicy::cached(path.as_str(), &query, state.config.cache_ttl);
    let request = UpstreamRequest::new(Method::GET, state.group_path(""), credential);
    relay(&state, policy, request).await
}

async fn get_events(
    path: FullPath,
    query: String,
    credential: Credential,
    state: AppState,
) -> Result<Response<Body>, Rejection> {
    let policy = CachePolicy::cached(path.as_str(), &query, state.config.cache_ttl);
    let request = UpstreamRequest::new(Method::GET, state.group_path("/events"), credential)
        .param("status", EVENT_STATUSES);
    relay(&state, policy, request).await
}

async fn get_event(
    id: String,
    path: FullPath,
    query: String,
    credential: Credential,
    state: AppState,
) -> Result<Response<Body>, Rejection> {
    let policy = CachePolicy::cached(path.as_str(), &query, state.config.cache_ttl);
    let upstream_path = state.group_path(&format!("/events/{}", id));
    let request = UpstreamRequest::new(Method::GET, upstream_path, credential)
        .param("status", EVENT_STATUSES);
    relay(&state, policy, request).await
}

async fn get_rsvps(
    id: String,
    credential: Credential,
    state: AppState,
) -> Result<Response<Body>, Rejection> {
    let upstream_path = state.group_path(&format!("/events/{}/rsvps", id));
    let request =
        UpstreamRequest::new(Method::GET, upstream_path, credential).param("response", "yes");
    relay(&state, CachePolicy::Bypass, request).await
}

async fn post_rsvp(
    id: String,
    params: RsvpParams,
    credential: Credential,
    state: AppState,
) -> Result<Response<Body>, Rejection> {
    let upstream_path = state.group_path(&format!("/events/{}/rsvps", id));
    let request = UpstreamRequest::new(Method::POST, upstream_path, credential)
        .optional_param("response", params.response);
    relay(&state, CachePolicy::Bypass, request).await
}

async fn get_comments(
    id: String,
    credential: Credential,
    state: AppState,
) -> Result<Response<Body>, Rejection> {
    let upstream_path = state.group_path(&format!("/events/{}/comments", id));
    let request = UpstreamRequest::new(Method::GET, upstream_path, credential);
    relay(&state, CachePolicy::Bypass, request).await
}

async fn post_comment(
    id: String,
    params: CommentParams,
    credential: Credential,
    state: AppState,
) -> Result<Response<Body>, Rejection> {
    let upstream_path = state.group_path(&format!("/events/{}/comments", id));
    let request = UpstreamRequest::new(Method::POST, upstream_path, credential)
        .optional_param("comment", params.comment);
    relay(&state, CachePolicy::Bypass, request).await
}

async fn get_member(credential: Credential, state: AppState) -> Result<Response<Body>, Rejection> {
    let request = UpstreamRequest::new(Method::GET, "members/self", credential);
    relay(&state, CachePolicy::Bypass, request).await
}

async fn relay(
    state: &AppState,
    policy: CachePolicy,
    request: UpstreamRequest,
) -> Result<Response<Body>, Rejection> {
    let body = state
        .pipeline
        .execute(&policy, request)
        .await
        .map_err(warp::reject::custom)?;

    let mut response = Response::new(Body::from(body));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}

pub async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if let Some(e) = err.find::<UpstreamError>() {
        tracing::debug!(error = %e, "upstream failure surfaced to caller");
        (e.status_code(), e.message())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
    };

    Ok(warp::reply::with_status(message, code))
}
