use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, Method, header},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use crate::{error::ApiError, rate_limit::RateLimiter};

/// Methods that change server state and therefore pass through the full
/// admission pipeline. Safe methods (GET, HEAD, OPTIONS) skip the origin
/// check entirely.
fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// same_origin
///
/// Pure, synchronous CSRF check. For mutating methods: a present `Origin`
/// header must contain the request's `Host` value as a substring. An absent
/// `Origin` passes — a deliberate permissive fallback, since some legitimate
/// non-browser clients omit the header. That leniency is a known weakness of
/// this check; browsers always send `Origin` on cross-site mutating
/// requests, which is the attack this gate exists to stop.
pub fn same_origin(method: &Method, origin: Option<&str>, host: Option<&str>) -> bool {
    if !is_mutating(method) {
        return true;
    }
    match (origin, host) {
        (None, _) => true,
        (Some(origin), Some(host)) => origin.contains(host),
        // Origin present but no Host to validate against: cannot confirm
        // same-origin, so reject.
        (Some(_), None) => false,
    }
}

/// origin_guard
///
/// First gate of the admission pipeline. Rejects cross-origin state-changing
/// requests with 403 before any further processing happens.
pub async fn origin_guard(request: Request, next: Next) -> Result<Response, ApiError> {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok());
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok());

    if !same_origin(request.method(), origin, host) {
        tracing::warn!(
            method = %request.method(),
            origin = origin.unwrap_or("-"),
            host = host.unwrap_or("-"),
            "rejected cross-origin request"
        );
        return Err(ApiError::Csrf);
    }

    Ok(next.run(request).await)
}

/// Derives the rate-limit partition key from caller-identifying request
/// metadata: the first `x-forwarded-for` hop when running behind a proxy,
/// otherwise the socket peer address. Distinct keys have fully independent
/// quotas.
fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        && let Some(first) = forwarded.split(',').next()
    {
        let first = first.trim();
        if !first.is_empty() {
            return first.to_owned();
        }
    }

    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => addr.ip().to_string(),
        None => "unknown".to_owned(),
    }
}

/// rate_limit
///
/// Second gate of the admission pipeline. Runs before identity resolution so
/// a flood is turned away without spending Directory lookups on it. Admitted
/// responses still carry the quota telemetry headers so well-behaved clients
/// can pace themselves.
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_key(&request);
    let decision = limiter.admit(&key).await;

    if !decision.admitted {
        return Err(ApiError::RateLimited {
            limit: decision.limit,
            remaining: 0,
            reset_at: decision.reset_at,
        });
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("x-ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert(
        "x-ratelimit-reset",
        HeaderValue::from(decision.reset_at.timestamp()),
    );
    Ok(response)
}
