use axum::{
    Json,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

/// ApiError
///
/// The caller-visible rejection taxonomy of the admission pipeline. Each
/// variant is terminal for the current request: the failing gate converts
/// directly into an HTTP response and no retry is attempted server-side.
///
/// Store outages are deliberately absent here — the rate limiter recovers
/// from them locally (fail open) and they never reach the HTTP boundary.
/// Response bodies carry a stable machine-readable `error` code plus a short
/// human-readable `message`; internal detail (hosts, stack state) is never
/// included.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// No identity could be resolved for the request (missing/invalid token,
    /// or the backing account no longer exists).
    #[error("authentication required")]
    Unauthorized,

    /// An identity was resolved but its role does not satisfy the operation's
    /// required role.
    #[error("insufficient role")]
    Forbidden,

    /// State-changing request whose Origin header does not match the Host.
    #[error("cross-origin request rejected")]
    Csrf,

    /// The caller's quota for the current window is exhausted.
    #[error("rate limit exceeded")]
    RateLimited {
        limit: u32,
        remaining: u32,
        reset_at: DateTime<Utc>,
    },

    /// The target resource does not exist, is not visible to the caller, or
    /// is not owned by them. Collapsed into one response on purpose so the
    /// existence of hidden resources is not observable.
    #[error("not found")]
    NotFound,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden | ApiError::Csrf => StatusCode::FORBIDDEN,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "unauthorized",
            ApiError::Forbidden => "forbidden",
            ApiError::Csrf => "cross_origin_rejected",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::NotFound => "not_found",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.code(),
            "message": self.to_string(),
        });

        let mut response = (status, Json(body)).into_response();

        // 429 responses expose the quota telemetry so clients can back off
        // until the window rolls over.
        if let ApiError::RateLimited {
            limit,
            remaining,
            reset_at,
        } = self
        {
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", HeaderValue::from(limit));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            headers.insert("x-ratelimit-reset", HeaderValue::from(reset_at.timestamp()));
        }

        response
    }
}
