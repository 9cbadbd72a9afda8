use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod admission;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod rate_limit;
pub mod repository;
pub mod roles;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point.
pub use config::AppConfig;
pub use rate_limit::{MemoryCounterStore, RateLimiter};
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation (Swagger JSON) from every
/// handler decorated with `#[utoipa::path]` and every schema deriving
/// `ToSchema`. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_prompts, handlers::get_prompt_details, handlers::get_me,
        handlers::get_my_prompts, handlers::create_prompt, handlers::update_prompt,
        handlers::delete_prompt, handlers::get_admin_prompts,
        handlers::update_prompt_status, handlers::delete_admin_prompt,
        handlers::get_admin_stats
    ),
    components(
        schemas(
            models::Prompt, models::CreatePromptRequest, models::UpdatePromptRequest,
            models::UserProfile, models::ModerationStats, roles::Role,
        )
    ),
    tags(
        (name = "prompt-portal", description = "Prompt publishing and moderation API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe, immutable container holding all application
/// services and configuration, shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository layer: database access, and the Directory used by the
    /// authorization layer.
    pub repo: RepositoryState,
    /// The request-admission rate limiter (shared counter store inside).
    pub limiter: RateLimiter,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Allow extractors and middleware to selectively pull components from the
// shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for RateLimiter {
    fn from_ref(app_state: &AppState) -> RateLimiter {
        app_state.limiter.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the `authenticated_routes` scope. The
/// `AuthUser` extractor performs the full resolution (token validation plus
/// Directory lookup); if it fails the request is rejected with 401 before
/// the handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure and the request-admission pipeline.
///
/// Gate order for every request, outermost first: origin guard (CSRF),
/// rate limiter (keyed by caller address), then — per scope — the
/// authentication layer and the handlers' own `require_role` checks. The
/// first failing gate short-circuits the rest and determines the response.
/// Observability layers (request-id, trace) sit outside all gates so even
/// rejected requests are correlated in the logs.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        // Documentation: serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public routes: no authentication layer.
        .merge(public::public_routes())
        // Authenticated routes, protected by the auth middleware.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin routes, nested under '/admin'. Role checks happen inside the
        // handlers via `require_role`, after authentication.
        .nest("/admin", admin::admin_routes())
        .with_state(state.clone());

    // The ServiceBuilder stack runs top-to-bottom on the way in: request-id
    // and tracing first, then the admission gates in pipeline order.
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id))
                // Gate 1: reject cross-origin state-changing requests.
                .layer(middleware::from_fn(admission::origin_guard))
                // Gate 2: per-caller quota, before any identity resolution.
                .layer(middleware::from_fn_with_state(state, admission::rate_limit)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Customizes the `TraceLayer` span: includes the `x-request-id` header (if
/// present) alongside the HTTP method and URI, so every log line for one
/// request is correlated by a unique id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
