use crate::handlers;
use axum::{Router, routing::get};

use crate::AppState;

/// Public Router Module
///
/// Endpoints accessible to any client, anonymous or logged-in. All data
/// retrieval here must enforce `is_public=true` at the Repository level so
/// prompts pending review or hidden by a moderator never leak.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness endpoint for monitoring and load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /prompts?tag=...&search=...
        // Lists public prompts with tag filtering and full-text search.
        .route("/prompts", get(handlers::get_prompts))
        // GET /prompts/{id}
        // Detailed view of a single prompt. Visibility is enforced in the
        // handler: public-only for anonymous callers, any prompt for
        // moderators.
        .route("/prompts/{id}", get(handlers::get_prompt_details))
}
