use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, put},
};

/// Admin Router Module
///
/// Moderation and oversight endpoints, nested under `/admin`. Each handler
/// resolves the caller through the `AuthUser` extractor and then performs an
/// explicit `require_role` check: Moderator for queue management and
/// moderation actions, Admin for the cross-user statistics. The role
/// hierarchy means an admin passes every moderator gate.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Dashboard counters (total prompts/users, pending reviews). Admin only.
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/prompts
        // Lists ALL prompts including hidden ones, review queue first.
        .route("/prompts", get(handlers::get_admin_prompts))
        // PUT /admin/prompts/{id}/status
        // Publishes or hides a prompt. The core moderation endpoint.
        .route("/prompts/{id}/status", put(handlers::update_prompt_status))
        // DELETE /admin/prompts/{id}
        // Force-deletes any prompt, bypassing ownership.
        .route("/prompts/{id}", delete(handlers::delete_admin_prompt))
}
