use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Routes for any user who has passed the authentication layer: prompt
/// submission and management of the user's own records.
///
/// Access control strategy: every handler here relies on the `AuthUser`
/// extractor middleware on the layer above this module, guaranteeing a
/// validated identity. Owner-only checks (update/delete) are then enforced
/// in the repository's SQL against the extracted user id.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The authenticated user's profile and parsed role.
        .route("/me", get(handlers::get_me))
        // GET /me/prompts
        // All prompts owned by the user, including hidden ones.
        .route("/me/prompts", get(handlers::get_my_prompts))
        // POST /prompts
        // Submits a new prompt; it starts hidden, pending moderation.
        .route("/prompts", post(handlers::create_prompt))
        // PUT/DELETE /prompts/{id}
        // Modify or remove the user's own prompt; strict ownership check is
        // enforced in the repository query.
        .route(
            "/prompts/{id}",
            put(handlers::update_prompt).delete(handlers::delete_prompt),
        )
}
