use crate::{
    AppState,
    auth::{AuthUser, MaybeUser},
    error::ApiError,
    models::{CreatePromptRequest, ModerationStats, Prompt, UpdatePromptRequest, UserProfile},
    roles::Role,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// PromptFilter
///
/// Accepted query parameters for the public prompt listing (GET /prompts).
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PromptFilter {
    /// Optional tag filter (substring match against the stored tag list).
    pub tag: Option<String>,
    /// Optional full-text search string matched against title/body/author.
    pub search: Option<String>,
}

// --- Public Handlers ---

/// get_prompts
///
/// [Public Route] Lists public prompts with tag filtering and search.
/// The repository applies the `is_public=true` filter unconditionally, so
/// hidden prompts cannot leak through any filter combination.
#[utoipa::path(
    get,
    path = "/prompts",
    params(PromptFilter),
    responses((status = 200, description = "List filtered prompts", body = [Prompt]))
)]
pub async fn get_prompts(
    State(state): State<AppState>,
    Query(filter): Query<PromptFilter>,
) -> Json<Vec<Prompt>> {
    let prompts = state.repo.get_prompts(filter.tag, filter.search).await;
    Json(prompts)
}

/// get_prompt_details
///
/// [Public Route] Retrieves a single prompt by ID.
///
/// Anonymous callers and plain users only see public prompts. A signed-in
/// moderator (or admin) also sees hidden ones, so review links can be opened
/// directly — a non-authoritative branch, hence `has_permission` rather than
/// `require_role`.
#[utoipa::path(
    get,
    path = "/prompts/{id}",
    params(("id" = Uuid, Path, description = "Prompt ID")),
    responses(
        (status = 200, description = "Found", body = Prompt),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_prompt_details(
    viewer: MaybeUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Prompt>, ApiError> {
    let prompt = if viewer.has_permission(Role::Moderator) {
        state.repo.get_prompt(id).await
    } else {
        state.repo.get_public_prompt(id).await
    };
    prompt.map(Json).ok_or(ApiError::NotFound)
}

// --- Authenticated Handlers ---

/// get_me
///
/// [Authenticated Route] The authenticated user's own profile, with the
/// parsed role so the client can shape its UI.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(AuthUser { id, email, role }: AuthUser) -> Json<UserProfile> {
    Json(UserProfile { id, email, role })
}

/// get_my_prompts
///
/// [Authenticated Route] Lists all prompts owned by the requesting user,
/// including those still hidden or pending review.
#[utoipa::path(
    get,
    path = "/me/prompts",
    responses((status = 200, description = "My Prompts", body = [Prompt]))
)]
pub async fn get_my_prompts(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<Prompt>> {
    let prompts = state.repo.get_my_prompts(id).await;
    Json(prompts)
}

/// create_prompt
///
/// [Authenticated Route] Submits a new prompt. The owner is taken from the
/// authenticated session, never from the payload. New prompts start hidden
/// and enter the moderation queue.
#[utoipa::path(
    post,
    path = "/prompts",
    request_body = CreatePromptRequest,
    responses((status = 201, description = "Created", body = Prompt))
)]
pub async fn create_prompt(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePromptRequest>,
) -> Result<(StatusCode, Json<Prompt>), StatusCode> {
    match state.repo.create_prompt(payload, id).await {
        Some(prompt) => Ok((StatusCode::CREATED, Json(prompt))),
        None => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// update_prompt
///
/// [Authenticated Route] Modifies the caller's own prompt. The repository
/// enforces the owner-only check in SQL, so a non-owner simply matches zero
/// rows and gets a 404.
#[utoipa::path(
    put,
    path = "/prompts/{id}",
    request_body = UpdatePromptRequest,
    responses(
        (status = 200, description = "Updated", body = Prompt),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn update_prompt(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePromptRequest>,
) -> Result<Json<Prompt>, ApiError> {
    state
        .repo
        .update_prompt(id, user_id, payload)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// delete_prompt
///
/// [Authenticated Route] Deletes the caller's own prompt (owner-only check
/// in the repository).
#[utoipa::path(
    delete,
    path = "/prompts/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn delete_prompt(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.repo.delete_prompt(id, user_id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

// --- Admin / Moderation Handlers ---

/// get_admin_prompts
///
/// [Moderator Route] Lists ALL prompts including hidden ones, with the
/// review queue first. Requires the Moderator role or above.
#[utoipa::path(
    get,
    path = "/admin/prompts",
    responses(
        (status = 200, description = "All prompts", body = [Prompt]),
        (status = 403, description = "Insufficient role")
    )
)]
pub async fn get_admin_prompts(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Prompt>>, ApiError> {
    user.require_role(Role::Moderator)?;
    Ok(Json(state.repo.get_all_prompts().await))
}

/// update_prompt_status
///
/// [Moderator Route] Publishes or hides a prompt. This is the core
/// moderation endpoint; the role gate goes through `require_role` so that
/// under-privileged attempts fail loudly with 403.
#[utoipa::path(
    put,
    path = "/admin/prompts/{id}/status",
    params(("id" = Uuid, Path, description = "Prompt ID")),
    request_body = bool,
    responses(
        (status = 200, description = "Updated", body = Prompt),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_prompt_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(is_public): Json<bool>,
) -> Result<Json<Prompt>, ApiError> {
    user.require_role(Role::Moderator)?;
    state
        .repo
        .set_prompt_status(id, is_public)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// delete_admin_prompt
///
/// [Moderator Route] Force-deletes any prompt, bypassing ownership.
#[utoipa::path(
    delete,
    path = "/admin/prompts/{id}",
    params(("id" = Uuid, Path, description = "Prompt ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Insufficient role"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_admin_prompt(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    user.require_role(Role::Moderator)?;
    if state.repo.delete_prompt_admin(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// get_admin_stats
///
/// [Admin Route] Dashboard counters. Admin-only: the stats aggregate across
/// all users, which is above a moderator's remit.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Stats", body = ModerationStats),
        (status = 403, description = "Insufficient role")
    )
)]
pub async fn get_admin_stats(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ModerationStats>, ApiError> {
    user.require_role(Role::Admin)?;
    Ok(Json(state.repo.get_stats().await))
}
