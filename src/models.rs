use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::roles::Role;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The user's canonical identity record stored in the `public.profiles`
/// table. This is the Directory's view of a principal: the `role` column is
/// the source of truth for the user's current privileges, never any cached
/// claim inside a session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct User {
    // Primary key, shared with the external auth provider's user id.
    pub id: Uuid,
    pub email: String,
    // Stored role string: 'user', 'moderator' or 'admin'. Parsed into
    // `roles::Role` at the authorization boundary.
    pub role: String,
}

/// Prompt
///
/// A published (or pending) prompt record from the `public.prompts` table.
/// This is the primary data structure for the portal's business logic.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow, Default)]
pub struct Prompt {
    pub id: Uuid,
    // FK to public.profiles.id (owner).
    pub user_id: Uuid,
    pub author: String,
    pub title: String,
    // The prompt text itself.
    pub body: String,
    // Free-form comma-separated tags used for browsing filters.
    pub tags: Option<String>,

    // Controls public visibility; newly submitted prompts start hidden and
    // are published by a moderator. Enforced at the repository layer.
    pub is_public: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// CreatePromptRequest
///
/// Input payload for submitting a new prompt (POST /prompts).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreatePromptRequest {
    pub title: String,
    pub body: String,
    pub author_name: String,
    pub tags: Option<String>,
}

/// UpdatePromptRequest
///
/// Partial update payload for modifying an existing prompt
/// (PUT /prompts/{id}). All fields are optional; only provided fields are
/// written, via COALESCE at the repository layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdatePromptRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

// --- Dashboard & Profile Schemas (Output) ---

/// ModerationStats
///
/// Output schema for the administrative statistics dashboard
/// (GET /admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct ModerationStats {
    pub total_prompts: i64,
    pub total_users: i64,
    /// The number of prompts where `is_public` is false.
    pub pending_review: i64,
}

/// UserProfile
///
/// Output schema for the authenticated user's profile (GET /me). Unlike the
/// raw `User` row, the role here is the parsed enum the client can rely on.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}
