use crate::models::{CreatePromptRequest, ModerationStats, Prompt, UpdatePromptRequest, User};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// The abstract contract for all persistence operations. Handlers interact
/// with the data layer through this trait only, so tests can substitute an
/// in-memory mock for the Postgres implementation.
///
/// `get_user` doubles as the Directory of the authorization layer: it is the
/// source of truth for a principal's existence and current role on every
/// request, regardless of what a session token claims.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Public browsing ---
    // Public listing with filtering. Must enforce is_public=true.
    async fn get_prompts(&self, tag: Option<String>, search: Option<String>) -> Vec<Prompt>;
    // Retrieves a prompt only if it is public.
    async fn get_public_prompt(&self, id: Uuid) -> Option<Prompt>;
    // Retrieves any prompt regardless of visibility. Callers are responsible
    // for having established the privilege to see hidden records.
    async fn get_prompt(&self, id: Uuid) -> Option<Prompt>;

    // --- Owner actions ---
    async fn get_my_prompts(&self, user_id: Uuid) -> Vec<Prompt>;
    async fn create_prompt(&self, req: CreatePromptRequest, user_id: Uuid) -> Option<Prompt>;
    // Owner-only: updates only if the user_id matches. COALESCE for partial updates.
    async fn update_prompt(
        &self,
        id: Uuid,
        user_id: Uuid,
        req: UpdatePromptRequest,
    ) -> Option<Prompt>;
    // Owner-only: deletes only if the user_id matches the prompt's owner.
    async fn delete_prompt(&self, id: Uuid, user_id: Uuid) -> bool;

    // --- Moderation ---
    // Lists all prompts regardless of visibility, hidden ones first.
    async fn get_all_prompts(&self) -> Vec<Prompt>;
    // Publishes or hides a prompt.
    async fn set_prompt_status(&self, id: Uuid, is_public: bool) -> Option<Prompt>;
    /// Moderator override: delete ANY prompt by id (no ownership check).
    async fn delete_prompt_admin(&self, id: Uuid) -> bool;

    // --- Directory / stats ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn get_stats(&self) -> ModerationStats;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by
/// PostgreSQL through the runtime sqlx query API.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PROMPT_COLUMNS: &str =
    "id, user_id, author, title, body, tags, is_public, created_at, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    /// Flexible public listing using QueryBuilder for safe parameterization.
    /// Strictly enforces `WHERE is_public = true` in the base query so hidden
    /// prompts never leak to anonymous browsers.
    async fn get_prompts(&self, tag: Option<String>, search: Option<String>) -> Vec<Prompt> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {PROMPT_COLUMNS} FROM prompts WHERE is_public = true "
        ));

        if let Some(t) = tag {
            builder.push(" AND tags ILIKE ");
            builder.push_bind(format!("%{}%", t));
        }

        if let Some(s) = search {
            // Case-insensitive search across title, body and author.
            let pattern = format!("%{}%", s);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR body ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR author ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC");

        match builder.build_query_as::<Prompt>().fetch_all(&self.pool).await {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("get_prompts error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_public_prompt(&self, id: Uuid) -> Option<Prompt> {
        sqlx::query_as::<_, Prompt>(&format!(
            "SELECT {PROMPT_COLUMNS} FROM prompts WHERE id = $1 AND is_public = true"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_public_prompt error: {:?}", e);
            None
        })
    }

    async fn get_prompt(&self, id: Uuid) -> Option<Prompt> {
        sqlx::query_as::<_, Prompt>(&format!(
            "SELECT {PROMPT_COLUMNS} FROM prompts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_prompt error: {:?}", e);
            None
        })
    }

    /// Retrieves all prompts owned by the authenticated user, including
    /// those still hidden or pending review.
    async fn get_my_prompts(&self, user_id: Uuid) -> Vec<Prompt> {
        match sqlx::query_as::<_, Prompt>(&format!(
            "SELECT {PROMPT_COLUMNS} FROM prompts WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("get_my_prompts error: {:?}", e);
                vec![]
            }
        }
    }

    /// Inserts a new prompt. All new prompts start with `is_public = false`
    /// and require moderator approval before appearing publicly.
    async fn create_prompt(&self, req: CreatePromptRequest, user_id: Uuid) -> Option<Prompt> {
        let new_id = Uuid::new_v4();
        sqlx::query_as::<_, Prompt>(&format!(
            "INSERT INTO prompts (id, user_id, author, title, body, tags, is_public, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, false, NOW(), NOW()) \
             RETURNING {PROMPT_COLUMNS}"
        ))
        .bind(new_id)
        .bind(user_id)
        .bind(req.author_name)
        .bind(req.title)
        .bind(req.body)
        .bind(req.tags)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| tracing::error!("create_prompt error: {:?}", e))
        .ok()
    }

    /// Updates a prompt only if `user_id` matches the owner. COALESCE keeps
    /// columns untouched when the corresponding request field is None.
    async fn update_prompt(
        &self,
        id: Uuid,
        user_id: Uuid,
        req: UpdatePromptRequest,
    ) -> Option<Prompt> {
        sqlx::query_as::<_, Prompt>(&format!(
            "UPDATE prompts \
             SET title = COALESCE($3, title), \
                 body = COALESCE($4, body), \
                 tags = COALESCE($5, tags), \
                 updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {PROMPT_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(req.title)
        .bind(req.body)
        .bind(req.tags)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_prompt error: {:?}", e);
            None
        })
    }

    /// Deletes a prompt only if `user_id` matches the owner.
    async fn delete_prompt(&self, id: Uuid, user_id: Uuid) -> bool {
        match sqlx::query("DELETE FROM prompts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_prompt error: {:?}", e);
                false
            }
        }
    }

    /// Moderation listing: every prompt, with hidden ones surfaced first so
    /// the review queue sits at the top.
    async fn get_all_prompts(&self) -> Vec<Prompt> {
        match sqlx::query_as::<_, Prompt>(&format!(
            "SELECT {PROMPT_COLUMNS} FROM prompts ORDER BY is_public ASC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("get_all_prompts error: {:?}", e);
                vec![]
            }
        }
    }

    async fn set_prompt_status(&self, id: Uuid, is_public: bool) -> Option<Prompt> {
        sqlx::query_as::<_, Prompt>(&format!(
            "UPDATE prompts SET is_public = $1, updated_at = NOW() WHERE id = $2 \
             RETURNING {PROMPT_COLUMNS}"
        ))
        .bind(is_public)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_prompt_status error: {:?}", e);
            None
        })
    }

    async fn delete_prompt_admin(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM prompts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_prompt_admin error: {:?}", e);
                false
            }
        }
    }

    /// Directory lookup: existence and current role for a principal.
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>("SELECT id, email, role FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or(None)
    }

    /// Compiles the counters for the moderation dashboard in one call.
    async fn get_stats(&self) -> ModerationStats {
        let total_prompts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM prompts")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let pending_review: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM prompts WHERE is_public = false")
                .fetch_one(&self.pool)
                .await
                .unwrap_or(0);
        ModerationStats {
            total_prompts,
            total_users,
            pending_review,
        }
    }
}
