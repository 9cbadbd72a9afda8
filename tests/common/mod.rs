#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use prompt_portal::{
    AppState, MemoryCounterStore, RateLimiter,
    auth::Claims,
    config::{AppConfig, Env},
    models::{CreatePromptRequest, ModerationStats, Prompt, UpdatePromptRequest, User},
    repository::Repository,
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

/// In-memory Repository standing in for Postgres. Prompts and users live in
/// plain vectors; `directory_lookups` counts `get_user` calls so tests can
/// assert which pipeline gates ran before a rejection.
#[derive(Default)]
pub struct MockRepo {
    pub users: Vec<User>,
    pub prompts: Mutex<Vec<Prompt>>,
    pub directory_lookups: AtomicUsize,
}

impl MockRepo {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users,
            ..Default::default()
        }
    }

    pub fn lookup_count(&self) -> usize {
        self.directory_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Repository for MockRepo {
    async fn get_prompts(&self, tag: Option<String>, search: Option<String>) -> Vec<Prompt> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_public)
            .filter(|p| {
                tag.as_deref()
                    .is_none_or(|t| p.tags.as_deref().unwrap_or("").contains(t))
            })
            .filter(|p| search.as_deref().is_none_or(|s| p.title.contains(s)))
            .cloned()
            .collect()
    }

    async fn get_public_prompt(&self, id: Uuid) -> Option<Prompt> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id && p.is_public)
            .cloned()
    }

    async fn get_prompt(&self, id: Uuid) -> Option<Prompt> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    async fn get_my_prompts(&self, user_id: Uuid) -> Vec<Prompt> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect()
    }

    async fn create_prompt(&self, req: CreatePromptRequest, user_id: Uuid) -> Option<Prompt> {
        let prompt = Prompt {
            id: Uuid::new_v4(),
            user_id,
            author: req.author_name,
            title: req.title,
            body: req.body,
            tags: req.tags,
            is_public: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.prompts.lock().unwrap().push(prompt.clone());
        Some(prompt)
    }

    async fn update_prompt(
        &self,
        id: Uuid,
        user_id: Uuid,
        req: UpdatePromptRequest,
    ) -> Option<Prompt> {
        let mut prompts = self.prompts.lock().unwrap();
        let prompt = prompts
            .iter_mut()
            .find(|p| p.id == id && p.user_id == user_id)?;
        if let Some(title) = req.title {
            prompt.title = title;
        }
        if let Some(body) = req.body {
            prompt.body = body;
        }
        if let Some(tags) = req.tags {
            prompt.tags = Some(tags);
        }
        prompt.updated_at = Utc::now();
        Some(prompt.clone())
    }

    async fn delete_prompt(&self, id: Uuid, user_id: Uuid) -> bool {
        let mut prompts = self.prompts.lock().unwrap();
        let before = prompts.len();
        prompts.retain(|p| !(p.id == id && p.user_id == user_id));
        prompts.len() < before
    }

    async fn get_all_prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }

    async fn set_prompt_status(&self, id: Uuid, is_public: bool) -> Option<Prompt> {
        let mut prompts = self.prompts.lock().unwrap();
        let prompt = prompts.iter_mut().find(|p| p.id == id)?;
        prompt.is_public = is_public;
        Some(prompt.clone())
    }

    async fn delete_prompt_admin(&self, id: Uuid) -> bool {
        let mut prompts = self.prompts.lock().unwrap();
        let before = prompts.len();
        prompts.retain(|p| p.id != id);
        prompts.len() < before
    }

    async fn get_user(&self, id: Uuid) -> Option<User> {
        self.directory_lookups.fetch_add(1, Ordering::SeqCst);
        self.users.iter().find(|u| u.id == id).cloned()
    }

    async fn get_stats(&self) -> ModerationStats {
        let prompts = self.prompts.lock().unwrap();
        ModerationStats {
            total_prompts: prompts.len() as i64,
            total_users: self.users.len() as i64,
            pending_review: prompts.iter().filter(|p| !p.is_public).count() as i64,
        }
    }
}

pub fn user(id: Uuid, email: &str, role: &str) -> User {
    User {
        id,
        email: email.to_string(),
        role: role.to_string(),
    }
}

pub fn prompt(id: Uuid, user_id: Uuid, title: &str, is_public: bool) -> Prompt {
    Prompt {
        id,
        user_id,
        author: "author".to_string(),
        title: title.to_string(),
        body: "body".to_string(),
        tags: None,
        is_public,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Mints an HS256 token for `user_id`, expiring `exp_offset_secs` from now
/// (negative values produce an already-expired token).
pub fn mint_token(user_id: Uuid, exp_offset_secs: i64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + exp_offset_secs).max(0) as usize,
    };

    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

/// Builds an AppState around the mock repository with the test secret and a
/// configurable quota.
pub fn test_state(env: Env, repo: MockRepo, limit: u32, window: Duration) -> AppState {
    let config = AppConfig {
        env,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        rate_limit_max: limit,
        rate_limit_window: window,
        ..AppConfig::default()
    };

    AppState {
        repo: Arc::new(repo),
        limiter: RateLimiter::new(Arc::new(MemoryCounterStore::new()), limit, window),
        config,
    }
}
