use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    repository::RepositoryState,
    roles::Role,
};

/// Claims
///
/// The payload structure expected inside a JSON Web Token (JWT). Claims are
/// signed by the auth provider's secret and validated on every authenticated
/// request. Note that claims carry no role: the Directory lookup below is
/// the only source of a principal's current role.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the user, keying the `public.profiles` row.
    pub sub: Uuid,
    /// Expiration time (exp): timestamp after which the JWT must be rejected.
    pub exp: usize,
    /// Issued at (iat): timestamp when the JWT was issued.
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request, produced by the
/// extractor below. Resolved fresh per request; never cached across requests.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    /// The user's current role, parsed from the Directory record.
    pub role: Role,
}

impl AuthUser {
    /// The loud authorization check: every state-changing privileged handler
    /// calls this so that unauthorized attempts fail visibly with Forbidden.
    /// Returns the identity unchanged when `self.role` satisfies `required`.
    pub fn require_role(self, required: Role) -> Result<Self, ApiError> {
        if self.role.satisfies(required) {
            Ok(self)
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler, and as the gate inside
/// the authentication middleware layer.
///
/// Resolution order:
/// 1. Local bypass: in `Env::Local` only, an `x-user-id` header names the
///    principal directly (still verified against the Directory).
/// 2. Bearer token extraction and JWT decoding (signature + expiry).
/// 3. Directory lookup: the profiles row must still exist and carry a valid
///    role. A principal deleted after token issuance is Unauthorized, not a
///    stale-but-valid user.
///
/// Rejection: `ApiError::Unauthorized` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Local development bypass, guarded by the Env check. Falls through
        // to standard JWT validation when the header is absent or stale.
        if config.env == Env::Local
            && let Some(user_id_header) = parts.headers.get("x-user-id")
            && let Ok(id_str) = user_id_header.to_str()
            && let Ok(user_id) = Uuid::parse_str(id_str)
            && let Some(user) = repo.get_user(user_id).await
            && let Ok(role) = user.role.parse::<Role>()
        {
            return Ok(AuthUser {
                id: user.id,
                email: user.email,
                role,
            });
        }

        // Bearer token extraction.
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        // Expired, malformed and badly signed tokens all collapse into the
        // same opaque 401; the distinction is not leaked to the caller.
        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|_| ApiError::Unauthorized)?;

        // Directory lookup (final verification). The token being valid is
        // not enough: the account must still exist, and its *current* role
        // wins over anything the session was issued with.
        let user = repo
            .get_user(token_data.claims.sub)
            .await
            .ok_or(ApiError::Unauthorized)?;

        // A profile row with an unrecognised role string is treated the same
        // as a missing row.
        let role = user.role.parse::<Role>().map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthUser {
            id: user.id,
            email: user.email,
            role,
        })
    }
}

/// MaybeUser
///
/// Optional-identity extractor for endpoints that behave differently for
/// signed-in users but never reject anonymous ones. This is the quiet
/// counterpart to `AuthUser`: it cannot fail.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    /// Non-authoritative permission probe for conditional branching (e.g.
    /// whether to include moderation fields in a response). Returns false
    /// for both anonymous and under-privileged callers. Mutating operations
    /// must use `AuthUser::require_role` instead, so failures stay loud.
    pub fn has_permission(&self, required: Role) -> bool {
        match &self.0 {
            Some(user) => user.role.satisfies(required),
            None => false,
        }
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(
            AuthUser::from_request_parts(parts, state).await.ok(),
        ))
    }
}
