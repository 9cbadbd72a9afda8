mod common;

use axum::{
    extract::FromRequestParts,
    http::{Method, Request, Uri, header, request::Parts},
};
use common::{MockRepo, mint_token, test_state, user};
use prompt_portal::{
    auth::{AuthUser, MaybeUser},
    config::Env,
    error::ApiError,
    rate_limit::{DEFAULT_LIMIT, DEFAULT_WINDOW},
    roles::Role,
};
use uuid::Uuid;

const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn state_with(env: Env, repo: MockRepo) -> prompt_portal::AppState {
    test_state(env, repo, DEFAULT_LIMIT, DEFAULT_WINDOW)
}

#[tokio::test]
async fn valid_jwt_resolves_identity_with_current_role() {
    let repo = MockRepo::with_users(vec![user(TEST_USER_ID, "mod@example.com", "moderator")]);
    let state = state_with(Env::Production, repo);

    let mut parts = request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", mint_token(TEST_USER_ID, 3600)))
            .unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(auth_user.id, TEST_USER_ID);
    assert_eq!(auth_user.email, "mod@example.com");
    assert_eq!(auth_user.role, Role::Moderator);
}

#[tokio::test]
async fn missing_header_is_unauthorized() {
    let state = state_with(Env::Production, MockRepo::default());

    let mut parts = request_parts(Method::GET, "/".parse().unwrap());
    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let repo = MockRepo::with_users(vec![user(TEST_USER_ID, "u@example.com", "user")]);
    let state = state_with(Env::Production, repo);

    // Well past the default validation leeway.
    let token = mint_token(TEST_USER_ID, -600);
    let mut parts = request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );

    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn deleted_account_is_unauthorized_despite_valid_token() {
    // The token verifies, but the Directory has no such principal anymore.
    let state = state_with(Env::Production, MockRepo::default());

    let mut parts = request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", mint_token(TEST_USER_ID, 3600)))
            .unwrap(),
    );

    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn unknown_role_string_is_unauthorized() {
    let repo = MockRepo::with_users(vec![user(TEST_USER_ID, "u@example.com", "superuser")]);
    let state = state_with(Env::Production, repo);

    let mut parts = request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(&format!("Bearer {}", mint_token(TEST_USER_ID, 3600)))
            .unwrap(),
    );

    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn local_bypass_resolves_through_directory() {
    let bypass_id = Uuid::new_v4();
    let repo = MockRepo::with_users(vec![user(bypass_id, "local@dev.com", "admin")]);
    let state = state_with(Env::Local, repo);

    let mut parts = request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&bypass_id.to_string()).unwrap(),
    );

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(auth_user.id, bypass_id);
    assert_eq!(auth_user.role, Role::Admin);
}

#[tokio::test]
async fn local_bypass_is_disabled_in_production() {
    let bypass_id = Uuid::new_v4();
    let repo = MockRepo::with_users(vec![user(bypass_id, "local@dev.com", "admin")]);
    let state = state_with(Env::Production, repo);

    let mut parts = request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        header::HeaderValue::from_str(&bypass_id.to_string()).unwrap(),
    );

    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn require_role_enforces_the_hierarchy() {
    let make = |role| AuthUser {
        id: TEST_USER_ID,
        email: "u@example.com".to_string(),
        role,
    };

    assert!(make(Role::Admin).require_role(Role::Moderator).is_ok());
    assert!(make(Role::Moderator).require_role(Role::Moderator).is_ok());
    assert!(matches!(
        make(Role::User).require_role(Role::Moderator),
        Err(ApiError::Forbidden)
    ));
    assert!(matches!(
        make(Role::Moderator).require_role(Role::Admin),
        Err(ApiError::Forbidden)
    ));
}

#[tokio::test]
async fn maybe_user_never_rejects_and_probes_quietly() {
    let state = state_with(Env::Production, MockRepo::default());

    // Anonymous request: extraction succeeds with no identity, and every
    // permission probe answers false.
    let mut parts = request_parts(Method::GET, "/".parse().unwrap());
    let MaybeUser(viewer) = MaybeUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert!(viewer.is_none());

    let anonymous = MaybeUser(None);
    assert!(!anonymous.has_permission(Role::User));

    let moderator = MaybeUser(Some(AuthUser {
        id: TEST_USER_ID,
        email: "mod@example.com".to_string(),
        role: Role::Moderator,
    }));
    assert!(moderator.has_permission(Role::User));
    assert!(moderator.has_permission(Role::Moderator));
    assert!(!moderator.has_permission(Role::Admin));
}
