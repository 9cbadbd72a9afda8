/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated
/// modules. Access control is applied explicitly at the module level (via
/// Axum layers and per-handler `require_role` calls), so no protected
/// endpoint is ever exposed by accident.
///
/// Routes accessible to all users (anonymous, read-only).
/// Handlers must enforce visibility checks (`is_public=true`) at the
/// Repository level.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated user session.
pub mod authenticated;

/// Routes restricted to moderators and admins. Every handler performs its
/// own `require_role` check on top of the authentication layer.
pub mod admin;
