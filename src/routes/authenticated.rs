use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes for any caller holding a valid bearer token. The `auth_middleware` route
/// layer rejects everyone else with 401.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /users/admin/{email}
        // Whether the caller is an admin. The segment is an email here; the admin router
        // mounts PATCH on the same path, where it is a user id. The handler only answers
        // for the token's own email.
        .route("/users/admin/{key}", get(handlers::check_admin))
}
