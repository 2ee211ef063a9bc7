use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, patch},
};

/// Admin Router Module
///
/// User management. The `admin_middleware` route layer verifies the token (401) and
/// then requires the caller's user record to carry the admin role (403).
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /users
        .route("/users", get(handlers::list_users))
        // DELETE /users/{id}
        .route("/users/{id}", delete(handlers::delete_user))
        // PATCH /users/admin/{id}
        // Promotes the user to admin.
        .route("/users/admin/{key}", patch(handlers::promote_user))
}
