use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token. Writes here accept the body verbatim; no
/// ownership or shape checks are made.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Liveness banner for monitors and load balancers.
        .route("/", get(|| async { "Jersey Geeks Server running" }))
        // --- Catalog ---
        // GET /jerseys?email=...&search=...  |  POST /jerseys
        .route(
            "/jerseys",
            get(handlers::list_items).post(handlers::create_item),
        )
        // GET /club-jerseys?search=...
        .route("/club-jerseys", get(handlers::list_club_items))
        // GET /custom-jerseys?search=...
        .route("/custom-jerseys", get(handlers::list_custom_items))
        // GET/PUT/DELETE /jerseys/{id}
        .route(
            "/jerseys/{id}",
            get(handlers::get_item)
                .put(handlers::replace_item)
                .delete(handlers::delete_item),
        )
        // --- Cart ---
        // GET /carts?email=...  |  POST /carts
        .route(
            "/carts",
            get(handlers::list_cart_entries).post(handlers::add_cart_entry),
        )
        .route("/carts/{id}", delete(handlers::delete_cart_entry))
        // --- Identity ---
        // POST /users
        // Idempotent sign-up; GET on the same path is mounted by the admin router.
        .route("/users", post(handlers::create_user))
        // POST /jwt
        // Issues a one-hour bearer token.
        .route("/jwt", post(handlers::issue_token))
}
