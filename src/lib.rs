use axum::{
    Router,
    extract::{FromRef, Request},
    http::{HeaderName, HeaderValue, Method, header},
    middleware::{self, Next},
    response::Response,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod query;
pub mod repository;

// Routing segregated by access tier (Public, Authenticated, Admin).
pub mod routes;
use auth::{AdminUser, AuthUser};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use repository::{MemoryRepository, MongoRepository, RepositoryState};

/// Registers the `bearer` security scheme referenced by the protected handlers.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and schema into the OpenAPI document
/// served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_items, handlers::list_club_items, handlers::list_custom_items,
        handlers::get_item, handlers::create_item, handlers::replace_item, handlers::delete_item,
        handlers::add_cart_entry, handlers::list_cart_entries, handlers::delete_cart_entry,
        handlers::list_users, handlers::check_admin, handlers::create_user,
        handlers::delete_user, handlers::promote_user, handlers::issue_token
    ),
    components(
        schemas(
            models::Item, models::CartEntry, models::User, models::InsertAck,
            models::UpdateAck, models::DeleteAck, models::UserExists,
            models::CreateUserResponse, models::AdminStatus, models::TokenResponse,
            error::MessageBody,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "jersey-geeks", description = "Jersey Geeks store API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container shared by every request: the store handle and the
/// loaded configuration. Built once in `main` and injected through Axum's `State`.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: the document store (MongoDB or in-memory).
    pub repo: RepositoryState,
    /// Configuration: signing secret, CORS allow-list, etc.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors such as `AuthUser` and `AdminUser` pull just the piece they need.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Gate for the authenticated routes. Extracting `AuthUser` verifies the bearer token;
/// a failure rejects with 401 before the handler (or the store) is reached.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// admin_middleware
///
/// Gate for the admin routes: token verification (401) followed by the role gate (403).
async fn admin_middleware(_admin: AdminUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// Builds the CORS policy: only the configured origins, with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// create_router
///
/// Assembles the routing structure, applies the auth gates and the observability
/// layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: no gate.
        .merge(public::public_routes())
        // Authenticated Routes: token verification only.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin Routes: token verification, then the role gate.
        .merge(
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), admin_middleware)),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                // Generates a UUID x-request-id for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // Echoes the request id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span with method, URI and the `x-request-id`, so every log
/// line for one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
