use crate::{
    AppState,
    auth::{self, AuthUser, Claims},
    error::{AppError, MessageBody},
    extractors::{extract_json, extract_query},
    models::{
        self, AdminStatus, CartEntry, CreateUserResponse, DeleteAck, InsertAck, Item, TokenResponse,
        UpdateAck, User, UserExists,
    },
    query::{self, Category},
    repository::Collection,
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use mongodb::bson::Document;
use serde::Deserialize;
use serde_json::{Map, Value};

// --- Filter Structs ---

/// ItemFilter
///
/// Query parameters for the catalog listing (GET /jerseys).
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ItemFilter {
    /// Only items listed by this provider.
    pub email: Option<String>,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
}

/// SearchFilter
///
/// Query parameters for the category listings.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct SearchFilter {
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
}

/// CartFilter
///
/// Query parameters for GET /carts.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct CartFilter {
    /// The shopper whose cart to list.
    pub email: Option<String>,
}

fn render(documents: Vec<Document>) -> Vec<Value> {
    documents.into_iter().map(models::document_to_json).collect()
}

// --- Catalog ---

/// list_items
///
/// [Public Route] Lists jerseys, optionally narrowed by provider email and title search.
/// Both filters apply together when both are given.
#[utoipa::path(
    get,
    path = "/jerseys",
    params(ItemFilter),
    responses((status = 200, description = "Matching jerseys", body = [Item]))
)]
pub async fn list_items(
    State(state): State<AppState>,
    filter: Result<Query<ItemFilter>, QueryRejection>,
) -> Result<Json<Vec<Value>>, AppError> {
    let filter = extract_query(filter)?;
    let filter = query::item_filter(filter.email.as_deref(), filter.search.as_deref());
    let items = state.repo.find(Collection::Items, filter).await?;
    Ok(Json(render(items)))
}

async fn list_category(
    state: AppState,
    category: Category,
    search: Option<String>,
) -> Result<Json<Vec<Value>>, AppError> {
    let filter = query::category_filter(category, search.as_deref());
    let items = state.repo.find(Collection::Items, filter).await?;
    Ok(Json(render(items)))
}

/// list_club_items
///
/// [Public Route] Lists jerseys in the "club" category.
#[utoipa::path(
    get,
    path = "/club-jerseys",
    params(SearchFilter),
    responses((status = 200, description = "Club jerseys", body = [Item]))
)]
pub async fn list_club_items(
    State(state): State<AppState>,
    filter: Result<Query<SearchFilter>, QueryRejection>,
) -> Result<Json<Vec<Value>>, AppError> {
    list_category(state, Category::Club, extract_query(filter)?.search).await
}

/// list_custom_items
///
/// [Public Route] Lists jerseys in the "local" (custom-made) category.
#[utoipa::path(
    get,
    path = "/custom-jerseys",
    params(SearchFilter),
    responses((status = 200, description = "Custom jerseys", body = [Item]))
)]
pub async fn list_custom_items(
    State(state): State<AppState>,
    filter: Result<Query<SearchFilter>, QueryRejection>,
) -> Result<Json<Vec<Value>>, AppError> {
    list_category(state, Category::Local, extract_query(filter)?.search).await
}

/// get_item
///
/// [Public Route] Returns one jersey, or `null` when the id matches nothing.
#[utoipa::path(
    get,
    path = "/jerseys/{id}",
    params(("id" = String, Path, description = "Jersey ObjectId")),
    responses((status = 200, description = "The jersey or null", body = Item))
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Value>>, AppError> {
    let item = state
        .repo
        .find_one(Collection::Items, query::id_filter(&id)?)
        .await?;
    Ok(Json(item.map(models::document_to_json)))
}

/// create_item
///
/// [Public Route] Stores the request body as a new jersey, exactly as sent.
#[utoipa::path(
    post,
    path = "/jerseys",
    request_body = Item,
    responses((status = 200, description = "Inserted", body = InsertAck))
)]
pub async fn create_item(
    State(state): State<AppState>,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<Json<InsertAck>, AppError> {
    let body = extract_json(body)?;
    Ok(Json(state.repo.insert_one(Collection::Items, body).await?))
}

/// replace_item
///
/// [Public Route] Overwrites the whitelisted jersey fields with the body's values.
/// Whitelisted fields missing from the body become null; other body fields are ignored.
#[utoipa::path(
    put,
    path = "/jerseys/{id}",
    params(("id" = String, Path, description = "Jersey ObjectId")),
    request_body = Item,
    responses((status = 200, description = "Update acknowledgment", body = UpdateAck))
)]
pub async fn replace_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<Json<UpdateAck>, AppError> {
    let filter = query::id_filter(&id)?;
    let body = extract_json(body)?;
    let ack = state
        .repo
        .update_one(Collection::Items, filter, query::item_replacement(&body))
        .await?;
    Ok(Json(ack))
}

/// delete_item
///
/// [Public Route] Removes a jersey. Existing cart entries that reference it are left alone.
#[utoipa::path(
    delete,
    path = "/jerseys/{id}",
    params(("id" = String, Path, description = "Jersey ObjectId")),
    responses((status = 200, description = "Delete acknowledgment", body = DeleteAck))
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, AppError> {
    let ack = state
        .repo
        .delete_one(Collection::Items, query::id_filter(&id)?)
        .await?;
    Ok(Json(ack))
}

// --- Cart ---

/// add_cart_entry
///
/// [Public Route] Saves the body as a cart entry. The `email` in the body decides whose
/// cart it lands in; it is not checked against any token.
#[utoipa::path(
    post,
    path = "/carts",
    request_body = CartEntry,
    responses((status = 200, description = "Inserted", body = InsertAck))
)]
pub async fn add_cart_entry(
    State(state): State<AppState>,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<Json<InsertAck>, AppError> {
    let body = extract_json(body)?;
    Ok(Json(state.repo.insert_one(Collection::Carts, body).await?))
}

/// list_cart_entries
///
/// [Public Route] Lists every cart entry saved under `email`.
#[utoipa::path(
    get,
    path = "/carts",
    params(CartFilter),
    responses((status = 200, description = "Cart entries", body = [CartEntry]))
)]
pub async fn list_cart_entries(
    State(state): State<AppState>,
    filter: Result<Query<CartFilter>, QueryRejection>,
) -> Result<Json<Vec<Value>>, AppError> {
    let filter = extract_query(filter)?;
    let entries = state
        .repo
        .find(Collection::Carts, query::cart_filter(filter.email.as_deref()))
        .await?;
    Ok(Json(render(entries)))
}

/// delete_cart_entry
///
/// [Public Route] Removes a single cart entry by its own id.
#[utoipa::path(
    delete,
    path = "/carts/{id}",
    params(("id" = String, Path, description = "Cart entry ObjectId")),
    responses((status = 200, description = "Delete acknowledgment", body = DeleteAck))
)]
pub async fn delete_cart_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, AppError> {
    let ack = state
        .repo
        .delete_one(Collection::Carts, query::id_filter(&id)?)
        .await?;
    Ok(Json(ack))
}

// --- Users ---

/// list_users
///
/// [Admin Route] Returns every user document.
///
/// *Authorization*: the admin route layer runs the token check and the role gate first.
#[utoipa::path(
    get,
    path = "/users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All users", body = [User]),
        (status = 401, description = "Missing or invalid token", body = MessageBody),
        (status = 403, description = "Not an admin", body = MessageBody)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<Value>>, AppError> {
    let users = state.repo.find(Collection::Users, Document::new()).await?;
    Ok(Json(render(users)))
}

/// check_admin
///
/// [Authenticated Route] Tells a signed-in user whether they are an admin.
///
/// *Authorization*: callers may only ask about themselves; any other email is 403.
#[utoipa::path(
    get,
    path = "/users/admin/{email}",
    params(("email" = String, Path, description = "Must equal the token's email")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Role flag", body = AdminStatus),
        (status = 401, description = "Missing or invalid token", body = MessageBody),
        (status = 403, description = "Asked about someone else", body = MessageBody)
    )
)]
pub async fn check_admin(
    AuthUser { claims }: AuthUser,
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<AdminStatus>, AppError> {
    auth::require_self(&claims, &email)?;

    let user = state
        .repo
        .find_one(Collection::Users, query::email_filter(Some(email.as_str())))
        .await?;
    Ok(Json(AdminStatus {
        admin: user.as_ref().is_some_and(models::has_admin_role),
    }))
}

/// create_user
///
/// [Public Route] Registers a user on first sign-in.
///
/// *Idempotency*: if a user with the body's email already exists, nothing is inserted
/// and the "already exists" sentinel is returned instead of an acknowledgment.
#[utoipa::path(
    post,
    path = "/users",
    request_body = User,
    responses((status = 200, description = "Inserted, or already exists", body = CreateUserResponse))
)]
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<Document>, JsonRejection>,
) -> Result<Json<CreateUserResponse>, AppError> {
    let body = extract_json(body)?;
    let filter = query::email_filter(body.get_str("email").ok());

    if state.repo.find_one(Collection::Users, filter).await?.is_some() {
        return Ok(Json(CreateUserResponse::Exists(UserExists::default())));
    }

    let ack = state.repo.insert_one(Collection::Users, body).await?;
    Ok(Json(CreateUserResponse::Inserted(ack)))
}

/// delete_user
///
/// [Admin Route] Removes a user by id.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User ObjectId")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Delete acknowledgment", body = DeleteAck),
        (status = 401, description = "Missing or invalid token", body = MessageBody),
        (status = 403, description = "Not an admin", body = MessageBody)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, AppError> {
    let ack = state
        .repo
        .delete_one(Collection::Users, query::id_filter(&id)?)
        .await?;
    Ok(Json(ack))
}

/// promote_user
///
/// [Admin Route] Sets a user's role to "admin". No other field is touched.
#[utoipa::path(
    patch,
    path = "/users/admin/{id}",
    params(("id" = String, Path, description = "User ObjectId")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Update acknowledgment", body = UpdateAck),
        (status = 401, description = "Missing or invalid token", body = MessageBody),
        (status = 403, description = "Not an admin", body = MessageBody)
    )
)]
pub async fn promote_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UpdateAck>, AppError> {
    let ack = state
        .repo
        .update_one(Collection::Users, query::id_filter(&id)?, query::admin_promotion())
        .await?;
    Ok(Json(ack))
}

// --- Tokens ---

/// issue_token
///
/// [Public Route] Signs the body's fields into a bearer token valid for one hour.
#[utoipa::path(
    post,
    path = "/jwt",
    request_body = User,
    responses((status = 200, description = "Signed token", body = TokenResponse))
)]
pub async fn issue_token(
    State(state): State<AppState>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let claims = Claims::from_payload(extract_json(payload)?);
    let token = auth::sign(&claims, &state.config.jwt_secret)?;
    Ok(Json(TokenResponse { token }))
}
