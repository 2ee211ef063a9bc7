use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::JsonRejection,
    },
};
use jersey_geeks::{
    AppError, AppState, MemoryRepository,
    auth::{AuthUser, Claims, verify_bearer},
    config::AppConfig,
    handlers::{self, CartFilter, ItemFilter, SearchFilter},
    models::CreateUserResponse,
    repository::{Collection, Repository},
};
use mongodb::bson::{Bson, Document, doc, oid::ObjectId};
use serde_json::{Map, Value, json};
use std::sync::Arc;

// --- Test Setup ---

const TEST_JWT_SECRET: &str = "handler-test-secret";

fn create_test_state() -> (AppState, Arc<MemoryRepository>) {
    let repo = Arc::new(MemoryRepository::new());
    let config = AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };
    let state = AppState {
        repo: repo.clone(),
        config,
    };
    (state, repo)
}

async fn seed(repo: &MemoryRepository, collection: Collection, document: Document) -> ObjectId {
    let ack = repo.insert_one(collection, document).await.unwrap();
    match ack.inserted_id {
        Bson::ObjectId(oid) => oid,
        other => panic!("expected an ObjectId, got {other:?}"),
    }
}

fn auth_user(email: &str) -> AuthUser {
    let mut payload = Map::new();
    payload.insert("email".to_string(), Value::from(email));
    AuthUser {
        claims: Claims::from_payload(payload),
    }
}

fn titles(items: &[Value]) -> Vec<&str> {
    items.iter().filter_map(|item| item["title"].as_str()).collect()
}

fn body(value: Value) -> Result<Json<Document>, JsonRejection> {
    Ok(Json(serde_json::from_value(value).unwrap()))
}

// --- Catalog ---

#[tokio::test]
async fn test_list_items_composes_email_and_search() {
    let (state, repo) = create_test_state();
    seed(&repo, Collection::Items, doc! { "title": "Retro Home", "providerEmail": "a@shop.com" }).await;
    seed(&repo, Collection::Items, doc! { "title": "Retro Away", "providerEmail": "b@shop.com" }).await;
    seed(&repo, Collection::Items, doc! { "title": "Modern Home", "providerEmail": "a@shop.com" }).await;

    let Json(items) = handlers::list_items(
        State(state.clone()),
        Ok(Query(ItemFilter {
            email: Some("a@shop.com".to_string()),
            search: Some("retro".to_string()),
        })),
    )
    .await
    .unwrap();
    assert_eq!(titles(&items), vec!["Retro Home"]);

    let Json(all) = handlers::list_items(State(state), Ok(Query(ItemFilter::default())))
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_search_is_literal_not_a_pattern() {
    let (state, repo) = create_test_state();
    seed(&repo, Collection::Items, doc! { "title": "Kit (2024)", "category": "club" }).await;
    seed(&repo, Collection::Items, doc! { "title": "Kit 2024", "category": "club" }).await;

    let Json(items) = handlers::list_club_items(
        State(state),
        Ok(Query(SearchFilter {
            search: Some("(2024)".to_string()),
        })),
    )
    .await
    .unwrap();
    assert_eq!(titles(&items), vec!["Kit (2024)"]);
}

#[tokio::test]
async fn test_category_listings_only_return_their_category() {
    let (state, repo) = create_test_state();
    seed(&repo, Collection::Items, doc! { "title": "Club Home", "category": "club" }).await;
    seed(&repo, Collection::Items, doc! { "title": "Local Home", "category": "local" }).await;
    seed(&repo, Collection::Items, doc! { "title": "Vintage", "category": "retro" }).await;

    let Json(club) = handlers::list_club_items(State(state.clone()), Ok(Query(SearchFilter::default())))
        .await
        .unwrap();
    assert_eq!(titles(&club), vec!["Club Home"]);

    let Json(custom) = handlers::list_custom_items(
        State(state),
        Ok(Query(SearchFilter {
            search: Some("home".to_string()),
        })),
    )
    .await
    .unwrap();
    assert_eq!(titles(&custom), vec!["Local Home"]);
}

#[tokio::test]
async fn test_get_item_renders_hex_id_or_null() {
    let (state, repo) = create_test_state();
    let oid = seed(&repo, Collection::Items, doc! { "title": "Home", "price": 25 }).await;

    let Json(found) = handlers::get_item(State(state.clone()), Path(oid.to_hex()))
        .await
        .unwrap();
    let found = found.unwrap();
    assert_eq!(found["_id"], Value::String(oid.to_hex()));
    assert_eq!(found["price"], 25);

    let Json(missing) = handlers::get_item(State(state), Path(ObjectId::new().to_hex()))
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_malformed_id_is_a_server_error() {
    let (state, _repo) = create_test_state();

    let result = handlers::get_item(State(state.clone()), Path("not-an-id".to_string())).await;
    assert!(matches!(result, Err(AppError::MalformedIdentifier(_))));

    let result = handlers::delete_cart_entry(State(state), Path("123".to_string())).await;
    assert!(matches!(result, Err(AppError::MalformedIdentifier(_))));
}

#[tokio::test]
async fn test_create_item_stores_body_verbatim() {
    let (state, repo) = create_test_state();

    let Json(ack) = handlers::create_item(
        State(state),
        body(json!({ "title": "Home", "providerEmail": "a@shop.com", "extra": { "nested": true } })),
    )
    .await
    .unwrap();
    assert!(ack.acknowledged);

    let stored = repo
        .find_one(Collection::Items, doc! { "_id": ack.inserted_id })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.get_str("providerEmail").unwrap(), "a@shop.com");
    assert!(stored.get_document("extra").unwrap().get_bool("nested").unwrap());
}

#[tokio::test]
async fn test_replace_item_copies_only_whitelisted_fields() {
    let (state, repo) = create_test_state();
    let oid = seed(
        &repo,
        Collection::Items,
        doc! { "title": "Old", "price": 10, "providerEmail": "a@shop.com", "gsm": "160" },
    )
    .await;

    let Json(ack) = handlers::replace_item(
        State(state),
        Path(oid.to_hex()),
        body(json!({ "title": "New", "price": 12, "providerEmail": "thief@shop.com", "hack": 1 })),
    )
    .await
    .unwrap();
    assert_eq!((ack.matched_count, ack.modified_count), (1, 1));

    let stored = repo
        .find_one(Collection::Items, doc! { "_id": oid })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.get_str("title").unwrap(), "New");
    assert_eq!(stored.get_str("providerEmail").unwrap(), "a@shop.com");
    assert!(!stored.contains_key("hack"));
    // Whitelisted but absent from the body.
    assert_eq!(stored.get("gsm"), Some(&Bson::Null));
}

#[tokio::test]
async fn test_delete_item_twice_reports_zero_the_second_time() {
    let (state, repo) = create_test_state();
    let oid = seed(&repo, Collection::Items, doc! { "title": "Gone" }).await;

    let Json(first) = handlers::delete_item(State(state.clone()), Path(oid.to_hex()))
        .await
        .unwrap();
    assert_eq!(first.deleted_count, 1);

    let Json(second) = handlers::delete_item(State(state), Path(oid.to_hex()))
        .await
        .unwrap();
    assert_eq!(second.deleted_count, 0);
}

// --- Cart ---

#[tokio::test]
async fn test_cart_listing_is_scoped_to_email() {
    let (state, _repo) = create_test_state();
    for email in ["a@x.com", "a@x.com", "b@x.com"] {
        handlers::add_cart_entry(
            State(state.clone()),
            body(json!({ "email": email, "jerseyId": ObjectId::new().to_hex() })),
        )
        .await
        .unwrap();
    }

    let Json(entries) = handlers::list_cart_entries(
        State(state.clone()),
        Ok(Query(CartFilter {
            email: Some("a@x.com".to_string()),
        })),
    )
    .await
    .unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|entry| entry["email"] == "a@x.com"));

    let Json(none) = handlers::list_cart_entries(State(state), Ok(Query(CartFilter::default())))
        .await
        .unwrap();
    assert!(none.is_empty(), "a missing email must not list every cart");
}

// --- Users ---

#[tokio::test]
async fn test_create_user_is_idempotent() {
    let (state, repo) = create_test_state();

    let Json(first) = handlers::create_user(State(state.clone()), body(json!({ "email": "a@x.com" })))
        .await
        .unwrap();
    assert!(matches!(first, CreateUserResponse::Inserted(_)));

    let Json(second) = handlers::create_user(
        State(state),
        body(json!({ "email": "a@x.com", "name": "Ann" })),
    )
    .await
    .unwrap();
    let CreateUserResponse::Exists(sentinel) = second else {
        panic!("expected the already-exists sentinel");
    };
    assert_eq!(sentinel.message, "User already exists");
    assert!(sentinel.inserted_id.is_none());
    assert_eq!(repo.count(Collection::Users).await, 1);
}

#[tokio::test]
async fn test_check_admin_answers_only_for_self() {
    let (state, repo) = create_test_state();
    seed(&repo, Collection::Users, doc! { "email": "boss@x.com", "role": "admin" }).await;
    seed(&repo, Collection::Users, doc! { "email": "fan@x.com" }).await;

    let Json(status) = handlers::check_admin(
        auth_user("boss@x.com"),
        State(state.clone()),
        Path("boss@x.com".to_string()),
    )
    .await
    .unwrap();
    assert!(status.admin);

    let Json(status) = handlers::check_admin(
        auth_user("fan@x.com"),
        State(state.clone()),
        Path("fan@x.com".to_string()),
    )
    .await
    .unwrap();
    assert!(!status.admin);

    let result = handlers::check_admin(
        auth_user("fan@x.com"),
        State(state),
        Path("boss@x.com".to_string()),
    )
    .await;
    assert!(matches!(result, Err(AppError::Forbidden("Forbidden"))));
}

#[tokio::test]
async fn test_promote_user_only_sets_role() {
    let (state, repo) = create_test_state();
    let oid = seed(&repo, Collection::Users, doc! { "email": "fan@x.com", "name": "Fan" }).await;

    let Json(ack) = handlers::promote_user(State(state.clone()), Path(oid.to_hex()))
        .await
        .unwrap();
    assert_eq!((ack.matched_count, ack.modified_count), (1, 1));

    let stored = repo
        .find_one(Collection::Users, doc! { "_id": oid })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.get_str("role").unwrap(), "admin");
    assert_eq!(stored.get_str("name").unwrap(), "Fan");

    let Json(again) = handlers::promote_user(State(state), Path(oid.to_hex()))
        .await
        .unwrap();
    assert_eq!((again.matched_count, again.modified_count), (1, 0));
}

#[tokio::test]
async fn test_list_and_delete_users() {
    let (state, repo) = create_test_state();
    let oid = seed(&repo, Collection::Users, doc! { "email": "a@x.com" }).await;
    seed(&repo, Collection::Users, doc! { "email": "b@x.com" }).await;

    let Json(users) = handlers::list_users(State(state.clone())).await.unwrap();
    assert_eq!(users.len(), 2);

    let Json(ack) = handlers::delete_user(State(state), Path(oid.to_hex()))
        .await
        .unwrap();
    assert_eq!(ack.deleted_count, 1);
    assert_eq!(repo.count(Collection::Users).await, 1);
}

// --- Tokens ---

#[tokio::test]
async fn test_issue_token_round_trips_through_verifier() {
    let (state, _repo) = create_test_state();
    let mut payload = Map::new();
    payload.insert("email".to_string(), Value::from("a@x.com"));
    payload.insert("name".to_string(), Value::from("Ann"));

    let Json(response) = handlers::issue_token(State(state), Ok(Json(payload))).await.unwrap();

    let claims = verify_bearer(
        Some(format!("Bearer {}", response.token).as_str()),
        TEST_JWT_SECRET,
    )
    .unwrap();
    assert_eq!(claims.email, "a@x.com");
    assert_eq!(claims.extra.get("name"), Some(&Value::from("Ann")));
    assert_eq!(claims.exp - claims.iat, 3600);
}
