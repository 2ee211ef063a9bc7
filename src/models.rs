use mongodb::bson::{Bson, Document, oid::ObjectId};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Stored Documents ---
//
// Bodies are written to the store verbatim, so these structs describe the expected
// shape for documentation and the generated TypeScript bindings. Handlers move raw
// `Document`s through the repository.

/// The only role value this service ever assigns.
pub const ADMIN_ROLE: &str = "admin";

/// Item fields copied from the request body by the replace endpoint (PUT /jerseys/{id}).
/// Any other body field is dropped on replace.
pub const ITEM_REPLACEABLE_FIELDS: [&str; 11] = [
    "title",
    "category",
    "image",
    "price",
    "description",
    "fabric_quality",
    "available",
    "version",
    "sleeve",
    "design",
    "gsm",
];

/// Item
///
/// A catalog jersey from the `jerseys` collection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Item {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[ts(type = "string")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub title: Option<String>,
    // "club", "local" or free text.
    pub category: Option<String>,
    pub image: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub fabric_quality: Option<String>,
    pub available: Option<String>,
    pub version: Option<String>,
    pub sleeve: Option<String>,
    pub design: Option<String>,
    // Fabric weight.
    pub gsm: Option<String>,
    #[serde(rename = "providerEmail")]
    pub provider_email: Option<String>,
}

/// CartEntry
///
/// A jersey saved to a shopper's cart (`carts` collection). The display fields are
/// copied from the item when it is added; nothing keeps them in sync afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CartEntry {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[ts(type = "string")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    // Shopper email. Caller-supplied and never checked against the token.
    pub email: Option<String>,
    #[serde(rename = "jerseyId")]
    pub jersey_id: Option<String>,
    pub title: Option<String>,
    pub image: Option<String>,
    pub price: Option<f64>,
}

/// User
///
/// A registered shopper from the `users` collection. `role` is absent for members.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    #[ts(type = "string")]
    #[schema(value_type = Option<String>)]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Returns true when a stored user document carries the admin role.
pub fn has_admin_role(user: &Document) -> bool {
    user.get_str("role").is_ok_and(|role| role == ADMIN_ROLE)
}

// --- Store Acknowledgments ---

/// InsertAck
///
/// Result of an insert-one, shaped like the driver's `InsertOneResult` document.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InsertAck {
    pub acknowledged: bool,
    #[serde(serialize_with = "serialize_bson")]
    #[ts(type = "string")]
    #[schema(value_type = String)]
    pub inserted_id: Bson,
}

impl InsertAck {
    pub fn new(inserted_id: Bson) -> Self {
        Self {
            acknowledged: true,
            inserted_id,
        }
    }
}

/// UpdateAck
///
/// Result of an update-one. Upserts are never requested, so the upsert fields are
/// always zero/null.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateAck {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub upserted_id: Option<String>,
}

impl UpdateAck {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_count: 0,
            upserted_id: None,
        }
    }
}

/// DeleteAck
///
/// Result of a delete-one. A zero count means nothing matched; that is not an error.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DeleteAck {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteAck {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}

// --- Response Payloads ---

/// UserExists
///
/// Sentinel returned by POST /users when the email is already registered.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserExists {
    pub message: String,
    // Always null; mirrors the shape of an insert acknowledgment.
    #[ts(type = "null")]
    #[schema(value_type = Option<String>)]
    pub inserted_id: Option<String>,
}

impl Default for UserExists {
    fn default() -> Self {
        Self {
            message: "User already exists".to_string(),
            inserted_id: None,
        }
    }
}

/// CreateUserResponse
///
/// Either the sentinel or the insert acknowledgment, serialized without a tag.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum CreateUserResponse {
    Exists(UserExists),
    Inserted(InsertAck),
}

/// AdminStatus
///
/// Output of GET /users/admin/{email}.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct AdminStatus {
    pub admin: bool,
}

/// TokenResponse
///
/// Output of POST /jwt.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
}

// --- JSON Rendering ---

/// Renders a stored document as plain JSON.
///
/// ObjectIds become their 24-character hex string; every other value uses relaxed
/// extended JSON.
pub fn document_to_json(document: Document) -> Value {
    bson_to_json(Bson::Document(document))
}

fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Document(document) => Value::Object(
            document
                .into_iter()
                .map(|(key, value)| (key, bson_to_json(value)))
                .collect(),
        ),
        Bson::Array(values) => Value::Array(values.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

fn serialize_bson<S: Serializer>(value: &Bson, serializer: S) -> Result<S::Ok, S::Error> {
    bson_to_json(value.clone()).serialize(serializer)
}
