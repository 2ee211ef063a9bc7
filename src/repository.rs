use crate::{
    error::AppError,
    models::{DeleteAck, InsertAck, UpdateAck},
};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    Client, Database,
    bson::{Bson, Document, doc, oid::ObjectId},
};
use regex::RegexBuilder;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Collection
///
/// The three named collections this service reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Items,
    Carts,
    Users,
}

impl Collection {
    /// The collection's name in the database.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Items => "jerseys",
            Self::Carts => "carts",
            Self::Users => "users",
        }
    }
}

/// Repository Trait
///
/// The document-store contract every handler talks to. Each method is exactly one
/// store operation; filters come from the `query` module.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across Axum's
/// request tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    /// All documents matching `filter`, in store order. Never paginated.
    async fn find(&self, collection: Collection, filter: Document) -> Result<Vec<Document>, AppError>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<Option<Document>, AppError>;

    /// Inserts `document` as given. An `_id` is generated when the document has none.
    async fn insert_one(&self, collection: Collection, document: Document) -> Result<InsertAck, AppError>;

    /// Applies `fields` as a `$set` to the first document matching `filter`.
    async fn update_one(
        &self,
        collection: Collection,
        filter: Document,
        fields: Document,
    ) -> Result<UpdateAck, AppError>;

    async fn delete_one(&self, collection: Collection, filter: Document) -> Result<DeleteAck, AppError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

// --- MongoDB ---

/// MongoRepository
///
/// The production implementation, backed by a MongoDB database handle. Pooling and
/// reconnection are left to the driver.
pub struct MongoRepository {
    db: Database,
}

impl MongoRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Connects to `uri` and selects `db_name`.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, mongodb::error::Error> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::new(client.database(db_name)))
    }

    fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        self.db.collection(collection.name())
    }
}

#[async_trait]
impl Repository for MongoRepository {
    async fn find(&self, collection: Collection, filter: Document) -> Result<Vec<Document>, AppError> {
        let cursor = self.collection(collection).find(filter).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<Option<Document>, AppError> {
        Ok(self.collection(collection).find_one(filter).await?)
    }

    async fn insert_one(&self, collection: Collection, document: Document) -> Result<InsertAck, AppError> {
        let result = self.collection(collection).insert_one(document).await?;
        Ok(InsertAck::new(result.inserted_id))
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Document,
        fields: Document,
    ) -> Result<UpdateAck, AppError> {
        let result = self
            .collection(collection)
            .update_one(filter, doc! { "$set": fields })
            .await?;
        Ok(UpdateAck::new(result.matched_count, result.modified_count))
    }

    async fn delete_one(&self, collection: Collection, filter: Document) -> Result<DeleteAck, AppError> {
        let result = self.collection(collection).delete_one(filter).await?;
        Ok(DeleteAck::new(result.deleted_count))
    }
}

// --- In-Memory ---

/// MemoryRepository
///
/// An in-process store used by the test suite and by `STORE_BACKEND=memory` local runs.
///
/// It evaluates the subset of the filter language the `query` module produces:
/// top-level field equality (null matches a missing field) and `{"$regex", "$options"}`
/// on string fields.
#[derive(Default)]
pub struct MemoryRepository {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in `collection`.
    pub async fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }
}

fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(field, expected)| matches_field(document.get(field), expected))
}

fn matches_field(actual: Option<&Bson>, expected: &Bson) -> bool {
    match expected {
        Bson::Document(operator) if operator.contains_key("$regex") => {
            let (Ok(pattern), Some(Bson::String(value))) = (operator.get_str("$regex"), actual) else {
                return false;
            };
            let case_insensitive = operator.get_str("$options").is_ok_and(|o| o.contains('i'));
            RegexBuilder::new(pattern)
                .case_insensitive(case_insensitive)
                .build()
                .is_ok_and(|re| re.is_match(value))
        }
        Bson::Null => matches!(actual, None | Some(Bson::Null)),
        _ => actual == Some(expected),
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find(&self, collection: Collection, filter: Document) -> Result<Vec<Document>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|d| matches_filter(d, &filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: Document,
    ) -> Result<Option<Document>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|documents| documents.iter().find(|d| matches_filter(d, &filter)))
            .cloned())
    }

    async fn insert_one(&self, collection: Collection, mut document: Document) -> Result<InsertAck, AppError> {
        let id = match document.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                document.insert("_id", id.clone());
                id
            }
        };
        self.collections
            .write()
            .await
            .entry(collection)
            .or_default()
            .push(document);
        Ok(InsertAck::new(id))
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: Document,
        fields: Document,
    ) -> Result<UpdateAck, AppError> {
        let mut collections = self.collections.write().await;
        let Some(document) = collections
            .get_mut(&collection)
            .and_then(|documents| documents.iter_mut().find(|d| matches_filter(d, &filter)))
        else {
            return Ok(UpdateAck::new(0, 0));
        };

        let mut modified = false;
        for (field, value) in fields {
            if document.get(&field) != Some(&value) {
                document.insert(field, value);
                modified = true;
            }
        }
        Ok(UpdateAck::new(1, u64::from(modified)))
    }

    async fn delete_one(&self, collection: Collection, filter: Document) -> Result<DeleteAck, AppError> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(&collection) else {
            return Ok(DeleteAck::new(0));
        };
        match documents.iter().position(|d| matches_filter(d, &filter)) {
            Some(index) => {
                documents.remove(index);
                Ok(DeleteAck::new(1))
            }
            None => Ok(DeleteAck::new(0)),
        }
    }
}
