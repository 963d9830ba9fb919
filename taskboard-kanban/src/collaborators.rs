//! External collaborators: authentication, document storage, blob storage and
//! text generation.
//!
//! The board engine only talks to the outside world through these traits.
//! `taskboard-remote` implements them over HTTP; [`crate::memory`] implements
//! them in memory for tests.

use crate::error::Result;
use crate::summary::SummaryRequest;
use crate::types::{ImageRef, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// A collection inside a database of the document store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Collection {
    pub database_id: String,
    pub collection_id: String,
}

impl Collection {
    pub fn new(database_id: impl Into<String>, collection_id: impl Into<String>) -> Self {
        Self {
            database_id: database_id.into(),
            collection_id: collection_id.into(),
        }
    }
}

/// A stored document: store-assigned id and creation time plus its fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub data: Map<String, Value>,
}

/// Filter applied when listing documents
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum Query {
    /// Attribute equals any of the values
    Equal {
        attribute: String,
        values: Vec<Value>,
    },
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equal {
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    /// True when `data` satisfies the query
    pub fn matches(&self, data: &Map<String, Value>) -> bool {
        match self {
            Self::Equal { attribute, values } => data
                .get(attribute)
                .is_some_and(|value| values.contains(value)),
        }
    }
}

/// Image bytes to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Resolves the current session to a user
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Fails with `Unauthenticated` when there is no valid session
    async fn current_user(&self) -> Result<User>;
}

/// Request/response access to a document database
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(
        &self,
        collection: &Collection,
        queries: &[Query],
    ) -> Result<Vec<Document>>;

    async fn create_document(
        &self,
        collection: &Collection,
        data: Map<String, Value>,
    ) -> Result<Document>;

    /// Patch the given fields; fields not named keep their value
    async fn update_document(
        &self,
        collection: &Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document>;

    async fn delete_document(&self, collection: &Collection, id: &str) -> Result<()>;
}

/// Storage for image blobs
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn upload_blob(
        &self,
        bucket_id: &str,
        upload: ImageUpload,
        owner: &UserId,
    ) -> Result<ImageRef>;

    /// Fails with `NotFound` when the blob does not exist
    async fn delete_blob(&self, image: &ImageRef) -> Result<()>;

    /// URL under which the blob can be displayed
    fn public_url(&self, image: &ImageRef) -> String;
}

/// Natural-language text generation
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &SummaryRequest) -> Result<String>;
}
