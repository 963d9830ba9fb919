//! In-memory collaborators for tests.
//!
//! [`MemoryBackend`] implements [`DocumentStore`], [`BlobStorage`] and
//! [`Authenticator`] over plain maps, with per-operation failure injection.
//! [`ScriptedGenerator`] answers every summary request with a fixed reply.

use crate::collaborators::{
    Authenticator, BlobStorage, Collection, Document, DocumentStore, ImageUpload, Query,
    TextGenerator, User,
};
use crate::error::{KanbanError, Result};
use crate::summary::SummaryRequest;
use crate::types::{ImageRef, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use ulid::Ulid;

/// Operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryOperation {
    List,
    Create,
    Update,
    Delete,
    Upload,
    DeleteBlob,
    CurrentUser,
}

impl MemoryOperation {
    fn name(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Upload => "upload",
            Self::DeleteBlob => "delete blob",
            Self::CurrentUser => "current user",
        }
    }
}

#[derive(Default)]
struct MemoryState {
    /// Keyed by collection id, documents in creation order
    documents: HashMap<String, Vec<Document>>,
    /// Keyed by (bucket id, file id)
    blobs: BTreeMap<(String, String), ImageUpload>,
    failing: HashSet<MemoryOperation>,
    user: Option<User>,
    created: i64,
    updates: usize,
    blob_deletes: usize,
}

/// Document store, blob storage and authenticator backed by memory
#[derive(Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend with a signed-in user
    pub fn with_user(user: User) -> Self {
        let backend = Self::new();
        backend.state().user = Some(user);
        backend
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every later call of `operation` fail with a `RemoteSync` error
    pub fn fail(&self, operation: MemoryOperation) {
        self.state().failing.insert(operation);
    }

    /// Undo [`MemoryBackend::fail`]
    pub fn recover(&self, operation: MemoryOperation) {
        self.state().failing.remove(&operation);
    }

    /// Store a document verbatim, bypassing validation. Returns its id.
    pub fn insert_raw(&self, collection: &Collection, data: Value) -> String {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let mut state = self.state();
        let document = state.next_document(data);
        let id = document.id.clone();
        state
            .documents
            .entry(collection.collection_id.clone())
            .or_default()
            .push(document);
        id
    }

    pub fn documents(&self, collection: &Collection) -> Vec<Document> {
        self.state()
            .documents
            .get(&collection.collection_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn document(&self, collection: &Collection, id: &str) -> Option<Document> {
        self.documents(collection).into_iter().find(|d| d.id == id)
    }

    pub fn has_blob(&self, image: &ImageRef) -> bool {
        self.state()
            .blobs
            .contains_key(&(image.bucket_id.clone(), image.file_id.clone()))
    }

    pub fn blob_count(&self) -> usize {
        self.state().blobs.len()
    }

    /// Number of update calls received, failed ones included
    pub fn update_count(&self) -> usize {
        self.state().updates
    }

    /// Number of blob delete calls received, failed ones included
    pub fn blob_delete_count(&self) -> usize {
        self.state().blob_deletes
    }
}

impl MemoryState {
    fn check(&self, operation: MemoryOperation) -> Result<()> {
        if self.failing.contains(&operation) {
            return Err(KanbanError::remote_sync(
                operation.name(),
                "injected failure",
            ));
        }
        Ok(())
    }

    /// Creation times advance one second per document so ties never occur
    fn next_document(&mut self, data: Map<String, Value>) -> Document {
        self.created += 1;
        Document {
            id: Ulid::new().to_string().to_lowercase(),
            created_at: epoch() + Duration::seconds(self.created),
            data,
        }
    }
}

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_704_067_200, 0)
        .single()
        .unwrap_or_default()
}

#[async_trait]
impl DocumentStore for MemoryBackend {
    async fn list_documents(
        &self,
        collection: &Collection,
        queries: &[Query],
    ) -> Result<Vec<Document>> {
        self.state().check(MemoryOperation::List)?;
        Ok(self
            .documents(collection)
            .into_iter()
            .filter(|d| queries.iter().all(|q| q.matches(&d.data)))
            .collect())
    }

    async fn create_document(
        &self,
        collection: &Collection,
        data: Map<String, Value>,
    ) -> Result<Document> {
        let mut state = self.state();
        state.check(MemoryOperation::Create)?;
        let document = state.next_document(data);
        state
            .documents
            .entry(collection.collection_id.clone())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn update_document(
        &self,
        collection: &Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document> {
        let mut state = self.state();
        state.updates += 1;
        state.check(MemoryOperation::Update)?;
        let document = state
            .documents
            .get_mut(&collection.collection_id)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| KanbanError::not_found("document", id))?;
        document.data.extend(data);
        Ok(document.clone())
    }

    async fn delete_document(&self, collection: &Collection, id: &str) -> Result<()> {
        let mut state = self.state();
        state.check(MemoryOperation::Delete)?;
        let docs = state
            .documents
            .get_mut(&collection.collection_id)
            .ok_or_else(|| KanbanError::not_found("document", id))?;
        let before = docs.len();
        docs.retain(|d| d.id != id);
        if docs.len() == before {
            return Err(KanbanError::not_found("document", id));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStorage for MemoryBackend {
    async fn upload_blob(
        &self,
        bucket_id: &str,
        upload: ImageUpload,
        _owner: &UserId,
    ) -> Result<ImageRef> {
        let mut state = self.state();
        state.check(MemoryOperation::Upload)?;
        let image = ImageRef::new(bucket_id, Ulid::new().to_string().to_lowercase());
        state
            .blobs
            .insert((image.bucket_id.clone(), image.file_id.clone()), upload);
        Ok(image)
    }

    async fn delete_blob(&self, image: &ImageRef) -> Result<()> {
        let mut state = self.state();
        state.blob_deletes += 1;
        state.check(MemoryOperation::DeleteBlob)?;
        state
            .blobs
            .remove(&(image.bucket_id.clone(), image.file_id.clone()))
            .map(|_| ())
            .ok_or_else(|| KanbanError::not_found("blob", &image.file_id))
    }

    fn public_url(&self, image: &ImageRef) -> String {
        format!("memory://{}/{}", image.bucket_id, image.file_id)
    }
}

#[async_trait]
impl Authenticator for MemoryBackend {
    async fn current_user(&self) -> Result<User> {
        let state = self.state();
        state.check(MemoryOperation::CurrentUser)?;
        state
            .user
            .clone()
            .ok_or_else(|| KanbanError::unauthenticated("no active session"))
    }
}

/// Text generator that always answers with the same reply
pub struct ScriptedGenerator {
    reply: std::result::Result<String, String>,
    requests: Mutex<Vec<SummaryRequest>>,
}

impl ScriptedGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Generator whose every call fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<SummaryRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &SummaryRequest) -> Result<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        self.reply
            .clone()
            .map_err(|message| KanbanError::remote_sync("generate", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tasks() -> Collection {
        Collection::new("db", "tasks")
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let backend = MemoryBackend::new();
        let id = backend.insert_raw(&tasks(), json!({"title": "a", "order": 0}));
        let mut patch = Map::new();
        patch.insert("order".to_string(), json!(3));
        backend.update_document(&tasks(), &id, patch).await.unwrap();

        let doc = backend.document(&tasks(), &id).unwrap();
        assert_eq!(doc.data["title"], json!("a"));
        assert_eq!(doc.data["order"], json!(3));
    }

    #[tokio::test]
    async fn test_failure_injection_and_recovery() {
        let backend = MemoryBackend::new();
        backend.fail(MemoryOperation::List);
        assert!(backend.list_documents(&tasks(), &[]).await.is_err());
        backend.recover(MemoryOperation::List);
        assert!(backend.list_documents(&tasks(), &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let backend = MemoryBackend::new();
        let err = backend
            .delete_blob(&ImageRef::new("images", "nope"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_current_user_requires_session() {
        assert!(matches!(
            MemoryBackend::new().current_user().await,
            Err(KanbanError::Unauthenticated { .. })
        ));
        let user = User {
            id: UserId::from("u1"),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        };
        let backend = MemoryBackend::with_user(user.clone());
        assert_eq!(backend.current_user().await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_documents_get_increasing_creation_times() {
        let backend = MemoryBackend::new();
        let first = backend.insert_raw(&tasks(), json!({}));
        let second = backend.insert_raw(&tasks(), json!({}));
        let first = backend.document(&tasks(), &first).unwrap();
        let second = backend.document(&tasks(), &second).unwrap();
        assert!(first.created_at < second.created_at);
    }
}
