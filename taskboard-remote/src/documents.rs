//! Document store over the REST API

use crate::client::RemoteClient;
use crate::error::RemoteError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use taskboard_kanban::{Collection, Document, DocumentStore, KanbanError, Query};
use tracing::debug;

/// Lets the server pick the document id
const UNIQUE_ID: &str = "unique()";

/// Documents requested per page when listing
pub const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<Map<String, Value>>,
}

/// Split a raw document into system attributes (`$id`, `$createdAt`) and
/// its own fields. Other `$`-prefixed attributes are dropped.
pub(crate) fn parse_document(mut raw: Map<String, Value>) -> Result<Document, RemoteError> {
    let id = match raw.remove("$id") {
        Some(Value::String(id)) => id,
        _ => return Err(RemoteError::InvalidResponse("document without $id".into())),
    };
    let created_at = raw
        .remove("$createdAt")
        .and_then(|v| v.as_str().map(str::to_string))
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|d| d.with_timezone(&Utc))
        .ok_or_else(|| {
            RemoteError::InvalidResponse(format!("document {} without a valid $createdAt", id))
        })?;
    raw.retain(|key, _| !key.starts_with('$'));
    Ok(Document {
        id,
        created_at,
        data: raw,
    })
}

/// [`DocumentStore`] backed by `/databases/{db}/collections/{col}/documents`
#[derive(Debug, Clone)]
pub struct RemoteDocumentStore {
    client: RemoteClient,
}

impl RemoteDocumentStore {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    fn documents_path(collection: &Collection) -> String {
        format!(
            "/databases/{}/collections/{}/documents",
            urlencoding::encode(&collection.database_id),
            urlencoding::encode(&collection.collection_id)
        )
    }

    fn document_path(collection: &Collection, id: &str) -> String {
        format!(
            "{}/{}",
            Self::documents_path(collection),
            urlencoding::encode(id)
        )
    }

    /// Queries travel as JSON in repeated `queries[]` parameters. Every
    /// page is capped at [`PAGE_SIZE`] and continues after `cursor`.
    fn list_path(
        collection: &Collection,
        queries: &[Query],
        cursor: Option<&str>,
    ) -> Result<String, RemoteError> {
        let mut encoded = queries
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        encoded.push(json!({ "method": "limit", "values": [PAGE_SIZE] }).to_string());
        if let Some(cursor) = cursor {
            encoded.push(json!({ "method": "cursorAfter", "values": [cursor] }).to_string());
        }

        let mut path = Self::documents_path(collection);
        for (i, query) in encoded.iter().enumerate() {
            path.push(if i == 0 { '?' } else { '&' });
            path.push_str("queries[]=");
            path.push_str(&urlencoding::encode(query));
        }
        Ok(path)
    }

    async fn list_page(
        &self,
        collection: &Collection,
        queries: &[Query],
        cursor: Option<&str>,
    ) -> Result<Vec<Document>, RemoteError> {
        let response = self
            .client
            .request(Method::GET, &Self::list_path(collection, queries, cursor)?)
            .send()
            .await?;
        let response = self
            .client
            .check_response(response, "collection", &collection.collection_id)
            .await?;
        let list: DocumentList = response.json().await?;
        list.documents.into_iter().map(parse_document).collect()
    }

    /// Every matching document, following the cursor until a short page
    async fn list(
        &self,
        collection: &Collection,
        queries: &[Query],
    ) -> Result<Vec<Document>, RemoteError> {
        let mut documents: Vec<Document> = Vec::new();
        loop {
            let cursor = documents.last().map(|d| d.id.clone());
            let page = self
                .list_page(collection, queries, cursor.as_deref())
                .await?;
            let full = page.len() >= PAGE_SIZE;
            documents.extend(page);
            if !full {
                break;
            }
        }
        debug!(
            "Listed {} documents from {}",
            documents.len(),
            collection.collection_id
        );
        Ok(documents)
    }

    async fn create(
        &self,
        collection: &Collection,
        data: Map<String, Value>,
    ) -> Result<Document, RemoteError> {
        let response = self
            .client
            .request(Method::POST, &Self::documents_path(collection))
            .json(&json!({ "documentId": UNIQUE_ID, "data": data }))
            .send()
            .await?;
        let response = self
            .client
            .check_response(response, "collection", &collection.collection_id)
            .await?;
        parse_document(response.json().await?)
    }

    async fn update(
        &self,
        collection: &Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, RemoteError> {
        let response = self
            .client
            .request(Method::PATCH, &Self::document_path(collection, id))
            .json(&json!({ "data": data }))
            .send()
            .await?;
        let response = self.client.check_response(response, "document", id).await?;
        parse_document(response.json().await?)
    }

    async fn delete(&self, collection: &Collection, id: &str) -> Result<(), RemoteError> {
        let response = self
            .client
            .request(Method::DELETE, &Self::document_path(collection, id))
            .send()
            .await?;
        self.client.check_response(response, "document", id).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for RemoteDocumentStore {
    async fn list_documents(
        &self,
        collection: &Collection,
        queries: &[Query],
    ) -> Result<Vec<Document>, KanbanError> {
        self.list(collection, queries)
            .await
            .map_err(|e| e.into_kanban("list"))
    }

    async fn create_document(
        &self,
        collection: &Collection,
        data: Map<String, Value>,
    ) -> Result<Document, KanbanError> {
        self.create(collection, data)
            .await
            .map_err(|e| e.into_kanban("create"))
    }

    async fn update_document(
        &self,
        collection: &Collection,
        id: &str,
        data: Map<String, Value>,
    ) -> Result<Document, KanbanError> {
        self.update(collection, id, data)
            .await
            .map_err(|e| e.into_kanban("update"))
    }

    async fn delete_document(&self, collection: &Collection, id: &str) -> Result<(), KanbanError> {
        self.delete(collection, id)
            .await
            .map_err(|e| e.into_kanban("delete"))
    }
}
