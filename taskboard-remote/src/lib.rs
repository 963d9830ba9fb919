//! # Taskboard Remote
//!
//! HTTP implementations of the collaborator traits in `taskboard-kanban`:
//!
//! - [`RemoteDocumentStore`] - task records in a REST document database
//! - [`RemoteBlobStorage`] - image files in a storage bucket
//! - [`RemoteAuthenticator`] - the account behind the configured session
//! - [`ChatCompletionsClient`] - board summaries from a chat completions API
//!
//! [`RemoteServices::connect`] builds all four from a [`TaskboardConfig`].

pub mod account;
pub mod client;
pub mod documents;
pub mod error;
pub mod storage;
pub mod summary;

pub use account::RemoteAuthenticator;
pub use client::RemoteClient;
pub use documents::RemoteDocumentStore;
pub use error::RemoteError;
pub use storage::RemoteBlobStorage;
pub use summary::ChatCompletionsClient;

use std::sync::Arc;
use taskboard_config::TaskboardConfig;
use taskboard_kanban::{Authenticator, BlobStorage, DocumentStore, SyncAdapter, TextGenerator};

/// The remote collaborators, sharing one HTTP connection pool
#[derive(Clone)]
pub struct RemoteServices {
    pub authenticator: Arc<dyn Authenticator>,
    pub documents: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStorage>,
    pub generator: Arc<dyn TextGenerator>,
}

impl RemoteServices {
    pub fn connect(config: &TaskboardConfig) -> Result<Self, RemoteError> {
        let client = RemoteClient::new(&config.remote)?;
        Ok(Self {
            authenticator: Arc::new(RemoteAuthenticator::new(client.clone())),
            documents: Arc::new(RemoteDocumentStore::new(client.clone())),
            blobs: Arc::new(RemoteBlobStorage::new(client)),
            generator: Arc::new(ChatCompletionsClient::new(&config.summary)),
        })
    }

    /// Sync adapter over these services for the configured collection
    pub fn sync_adapter(&self, config: &TaskboardConfig) -> SyncAdapter {
        SyncAdapter::new(
            Arc::clone(&self.documents),
            Arc::clone(&self.blobs),
            config.store.clone(),
        )
    }
}
