//! Current-session lookup via `GET /account`

use crate::client::RemoteClient;
use crate::error::RemoteError;
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use taskboard_kanban::{Authenticator, KanbanError, User, UserId};
use tracing::info;

#[derive(Debug, Deserialize)]
struct Account {
    #[serde(rename = "$id")]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
}

/// [`Authenticator`] resolving the session carried by the client's
/// credentials
#[derive(Debug, Clone)]
pub struct RemoteAuthenticator {
    client: RemoteClient,
}

impl RemoteAuthenticator {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    async fn account(&self) -> Result<User, RemoteError> {
        let response = self.client.request(Method::GET, "/account").send().await?;
        let response = self
            .client
            .check_response(response, "account", "current")
            .await?;
        let account: Account = response.json().await?;
        info!("Signed in as {}", account.id);
        Ok(User {
            id: UserId::new(account.id),
            name: account.name,
            email: account.email,
        })
    }
}

#[async_trait]
impl Authenticator for RemoteAuthenticator {
    async fn current_user(&self) -> Result<User, KanbanError> {
        self.account().await.map_err(|e| match e {
            // a missing account means there is no session
            RemoteError::NotFound { .. } => KanbanError::unauthenticated("no active session"),
            other => other.into_kanban("account"),
        })
    }
}
