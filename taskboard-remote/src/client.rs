//! Shared HTTP client for the document database REST API.

use crate::error::RemoteError;
use reqwest::{Client, Method, RequestBuilder, Response};
use std::time::Duration;
use taskboard_config::RemoteConfig;
use tracing::debug;

pub const PROJECT_HEADER: &str = "X-Appwrite-Project";
pub const KEY_HEADER: &str = "X-Appwrite-Key";
pub const JWT_HEADER: &str = "X-Appwrite-JWT";

/// Extract a human-readable message from a JSON error body.
///
/// Tries `message`, then `error_description`, then falls back to the raw body.
pub(crate) fn extract_error_description(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = json.get("message").and_then(|v| v.as_str()) {
            return msg.to_string();
        }
        if let Some(desc) = json.get("error_description").and_then(|v| v.as_str()) {
            return desc.to_string();
        }
    }
    body.to_string()
}

/// Authenticated client for one project of the remote service.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: Client,
    endpoint: String,
    project_id: String,
    api_key: Option<String>,
    jwt: Option<String>,
}

impl RemoteClient {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            jwt: config.jwt.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Absolute URL for an API path such as `/account`
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    /// Start a request with the project and credential headers set
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);
        let mut builder = self
            .client
            .request(method, url)
            .header(PROJECT_HEADER, &self.project_id);
        if let Some(key) = &self.api_key {
            builder = builder.header(KEY_HEADER, key);
        }
        if let Some(jwt) = &self.jwt {
            builder = builder.header(JWT_HEADER, jwt);
        }
        builder
    }

    /// Map an HTTP response to a `RemoteError` based on status code.
    ///
    /// `resource` and `id` name what was addressed, for 404 errors.
    pub async fn check_response(
        &self,
        response: Response,
        resource: &str,
        id: &str,
    ) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let status_code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_description(&body);

        match status_code {
            401 => Err(RemoteError::Unauthorized(message)),
            403 => Err(RemoteError::Forbidden(message)),
            404 => Err(RemoteError::NotFound {
                resource: resource.to_string(),
                id: id.to_string(),
            }),
            _ => Err(RemoteError::Api {
                status: status_code,
                body: message,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_description() {
        assert_eq!(
            extract_error_description(r#"{"message": "Document not found", "code": 404}"#),
            "Document not found"
        );
        assert_eq!(extract_error_description("plain text"), "plain text");
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let config = RemoteConfig {
            endpoint: "https://example.com/v1/".to_string(),
            project_id: "p1".to_string(),
            ..Default::default()
        };
        let client = RemoteClient::new(&config).unwrap();
        assert_eq!(client.url("/account"), "https://example.com/v1/account");
    }
}
