//! Blob storage over the REST API

use crate::client::RemoteClient;
use crate::error::RemoteError;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Deserialize;
use taskboard_kanban::{BlobStorage, ImageRef, ImageUpload, KanbanError, UserId};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct UploadedFile {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "bucketId")]
    bucket_id: Option<String>,
}

/// Files are publicly readable; only the owner may change or delete them
pub(crate) fn file_permissions(owner: &UserId) -> [String; 3] {
    [
        r#"read("any")"#.to_string(),
        format!(r#"update("user:{}")"#, owner),
        format!(r#"delete("user:{}")"#, owner),
    ]
}

/// [`BlobStorage`] backed by `/storage/buckets/{bucket}/files`
#[derive(Debug, Clone)]
pub struct RemoteBlobStorage {
    client: RemoteClient,
}

impl RemoteBlobStorage {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    fn files_path(bucket_id: &str) -> String {
        format!("/storage/buckets/{}/files", urlencoding::encode(bucket_id))
    }

    fn file_path(image: &ImageRef) -> String {
        format!(
            "{}/{}",
            Self::files_path(&image.bucket_id),
            urlencoding::encode(&image.file_id)
        )
    }

    async fn upload(
        &self,
        bucket_id: &str,
        upload: ImageUpload,
        owner: &UserId,
    ) -> Result<ImageRef, RemoteError> {
        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)
            .map_err(|e| RemoteError::Validation(e.to_string()))?;
        let mut form = Form::new().text("fileId", "unique()").part("file", part);
        for permission in file_permissions(owner) {
            form = form.text("permissions[]", permission);
        }

        let response = self
            .client
            .request(Method::POST, &Self::files_path(bucket_id))
            .multipart(form)
            .send()
            .await?;
        let response = self
            .client
            .check_response(response, "bucket", bucket_id)
            .await?;
        let file: UploadedFile = response.json().await?;
        debug!("Uploaded file {} to {}", file.id, bucket_id);
        Ok(ImageRef::new(
            file.bucket_id.unwrap_or_else(|| bucket_id.to_string()),
            file.id,
        ))
    }

    async fn delete(&self, image: &ImageRef) -> Result<(), RemoteError> {
        let response = self
            .client
            .request(Method::DELETE, &Self::file_path(image))
            .send()
            .await?;
        self.client
            .check_response(response, "file", &image.file_id)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl BlobStorage for RemoteBlobStorage {
    async fn upload_blob(
        &self,
        bucket_id: &str,
        upload: ImageUpload,
        owner: &UserId,
    ) -> Result<ImageRef, KanbanError> {
        self.upload(bucket_id, upload, owner)
            .await
            .map_err(|e| e.into_kanban("upload"))
    }

    async fn delete_blob(&self, image: &ImageRef) -> Result<(), KanbanError> {
        self.delete(image)
            .await
            .map_err(|e| e.into_kanban("delete blob"))
    }

    fn public_url(&self, image: &ImageRef) -> String {
        format!(
            "{}/view?project={}",
            self.client.url(&Self::file_path(image)),
            urlencoding::encode(self.client.project_id())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_config::RemoteConfig;

    #[test]
    fn test_public_url() {
        let client = RemoteClient::new(&RemoteConfig {
            endpoint: "https://cloud.example.com/v1".to_string(),
            project_id: "board".to_string(),
            ..Default::default()
        })
        .unwrap();
        let storage = RemoteBlobStorage::new(client);
        assert_eq!(
            storage.public_url(&ImageRef::new("images", "f1")),
            "https://cloud.example.com/v1/storage/buckets/images/files/f1/view?project=board"
        );
    }

    #[test]
    fn test_file_permissions_name_owner() {
        let permissions = file_permissions(&UserId::from("u1"));
        assert_eq!(permissions[0], r#"read("any")"#);
        assert_eq!(permissions[1], r#"update("user:u1")"#);
        assert_eq!(permissions[2], r#"delete("user:u1")"#);
    }
}
