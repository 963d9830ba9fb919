//! Persistence sync adapter
//!
//! Translates board mutations into calls on the document store and the blob
//! storage. There is no retry and no rollback: a failed call surfaces as an
//! error and the in-memory board keeps its optimistic state.

use crate::collaborators::{BlobStorage, Collection, DocumentStore, ImageUpload, Query};
use crate::error::{KanbanError, Result};
use crate::record::{decode_task, NewTask, TaskPatch, FIELD_ORDER, FIELD_STATUS};
use crate::types::{Board, ImageRef, Task, TaskId, TaskImage, TaskStatus, UserId};
use futures::future::try_join_all;
use serde_json::{Map, Value};
use std::sync::Arc;
use taskboard_common::Pretty;
use taskboard_config::StoreConfig;
use tracing::{debug, info, warn};

/// What happened to a task's image blob during a delete or clear
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageCleanup {
    /// The task had no image
    NoImage,
    /// The blob was deleted, or was already gone
    Deleted,
    /// The blob could not be deleted; the task change went ahead anyway
    Skipped { reason: String },
}

/// Pushes task changes to the remote store
pub struct SyncAdapter {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStorage>,
    store: StoreConfig,
    collection: Collection,
}

impl SyncAdapter {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStorage>,
        store: StoreConfig,
    ) -> Self {
        let collection = Collection::new(&store.database_id, &store.collection_id);
        Self {
            documents,
            blobs,
            store,
            collection,
        }
    }

    pub fn store(&self) -> &StoreConfig {
        &self.store
    }

    /// Load the owner's tasks and arrange them into a board
    pub async fn load_board(&self, owner: &UserId) -> Result<Board> {
        let queries = [Query::equal(&self.store.owner_field, owner.as_str())];
        let documents = self
            .documents
            .list_documents(&self.collection, &queries)
            .await?;
        let fetched = documents.len();

        let tasks: Vec<Task> = documents
            .iter()
            .filter_map(|document| decode_task(document, &self.store.owner_field))
            .collect();
        if tasks.len() < fetched {
            warn!(
                "Skipped {} of {} task records for {}",
                fetched - tasks.len(),
                fetched,
                owner
            );
        }

        let board = Board::from_tasks(tasks);
        info!("Loaded {} tasks for {}", board.task_count(), owner);
        Ok(board)
    }

    /// Persist a task move.
    ///
    /// `dest_tasks` is the destination column in its new order and must
    /// contain the moved task. The moved task gets its new status and order,
    /// then every task of the destination column is renumbered concurrently.
    pub async fn sync_move(
        &self,
        task: &Task,
        dest_column: TaskStatus,
        dest_tasks: &[Task],
    ) -> Result<()> {
        let order = dest_tasks
            .iter()
            .position(|t| t.id == task.id)
            .ok_or_else(|| KanbanError::stale(dest_column.as_str(), task.order, dest_tasks.len()))?;

        let mut moved = Map::new();
        moved.insert(FIELD_STATUS.into(), Value::from(dest_column.as_str()));
        moved.insert(FIELD_ORDER.into(), Value::from(order));
        debug!("Syncing move of {} {}", task.id, Pretty(&moved));
        self.documents
            .update_document(&self.collection, task.id.as_str(), moved)
            .await?;

        let renumbers = dest_tasks.iter().enumerate().map(|(position, t)| {
            let mut data = Map::new();
            data.insert(FIELD_ORDER.into(), Value::from(position));
            self.documents
                .update_document(&self.collection, t.id.as_str(), data)
        });
        try_join_all(renumbers).await?;

        debug!(
            "Renumbered {} tasks in {}",
            dest_tasks.len(),
            dest_column
        );
        Ok(())
    }

    /// Create a task document
    pub async fn create_remote(&self, new_task: NewTask) -> Result<Task> {
        let data = new_task.to_data(&self.store.owner_field)?;
        let document = self
            .documents
            .create_document(&self.collection, data)
            .await?;

        let mut task = Task::new(
            document.id,
            new_task.title.trim(),
            new_task.column,
            new_task.order,
            new_task.owner,
        )
        .with_created_at(document.created_at);
        task.image = new_task.image.map(TaskImage::Attached);
        task.due_date = new_task.due_date;
        task.priority = new_task.priority;

        info!("Created task {} in {}", task.id, task.status);
        Ok(task)
    }

    /// Delete a task document
    pub async fn delete_remote(&self, task_id: &TaskId) -> Result<()> {
        self.documents
            .delete_document(&self.collection, task_id.as_str())
            .await?;
        debug!("Deleted task {}", task_id);
        Ok(())
    }

    /// Delete an image blob. A blob that no longer exists counts as deleted.
    pub async fn delete_image_blob(&self, image: &ImageRef) -> Result<()> {
        match self.blobs.delete_blob(image).await {
            Ok(()) => {
                debug!("Deleted image {}/{}", image.bucket_id, image.file_id);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                info!(
                    "Image {}/{} was already gone",
                    image.bucket_id, image.file_id
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Delete a task and its image blob.
    ///
    /// Image cleanup never fails the delete: problems are logged and reported
    /// as [`ImageCleanup::Skipped`].
    pub async fn remove_task_remote(&self, task: &Task) -> Result<ImageCleanup> {
        let cleanup = self.cleanup_image(&task.id, task.image.as_ref()).await;
        self.delete_remote(&task.id).await?;
        Ok(cleanup)
    }

    /// Apply edits to a task document. An empty patch is a no-op.
    pub async fn update_remote(&self, task_id: &TaskId, patch: &TaskPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let data = patch.to_data()?;
        debug!("Updating task {} {}", task_id, Pretty(&data));
        self.documents
            .update_document(&self.collection, task_id.as_str(), data)
            .await?;
        Ok(())
    }

    /// Upload an image into the configured bucket
    pub async fn upload_image(&self, upload: ImageUpload, owner: &UserId) -> Result<ImageRef> {
        let file_name = upload.file_name.clone();
        let image = self
            .blobs
            .upload_blob(&self.store.bucket_id, upload, owner)
            .await?;
        info!("Uploaded {} as {}", file_name, image.file_id);
        Ok(image)
    }

    pub fn image_url(&self, image: &ImageRef) -> String {
        self.blobs.public_url(image)
    }

    /// Detach the image from a task, then delete its blob
    pub async fn clear_image(&self, task_id: &TaskId, image: &TaskImage) -> Result<ImageCleanup> {
        let patch = TaskPatch {
            image: Some(None),
            ..Default::default()
        };
        self.update_remote(task_id, &patch).await?;
        Ok(self.cleanup_image(task_id, Some(image)).await)
    }

    /// Best-effort blob deletion for a task that is losing its image
    pub(crate) async fn cleanup_image(
        &self,
        task_id: &TaskId,
        image: Option<&TaskImage>,
    ) -> ImageCleanup {
        match image {
            None => ImageCleanup::NoImage,
            Some(TaskImage::Unreadable(raw)) => {
                warn!(
                    "Skipping image cleanup for task {}: unreadable metadata {}",
                    task_id, raw
                );
                ImageCleanup::Skipped {
                    reason: format!("unreadable image metadata: {}", raw),
                }
            }
            Some(TaskImage::Attached(image)) => match self.delete_image_blob(image).await {
                Ok(()) => ImageCleanup::Deleted,
                Err(e) => {
                    warn!("Failed to delete image of task {}: {}", task_id, e);
                    ImageCleanup::Skipped {
                        reason: e.to_string(),
                    }
                }
            },
        }
    }
}
