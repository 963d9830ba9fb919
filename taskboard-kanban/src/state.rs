//! Board state container.
//!
//! [`BoardState`] owns the current board for a session, applies user actions
//! to it synchronously and pushes the matching changes to the remote store.
//! Changes are published optimistically: listeners see the new board before
//! the remote store confirms it, and a failed sync is reported through
//! [`BoardEvent::SyncFailed`] instead of being rolled back.

use crate::collaborators::ImageUpload;
use crate::error::{KanbanError, Result};
use crate::record::{NewTask, TaskPatch};
use crate::reorder::{apply_drag, DragGesture, MoveDelta, ReorderOutcome};
use crate::summary::{column_counts, ColumnCounts};
use crate::sync::{ImageCleanup, SyncAdapter};
use crate::types::{Board, ImageRef, Priority, Task, TaskId, TaskStatus, UserId};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use taskboard_common::Pretty;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 64;

/// Notifications published by [`BoardState`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// The board or the search string changed
    Changed { revision: u64 },
    /// A remote write failed; the local board was kept as is
    SyncFailed { operation: String, message: String },
    /// A task lost its image but the blob could not be deleted
    ImageCleanupSkipped { task_id: TaskId, reason: String },
}

/// Input for a new task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub column: TaskStatus,
    pub image: Option<ImageUpload>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, column: TaskStatus) -> Self {
        Self {
            title: title.into(),
            column,
            image: None,
            due_date: None,
            priority: None,
        }
    }
}

/// What to do with a task's image when editing it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageEdit {
    #[default]
    Keep,
    Replace(ImageUpload),
    Remove,
}

/// Edits to an existing task. `None` keeps a field, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub priority: Option<Option<Priority>>,
    pub image: ImageEdit,
}

/// The board of one signed-in user
pub struct BoardState {
    sync: Arc<SyncAdapter>,
    owner: Option<UserId>,
    board: Board,
    search: String,
    revision: u64,
    events: broadcast::Sender<BoardEvent>,
    pending: JoinSet<Result<()>>,
}

impl BoardState {
    pub fn new(sync: Arc<SyncAdapter>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            sync,
            owner: None,
            board: Board::new(),
            search: String::new(),
            revision: 0,
            events,
            pending: JoinSet::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.events.subscribe()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn owner(&self) -> Option<&UserId> {
        self.owner.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// The board as it should be displayed, filtered by the search string
    pub fn visible_board(&self) -> Board {
        self.board.filtered(&self.search)
    }

    pub fn counts(&self) -> ColumnCounts {
        column_counts(&self.board)
    }

    /// Number of syncs still running
    pub fn pending_syncs(&self) -> usize {
        self.pending.len()
    }

    /// Replace the board with the owner's tasks from the remote store
    pub async fn load(&mut self, owner: UserId) -> Result<()> {
        let board = self.sync.load_board(&owner).await?;
        self.owner = Some(owner);
        self.set_board(board);
        Ok(())
    }

    pub fn set_board(&mut self, board: Board) {
        self.board = board;
        self.publish_change();
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.publish_change();
    }

    /// Apply a finished drag.
    ///
    /// The board changes immediately; a task move is persisted on a spawned
    /// task that [`BoardState::flush`] can wait for. Returns whether the
    /// board changed.
    ///
    /// # Panics
    ///
    /// Panics when a task move has to be persisted and the caller is not
    /// running inside a Tokio runtime.
    pub fn drag_end(&mut self, gesture: DragGesture) -> Result<bool> {
        match apply_drag(&self.board, &gesture)? {
            ReorderOutcome::Unchanged => Ok(false),
            ReorderOutcome::ColumnsReordered(board) => {
                self.set_board(board);
                Ok(true)
            }
            ReorderOutcome::TaskMoved { board, delta } => {
                self.set_board(board);
                self.spawn_move_sync(delta);
                Ok(true)
            }
        }
    }

    fn spawn_move_sync(&mut self, delta: MoveDelta) {
        debug!("Spawning move sync {}", Pretty(&delta));
        let sync = self.sync.clone();
        let events = self.events.clone();
        self.pending.spawn(async move {
            let result = sync
                .sync_move(&delta.task, delta.column, &delta.column_tasks)
                .await;
            if let Err(e) = &result {
                warn!("Failed to sync move of {}: {}", delta.task.id, e);
                let _ = events.send(BoardEvent::SyncFailed {
                    operation: "move".to_string(),
                    message: e.to_string(),
                });
            }
            result
        });
    }

    /// Wait for every spawned sync and return the failures
    pub async fn flush(&mut self) -> Vec<KanbanError> {
        let mut failures = Vec::new();
        while let Some(joined) = self.pending.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failures.push(e),
                Err(join_error) => {
                    failures.push(KanbanError::remote_sync("move", join_error.to_string()))
                }
            }
        }
        failures
    }

    fn require_owner(&self) -> Result<UserId> {
        self.owner
            .clone()
            .ok_or_else(|| KanbanError::unauthenticated("board has not been loaded"))
    }

    /// Create a task at the end of its column.
    ///
    /// A failed image upload does not stop the task from being created; it
    /// is created without an image.
    pub async fn add_task(&mut self, draft: TaskDraft) -> Result<Task> {
        let owner = self.require_owner()?;
        let order = self.board.column(draft.column).len();

        let mut new_task = NewTask::new(draft.title, draft.column, order, owner.clone());
        new_task.due_date = draft.due_date;
        new_task.priority = draft.priority;
        if let Some(upload) = draft.image {
            match self.sync.upload_image(upload, &owner).await {
                Ok(image) => new_task.image = Some(image),
                Err(e) => warn!("Image upload failed, creating task without image: {}", e),
            }
        }

        let uploaded = new_task.image.clone();
        let created = self.sync.create_remote(new_task).await;
        if created.is_err() {
            if let Some(image) = &uploaded {
                self.discard_upload(image).await;
            }
        }
        let task = self.report(created, "create")?;
        self.board = self.board.insert_task(task.status, task.clone());
        self.publish_change();
        Ok(task)
    }

    /// Edit a task's fields and image
    pub async fn update_task(&mut self, id: &TaskId, edit: TaskEdit) -> Result<Task> {
        let current = self
            .board
            .task(id)
            .cloned()
            .ok_or_else(|| KanbanError::TaskNotFound { id: id.to_string() })?;

        let mut patch = TaskPatch {
            title: edit.title,
            due_date: edit.due_date,
            priority: edit.priority,
            image: None,
        };
        let mut old_image = None;
        match edit.image {
            ImageEdit::Keep => {}
            ImageEdit::Replace(upload) => {
                let owner = self.require_owner()?;
                let image = self.report(self.sync.upload_image(upload, &owner).await, "upload")?;
                patch.image = Some(Some(image));
                old_image = current.image.clone();
            }
            ImageEdit::Remove => {
                patch.image = Some(None);
                old_image = current.image.clone();
            }
        }

        let saved = self.sync.update_remote(id, &patch).await;
        if saved.is_err() {
            if let Some(Some(image)) = &patch.image {
                self.discard_upload(image).await;
            }
        }
        self.report(saved, "update")?;

        let mut updated = current;
        patch.apply(&mut updated);
        self.board = self.board.replace_task(updated.clone())?;
        self.publish_change();

        let cleanup = self.sync.cleanup_image(id, old_image.as_ref()).await;
        self.report_cleanup(id, cleanup);
        Ok(updated)
    }

    /// Remove a task.
    ///
    /// The task leaves the board and the column is renumbered before the
    /// remote delete is awaited.
    pub async fn delete_task(&mut self, id: &TaskId) -> Result<()> {
        let (column, index) = self
            .board
            .find_task(id)
            .ok_or_else(|| KanbanError::TaskNotFound { id: id.to_string() })?;
        let (board, task) = self.board.remove_task(column, index)?;
        self.board = board.renumber(column);
        self.publish_change();

        let cleanup = self.report(self.sync.remove_task_remote(&task).await, "delete")?;
        self.report_cleanup(id, cleanup);
        info!("Deleted task {}", id);
        Ok(())
    }

    /// Detach a task's image and delete its blob
    pub async fn delete_image(&mut self, id: &TaskId) -> Result<()> {
        let task = self
            .board
            .task(id)
            .cloned()
            .ok_or_else(|| KanbanError::TaskNotFound { id: id.to_string() })?;
        let Some(image) = task.image.clone() else {
            return Ok(());
        };

        let cleanup = self.report(self.sync.clear_image(id, &image).await, "update")?;
        let mut updated = task;
        updated.image = None;
        self.board = self.board.replace_task(updated)?;
        self.publish_change();
        self.report_cleanup(id, cleanup);
        Ok(())
    }

    /// Delete a blob uploaded for a write that then failed
    async fn discard_upload(&self, image: &ImageRef) {
        match self.sync.delete_image_blob(image).await {
            Ok(()) => debug!(
                "Discarded unused upload {}/{}",
                image.bucket_id, image.file_id
            ),
            Err(e) => warn!(
                "Could not discard unused upload {}/{}: {}",
                image.bucket_id, image.file_id, e
            ),
        }
    }

    fn publish_change(&mut self) {
        self.revision += 1;
        let _ = self.events.send(BoardEvent::Changed {
            revision: self.revision,
        });
    }

    /// Publish `SyncFailed` for a failed remote call and pass the result on
    fn report<T>(&self, result: Result<T>, operation: &str) -> Result<T> {
        if let Err(e) = &result {
            warn!("Remote {} failed: {}", operation, e);
            let _ = self.events.send(BoardEvent::SyncFailed {
                operation: operation.to_string(),
                message: e.to_string(),
            });
        }
        result
    }

    fn report_cleanup(&self, task_id: &TaskId, cleanup: ImageCleanup) {
        if let ImageCleanup::Skipped { reason } = cleanup {
            let _ = self.events.send(BoardEvent::ImageCleanupSkipped {
                task_id: task_id.clone(),
                reason,
            });
        }
    }
}
