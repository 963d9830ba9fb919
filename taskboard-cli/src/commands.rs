//! Command execution against a signed-in board session.

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use taskboard_config::{SummaryConfig, TaskboardConfig};
use taskboard_kanban::{
    parse_due_date, Authenticator, BoardEvent, BoardState, DragGesture, DropResult, ImageEdit,
    ImageUpload, Priority, Summarizer, SyncAdapter, TaskDraft, TaskEdit, TaskId, TaskLocation,
    TaskStatus, TextGenerator, User,
};
use taskboard_remote::RemoteServices;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::cli::Commands;
use crate::table::{board_table, counts_line};

/// A loaded board for the signed-in user
pub struct Session {
    user: User,
    state: BoardState,
    sync: Arc<SyncAdapter>,
    summarizer: Summarizer,
}

impl Session {
    /// Sign in against the configured remote services and load the board
    pub async fn connect(config: &TaskboardConfig) -> Result<Self> {
        let services = RemoteServices::connect(config).context("Failed to build HTTP clients")?;
        let sync = Arc::new(services.sync_adapter(config));
        Self::open(
            services.authenticator,
            sync,
            services.generator,
            &config.summary,
        )
        .await
    }

    pub async fn open(
        authenticator: Arc<dyn Authenticator>,
        sync: Arc<SyncAdapter>,
        generator: Arc<dyn TextGenerator>,
        summary: &SummaryConfig,
    ) -> Result<Self> {
        let user = authenticator
            .current_user()
            .await
            .context("Not signed in")?;
        let mut state = BoardState::new(Arc::clone(&sync));
        state
            .load(user.id.clone())
            .await
            .context("Failed to load the board")?;
        Ok(Self {
            user,
            state,
            sync,
            summarizer: Summarizer::new(generator, summary),
        })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    /// Run a board command and return what should be printed
    pub async fn execute(&mut self, command: Commands) -> Result<String> {
        let mut events = self.state.subscribe();
        let mut output = match command {
            Commands::Board { search, json } => self.show(search.as_deref(), json)?,
            Commands::Add {
                title,
                column,
                due,
                priority,
                image,
            } => {
                let mut draft = TaskDraft::new(title, parse_column(&column)?);
                draft.due_date = due.as_deref().map(parse_due).transpose()?;
                draft.priority = priority.as_deref().map(parse_priority).transpose()?;
                draft.image = image.as_deref().map(read_image).transpose()?;
                let task = self.state.add_task(draft).await?;
                format!("Added {} to {}", task.id, task.status.display_name())
            }
            Commands::Move { task, to, index } => self.move_task(&task, to.as_deref(), index)?,
            Commands::Drop { result } => self.drop_result(&result)?,
            Commands::Edit {
                task,
                title,
                due,
                clear_due,
                priority,
                clear_priority,
                image,
                remove_image,
            } => {
                let mut edit = TaskEdit {
                    title,
                    ..Default::default()
                };
                if clear_due {
                    edit.due_date = Some(None);
                } else if let Some(raw) = due {
                    edit.due_date = Some(Some(parse_due(&raw)?));
                }
                if clear_priority {
                    edit.priority = Some(None);
                } else if let Some(raw) = priority {
                    edit.priority = Some(Some(parse_priority(&raw)?));
                }
                if remove_image {
                    edit.image = ImageEdit::Remove;
                } else if let Some(path) = image {
                    edit.image = ImageEdit::Replace(read_image(&path)?);
                }
                let updated = self.state.update_task(&TaskId::from(task), edit).await?;
                format!("Updated {}", updated.id)
            }
            Commands::Delete { task } => {
                let id = TaskId::from(task);
                self.state.delete_task(&id).await?;
                format!("Deleted {}", id)
            }
            Commands::Image { task } => {
                let id = TaskId::from(task);
                let task = self
                    .state
                    .board()
                    .task(&id)
                    .ok_or_else(|| anyhow!("No task {}", id))?;
                match task.image_ref() {
                    Some(image) => self.sync.image_url(image),
                    None => bail!("Task {} has no readable image", id),
                }
            }
            Commands::Summary => self.summarizer.summarize(self.state.board()).await?,
            Commands::Whoami => format!(
                "{} <{}> ({})",
                self.user.name, self.user.email, self.user.id
            ),
            Commands::Config => bail!("`config` does not need a session"),
        };

        let failures = self.state.flush().await;
        if let Some(first) = failures.first() {
            bail!(
                "{} change(s) were not saved remotely: {}",
                failures.len(),
                first
            );
        }
        for note in cleanup_notes(&mut events) {
            output.push('\n');
            output.push_str(&note);
        }
        Ok(output)
    }

    fn show(&mut self, search: Option<&str>, json: bool) -> Result<String> {
        if let Some(search) = search {
            self.state.set_search(search);
        }
        let board = self.state.visible_board();
        if json {
            return Ok(serde_json::to_string_pretty(&board)?);
        }
        Ok(format!(
            "{}\n{}",
            counts_line(&self.state.counts()),
            board_table(&board)
        ))
    }

    fn move_task(&mut self, task: &str, to: Option<&str>, index: Option<usize>) -> Result<String> {
        let id = TaskId::from(task);
        let (column, source_index) = self
            .state
            .board()
            .find_task(&id)
            .ok_or_else(|| anyhow!("No task {}", id))?;
        let destination_column = to.map(parse_column).transpose()?.unwrap_or(column);
        let destination_len = self.state.board().column(destination_column).len();
        let last = if destination_column == column {
            destination_len.saturating_sub(1)
        } else {
            destination_len
        };
        let destination_index = index.unwrap_or(last);

        let gesture = DragGesture::Task {
            source: TaskLocation::new(column, source_index),
            destination: Some(TaskLocation::new(destination_column, destination_index)),
        };
        debug!("Moving {} with {:?}", id, gesture);
        if !self.state.drag_end(gesture)? {
            return Ok(format!("{} is already there", id));
        }
        Ok(format!(
            "Moved {} to {} position {}",
            id,
            destination_column.display_name(),
            destination_index
        ))
    }

    fn drop_result(&mut self, raw: &str) -> Result<String> {
        let drop: DropResult = serde_json::from_str(raw).context("Invalid drop result")?;
        let gesture = DragGesture::try_from(drop)?;
        Ok(if self.state.drag_end(gesture)? {
            "Board updated".to_string()
        } else {
            "Nothing changed".to_string()
        })
    }
}

fn cleanup_notes(events: &mut broadcast::Receiver<BoardEvent>) -> Vec<String> {
    let mut notes = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let BoardEvent::ImageCleanupSkipped { task_id, reason } = event {
            notes.push(format!("Note: image of {} was not deleted: {}", task_id, reason));
        }
    }
    notes
}

fn parse_column(raw: &str) -> Result<TaskStatus> {
    Ok(raw.trim().to_ascii_lowercase().parse()?)
}

fn parse_priority(raw: &str) -> Result<Priority> {
    Ok(raw.trim().parse()?)
}

fn parse_due(raw: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    parse_due_date(raw).ok_or_else(|| anyhow!("'{}' is not a date (use YYYY-MM-DD)", raw))
}

/// Content type from the file extension
pub fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => {
            warn!("Unknown image type for {}", path.display());
            "application/octet-stream"
        }
    }
}

fn read_image(path: &Path) -> Result<ImageUpload> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();
    Ok(ImageUpload::new(file_name, content_type(path), bytes))
}
