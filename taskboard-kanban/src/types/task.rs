//! Task types: Task, TaskStatus, Priority and image references

use super::ids::{TaskId, UserId};
use crate::error::{KanbanError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The three fixed workflow columns, which double as a task's status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// All statuses in canonical column order
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Stored form, also used as the droppable id of the column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "inprogress",
            Self::Done => "done",
        }
    }

    /// Position in canonical column order
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Todo => 0,
            Self::InProgress => 1,
            Self::Done => 2,
        }
    }

    /// Column heading
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = KanbanError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "todo" => Ok(Self::Todo),
            "inprogress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(KanbanError::invalid_value(
                "status",
                format!("'{}' is not one of todo, inprogress, done", other),
            )),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = KanbanError;

    /// Case-insensitive
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(KanbanError::invalid_value(
                "priority",
                format!("'{}' is not one of Low, Medium, High", s),
            )),
        }
    }
}

/// Location of an image blob: the bucket and the file inside it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    pub bucket_id: String,
    pub file_id: String,
}

impl ImageRef {
    pub fn new(bucket_id: impl Into<String>, file_id: impl Into<String>) -> Self {
        Self {
            bucket_id: bucket_id.into(),
            file_id: file_id.into(),
        }
    }

    /// Stored form: a JSON string `{"bucketId":"…","fileId":"…"}`
    pub fn to_stored(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode the stored form. Accepts either the JSON string or the object
    /// itself; both ids must be non-empty.
    pub fn from_stored(value: &serde_json::Value) -> Result<Self> {
        let image: ImageRef = match value {
            serde_json::Value::String(raw) => serde_json::from_str(raw)
                .map_err(|e| KanbanError::malformed_image(format!("{}: {}", raw, e)))?,
            serde_json::Value::Object(_) => serde_json::from_value(value.clone())
                .map_err(|e| KanbanError::malformed_image(format!("{}: {}", value, e)))?,
            other => {
                return Err(KanbanError::malformed_image(format!(
                    "expected a string or object, got {}",
                    other
                )))
            }
        };

        if image.bucket_id.is_empty() || image.file_id.is_empty() {
            return Err(KanbanError::malformed_image(format!(
                "empty bucket or file id in {}",
                value
            )));
        }
        Ok(image)
    }
}

/// Image metadata of a task, decoded once when the record is read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskImage {
    Attached(ImageRef),
    /// Metadata that could not be decoded, kept verbatim for logging.
    /// Treated as "no image".
    Unreadable(String),
}

impl TaskImage {
    /// Decode a stored image field. Null and empty strings mean no image.
    pub fn decode(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(raw) if raw.trim().is_empty() => None,
            _ => Some(match ImageRef::from_stored(value) {
                Ok(image) => Self::Attached(image),
                Err(_) => Self::Unreadable(match value {
                    serde_json::Value::String(raw) => raw.clone(),
                    other => other.to_string(),
                }),
            }),
        }
    }

    pub fn image_ref(&self) -> Option<&ImageRef> {
        match self {
            Self::Attached(image) => Some(image),
            Self::Unreadable(_) => None,
        }
    }
}

/// A task/card on the board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub status: TaskStatus,
    /// Display position inside the column
    pub order: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<TaskImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    pub owner: UserId,
}

impl Task {
    /// Create a task with no image, due date or priority
    pub fn new(
        id: impl Into<TaskId>,
        title: impl Into<String>,
        status: TaskStatus,
        order: usize,
        owner: impl Into<UserId>,
    ) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            title: title.into(),
            status,
            order,
            image: None,
            due_date: None,
            priority: None,
            owner: owner.into(),
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_image(mut self, image: TaskImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// The attached image, ignoring unreadable metadata
    pub fn image_ref(&self) -> Option<&ImageRef> {
        self.image.as_ref().and_then(TaskImage::image_ref)
    }
}
