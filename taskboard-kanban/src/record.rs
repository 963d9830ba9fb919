//! Translation between store documents and [`Task`]s.
//!
//! Stored field names: `title`, `status`, `order`, `image`, `dueDate`,
//! `priority` and the configurable owner field (`userId` by default).

use crate::collaborators::Document;
use crate::error::{KanbanError, Result};
use crate::types::{ImageRef, Priority, Task, TaskId, TaskImage, TaskStatus, UserId};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::{Map, Value};
use tracing::warn;

pub const FIELD_TITLE: &str = "title";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_ORDER: &str = "order";
pub const FIELD_IMAGE: &str = "image";
pub const FIELD_DUE_DATE: &str = "dueDate";
pub const FIELD_PRIORITY: &str = "priority";

/// Fields of a task that does not exist in the store yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub column: TaskStatus,
    pub order: usize,
    pub owner: UserId,
    pub image: Option<ImageRef>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
}

impl NewTask {
    pub fn new(
        title: impl Into<String>,
        column: TaskStatus,
        order: usize,
        owner: impl Into<UserId>,
    ) -> Self {
        Self {
            title: title.into(),
            column,
            order,
            owner: owner.into(),
            image: None,
            due_date: None,
            priority: None,
        }
    }

    pub fn with_image(mut self, image: ImageRef) -> Self {
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

    /// Document fields for the create call
    pub fn to_data(&self, owner_field: &str) -> Result<Map<String, Value>> {
        validate_title(&self.title)?;
        let mut data = Map::new();
        data.insert(FIELD_TITLE.into(), Value::from(self.title.trim()));
        data.insert(FIELD_STATUS.into(), Value::from(self.column.as_str()));
        data.insert(FIELD_ORDER.into(), Value::from(self.order));
        data.insert(owner_field.into(), Value::from(self.owner.as_str()));
        data.insert(FIELD_IMAGE.into(), image_value(self.image.as_ref())?);
        data.insert(FIELD_DUE_DATE.into(), due_date_value(self.due_date));
        data.insert(FIELD_PRIORITY.into(), priority_value(self.priority));
        Ok(data)
    }
}

/// Edits to an existing task.
///
/// `None` leaves a field alone; for the optional fields `Some(None)` clears
/// the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub priority: Option<Option<Priority>>,
    pub image: Option<Option<ImageRef>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
            && self.image.is_none()
    }

    /// Document fields for the update call
    pub fn to_data(&self) -> Result<Map<String, Value>> {
        let mut data = Map::new();
        if let Some(title) = &self.title {
            validate_title(title)?;
            data.insert(FIELD_TITLE.into(), Value::from(title.trim()));
        }
        if let Some(due_date) = self.due_date {
            data.insert(FIELD_DUE_DATE.into(), due_date_value(due_date));
        }
        if let Some(priority) = self.priority {
            data.insert(FIELD_PRIORITY.into(), priority_value(priority));
        }
        if let Some(image) = &self.image {
            data.insert(FIELD_IMAGE.into(), image_value(image.as_ref())?);
        }
        Ok(data)
    }

    /// Apply the patch to a local copy of the task
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.trim().to_string();
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(image) = &self.image {
            task.image = image.clone().map(TaskImage::Attached);
        }
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(KanbanError::invalid_value(FIELD_TITLE, "must not be empty"));
    }
    Ok(())
}

fn image_value(image: Option<&ImageRef>) -> Result<Value> {
    Ok(match image {
        Some(image) => Value::from(image.to_stored()?),
        None => Value::Null,
    })
}

fn due_date_value(due_date: Option<DateTime<Utc>>) -> Value {
    due_date
        .map(|d| Value::from(d.to_rfc3339()))
        .unwrap_or(Value::Null)
}

fn priority_value(priority: Option<Priority>) -> Value {
    priority
        .map(|p| Value::from(p.as_str()))
        .unwrap_or(Value::Null)
}

/// Parse a due date: RFC 3339, or a bare `YYYY-MM-DD` meaning midnight UTC
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// Missing, negative or fractional order values sort last
fn decode_order(value: Option<&Value>) -> usize {
    value
        .and_then(|v| {
            v.as_u64().or_else(|| {
                v.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
        })
        .and_then(|order| usize::try_from(order).ok())
        .unwrap_or(usize::MAX)
}

/// Decode a store document into a task.
///
/// Returns `None`, after logging a warning, for records that cannot be placed
/// on the board: unknown status, missing title or missing owner. Unreadable
/// optional fields are dropped with a warning instead.
pub fn decode_task(document: &Document, owner_field: &str) -> Option<Task> {
    let data = &document.data;

    let status = match data.get(FIELD_STATUS).and_then(Value::as_str) {
        Some(raw) => match raw.parse::<TaskStatus>() {
            Ok(status) => status,
            Err(_) => {
                warn!(
                    "Skipping task {}: unknown status '{}'",
                    document.id, raw
                );
                return None;
            }
        },
        None => {
            warn!("Skipping task {}: missing status", document.id);
            return None;
        }
    };

    let Some(title) = data.get(FIELD_TITLE).and_then(Value::as_str) else {
        warn!("Skipping task {}: missing title", document.id);
        return None;
    };

    let Some(owner) = data.get(owner_field).and_then(Value::as_str) else {
        warn!("Skipping task {}: missing {}", document.id, owner_field);
        return None;
    };

    let due_date = match data.get(FIELD_DUE_DATE) {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) if raw.trim().is_empty() => None,
        Some(value) => {
            let parsed = value.as_str().and_then(parse_due_date);
            if parsed.is_none() {
                warn!(
                    "Ignoring unreadable due date {} on task {}",
                    value, document.id
                );
            }
            parsed
        }
    };

    let priority = match data.get(FIELD_PRIORITY) {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) if raw.is_empty() => None,
        Some(value) => {
            let parsed = value.as_str().and_then(|raw| raw.parse::<Priority>().ok());
            if parsed.is_none() {
                warn!(
                    "Ignoring unknown priority {} on task {}",
                    value, document.id
                );
            }
            parsed
        }
    };

    let image = data.get(FIELD_IMAGE).and_then(TaskImage::decode);
    if let Some(TaskImage::Unreadable(raw)) = &image {
        warn!("Task {} has unreadable image metadata: {}", document.id, raw);
    }

    Some(Task {
        id: TaskId::new(document.id.clone()),
        created_at: document.created_at,
        title: title.to_string(),
        status,
        order: decode_order(data.get(FIELD_ORDER)),
        image,
        due_date,
        priority,
        owner: UserId::new(owner),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(data: Value) -> Document {
        Document {
            id: "doc-1".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            data: data.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn test_decode_full_record() {
        let task = decode_task(
            &document(json!({
                "title": "Ship it",
                "status": "inprogress",
                "order": 2,
                "userId": "u1",
                "image": "{\"bucketId\":\"images\",\"fileId\":\"f1\"}",
                "dueDate": "2024-06-01T09:30:00.000+00:00",
                "priority": "High"
            })),
            "userId",
        )
        .unwrap();

        assert_eq!(task.id, TaskId::from("doc-1"));
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.order, 2);
        assert_eq!(task.image_ref(), Some(&ImageRef::new("images", "f1")));
        assert_eq!(
            task.due_date,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap())
        );
        assert_eq!(task.priority, Some(Priority::High));
        assert_eq!(task.owner, UserId::from("u1"));
    }

    #[test]
    fn test_unknown_status_is_skipped() {
        let doc = document(json!({"title": "x", "status": "archived", "userId": "u1"}));
        assert!(decode_task(&doc, "userId").is_none());
    }

    #[test]
    fn test_missing_owner_is_skipped() {
        let doc = document(json!({"title": "x", "status": "todo", "owner": "u1"}));
        assert!(decode_task(&doc, "userId").is_none());
        assert!(decode_task(&doc, "owner").is_some());
    }

    #[test]
    fn test_bad_order_sorts_last() {
        for order in [json!(-1), json!(null), json!("3"), json!(1.5)] {
            let doc = document(json!({"title": "x", "status": "todo", "userId": "u", "order": order}));
            assert_eq!(decode_task(&doc, "userId").unwrap().order, usize::MAX);
        }
        let doc = document(json!({"title": "x", "status": "todo", "userId": "u"}));
        assert_eq!(decode_task(&doc, "userId").unwrap().order, usize::MAX);
    }

    #[test]
    fn test_date_only_due_date_is_midnight_utc() {
        assert_eq!(
            parse_due_date("2024-02-29"),
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_due_date("next tuesday"), None);
    }

    #[test]
    fn test_unreadable_optional_fields_are_dropped() {
        let task = decode_task(
            &document(json!({
                "title": "x", "status": "done", "userId": "u", "order": 0,
                "dueDate": "soon", "priority": "Urgent", "image": "{oops"
            })),
            "userId",
        )
        .unwrap();
        assert_eq!(task.due_date, None);
        assert_eq!(task.priority, None);
        assert_eq!(task.image, Some(TaskImage::Unreadable("{oops".to_string())));
    }

    #[test]
    fn test_new_task_data() {
        let data = NewTask::new("  Plan sprint ", TaskStatus::Done, 1, "u1")
            .with_image(ImageRef::new("images", "f1"))
            .with_priority(Priority::Low)
            .to_data("userId")
            .unwrap();
        assert_eq!(data["title"], json!("Plan sprint"));
        assert_eq!(data["status"], json!("done"));
        assert_eq!(data["order"], json!(1));
        assert_eq!(data["userId"], json!("u1"));
        assert_eq!(data["image"], json!(r#"{"bucketId":"images","fileId":"f1"}"#));
        assert_eq!(data["dueDate"], Value::Null);
        assert_eq!(data["priority"], json!("Low"));
    }

    #[test]
    fn test_empty_title_rejected() {
        let err = NewTask::new("   ", TaskStatus::Todo, 0, "u1")
            .to_data("userId")
            .unwrap_err();
        assert!(matches!(err, KanbanError::InvalidValue { .. }));
    }

    #[test]
    fn test_patch_data_only_names_edited_fields() {
        let patch = TaskPatch {
            priority: Some(None),
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let data = patch.to_data().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data["priority"], Value::Null);
        assert!(!data.contains_key("dueDate"));
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn test_patch_apply() {
        let mut task = Task::new("t", "Old", TaskStatus::Todo, 0, "u").with_priority(Priority::High);
        TaskPatch {
            title: Some("New".to_string()),
            priority: Some(None),
            image: Some(Some(ImageRef::new("b", "f"))),
            ..Default::default()
        }
        .apply(&mut task);
        assert_eq!(task.title, "New");
        assert_eq!(task.priority, None);
        assert_eq!(task.image_ref(), Some(&ImageRef::new("b", "f")));
    }
}
