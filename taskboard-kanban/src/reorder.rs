//! Reorder engine: turns a finished drag gesture into the next board and the
//! persistence delta it requires.
//!
//! Column drags only change presentation. Task drags renumber every column
//! they touch in memory; the remote delta covers the moved task and the
//! destination column only, so the source column may keep gaps in its stored
//! order values until the next load.

use crate::error::{KanbanError, Result};
use crate::types::{Board, Task, TaskStatus, BOARD_DROPPABLE_ID};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A task position: column and index inside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLocation {
    pub column: TaskStatus,
    pub index: usize,
}

impl TaskLocation {
    pub fn new(column: TaskStatus, index: usize) -> Self {
        Self { column, index }
    }
}

/// A finished drag. No destination means the drop landed outside any target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragGesture {
    Column {
        source_index: usize,
        destination: Option<usize>,
    },
    Task {
        source: TaskLocation,
        destination: Option<TaskLocation>,
    },
}

/// What was dragged, as reported by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragKind {
    Column,
    Task,
}

/// One end of a drag as reported by the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraggableLocation {
    pub droppable_id: String,
    pub index: usize,
}

/// The UI's drop report. `droppable_id` is `"board"` for column drags and a
/// status id for task drags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropResult {
    #[serde(rename = "type")]
    pub kind: DragKind,
    pub source: DraggableLocation,
    #[serde(default)]
    pub destination: Option<DraggableLocation>,
}

impl TryFrom<DropResult> for DragGesture {
    type Error = KanbanError;

    fn try_from(drop: DropResult) -> Result<Self> {
        match drop.kind {
            DragKind::Column => {
                let board_location = |location: &DraggableLocation| {
                    if location.droppable_id == BOARD_DROPPABLE_ID {
                        Ok(location.index)
                    } else {
                        Err(KanbanError::invalid_value(
                            "droppable_id",
                            format!(
                                "column drags use '{}', got '{}'",
                                BOARD_DROPPABLE_ID, location.droppable_id
                            ),
                        ))
                    }
                };
                Ok(Self::Column {
                    source_index: board_location(&drop.source)?,
                    destination: drop.destination.as_ref().map(board_location).transpose()?,
                })
            }
            DragKind::Task => {
                let task_location = |location: &DraggableLocation| -> Result<TaskLocation> {
                    Ok(TaskLocation::new(
                        location.droppable_id.parse()?,
                        location.index,
                    ))
                };
                Ok(Self::Task {
                    source: task_location(&drop.source)?,
                    destination: drop.destination.as_ref().map(task_location).transpose()?,
                })
            }
        }
    }
}

/// Remote changes required by a task move
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveDelta {
    /// The moved task with its new status and order
    pub task: Task,
    pub column: TaskStatus,
    /// The destination column in its new order, moved task included
    pub column_tasks: Vec<Task>,
}

/// Result of applying a drag
#[derive(Debug, Clone, PartialEq)]
pub enum ReorderOutcome {
    /// Nothing to do
    Unchanged,
    /// Column display order changed; nothing to persist
    ColumnsReordered(Board),
    /// A task moved; `delta` must be pushed to the remote store
    TaskMoved { board: Board, delta: MoveDelta },
}

impl ReorderOutcome {
    /// The board after the drag, if it changed
    pub fn board(&self) -> Option<&Board> {
        match self {
            Self::Unchanged => None,
            Self::ColumnsReordered(board) | Self::TaskMoved { board, .. } => Some(board),
        }
    }
}

/// Apply a finished drag to `board`
pub fn apply_drag(board: &Board, gesture: &DragGesture) -> Result<ReorderOutcome> {
    match *gesture {
        DragGesture::Column {
            destination: None, ..
        }
        | DragGesture::Task {
            destination: None, ..
        } => Ok(ReorderOutcome::Unchanged),

        DragGesture::Column {
            source_index,
            destination: Some(destination),
        } => {
            let next = board.move_column(source_index, destination)?;
            if source_index == destination {
                return Ok(ReorderOutcome::Unchanged);
            }
            debug!(
                "Moved column {} -> {}: {:?}",
                source_index,
                destination,
                next.display_order()
            );
            Ok(ReorderOutcome::ColumnsReordered(next))
        }

        DragGesture::Task {
            source,
            destination: Some(destination),
        } => {
            let next = board.move_task(
                source.column,
                source.index,
                destination.column,
                destination.index,
            )?;
            if source == destination {
                return Ok(ReorderOutcome::Unchanged);
            }

            let column_tasks = next.column(destination.column).tasks.clone();
            let task = column_tasks[destination.index].clone();
            debug!(
                "Moved task {} from {}[{}] to {}[{}]",
                task.id, source.column, source.index, destination.column, destination.index
            );

            Ok(ReorderOutcome::TaskMoved {
                board: next,
                delta: MoveDelta {
                    task,
                    column: destination.column,
                    column_tasks,
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskId;

    fn board() -> Board {
        Board::from_tasks(vec![
            Task::new("a", "A", TaskStatus::Todo, 0, "u"),
            Task::new("b", "B", TaskStatus::Todo, 1, "u"),
            Task::new("c", "C", TaskStatus::Todo, 2, "u"),
            Task::new("d", "D", TaskStatus::Done, 0, "u"),
        ])
    }

    fn task_drag(from: (TaskStatus, usize), to: Option<(TaskStatus, usize)>) -> DragGesture {
        DragGesture::Task {
            source: TaskLocation::new(from.0, from.1),
            destination: to.map(|(c, i)| TaskLocation::new(c, i)),
        }
    }

    #[test]
    fn test_drop_outside_is_unchanged() {
        let outcome = apply_drag(&board(), &task_drag((TaskStatus::Todo, 0), None)).unwrap();
        assert_eq!(outcome, ReorderOutcome::Unchanged);
        let outcome = apply_drag(
            &board(),
            &DragGesture::Column {
                source_index: 0,
                destination: None,
            },
        )
        .unwrap();
        assert_eq!(outcome, ReorderOutcome::Unchanged);
    }

    #[test]
    fn test_drop_in_place_is_unchanged() {
        let outcome = apply_drag(
            &board(),
            &task_drag((TaskStatus::Todo, 1), Some((TaskStatus::Todo, 1))),
        )
        .unwrap();
        assert_eq!(outcome, ReorderOutcome::Unchanged);
    }

    #[test]
    fn test_column_drag_only_reorders_columns() {
        let outcome = apply_drag(
            &board(),
            &DragGesture::Column {
                source_index: 2,
                destination: Some(0),
            },
        )
        .unwrap();
        let ReorderOutcome::ColumnsReordered(next) = outcome else {
            panic!("expected a column reorder");
        };
        assert_eq!(next.display_order()[0], TaskStatus::Done);
        assert_eq!(next.column(TaskStatus::Todo).len(), 3);
        assert!(next.is_consistent());
    }

    #[test]
    fn test_same_column_move_renumbers_whole_column() {
        let outcome = apply_drag(
            &board(),
            &task_drag((TaskStatus::Todo, 2), Some((TaskStatus::Todo, 0))),
        )
        .unwrap();
        let ReorderOutcome::TaskMoved { board, delta } = outcome else {
            panic!("expected a task move");
        };
        assert_eq!(delta.task.id, TaskId::from("c"));
        assert_eq!(delta.task.order, 0);
        let ids: Vec<_> = delta.column_tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert!(delta
            .column_tasks
            .iter()
            .enumerate()
            .all(|(i, t)| t.order == i));
        assert!(board.is_consistent());
    }

    #[test]
    fn test_cross_column_move_delta_covers_destination() {
        let outcome = apply_drag(
            &board(),
            &task_drag((TaskStatus::Todo, 0), Some((TaskStatus::Done, 0))),
        )
        .unwrap();
        let ReorderOutcome::TaskMoved { board, delta } = outcome else {
            panic!("expected a task move");
        };
        assert_eq!(delta.column, TaskStatus::Done);
        assert_eq!(delta.task.status, TaskStatus::Done);
        let ids: Vec<_> = delta.column_tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
        // in memory the source column is renumbered too
        let todo = &board.column(TaskStatus::Todo).tasks;
        assert_eq!(todo[0].id, TaskId::from("b"));
        assert_eq!(todo[0].order, 0);
    }

    #[test]
    fn test_stale_gesture_fails_without_change() {
        let err = apply_drag(
            &board(),
            &task_drag((TaskStatus::Done, 3), Some((TaskStatus::Todo, 0))),
        )
        .unwrap_err();
        assert!(err.is_stale());

        // a drop onto its own, no longer existing, position is stale too
        let err = apply_drag(
            &board(),
            &task_drag((TaskStatus::Done, 5), Some((TaskStatus::Done, 5))),
        )
        .unwrap_err();
        assert!(err.is_stale());

        let err = apply_drag(
            &board(),
            &DragGesture::Column {
                source_index: 7,
                destination: Some(7),
            },
        )
        .unwrap_err();
        assert!(err.is_stale());
    }

    #[test]
    fn test_drop_result_conversion() {
        let drop: DropResult = serde_json::from_value(serde_json::json!({
            "type": "task",
            "source": {"droppableId": "todo", "index": 0},
            "destination": {"droppableId": "inprogress", "index": 1}
        }))
        .unwrap();
        assert_eq!(
            DragGesture::try_from(drop).unwrap(),
            task_drag((TaskStatus::Todo, 0), Some((TaskStatus::InProgress, 1)))
        );

        let column_drop = DropResult {
            kind: DragKind::Column,
            source: DraggableLocation {
                droppable_id: "board".to_string(),
                index: 1,
            },
            destination: None,
        };
        assert_eq!(
            DragGesture::try_from(column_drop).unwrap(),
            DragGesture::Column {
                source_index: 1,
                destination: None
            }
        );
    }

    #[test]
    fn test_drop_result_with_unknown_droppable_fails() {
        let drop = DropResult {
            kind: DragKind::Task,
            source: DraggableLocation {
                droppable_id: "backlog".to_string(),
                index: 0,
            },
            destination: None,
        };
        assert!(DragGesture::try_from(drop).is_err());
    }
}
