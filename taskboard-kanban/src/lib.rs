//! # Taskboard Kanban
//!
//! Client-side state of a three-column kanban board backed by a remote
//! document store.
//!
//! - [`types`] - tasks, columns and the [`Board`] aggregate with its pure
//!   move/insert/remove operations
//! - [`reorder`] - turns a finished drag into the next board and the remote
//!   delta it needs
//! - [`sync`] - the [`SyncAdapter`] pushing changes to the document store and
//!   blob storage
//! - [`summary`] - column counts and the natural-language board summary
//! - [`state`] - [`BoardState`], the per-session container that applies user
//!   actions optimistically and publishes [`BoardEvent`]s
//! - [`collaborators`] - the traits the remote services are reached through
//!
//! ```
//! use taskboard_kanban::{Board, Task, TaskStatus};
//!
//! let board = Board::from_tasks(vec![
//!     Task::new("a", "Write tests", TaskStatus::Todo, 0, "u1"),
//!     Task::new("b", "Fix bug", TaskStatus::Todo, 1, "u1"),
//! ]);
//! let next = board.move_task(TaskStatus::Todo, 0, TaskStatus::Done, 0)?;
//! assert_eq!(next.column(TaskStatus::Done).tasks[0].title, "Write tests");
//! assert_eq!(next.column(TaskStatus::Todo).tasks[0].order, 0);
//! # Ok::<(), taskboard_kanban::KanbanError>(())
//! ```

pub mod collaborators;
pub mod error;
#[cfg(feature = "test-support")]
pub mod memory;
pub mod record;
pub mod reorder;
pub mod state;
pub mod summary;
pub mod sync;
pub mod types;

pub use collaborators::{
    Authenticator, BlobStorage, Collection, Document, DocumentStore, ImageUpload, Query,
    TextGenerator, User,
};
pub use error::{KanbanError, Result};
pub use record::{parse_due_date, NewTask, TaskPatch};
pub use reorder::{
    apply_drag, DragGesture, DragKind, DraggableLocation, DropResult, MoveDelta, ReorderOutcome,
    TaskLocation,
};
pub use state::{BoardEvent, BoardState, ImageEdit, TaskDraft, TaskEdit};
pub use summary::{column_counts, ColumnCounts, Summarizer, SummaryRequest};
pub use sync::{ImageCleanup, SyncAdapter};
pub use types::{
    Board, Column, ImageRef, Priority, Task, TaskId, TaskImage, TaskStatus, UserId,
    BOARD_DROPPABLE_ID,
};
