//! Core types for the kanban engine

mod board;
mod ids;
mod task;

// Re-export all types
pub use board::{Board, Column, BOARD_DROPPABLE_ID};
pub use ids::{TaskId, UserId};
pub use task::{ImageRef, Priority, Task, TaskImage, TaskStatus};
