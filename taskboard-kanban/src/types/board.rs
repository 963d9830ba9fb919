//! Board-level types: Board and Column
//!
//! Every operation here is pure: it returns a new [`Board`] and leaves the
//! receiver untouched. After each operation every column holds tasks whose
//! `order` runs `0..n-1` in sequence position and whose `status` names the
//! column.

use super::ids::TaskId;
use super::task::{Task, TaskStatus};
use crate::error::{KanbanError, Result};
use serde::{Serialize, Serializer};

/// Droppable id of the board itself, used for column drags
pub const BOARD_DROPPABLE_ID: &str = "board";

/// A workflow column and its tasks in display order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
}

impl Column {
    fn new(status: TaskStatus) -> Self {
        Self {
            status,
            tasks: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn renumber(&mut self) {
        let status = self.status;
        for (position, task) in self.tasks.iter_mut().enumerate() {
            task.order = position;
            task.status = status;
        }
    }

    fn is_consistent(&self) -> bool {
        self.tasks
            .iter()
            .enumerate()
            .all(|(position, task)| task.order == position && task.status == self.status)
    }
}

/// The kanban board: all three columns, shown in `display_order`.
///
/// Column display order can be permuted by a column drag. It only affects
/// presentation and is never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    /// Indexed by [`TaskStatus::index`]
    columns: [Column; 3],
    display_order: [TaskStatus; 3],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.columns())
    }
}

impl Board {
    /// An empty board in canonical column order
    pub fn new() -> Self {
        Self {
            columns: TaskStatus::ALL.map(Column::new),
            display_order: TaskStatus::ALL,
        }
    }

    /// Build a board from loaded tasks.
    ///
    /// Tasks are grouped by status and sorted by `(order, created_at)`, then
    /// renumbered so gaps and duplicates left by earlier syncs disappear.
    pub fn from_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let mut board = Self::new();
        for task in tasks {
            board.column_mut(task.status).tasks.push(task);
        }
        for column in board.columns.iter_mut() {
            column
                .tasks
                .sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));
            column.renumber();
        }
        board
    }

    /// Columns in display order
    pub fn columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.display_order
            .iter()
            .map(move |status| &self.columns[status.index()])
    }

    pub fn display_order(&self) -> [TaskStatus; 3] {
        self.display_order
    }

    pub fn column(&self, status: TaskStatus) -> &Column {
        &self.columns[status.index()]
    }

    fn column_mut(&mut self, status: TaskStatus) -> &mut Column {
        &mut self.columns[status.index()]
    }

    /// All tasks, column by column in display order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.columns().flat_map(|column| column.tasks.iter())
    }

    pub fn task_count(&self) -> usize {
        self.columns.iter().map(Column::len).sum()
    }

    /// Column and index of a task
    pub fn find_task(&self, id: &TaskId) -> Option<(TaskStatus, usize)> {
        self.columns.iter().find_map(|column| {
            column
                .tasks
                .iter()
                .position(|task| &task.id == id)
                .map(|index| (column.status, index))
        })
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.find_task(id)
            .map(|(status, index)| &self.column(status).tasks[index])
    }

    /// Move the task at `source_index` of `source` to `dest_index` of `dest`.
    ///
    /// Within one column `dest_index` must be `< len`; across columns it may
    /// equal the destination length to append. The same column and index is
    /// the identity.
    pub fn move_task(
        &self,
        source: TaskStatus,
        source_index: usize,
        dest: TaskStatus,
        dest_index: usize,
    ) -> Result<Board> {
        let source_len = self.column(source).len();
        if source_index >= source_len {
            return Err(KanbanError::stale(source.as_str(), source_index, source_len));
        }

        let mut next = self.clone();

        if source == dest {
            if dest_index >= source_len {
                return Err(KanbanError::stale(dest.as_str(), dest_index, source_len));
            }
            if source_index == dest_index {
                return Ok(next);
            }
            let column = next.column_mut(source);
            let task = column.tasks.remove(source_index);
            column.tasks.insert(dest_index, task);
            column.renumber();
            return Ok(next);
        }

        let dest_len = self.column(dest).len();
        if dest_index > dest_len {
            return Err(KanbanError::stale(dest.as_str(), dest_index, dest_len));
        }

        let task = next.column_mut(source).tasks.remove(source_index);
        next.column_mut(source).renumber();
        let column = next.column_mut(dest);
        column.tasks.insert(dest_index, task);
        column.renumber();
        Ok(next)
    }

    /// Reorder the columns themselves. `permutation` must name every status
    /// exactly once.
    pub fn reorder_columns(&self, permutation: &[TaskStatus]) -> Result<Board> {
        let complete = permutation.len() == TaskStatus::ALL.len()
            && TaskStatus::ALL
                .iter()
                .all(|status| permutation.iter().filter(|s| *s == status).count() == 1);
        if !complete {
            return Err(KanbanError::invalid_value(
                "columns",
                format!(
                    "{:?} must name todo, inprogress and done exactly once",
                    permutation
                ),
            ));
        }

        let mut next = self.clone();
        next.display_order = [permutation[0], permutation[1], permutation[2]];
        Ok(next)
    }

    /// Move the column displayed at `from` so it is displayed at `to`
    pub fn move_column(&self, from: usize, to: usize) -> Result<Board> {
        let len = self.display_order.len();
        if from >= len {
            return Err(KanbanError::stale(BOARD_DROPPABLE_ID, from, len));
        }
        if to >= len {
            return Err(KanbanError::stale(BOARD_DROPPABLE_ID, to, len));
        }

        let mut order = self.display_order.to_vec();
        let status = order.remove(from);
        order.insert(to, status);
        self.reorder_columns(&order)
    }

    /// Append a task to `column`; its status and order are overwritten to match.
    pub fn insert_task(&self, column: TaskStatus, mut task: Task) -> Board {
        let mut next = self.clone();
        let target = next.column_mut(column);
        task.status = column;
        task.order = target.len();
        target.tasks.push(task);
        next
    }

    /// Remove and return the task at `index` of `column`.
    ///
    /// The remaining tasks keep their order values; call [`Board::renumber`]
    /// to close the gap.
    pub fn remove_task(&self, column: TaskStatus, index: usize) -> Result<(Board, Task)> {
        let len = self.column(column).len();
        if index >= len {
            return Err(KanbanError::stale(column.as_str(), index, len));
        }
        let mut next = self.clone();
        let task = next.column_mut(column).tasks.remove(index);
        Ok((next, task))
    }

    /// Swap in a new version of a task, keeping its current position
    pub fn replace_task(&self, mut task: Task) -> Result<Board> {
        let (status, index) = self
            .find_task(&task.id)
            .ok_or_else(|| KanbanError::TaskNotFound {
                id: task.id.to_string(),
            })?;
        let mut next = self.clone();
        task.status = status;
        task.order = index;
        next.column_mut(status).tasks[index] = task;
        Ok(next)
    }

    /// Reset the order values of `column` to `0..n-1`
    pub fn renumber(&self, column: TaskStatus) -> Board {
        let mut next = self.clone();
        next.column_mut(column).renumber();
        next
    }

    /// Keep only tasks whose title contains `search`, ignoring case.
    ///
    /// Used for display: the remaining tasks keep their stored order values.
    pub fn filtered(&self, search: &str) -> Board {
        let needle = search.trim().to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }
        let mut next = self.clone();
        for column in next.columns.iter_mut() {
            column
                .tasks
                .retain(|task| task.title.to_lowercase().contains(&needle));
        }
        next
    }

    /// True when every column satisfies the order and status invariant
    pub fn is_consistent(&self) -> bool {
        self.columns.iter().all(Column::is_consistent)
    }
}
