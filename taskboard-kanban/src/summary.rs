//! Board summaries: column counts and the natural-language summary built
//! from them

use crate::collaborators::TextGenerator;
use crate::error::Result;
use crate::types::{Board, TaskStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taskboard_common::Pretty;
use taskboard_config::SummaryConfig;
use tracing::debug;

/// Number of tasks per column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCounts {
    pub todo: usize,
    pub inprogress: usize,
    pub done: usize,
}

impl ColumnCounts {
    pub fn get(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::Todo => self.todo,
            TaskStatus::InProgress => self.inprogress,
            TaskStatus::Done => self.done,
        }
    }

    pub fn total(&self) -> usize {
        self.todo + self.inprogress + self.done
    }
}

/// Count the tasks in each column
pub fn column_counts(board: &Board) -> ColumnCounts {
    ColumnCounts {
        todo: board.column(TaskStatus::Todo).len(),
        inprogress: board.column(TaskStatus::InProgress).len(),
        done: board.column(TaskStatus::Done).len(),
    }
}

/// What the text generator is asked to summarize
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRequest {
    pub todos: ColumnCounts,
    /// System instructions for the generator
    pub instructions: String,
}

/// Turns a board into a short natural-language summary
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    instructions: String,
    max_chars: usize,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>, config: &SummaryConfig) -> Self {
        Self {
            generator,
            instructions: config.instructions.clone(),
            max_chars: config.max_chars,
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub async fn summarize(&self, board: &Board) -> Result<String> {
        let request = SummaryRequest {
            todos: column_counts(board),
            instructions: self.instructions.clone(),
        };
        debug!("Requesting board summary for counts {}", Pretty(&request.todos));

        let reply = self.generator.generate(&request).await?;
        Ok(truncate_chars(reply.trim(), self.max_chars))
    }
}

/// Cut `text` to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}
