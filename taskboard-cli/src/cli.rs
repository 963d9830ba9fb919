//! CLI definition for the `taskboard` command.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Taskboard - a three-column kanban board backed by a remote document store.
///
/// Configuration is read from ~/.taskboard/taskboard.{toml,yaml,yml,json},
/// then ./.taskboard/taskboard.{...}, then TASKBOARD_ environment variables
/// (use `__` to nest, e.g. TASKBOARD_REMOTE__PROJECT_ID).
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(version)]
#[command(about = "Three-column kanban board in the terminal")]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Read configuration from this file on top of the discovered ones
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the board
    Board {
        /// Only show tasks whose title contains this text
        #[arg(long, short)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a task at the end of a column
    Add {
        /// Task title
        title: String,
        /// Column: todo, inprogress or done
        #[arg(long, default_value = "todo")]
        column: String,
        /// Due date, YYYY-MM-DD or RFC 3339
        #[arg(long)]
        due: Option<String>,
        /// Priority: low, medium or high
        #[arg(long)]
        priority: Option<String>,
        /// Image file to attach
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,
    },

    /// Move a task to another column or position
    Move {
        /// Task id
        task: String,
        /// Destination column (defaults to the task's own column)
        #[arg(long)]
        to: Option<String>,
        /// Destination position within the column, 0-based (defaults to the end)
        #[arg(long)]
        index: Option<usize>,
    },

    /// Apply a drop result as reported by a drag-and-drop UI, given as JSON
    Drop {
        /// e.g. {"type":"task","source":{"droppableId":"todo","index":0},"destination":{"droppableId":"done","index":0}}
        result: String,
    },

    /// Edit a task
    Edit {
        /// Task id
        task: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New due date, YYYY-MM-DD or RFC 3339
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
        /// New priority: low, medium or high
        #[arg(long, conflicts_with = "clear_priority")]
        priority: Option<String>,
        /// Remove the priority
        #[arg(long)]
        clear_priority: bool,
        /// Replace the image with this file
        #[arg(long, value_name = "FILE", conflicts_with = "remove_image")]
        image: Option<PathBuf>,
        /// Remove the image
        #[arg(long)]
        remove_image: bool,
    },

    /// Delete a task and its image
    Delete {
        /// Task id
        task: String,
    },

    /// Print the public URL of a task's image
    Image {
        /// Task id
        task: String,
    },

    /// Ask for a short natural-language summary of the board
    Summary,

    /// Show the signed-in account
    Whoami,

    /// Print the effective configuration
    Config,
}
