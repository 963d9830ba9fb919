//! Board rendering for the terminal.

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use taskboard_kanban::{Board, ColumnCounts, Task, TaskImage, TaskStatus};

const TITLE_WIDTH: usize = 48;

/// Create a table sized to the terminal, falling back to 120 columns when
/// not connected to a TTY.
pub fn new_table() -> Table {
    let width = crossterm::terminal::size()
        .map(|(w, _)| w)
        .unwrap_or(120);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_width(width);
    table
}

/// Truncate to `max` characters, appending "..." if truncated
pub fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn image_cell(task: &Task) -> &'static str {
    match &task.image {
        None => "",
        Some(TaskImage::Attached(_)) => "yes",
        Some(TaskImage::Unreadable(_)) => "unreadable",
    }
}

/// One row per task, columns in display order
pub fn board_table(board: &Board) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Column", "#", "Id", "Title", "Priority", "Due", "Image",
    ]);
    for column in board.columns() {
        for task in &column.tasks {
            table.add_row(vec![
                column.status.display_name().to_string(),
                task.order.to_string(),
                task.id.to_string(),
                truncate_str(&task.title, TITLE_WIDTH),
                task.priority.map(|p| p.to_string()).unwrap_or_default(),
                task.due_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
                image_cell(task).to_string(),
            ]);
        }
    }
    table
}

/// Column headings with their task counts, e.g. `To Do (2)`
pub fn counts_line(counts: &ColumnCounts) -> String {
    TaskStatus::ALL
        .iter()
        .map(|status| format!("{} ({})", status.display_name(), counts.get(*status)))
        .collect::<Vec<_>>()
        .join("  ")
}
