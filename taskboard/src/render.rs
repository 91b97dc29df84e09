//! Plain-text rendering of a board for the terminal.

use std::fmt::Write as _;
use std::io::{self, Write};

use taskboard_proto::Task;

use crate::board::Partition;

/// One line describing a task:
/// `task-4  [todo] Design homepage mockup (high, @user-2, due 2024-02-10) #design #urgent`.
#[must_use]
pub fn task_line(task: &Task) -> String {
    let mut line = format!("{}  [{}] {} ({}", task.id, task.status, task.title, task.priority);
    if let Some(assignee) = &task.assignee_id {
        let _ = write!(line, ", @{assignee}");
    }
    if let Some(due) = task.due_date {
        let _ = write!(line, ", due {due}");
    }
    line.push(')');
    for tag in &task.tags {
        let _ = write!(line, " #{tag}");
    }
    line
}

/// Writes every section, in order, with its tasks.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_board<W: Write>(out: &mut W, partition: &Partition) -> io::Result<()> {
    for (section, tasks) in partition.iter() {
        writeln!(out, "{} [{}] ({})", section.name, section.id, tasks.len())?;
        for task in tasks {
            writeln!(out, "  {}", task_line(task))?;
        }
    }
    Ok(())
}
