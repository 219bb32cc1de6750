//! Some utility functions

pub mod comparison;

use crate::task::{Task, TaskState};

/// A debug utility that pretty-prints a list of tasks
pub fn print_task_list(title: &str, tasks: &[Task]) {
    println!("---- {} ({} tasks) -----", title, tasks.len());
    for task in tasks {
        print_task(task);
    }
}

pub fn print_task(task: &Task) {
    let completion = match task.state() {
        TaskState::Done => "✓",
        TaskState::ToDo => " ",
    };
    println!("    {} {}\t{}\t[{}] {}", completion, task.name(), task.id(), task.category(), task.tags().join(", "));
}
