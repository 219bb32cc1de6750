//! Utilities to compare tasks
//!
//! Backends do not guarantee any order. These can be used to sort results, e.g. with `sort_by`

use std::cmp::Ordering;

use crate::task::Task;

/// Compare tasks alphabetically, by name
pub fn compare_tasks_alpha(left: &Task, right: &Task) -> Ordering {
    Ord::cmp(&left.name().to_lowercase(), &right.name().to_lowercase())
}

/// Compare tasks by scheduled date, then by creation date
pub fn compare_tasks_chrono(left: &Task, right: &Task) -> Ordering {
    left.event_date().cmp(&right.event_date())
        .then_with(|| left.created_date().cmp(&right.created_date()))
}
