//! Calendar tasks

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Backend-assigned identifier of a task. Empty until the task has been created.
pub type TaskId = String;

/// Whether a task still has to be done
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    #[serde(rename = "to do")]
    ToDo,
    #[serde(rename = "done")]
    Done,
}

impl TaskState {
    /// Every possible state, in display order
    pub const ALL: [TaskState; 2] = [TaskState::ToDo, TaskState::Done];

    /// The string this state is stored as
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::ToDo => "to do",
            TaskState::Done => "done",
        }
    }
}

impl Default for TaskState {
    fn default() -> Self {
        TaskState::ToDo
    }
}

impl Display for TaskState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "to do" => Ok(TaskState::ToDo),
            "done" => Ok(TaskState::Done),
            other => Err(Error::UnknownState(other.to_string())),
        }
    }
}

/// A calendar task
///
/// Tasks are replaced as a whole by [`TasksCalendar::update`](crate::traits::TasksCalendar::update):
/// fetch a task, change it with the setters, then hand the full record back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Assigned by the backend when the task is created
    #[serde(default)]
    id: TaskId,
    /// The display name of the task
    name: String,
    /// When the task was created (milliseconds since the Unix epoch)
    created_date: i64,
    /// When the task is scheduled (milliseconds since the Unix epoch)
    event_date: i64,
    category: String,
    /// Kept in the caller's order, duplicates included
    tags: Vec<String>,
    state: TaskState,
    description: String,
}

impl Task {
    /// Create a brand new task, that has not been stored anywhere yet.
    /// Its creation date is now.
    pub fn new<N, C, T, D>(name: N, event_date: i64, category: C, tags: T, state: TaskState, description: D) -> Self
    where
        N: Into<String>,
        C: Into<String>,
        D: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let created_date = Utc::now().timestamp_millis();
        Self::new_with_parameters(
            TaskId::new(),
            name.into(),
            created_date,
            event_date,
            category.into(),
            tags.into_iter().map(Into::into).collect(),
            state,
            description.into(),
        )
    }

    /// Create a task with every field given, e.g. one that already exists in a backend
    #[allow(clippy::too_many_arguments)]
    pub fn new_with_parameters(id: TaskId, name: String, created_date: i64, event_date: i64,
                               category: String, tags: Vec<String>, state: TaskState, description: String,
                            ) -> Self
    {
        Self {
            id,
            name,
            created_date,
            event_date,
            category,
            tags,
            state,
            description,
        }
    }

    pub fn id(&self) -> &str            { &self.id           }
    pub fn name(&self) -> &str          { &self.name         }
    pub fn created_date(&self) -> i64   { self.created_date  }
    pub fn event_date(&self) -> i64     { self.event_date    }
    pub fn category(&self) -> &str      { &self.category     }
    pub fn tags(&self) -> &[String]     { &self.tags         }
    pub fn state(&self) -> TaskState    { self.state         }
    pub fn description(&self) -> &str   { &self.description  }

    /// Whether a backend has assigned an id to this task already
    pub fn has_id(&self) -> bool {
        self.id.is_empty() == false
    }

    pub fn set_name<S: Into<String>>(&mut self, new_name: S) {
        self.name = new_name.into();
    }
    pub fn set_created_date(&mut self, new_date: i64) {
        self.created_date = new_date;
    }
    pub fn set_event_date(&mut self, new_date: i64) {
        self.event_date = new_date;
    }
    pub fn set_category<S: Into<String>>(&mut self, new_category: S) {
        self.category = new_category.into();
    }
    pub fn set_tags<T>(&mut self, new_tags: T)
    where
        T: IntoIterator,
        T::Item: Into<String>,
    {
        self.tags = new_tags.into_iter().map(Into::into).collect();
    }
    pub fn set_state(&mut self, new_state: TaskState) {
        self.state = new_state;
    }
    pub fn set_description<S: Into<String>>(&mut self, new_description: S) {
        self.description = new_description.into();
    }

    /// Returns the same task, with the id a backend has just assigned to it
    pub(crate) fn with_id(mut self, id: TaskId) -> Self {
        self.id = id;
        self
    }
}
