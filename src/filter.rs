//! Filters over task fields
//!
//! A [`TaskFilter`] maps some task fields to the value a task must hold there. All of them must match (logical AND):
//! * when both the expected value and the task value are lists (i.e. `tags`), every expected element must be present
//!   somewhere in the task list. Order does not matter, and each expected element is checked on its own,
//!   so `["a", "a"]` still matches a task tagged `["a"]`.
//! * otherwise, the task value must be strictly equal to the expected value, type included (`"100"` does not match `100`).
//!
//! An empty filter matches every task.
//!
//! Backends that can not evaluate a filter themselves push it down as a list of [`Predicate`]s
//! (see [`TaskFilter::predicates`]), that follow the very same rules.

use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde_json::Value;

use crate::document::Document;
use crate::error::{Error, Result};
use crate::task::{Task, TaskState};

/// The fields a task can be filtered on
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskField {
    Id,
    Name,
    CreatedDate,
    EventDate,
    Category,
    Tags,
    State,
    Description,
}

impl TaskField {
    pub const ALL: [TaskField; 8] = [
        TaskField::Id,
        TaskField::Name,
        TaskField::CreatedDate,
        TaskField::EventDate,
        TaskField::Category,
        TaskField::Tags,
        TaskField::State,
        TaskField::Description,
    ];

    /// The name of this field in serialized tasks and in remote documents
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskField::Id => "id",
            TaskField::Name => "name",
            TaskField::CreatedDate => "createdDate",
            TaskField::EventDate => "eventDate",
            TaskField::Category => "category",
            TaskField::Tags => "tags",
            TaskField::State => "state",
            TaskField::Description => "description",
        }
    }

    /// Whether this field holds a list of values
    pub fn is_list(&self) -> bool {
        matches!(self, TaskField::Tags)
    }

    /// The value a task holds for this field
    pub fn value_of(&self, task: &Task) -> Value {
        match self {
            TaskField::Id => Value::from(task.id()),
            TaskField::Name => Value::from(task.name()),
            TaskField::CreatedDate => Value::from(task.created_date()),
            TaskField::EventDate => Value::from(task.event_date()),
            TaskField::Category => Value::from(task.category()),
            TaskField::Tags => Value::from(task.tags().to_vec()),
            TaskField::State => Value::from(task.state().as_str()),
            TaskField::Description => Value::from(task.description()),
        }
    }
}

impl Display for TaskField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TaskField::ALL.iter()
            .find(|field| field.as_str() == s)
            .copied()
            .ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}


/// A conjunction of constraints over task fields
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskFilter {
    constraints: BTreeMap<TaskField, Value>,
}

impl TaskFilter {
    /// A filter that matches every task
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a filter from a JSON object such as `{"state": "done", "tags": ["work"]}`.
    ///
    /// Values are kept as they are, so that their type is part of the match.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = match value {
            Value::Object(object) => object,
            other => return Err(Error::InvalidFilter(format!("expected an object, got {}", other))),
        };

        let mut filter = Self::new();
        for (name, expected) in object {
            let field = name.parse::<TaskField>()?;
            filter.constraints.insert(field, expected.clone());
        }
        Ok(filter)
    }

    /// Constrain `field` to an arbitrary value
    pub fn with_value<V: Into<Value>>(mut self, field: TaskField, value: V) -> Self {
        self.constraints.insert(field, value.into());
        self
    }

    pub fn with_id<S: Into<String>>(self, id: S) -> Self {
        self.with_value(TaskField::Id, id.into())
    }
    pub fn with_name<S: Into<String>>(self, name: S) -> Self {
        self.with_value(TaskField::Name, name.into())
    }
    pub fn with_created_date(self, date: i64) -> Self {
        self.with_value(TaskField::CreatedDate, date)
    }
    pub fn with_event_date(self, date: i64) -> Self {
        self.with_value(TaskField::EventDate, date)
    }
    pub fn with_category<S: Into<String>>(self, category: S) -> Self {
        self.with_value(TaskField::Category, category.into())
    }
    /// Only keep tasks that hold (at least) all these tags
    pub fn with_tags<T>(self, tags: T) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let tags: Vec<String> = tags.into_iter().map(Into::into).collect();
        self.with_value(TaskField::Tags, tags)
    }
    pub fn with_state(self, state: TaskState) -> Self {
        self.with_value(TaskField::State, state.as_str())
    }
    pub fn with_description<S: Into<String>>(self, description: S) -> Self {
        self.with_value(TaskField::Description, description.into())
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// The constrained fields and their expected values
    pub fn constraints(&self) -> impl Iterator<Item = (TaskField, &Value)> {
        self.constraints.iter().map(|(field, value)| (*field, value))
    }

    /// Whether `task` satisfies every constraint of this filter
    pub fn matches(&self, task: &Task) -> bool {
        self.constraints.iter()
            .all(|(field, expected)| value_matches(expected, &field.value_of(task)))
    }

    /// Translate this filter into predicates that a document store combines with AND.
    ///
    /// A list field constrained by a list becomes one containment predicate per expected element,
    /// every other constraint becomes an equality predicate.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        for (field, expected) in &self.constraints {
            match expected {
                Value::Array(elements) if field.is_list() => {
                    for element in elements {
                        predicates.push(Predicate::ArrayContains{ field: *field, value: element.clone() });
                    }
                },
                _ => predicates.push(Predicate::Equal{ field: *field, value: expected.clone() }),
            }
        }
        predicates
    }
}

impl TryFrom<Value> for TaskFilter {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_json(&value)
    }
}

/// Compare one expected value to the value a task holds
fn value_matches(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Array(wanted), Value::Array(held)) => wanted.iter().all(|element| held.contains(element)),
        _ => expected == actual,
    }
}

/// Keep the tasks that match `filter`, in their original order
pub fn filter_tasks<I>(tasks: I, filter: &TaskFilter) -> Vec<Task>
where
    I: IntoIterator<Item = Task>,
{
    tasks.into_iter()
        .filter(|task| filter.matches(task))
        .collect()
}


/// A single condition sent to a document store
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// The field must be strictly equal to the value
    Equal { field: TaskField, value: Value },
    /// The field must be a list that contains the value
    ArrayContains { field: TaskField, value: Value },
}

impl Predicate {
    pub fn field(&self) -> TaskField {
        match self {
            Predicate::Equal{ field, .. } => *field,
            Predicate::ArrayContains{ field, .. } => *field,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Predicate::Equal{ value, .. } => value,
            Predicate::ArrayContains{ value, .. } => value,
        }
    }

    /// Evaluate this predicate against a stored document. `id` is compared to the document identifier.
    pub fn matches(&self, document: &Document) -> bool {
        let held = match self.field() {
            TaskField::Id => Some(Value::from(document.id())),
            other => document.fields().get(other.as_str()).cloned(),
        };

        match (self, held) {
            (_, None) => false,
            (Predicate::Equal{ value, .. }, Some(held)) => &held == value,
            (Predicate::ArrayContains{ value, .. }, Some(Value::Array(held))) => held.contains(value),
            (Predicate::ArrayContains{ .. }, Some(_)) => false,
        }
    }
}
