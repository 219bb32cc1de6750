//! Documents, as held by a remote document database
//!
//! A document carries every task field but `id`, which is the identifier of the document itself.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::filter::TaskField;
use crate::task::Task;

pub mod memory_store;
pub use memory_store::MemoryDocumentStore;

/// The fields of a document, by name
pub type Fields = Map<String, Value>;

/// A document of a remote collection
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    id: String,
    fields: Fields,
}

impl Document {
    pub fn new(id: String, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Build the document that stores `task`, under the task id
    pub fn from_task(task: &Task) -> Result<Self> {
        Ok(Self::new(task.id().to_string(), task_fields(task)?))
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn fields(&self) -> &Fields { &self.fields }

    /// Decode the task stored in this document
    pub fn into_task(self) -> Result<Task> {
        let Document { id, mut fields } = self;
        fields.insert(TaskField::Id.as_str().to_string(), Value::String(id.clone()));
        serde_json::from_value(Value::Object(fields))
            .map_err(|err| Error::MalformedDocument(format!("{}: {}", id, err)))
    }
}

/// The document fields that store `task`, that is to say all of its fields but its id
pub fn task_fields(task: &Task) -> Result<Fields> {
    match serde_json::to_value(task)? {
        Value::Object(mut fields) => {
            fields.remove(TaskField::Id.as_str());
            Ok(fields)
        },
        other => Err(Error::MalformedDocument(format!("a task serialized as {}", other))),
    }
}
