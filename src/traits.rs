//! Traits used by multiple structs in this crate

use async_trait::async_trait;

use crate::document::{Document, Fields};
use crate::error::Result;
use crate::filter::{filter_tasks, Predicate, TaskFilter};
use crate::task::{Task, TaskId};

/// A place where tasks are stored.
///
/// None of these functions fail: an error of the underlying storage is logged, and reported as if
/// the operation could not happen (empty list, `None` or `false`).
/// As a consequence, "this task does not exist" and "the storage could not be reached" look the same.
#[async_trait]
pub trait TasksCalendar: Send + Sync {
    /// Returns every stored task, in storage order
    async fn get_all(&self) -> Vec<Task>;

    /// Returns the tasks that match `filter`.
    ///
    /// The default implementation fetches every task and runs the filter over them.
    async fn get_all_with_filter(&self, filter: &TaskFilter) -> Vec<Task> {
        filter_tasks(self.get_all().await, filter)
    }

    /// Returns the task with this id, if any
    async fn get_by_id(&self, id: &str) -> Option<Task>;

    /// Store a new task, and returns the id it has been given.
    /// Returns `None` in case a task already has the id of `task`, or in case the storage is unreachable
    async fn create(&mut self, task: Task) -> Option<TaskId>;

    /// Replace the stored task that has the same id as `task`.
    /// Returns whether such a task existed and has been replaced
    async fn update(&mut self, task: Task) -> bool;

    /// Remove the task with this id. Returns whether it existed and has been removed
    async fn delete(&mut self, id: &str) -> bool;

    /// Remove every task. Returns whether the calendar has been emptied
    async fn delete_all(&mut self) -> bool;
}


/// A medium that holds strings under string keys (akin to a browser `localStorage`)
pub trait KeyValueStore: Send + Sync {
    /// Returns the content of a slot, or `None` if nothing has been stored there
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    /// Replace the content of a slot
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
    /// Empty a slot. Removing an empty slot is not an error
    fn remove_item(&mut self, key: &str) -> Result<()>;
}


/// A named collection of documents in a (usually remote) database
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Add a new document. The store picks its id, and returns it
    async fn add_document(&self, fields: Fields) -> Result<String>;

    /// Returns the document with this id, if any
    async fn get_document(&self, id: &str) -> Result<Option<Document>>;

    /// Returns every document of the collection
    async fn list_documents(&self) -> Result<Vec<Document>>;

    /// Returns the documents that match every predicate
    async fn query_documents(&self, predicates: &[Predicate]) -> Result<Vec<Document>>;

    /// Replace the fields of an existing document. Returns `false` if there is no such document
    async fn replace_document(&self, id: &str, fields: Fields) -> Result<bool>;

    /// Remove a document. Returns `false` if there is no such document
    async fn delete_document(&self, id: &str) -> Result<bool>;
}
