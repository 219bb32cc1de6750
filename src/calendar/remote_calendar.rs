use async_trait::async_trait;
use futures::future::join_all;

use crate::document::{self, Document};
use crate::error::Result;
use crate::filter::TaskFilter;
use crate::task::{Task, TaskId};
use crate::traits::{DocumentStore, TasksCalendar};


/// A calendar whose tasks are documents of a [`DocumentStore`] collection.
///
/// Nothing is kept locally: every call is a round-trip to the store, which also picks the task ids.
#[derive(Debug)]
pub struct RemoteCalendar<D: DocumentStore> {
    store: D,
}

impl<D: DocumentStore> RemoteCalendar<D> {
    pub fn new(store: D) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    async fn try_get_all(&self) -> Result<Vec<Task>> {
        let documents = self.store.list_documents().await?;
        Ok(decode_documents(documents))
    }

    async fn try_get_all_with_filter(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let predicates = filter.predicates();
        log::debug!("Querying tasks with {} predicate(s)", predicates.len());
        let documents = self.store.query_documents(&predicates).await?;
        Ok(decode_documents(documents))
    }

    async fn try_get_by_id(&self, id: &str) -> Result<Option<Task>> {
        match self.store.get_document(id).await? {
            None => Ok(None),
            Some(document) => Ok(Some(document.into_task()?)),
        }
    }

    async fn try_create(&self, task: Task) -> Result<Option<TaskId>> {
        if task.has_id() && self.store.get_document(task.id()).await?.is_some() {
            log::warn!("A task with id {:?} already exists. Not creating it", task.id());
            return Ok(None);
        }

        let id = self.store.add_document(document::task_fields(&task)?).await?;
        log::info!("Document written with id {}", id);
        Ok(Some(id))
    }

    async fn try_update(&self, task: Task) -> Result<bool> {
        if task.has_id() == false {
            return Ok(false);
        }
        let replaced = self.store.replace_document(task.id(), document::task_fields(&task)?).await?;
        if replaced {
            log::info!("Document updated with id {}", task.id());
        }
        Ok(replaced)
    }

    async fn try_delete(&self, id: &str) -> Result<bool> {
        let deleted = self.store.delete_document(id).await?;
        if deleted {
            log::info!("Document deleted with id {}", id);
        }
        Ok(deleted)
    }

    /// Delete every document, all at once.
    ///
    /// This is not atomic: documents added during the call may survive it, and the deletions that
    /// succeeded are kept even if some other failed.
    async fn try_delete_all(&self) -> Result<bool> {
        let documents = self.store.list_documents().await?;
        let deletions = documents.iter()
            .map(|document| self.store.delete_document(document.id()));

        let mut success = true;
        for (document, result) in documents.iter().zip(join_all(deletions).await) {
            // A document that vanished in the meantime does not need deleting anymore
            if let Err(err) = result {
                log::warn!("Unable to delete document {}: {}", document.id(), err);
                success = false;
            }
        }
        Ok(success)
    }
}

/// Decode documents into tasks, skipping (and logging) the ones that do not hold a valid task
fn decode_documents(documents: Vec<Document>) -> Vec<Task> {
    documents.into_iter()
        .filter_map(|document| match document.into_task() {
            Ok(task) => Some(task),
            Err(err) => {
                log::warn!("Ignoring a document: {}", err);
                None
            },
        })
        .collect()
}

#[async_trait]
impl<D: DocumentStore> TasksCalendar for RemoteCalendar<D> {
    async fn get_all(&self) -> Vec<Task> {
        match self.try_get_all().await {
            Ok(tasks) => tasks,
            Err(err) => {
                log::warn!("Unable to get tasks: {}", err);
                Vec::new()
            },
        }
    }

    // This reimplements the trait method so that the store does the filtering
    async fn get_all_with_filter(&self, filter: &TaskFilter) -> Vec<Task> {
        match self.try_get_all_with_filter(filter).await {
            Ok(tasks) => tasks,
            Err(err) => {
                log::warn!("Unable to query tasks: {}", err);
                Vec::new()
            },
        }
    }

    async fn get_by_id(&self, id: &str) -> Option<Task> {
        match self.try_get_by_id(id).await {
            Ok(task) => task,
            Err(err) => {
                log::warn!("Unable to get task {}: {}", id, err);
                None
            },
        }
    }

    async fn create(&mut self, task: Task) -> Option<TaskId> {
        match self.try_create(task).await {
            Ok(id) => id,
            Err(err) => {
                log::warn!("Error adding document: {}", err);
                None
            },
        }
    }

    async fn update(&mut self, task: Task) -> bool {
        match self.try_update(task).await {
            Ok(done) => done,
            Err(err) => {
                log::warn!("Error updating document: {}", err);
                false
            },
        }
    }

    async fn delete(&mut self, id: &str) -> bool {
        match self.try_delete(id).await {
            Ok(done) => done,
            Err(err) => {
                log::warn!("Error deleting document {}: {}", id, err);
                false
            },
        }
    }

    async fn delete_all(&mut self) -> bool {
        match self.try_delete_all().await {
            Ok(done) => done,
            Err(err) => {
                log::warn!("Error deleting every document: {}", err);
                false
            },
        }
    }
}
