use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::task::{Task, TaskId};
use crate::traits::{KeyValueStore, TasksCalendar};


/// A calendar that keeps all of its tasks as a single JSON array, in one slot of a [`KeyValueStore`].
///
/// Every read parses the whole slot, every change writes it back as a whole.
/// Tasks get numeric ids (`"1"`, `"2"`...) from a counter that never goes below the highest id already stored,
/// so that a calendar re-opened over an existing slot does not hand out ids that are already taken.
#[derive(Debug)]
pub struct LocalCalendar<S: KeyValueStore> {
    storage: S,
    storage_key: String,
    /// The last id handed out by this instance
    counter: u64,
}

impl<S: KeyValueStore> LocalCalendar<S> {
    /// A calendar stored under the [default key](crate::config::DEFAULT_STORAGE_KEY)
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, crate::config::DEFAULT_STORAGE_KEY)
    }

    /// A calendar stored under a custom key
    pub fn with_key<K: Into<String>>(storage: S, storage_key: K) -> Self {
        Self {
            storage,
            storage_key: storage_key.into(),
            counter: 0,
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn load(&self) -> Result<Vec<Task>> {
        match self.storage.get_item(&self.storage_key)? {
            None => Ok(Vec::new()),
            Some(content) => Ok(serde_json::from_str(&content)?),
        }
    }

    fn save(&mut self, tasks: &[Task]) -> Result<()> {
        let content = serde_json::to_string(tasks)?;
        self.storage.set_item(&self.storage_key, &content)
    }

    /// Returns the next id, after having skipped every id already present in `tasks`
    fn next_id(&mut self, tasks: &[Task]) -> Result<TaskId> {
        let highest_stored = tasks.iter()
            .filter_map(|task| task.id().parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.counter = self.counter.max(highest_stored)
            .checked_add(1)
            .ok_or(Error::IdsExhausted)?;
        Ok(self.counter.to_string())
    }

    fn try_create(&mut self, task: Task) -> Result<Option<TaskId>> {
        let mut tasks = self.load()?;
        if tasks.iter().any(|stored| stored.id() == task.id()) {
            log::warn!("A task with id {:?} already exists. Not creating it", task.id());
            return Ok(None);
        }

        let id = self.next_id(&tasks)?;
        tasks.push(task.with_id(id.clone()));
        self.save(&tasks)?;
        log::info!("Task created with id {}", id);
        Ok(Some(id))
    }

    fn try_update(&mut self, task: Task) -> Result<bool> {
        let mut tasks = self.load()?;
        let stored = match tasks.iter_mut().find(|stored| stored.id() == task.id()) {
            None => return Ok(false),
            Some(stored) => stored,
        };

        let id = task.id().to_string();
        *stored = task;
        self.save(&tasks)?;
        log::info!("Task updated with id {}", id);
        Ok(true)
    }

    fn try_delete(&mut self, id: &str) -> Result<bool> {
        let mut tasks = self.load()?;
        let count_before = tasks.len();
        tasks.retain(|stored| stored.id() != id);
        if tasks.len() == count_before {
            return Ok(false);
        }

        self.save(&tasks)?;
        log::info!("Task deleted with id {}", id);
        Ok(true)
    }
}

#[async_trait]
impl<S: KeyValueStore> TasksCalendar for LocalCalendar<S> {
    async fn get_all(&self) -> Vec<Task> {
        match self.load() {
            Ok(tasks) => tasks,
            Err(err) => {
                log::warn!("Unable to read tasks from slot {:?}: {}", self.storage_key, err);
                Vec::new()
            },
        }
    }

    async fn get_by_id(&self, id: &str) -> Option<Task> {
        self.get_all().await
            .into_iter()
            .find(|task| task.id() == id)
    }

    async fn create(&mut self, task: Task) -> Option<TaskId> {
        match self.try_create(task) {
            Ok(id) => id,
            Err(err) => {
                log::warn!("Unable to create a task: {}", err);
                None
            },
        }
    }

    async fn update(&mut self, task: Task) -> bool {
        match self.try_update(task) {
            Ok(done) => done,
            Err(err) => {
                log::warn!("Unable to update a task: {}", err);
                false
            },
        }
    }

    async fn delete(&mut self, id: &str) -> bool {
        match self.try_delete(id) {
            Ok(done) => done,
            Err(err) => {
                log::warn!("Unable to delete task {}: {}", id, err);
                false
            },
        }
    }

    async fn delete_all(&mut self) -> bool {
        match self.save(&[]) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Unable to delete every task: {}", err);
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::task::TaskState;

    fn task(name: &str) -> Task {
        Task::new(name, 1643274544153, "category", vec!["tag"], TaskState::ToDo, "description")
    }

    #[tokio::test]
    async fn counter_skips_stored_ids() {
        let storage = MemoryStorage::new();
        let mut first = LocalCalendar::new(storage.clone());
        assert_eq!(first.create(task("a")).await, Some("1".to_string()));
        assert_eq!(first.create(task("b")).await, Some("2".to_string()));

        let mut reopened = LocalCalendar::new(storage.clone());
        assert_eq!(reopened.create(task("c")).await, Some("3".to_string()));
        // The first instance sees the task created by the second one
        assert_eq!(first.create(task("d")).await, Some("4".to_string()));
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let mut calendar = LocalCalendar::new(MemoryStorage::new());
        calendar.create(task("a")).await.unwrap();
        let second = calendar.create(task("b")).await.unwrap();
        assert!(calendar.delete(&second).await);
        assert_eq!(calendar.create(task("c")).await, Some("3".to_string()));
    }

    #[tokio::test]
    async fn slots_are_independent() {
        let storage = MemoryStorage::new();
        let mut work = LocalCalendar::with_key(storage.clone(), "work");
        let home = LocalCalendar::with_key(storage.clone(), "home");
        work.create(task("a")).await.unwrap();
        assert_eq!(work.get_all().await.len(), 1);
        assert!(home.get_all().await.is_empty());
        assert_eq!(home.storage_key(), "home");
    }

    #[tokio::test]
    async fn highest_possible_id() {
        let mut storage = MemoryStorage::new();
        let last = Task::new_with_parameters(
            u64::MAX.to_string(), "last".to_string(), 1, 2, "category".to_string(),
            Vec::new(), TaskState::Done, "description".to_string());
        let content = serde_json::to_string(&vec![last.clone()]).unwrap();
        storage.set_item(crate::config::DEFAULT_STORAGE_KEY, &content).unwrap();

        let mut calendar = LocalCalendar::new(storage.clone());
        assert_eq!(calendar.create(task("a")).await, None);
        assert_eq!(calendar.get_all().await, vec![last]);
    }
}
