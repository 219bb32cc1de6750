//! A document store that lives in memory
//!
//! It evaluates pushed-down predicates itself, which makes it a stand-in for a remote database in tests.
//! Its [`MockBehaviour`] can be tweaked to make some calls fail.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::document::{Document, Fields};
use crate::error::Result;
use crate::filter::Predicate;
use crate::mock_behaviour::MockBehaviour;
use crate::traits::DocumentStore;

#[derive(Debug, Default)]
struct StoreState {
    /// Documents, ordered by id like a remote collection lists them
    documents: BTreeMap<String, Fields>,
    behaviour: MockBehaviour,
}

/// An in-memory [`DocumentStore`]
#[derive(Debug)]
pub struct MemoryDocumentStore {
    state: Mutex<StoreState>,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::with_behaviour(MockBehaviour::default())
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose calls follow `behaviour`
    pub fn with_behaviour(behaviour: MockBehaviour) -> Self {
        Self {
            state: Mutex::new(StoreState {
                documents: BTreeMap::new(),
                behaviour,
            }),
        }
    }

    /// Replace the behaviour of the next calls
    pub async fn set_behaviour(&self, behaviour: MockBehaviour) {
        self.state.lock().await.behaviour = behaviour;
    }

    /// How many documents are stored
    pub async fn len(&self) -> usize {
        self.state.lock().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn add_document(&self, fields: Fields) -> Result<String> {
        let mut state = self.state.lock().await;
        state.behaviour.can_add_document()?;

        let id = Uuid::new_v4().to_simple().to_string();
        state.documents.insert(id.clone(), fields);
        Ok(id)
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        let mut state = self.state.lock().await;
        state.behaviour.can_get_document()?;

        Ok(state.documents.get(id)
            .map(|fields| Document::new(id.to_string(), fields.clone())))
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let mut state = self.state.lock().await;
        state.behaviour.can_list_documents()?;

        Ok(state.documents.iter()
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
            .collect())
    }

    async fn query_documents(&self, predicates: &[Predicate]) -> Result<Vec<Document>> {
        let mut state = self.state.lock().await;
        state.behaviour.can_query_documents()?;

        Ok(state.documents.iter()
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
            .filter(|document| predicates.iter().all(|p| p.matches(document)))
            .collect())
    }

    async fn replace_document(&self, id: &str, fields: Fields) -> Result<bool> {
        let mut state = self.state.lock().await;
        state.behaviour.can_replace_document()?;

        match state.documents.get_mut(id) {
            None => Ok(false),
            Some(stored) => {
                *stored = fields;
                Ok(true)
            },
        }
    }

    async fn delete_document(&self, id: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        state.behaviour.can_delete_document()?;

        Ok(state.documents.remove(id).is_some())
    }
}
