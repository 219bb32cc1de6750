//! This module provides ways to tweak mocked document stores, so that they can return errors on some tests

use crate::error::{Error, Result};

/// This stores some behaviour tweaks, that describe how a mocked instance will behave during a given test
///
/// So that a functions fails _n_ times after _m_ initial successes, set `(m, n)` for the suited parameter
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// If this is true, every action will be allowed
    pub is_suspended: bool,

    // From the DocumentStore trait
    pub add_document_behaviour: (u32, u32),
    pub get_document_behaviour: (u32, u32),
    pub list_documents_behaviour: (u32, u32),
    pub query_documents_behaviour: (u32, u32),
    pub replace_document_behaviour: (u32, u32),
    pub delete_document_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// All actions will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            add_document_behaviour: (0, n_fails),
            get_document_behaviour: (0, n_fails),
            list_documents_behaviour: (0, n_fails),
            query_documents_behaviour: (0, n_fails),
            replace_document_behaviour: (0, n_fails),
            delete_document_behaviour: (0, n_fails),
        }
    }

    /// Suspend this mock behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }
    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_add_document(&mut self) -> Result<()> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.add_document_behaviour, "add_document")
    }
    pub fn can_get_document(&mut self) -> Result<()> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.get_document_behaviour, "get_document")
    }
    pub fn can_list_documents(&mut self) -> Result<()> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.list_documents_behaviour, "list_documents")
    }
    pub fn can_query_documents(&mut self) -> Result<()> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.query_documents_behaviour, "query_documents")
    }
    pub fn can_replace_document(&mut self) -> Result<()> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.replace_document_behaviour, "replace_document")
    }
    pub fn can_delete_document(&mut self) -> Result<()> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.delete_document_behaviour, "delete_document")
    }
}


/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str) -> Result<()> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 -= 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else if remaining_failures > 0 {
        value.1 -= 1;
        log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
        Err(Error::Mocked(descr.to_string()))
    } else {
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    }
}
