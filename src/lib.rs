//! This crate stores calendar tasks.
//!
//! Every storage implements the same [`TasksCalendar`](traits::TasksCalendar) trait, so that callers can switch between:
//! * a [`LocalCalendar`], that keeps every task in a single slot of a key-value store (see the [`storage`] module),
//! * a [`RemoteCalendar`], that keeps every task as a document of a remote collection (see the [`client`] module for a Firestore client).
//!
//! Tasks can be fetched with a [`TaskFilter`], which is either evaluated locally, or pushed down to the remote database.

pub mod error;
pub use error::Error;
pub mod traits;

mod task;
pub use task::{Task, TaskId, TaskState};
pub mod filter;
pub use filter::{TaskField, TaskFilter};
pub mod document;
pub use document::Document;

pub mod calendar;
pub use calendar::{LocalCalendar, RemoteCalendar};
pub mod storage;
pub mod client;

pub mod config;
pub mod mock_behaviour;
pub mod utils;
