//! Errors raised by the storage building blocks
//!
//! These never reach the callers of [`TasksCalendar`](crate::traits::TasksCalendar), which collapses them into
//! "did not happen" values (empty lists, `None`, `false`) after logging them.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status code {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("unknown task field {0:?}")]
    UnknownField(String),

    #[error("unknown task state {0:?}")]
    UnknownState(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("no numeric id is left to give to a new task")]
    IdsExhausted,

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("mocked behaviour requires this {0} to fail")]
    Mocked(String),
}

pub type Result<T> = std::result::Result<T, Error>;
