//! Support for library configuration options

use std::path::Path;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// The slot a [`LocalCalendar`](crate::calendar::LocalCalendar) uses unless told otherwise
pub const DEFAULT_STORAGE_KEY: &str = "calendar-data";

/// The collection tasks are usually stored in, in a remote database
pub const DEFAULT_COLLECTION_NAME: &str = "calendar-tasks";

/// Where the Firestore REST API lives, when [`ClientSettings`] do not say otherwise.
/// Feel free to override it when initing this library (e.g. to target an emulator for a whole test suite).
pub static FIRESTORE_URL: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("https://firestore.googleapis.com".to_string())));

/// The database used inside a project, when [`ClientSettings`] do not say otherwise.
/// Feel free to override it when initing this library.
pub static DATABASE_ID: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("(default)".to_string())));

fn read_default(value: &Mutex<String>) -> String {
    match value.lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// How to reach a Firestore database.
///
/// This deserializes from the same JSON a web app is configured with (`{"projectId": ..., "apiKey": ...}`),
/// unknown keys being ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    pub project_id: String,
    /// Defaults to [`FIRESTORE_URL`]
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Defaults to [`DATABASE_ID`]
    #[serde(default)]
    pub database_id: Option<String>,
    /// Sent as the `key` query parameter
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sent as a bearer token
    #[serde(default)]
    pub access_token: Option<String>,
}

impl ClientSettings {
    pub fn new<S: Into<String>>(project_id: S) -> Self {
        Self {
            project_id: project_id.into(),
            base_url: None,
            database_id: None,
            api_key: None,
            access_token: None,
        }
    }

    /// Settings for a local Firestore emulator, e.g. at `localhost:8080`
    pub fn for_emulator<S: Into<String>>(host: &str, project_id: S) -> Result<Self> {
        let mut settings = Self::new(project_id);
        settings.base_url = Some(Url::parse(&format!("http://{}", host))?);
        // The emulator grants every right to this token
        settings.access_token = Some("owner".to_string());
        Ok(settings)
    }

    /// Read settings from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|source| Error::Io{ path: path.to_path_buf(), source })?;
        Ok(serde_json::from_reader(file)?)
    }

    /// The base URL to use, either the configured one or the library default
    pub fn resolved_base_url(&self) -> Result<Url> {
        match &self.base_url {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse(&read_default(&FIRESTORE_URL))?),
        }
    }

    /// The database to use, either the configured one or the library default
    pub fn resolved_database_id(&self) -> String {
        match &self.database_id {
            Some(id) => id.clone(),
            None => read_default(&DATABASE_ID),
        }
    }
}
