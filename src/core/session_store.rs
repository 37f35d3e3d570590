//! Persistence of the authenticated session in `login_details.json`.
//!
//! The file is a JSON object whose `session_info` key holds a [`SessionInfo`].
//! Other top-level keys are left untouched on save.

use crate::domain::model::SessionInfo;
use crate::domain::ports::Storage;
use crate::utils::error::{PosterError, Result};
use serde_json::{Map, Value};

pub const DEFAULT_SESSION_FILE: &str = "login_details.json";
const SESSION_KEY: &str = "session_info";

pub struct SessionStore<S: Storage> {
    storage: S,
    file_name: String,
}

impl<S: Storage> SessionStore<S> {
    pub fn new(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Loads the saved session. A missing file or a file without `session_info` yields `None`.
    pub async fn load(&self) -> Result<Option<SessionInfo>> {
        let Some(mut details) = self.read_details().await? else {
            tracing::debug!("No login details file found at {}", self.file_name);
            return Ok(None);
        };

        let Some(raw) = details.remove(SESSION_KEY) else {
            tracing::debug!("No session info found in {}", self.file_name);
            return Ok(None);
        };

        let session: SessionInfo =
            serde_json::from_value(raw).map_err(|e| PosterError::SessionError {
                message: format!("malformed session_info in {}: {}", self.file_name, e),
            })?;
        tracing::info!(
            "Loaded session from {} (last login {})",
            self.file_name,
            session.last_login
        );
        Ok(Some(session))
    }

    /// Loads a session that can be used for API calls, or fails with a session error.
    pub async fn load_usable(&self) -> Result<SessionInfo> {
        match self.load().await? {
            Some(session) if session.is_usable() => Ok(session),
            Some(_) => Err(PosterError::SessionError {
                message: format!("the session in {} is not logged in", self.file_name),
            }),
            None => Err(PosterError::SessionError {
                message: format!("{} not found", self.file_name),
            }),
        }
    }

    pub async fn save(&self, session: &SessionInfo) -> Result<()> {
        let mut details = match self.read_details().await {
            Ok(Some(details)) => details,
            Ok(None) => Map::new(),
            Err(PosterError::SerializationError(e)) => {
                tracing::warn!("Invalid JSON in {} ({}), replacing it", self.file_name, e);
                Map::new()
            }
            Err(e) => return Err(e),
        };

        details.insert(SESSION_KEY.to_string(), serde_json::to_value(session)?);
        let data = serde_json::to_vec_pretty(&Value::Object(details))?;
        self.storage.write_file(&self.file_name, &data).await?;

        tracing::info!("Session data saved to {}", self.file_name);
        Ok(())
    }

    async fn read_details(&self) -> Result<Option<Map<String, Value>>> {
        let data = match self.storage.read_file(&self.file_name).await {
            Ok(data) => data,
            Err(PosterError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };

        match serde_json::from_slice::<Value>(&data)? {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(PosterError::SessionError {
                message: format!("{} does not contain a JSON object", self.file_name),
            }),
        }
    }
}
