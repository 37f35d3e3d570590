use crate::domain::model::RunState;
use crate::domain::ports::Storage;
use crate::utils::error::{PosterError, Result};

pub const DEFAULT_STATE_FILE: &str = "run_state.json";

/// Persists the [`RunState`] between runs so an interrupted loop resumes where it stopped.
pub struct StateStore<S: Storage> {
    storage: S,
    file_name: String,
}

impl<S: Storage> StateStore<S> {
    pub fn new(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
        }
    }

    /// Returns the persisted state, or a fresh one aimed at `target_index`.
    /// The target from the caller always wins over the stored one.
    pub async fn load_or_new(&self, target_index: i64) -> Result<RunState> {
        match self.storage.read_file(&self.file_name).await {
            Ok(data) => {
                let mut state: RunState = serde_json::from_slice(&data)?;
                if state.target_index != target_index {
                    tracing::info!(
                        "Target index changed from {} to {}",
                        state.target_index,
                        target_index
                    );
                    state.target_index = target_index;
                }
                Ok(state)
            }
            Err(PosterError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(RunState::new(target_index))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn save(&self, state: &RunState) -> Result<()> {
        let data = serde_json::to_vec_pretty(state)?;
        self.storage.write_file(&self.file_name, &data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::cli::LocalStorage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fresh_state_when_missing() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(
            LocalStorage::new(dir.path().to_str().unwrap().to_string()),
            DEFAULT_STATE_FILE,
        );

        let state = store.load_or_new(229).await.unwrap();
        assert_eq!(state, RunState::new(229));
    }

    #[tokio::test]
    async fn test_resume_with_new_target() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(
            LocalStorage::new(dir.path().to_str().unwrap().to_string()),
            DEFAULT_STATE_FILE,
        );

        store
            .save(&RunState {
                last_index: 12,
                target_index: 20,
            })
            .await
            .unwrap();

        let state = store.load_or_new(40).await.unwrap();
        assert_eq!(state.last_index, 12);
        assert_eq!(state.target_index, 40);
    }
}
