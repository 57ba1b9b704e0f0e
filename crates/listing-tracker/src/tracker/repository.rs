use std::sync::{Arc, Mutex};

use super::domain::TrackerDocument;

/// Storage abstraction so the service can be exercised without touching the filesystem.
pub trait TrackerRepository: Send + Sync {
    fn load(&self) -> Result<TrackerDocument, RepositoryError>;
    fn save(&self, document: &TrackerDocument) -> Result<(), RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("tracker document not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("tracker document is corrupt: {0}")]
    Corrupt(String),
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryTrackerRepository {
    document: Arc<Mutex<Option<TrackerDocument>>>,
}

impl InMemoryTrackerRepository {
    pub fn new(document: TrackerDocument) -> Self {
        Self {
            document: Arc::new(Mutex::new(Some(document))),
        }
    }

    pub fn snapshot(&self) -> Option<TrackerDocument> {
        self.document
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl TrackerRepository for InMemoryTrackerRepository {
    fn load(&self) -> Result<TrackerDocument, RepositoryError> {
        let guard = self
            .document
            .lock()
            .map_err(|_| RepositoryError::Unavailable("tracker mutex poisoned".to_string()))?;
        guard.clone().ok_or(RepositoryError::NotFound)
    }

    fn save(&self, document: &TrackerDocument) -> Result<(), RepositoryError> {
        let mut guard = self
            .document
            .lock()
            .map_err(|_| RepositoryError::Unavailable("tracker mutex poisoned".to_string()))?;
        *guard = Some(document.clone());
        Ok(())
    }
}
