//! File-backed user registry
//!
//! A flat JSON array of numeric ids, loaded once at startup and rewritten
//! whole after every mutation. The read-modify-persist sequence runs under
//! one lock, so the file always reflects the in-memory set after any
//! completed mutation and concurrent recordings cannot lose updates.

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::errors::StorageError;
use crate::domain::entities::UserId;
use crate::domain::traits::UserStore;

#[derive(Debug)]
pub struct FileRegistry {
    path: PathBuf,
    users: Mutex<HashSet<UserId>>,
}

impl FileRegistry {
    /// Open the registry, reading the backing file if it exists.
    /// A missing file is a normal first run and yields an empty set.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let users = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let ids: Vec<UserId> = serde_json::from_str(&content).map_err(|e| {
                    StorageError::Serialization(format!(
                        "registry file {} is not a JSON id array: {}",
                        path.display(),
                        e
                    ))
                })?;
                ids.into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => return Err(StorageError::Io(e)),
        };

        Ok(Self {
            path,
            users: Mutex::new(users),
        })
    }

    /// Write the full set, called while the caller still holds the lock.
    fn persist(&self, users: &HashSet<UserId>) -> Result<(), StorageError> {
        let mut ids: Vec<UserId> = users.iter().copied().collect();
        ids.sort_unstable();
        let content = serde_json::to_string(&ids)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for FileRegistry {
    async fn record_if_new(&self, id: UserId) -> Result<bool, StorageError> {
        let mut users = self.users.lock().await;
        if !users.insert(id) {
            return Ok(false);
        }
        self.persist(&users)?;
        Ok(true)
    }

    async fn remove(&self, id: UserId) -> Result<bool, StorageError> {
        let mut users = self.users.lock().await;
        if !users.remove(&id) {
            return Ok(false);
        }
        self.persist(&users)?;
        Ok(true)
    }

    async fn snapshot(&self) -> Vec<UserId> {
        let users = self.users.lock().await;
        let mut ids: Vec<UserId> = users.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    async fn len(&self) -> usize {
        self.users.lock().await.len()
    }
}
