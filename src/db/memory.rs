use std::sync::RwLock;

use futures::future::{BoxFuture, FutureExt};

use crate::entry::MoodEntry;
use crate::errors::PersistenceError;

/// A store that keeps entries in process memory. Everything is lost on
/// exit; use it for tests and local runs, never for a deployment.
#[derive(Debug, Default)]
pub struct MemoryDb {
    entries: RwLock<Vec<MoodEntry>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_now(&self, entry: &MoodEntry) -> Result<(), PersistenceError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| PersistenceError::Poisoned)?;

        if entries.iter().any(|e| e.id == entry.id) {
            return Err(PersistenceError::DuplicateId(entry.id));
        }

        entries.push(entry.clone());

        Ok(())
    }

    fn snapshot(&self) -> Result<Vec<MoodEntry>, PersistenceError> {
        self.entries
            .read()
            .map(|entries| entries.clone())
            .map_err(|_| PersistenceError::Poisoned)
    }
}

impl super::Db for MemoryDb {
    fn count(&self) -> BoxFuture<Result<i64, PersistenceError>> {
        let count = self
            .entries
            .read()
            .map(|entries| entries.len() as i64)
            .map_err(|_| PersistenceError::Poisoned);

        futures::future::ready(count).boxed()
    }

    fn insert(&self, entry: &MoodEntry) -> BoxFuture<Result<(), PersistenceError>> {
        futures::future::ready(self.insert_now(entry)).boxed()
    }

    fn list(&self) -> BoxFuture<Result<Vec<MoodEntry>, PersistenceError>> {
        futures::future::ready(self.snapshot()).boxed()
    }
}
