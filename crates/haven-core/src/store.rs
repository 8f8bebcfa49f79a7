//! Mood/journal history: an append + read-all collaborator.
//!
//! `InMemoryMoodStore` backs tests and the daemon; `SledMoodStore` keeps entries on disk keyed
//! by timestamp so `read_all` comes back in chronological order.

use crate::error::HavenResult;
use crate::shared::MoodEntry;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

const MOOD_TREE: &str = "mood_entries";

pub trait MoodStore: Send + Sync {
    fn append(&self, entry: &MoodEntry) -> HavenResult<()>;

    /// All entries, oldest first.
    fn read_all(&self) -> HavenResult<Vec<MoodEntry>>;

    /// The `n` most recent entries, oldest first.
    fn recent(&self, n: usize) -> HavenResult<Vec<MoodEntry>> {
        let all = self.read_all()?;
        let skip = all.len().saturating_sub(n);
        Ok(all.into_iter().skip(skip).collect())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryMoodStore {
    entries: RwLock<Vec<MoodEntry>>,
}

impl InMemoryMoodStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MoodStore for InMemoryMoodStore {
    fn append(&self, entry: &MoodEntry) -> HavenResult<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
        Ok(())
    }

    fn read_all(&self) -> HavenResult<Vec<MoodEntry>> {
        Ok(self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

pub struct SledMoodStore {
    tree: sled::Tree,
}

impl SledMoodStore {
    pub fn open_path(path: impl AsRef<Path>) -> HavenResult<Self> {
        let db = sled::open(path)?;
        let tree = db.open_tree(MOOD_TREE)?;
        Ok(Self { tree })
    }

    /// Big-endian millis first so byte order is chronological; id breaks ties.
    fn key_for(entry: &MoodEntry) -> Vec<u8> {
        let millis = entry.timestamp.timestamp_millis().max(0) as u64;
        let mut key = Vec::with_capacity(8 + 16);
        key.extend_from_slice(&millis.to_be_bytes());
        key.extend_from_slice(entry.id.as_bytes());
        key
    }
}

impl MoodStore for SledMoodStore {
    fn append(&self, entry: &MoodEntry) -> HavenResult<()> {
        let value = serde_json::to_vec(entry)?;
        self.tree.insert(Self::key_for(entry), value)?;
        self.tree.flush()?;
        Ok(())
    }

    fn read_all(&self) -> HavenResult<Vec<MoodEntry>> {
        self.tree
            .iter()
            .values()
            .map(|value| -> HavenResult<MoodEntry> {
                let bytes = value?;
                Ok(serde_json::from_slice::<MoodEntry>(&bytes)?)
            })
            .collect()
    }
}
