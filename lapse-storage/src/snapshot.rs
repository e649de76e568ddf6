//! JSON snapshots of a store's live entries.
//!
//! A snapshot is the output of [`Store::items`] plus the time it was taken.
//! Loading merges into an existing store and never overwrites a live key.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use lapse_core::{CacheError, CacheResult, Entry, Timestamp};

use crate::store::Store;

/// Serializable copy of the unexpired entries at `taken_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    pub taken_at: Timestamp,
    pub items: HashMap<String, Entry<T>>,
}

impl<T> Snapshot<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn json_error(err: serde_json::Error) -> CacheError {
    if err.is_io() {
        CacheError::Io {
            reason: err.to_string(),
        }
    } else {
        CacheError::Snapshot {
            reason: err.to_string(),
        }
    }
}

impl<T> Store<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Copy the live entries into a [`Snapshot`].
    pub fn snapshot(&self) -> Snapshot<T> {
        Snapshot {
            taken_at: Utc::now(),
            items: self.items(),
        }
    }
}

impl<T> Store<T>
where
    T: Clone + Send + Sync + Serialize + 'static,
{
    /// Write a JSON snapshot of the live entries to `writer`.
    ///
    /// # Errors
    ///
    /// [`CacheError::Snapshot`] if a value cannot be encoded,
    /// [`CacheError::Io`] if the writer fails.
    pub fn save<W: Write>(&self, writer: W) -> CacheResult<()> {
        let snapshot = self.snapshot();
        serde_json::to_writer(writer, &snapshot).map_err(json_error)?;
        tracing::debug!(items = snapshot.len(), "Saved cache snapshot");
        Ok(())
    }

    /// [`Store::save`] to a file, creating or truncating it.
    pub fn save_file(&self, path: impl AsRef<Path>) -> CacheResult<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.save(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

impl<T> Store<T>
where
    T: Clone + Send + Sync + DeserializeOwned + 'static,
{
    /// Read a JSON snapshot from `reader` and merge it into the store.
    ///
    /// Keys holding a live entry are left alone; absent or expired keys take
    /// the snapshot's entry, expiration included. Returns how many entries
    /// were taken.
    ///
    /// # Errors
    ///
    /// [`CacheError::Snapshot`] if the input is not a valid snapshot,
    /// [`CacheError::Io`] if the reader fails. The store is untouched on
    /// error.
    pub fn load<R: Read>(&self, reader: R) -> CacheResult<usize> {
        let snapshot: Snapshot<T> = serde_json::from_reader(reader).map_err(json_error)?;
        let offered = snapshot.len();
        let loaded = self.load_items(snapshot.items);
        tracing::debug!(
            offered,
            loaded,
            taken_at = %snapshot.taken_at,
            "Loaded cache snapshot"
        );
        Ok(loaded)
    }

    /// [`Store::load`] from a file.
    pub fn load_file(&self, path: impl AsRef<Path>) -> CacheResult<usize> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        self.load(reader)
    }
}
