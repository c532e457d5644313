//! Key-value persistence for the tracker document
//!
//! The engine stores one string per key and always writes whole values.
//! `MemoryStorage` backs tests and the browser module (the page owns the
//! real local storage); `FileStorage` keeps one file per key for the CLI.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use calorie_tracker_shared::StorageError;

/// Backend holding serialized documents
pub trait KeyValueStorage {
    /// Read the value stored under `key`, `None` when nothing was saved yet
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}
