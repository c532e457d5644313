//! Common test utilities for integration tests
//!
//! Each tracker lives in its own temporary data directory, so tests can
//! reopen the store and see exactly what was persisted.

#![allow(dead_code)]

use calorie_tracker_engine::state::{StoreSettings, TrackerStore};
use calorie_tracker_engine::storage::{FileStorage, KeyValueStorage};
use calorie_tracker_shared::Catalog;
use chrono::NaiveDate;
use tempfile::TempDir;

pub const KEY: &str = "calorie-tracker-state-v2";

pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn today() -> NaiveDate {
    day("2024-03-01")
}

/// Test tracker wrapper
pub struct TestTracker {
    pub dir: TempDir,
    pub store: TrackerStore<FileStorage>,
}

impl TestTracker {
    /// Fresh tracker with the built-in catalog
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = open(&dir, Catalog::builtin());
        Self { dir, store }
    }

    /// Tracker over a document stored by an earlier version
    pub fn with_stored(raw: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        FileStorage::new(dir.path())
            .set(KEY, raw)
            .expect("Failed to seed document");
        let store = open(&dir, Catalog::builtin());
        Self { dir, store }
    }

    /// Drop the in-memory state and load again from disk
    pub fn reopen(self) -> Self {
        let Self { dir, store } = self;
        let catalog = store.catalog().clone();
        drop(store);
        let store = open(&dir, catalog);
        Self { dir, store }
    }

    /// The persisted document, as stored
    pub fn stored(&self) -> String {
        FileStorage::new(self.dir.path())
            .get(KEY)
            .expect("Failed to read document")
            .expect("No document stored")
    }
}

fn open(dir: &TempDir, catalog: Catalog) -> TrackerStore<FileStorage> {
    TrackerStore::open(
        FileStorage::new(dir.path()),
        StoreSettings::default(),
        catalog,
        today(),
    )
    .expect("Failed to open tracker")
}
