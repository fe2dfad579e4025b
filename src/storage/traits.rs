//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::CarRecord;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Dedup gateway to the persistent store
///
/// The crawl loop uses this trait in two steps per listing page: an existence
/// check to decide which detail pages still need fetching, and a
/// duplicate-safe insert of the extracted records. A URL conflict during
/// insert is never an error; the conflicting record is silently skipped.
pub trait ListingStore {
    /// Returns which of the given URLs are already stored
    ///
    /// Empty input returns an empty set without touching the database.
    fn existing_urls(&self, urls: &[String]) -> StorageResult<HashSet<String>>;

    /// Inserts the given records, skipping any whose `url` already exists
    ///
    /// Runs as a single transaction. Returns the number of rows actually
    /// inserted, which may be fewer than the number of records given.
    /// Empty input is a no-op returning 0.
    fn insert_new(&mut self, records: &[CarRecord]) -> StorageResult<usize>;
}
