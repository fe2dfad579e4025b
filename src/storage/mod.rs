//! Storage module for persisting extracted listings
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - Duplicate-safe insertion keyed by listing URL
//! - Existence checks used to skip already-harvested listings

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{ListingStore, StorageError, StorageResult};

use chrono::{DateTime, Utc};

/// A single extracted car listing, the unit of persistence
///
/// The `url` field is the natural key: the store never holds two rows with
/// the same URL, and records are immutable once inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct CarRecord {
    pub url: String,
    pub title: String,
    pub price_usd: i64,
    pub odometer: i64,
    pub username: String,
    pub phone_number: String,
    pub image_url: String,
    pub images_count: i64,
    pub car_number: String,
    pub car_vin: String,
    /// Wall-clock time of extraction, not any value on the page
    pub datetime_found: DateTime<Utc>,
}
