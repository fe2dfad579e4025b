//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ListingStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ListingStore, StorageError, StorageResult};
use crate::storage::CarRecord;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        // Initialize schema
        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database, used by tests
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Returns the total number of stored listings
    pub fn count_cars(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cars", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Looks up a single listing by URL
    pub fn get_by_url(&self, url: &str) -> StorageResult<Option<CarRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, title, price_usd, odometer, username, phone_number,
             image_url, images_count, car_number, car_vin, datetime_found
             FROM cars WHERE url = ?1",
        )?;

        let record = stmt
            .query_row(params![url], |row| {
                let raw: String = row.get(10)?;
                let datetime_found = DateTime::parse_from_rfc3339(&raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            10,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;

                Ok(CarRecord {
                    url: row.get(0)?,
                    title: row.get(1)?,
                    price_usd: row.get(2)?,
                    odometer: row.get(3)?,
                    username: row.get(4)?,
                    phone_number: row.get(5)?,
                    image_url: row.get(6)?,
                    images_count: row.get(7)?,
                    car_number: row.get(8)?,
                    car_vin: row.get(9)?,
                    datetime_found,
                })
            })
            .optional()?;

        Ok(record)
    }
}

impl ListingStore for SqliteStorage {
    fn existing_urls(&self, urls: &[String]) -> StorageResult<HashSet<String>> {
        if urls.is_empty() {
            return Ok(HashSet::new());
        }

        let placeholders = vec!["?"; urls.len()].join(", ");
        let sql = format!("SELECT url FROM cars WHERE url IN ({})", placeholders);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(urls.iter()), |row| {
            row.get::<_, String>(0)
        })?;

        let mut existing = HashSet::new();
        for url in rows {
            existing.insert(url?);
        }
        Ok(existing)
    }

    fn insert_new(&mut self, records: &[CarRecord]) -> StorageResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO cars
                 (url, title, price_usd, odometer, username, phone_number,
                  image_url, images_count, car_number, car_vin, datetime_found)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;

            for record in records {
                // execute returns 0 changed rows when the url conflicts
                inserted += stmt.execute(params![
                    record.url,
                    record.title,
                    record.price_usd,
                    record.odometer,
                    record.username,
                    record.phone_number,
                    record.image_url,
                    record.images_count,
                    record.car_number,
                    record.car_vin,
                    record.datetime_found.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(url: &str) -> CarRecord {
        CarRecord {
            url: url.to_string(),
            title: "Audi A6 2019".to_string(),
            price_usd: 28500,
            odometer: 95000,
            username: "Oleh".to_string(),
            phone_number: "380671234567".to_string(),
            image_url: "https://cdn.example.com/1.jpg".to_string(),
            images_count: 12,
            car_number: "AA 1234 BB".to_string(),
            car_vin: "WAUZZZ4G1KN000000".to_string(),
            datetime_found: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_count() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        let inserted = storage
            .insert_new(&[sample_record("https://a"), sample_record("https://b")])
            .unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(storage.count_cars().unwrap(), 2);
    }

    #[test]
    fn test_insert_empty_is_noop() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert_eq!(storage.insert_new(&[]).unwrap(), 0);
    }

    #[test]
    fn test_duplicate_url_silently_skipped() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        storage.insert_new(&[sample_record("https://a")]).unwrap();

        // Second insert of the same URL is not an error and inserts nothing
        let inserted = storage
            .insert_new(&[sample_record("https://a"), sample_record("https://b")])
            .unwrap();

        assert_eq!(inserted, 1);
        assert_eq!(storage.count_cars().unwrap(), 2);
    }

    #[test]
    fn test_existing_urls_empty_input() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let existing = storage.existing_urls(&[]).unwrap();
        assert!(existing.is_empty());
    }

    #[test]
    fn test_existing_urls_returns_subset() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .insert_new(&[sample_record("https://a"), sample_record("https://b")])
            .unwrap();

        let urls = vec![
            "https://a".to_string(),
            "https://b".to_string(),
            "https://c".to_string(),
        ];
        let existing = storage.existing_urls(&urls).unwrap();

        assert_eq!(existing.len(), 2);
        assert!(existing.contains("https://a"));
        assert!(existing.contains("https://b"));
        assert!(!existing.contains("https://c"));
    }

    #[test]
    fn test_records_are_immutable_once_inserted() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.insert_new(&[sample_record("https://a")]).unwrap();

        // Re-inserting with different fields does not overwrite the row
        let mut changed = sample_record("https://a");
        changed.price_usd = 1;
        storage.insert_new(&[changed]).unwrap();

        let stored = storage.get_by_url("https://a").unwrap().unwrap();
        assert_eq!(stored.price_usd, 28500);
    }

    #[test]
    fn test_get_by_url_roundtrip() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let record = sample_record("https://a");
        storage.insert_new(&[record.clone()]).unwrap();

        let stored = storage.get_by_url("https://a").unwrap().unwrap();
        assert_eq!(stored.title, record.title);
        assert_eq!(stored.odometer, record.odometer);
        assert_eq!(stored.phone_number, record.phone_number);

        assert!(storage.get_by_url("https://missing").unwrap().is_none());
    }
}
