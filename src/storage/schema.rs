//! Database schema definitions
//!
//! This module contains the SQL schema for the Ria-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Harvested car listings, one row per listing URL
CREATE TABLE IF NOT EXISTS cars (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL DEFAULT '',
    price_usd INTEGER NOT NULL DEFAULT 0,
    odometer INTEGER NOT NULL DEFAULT 0,
    username TEXT NOT NULL DEFAULT '',
    phone_number TEXT NOT NULL DEFAULT '',
    image_url TEXT NOT NULL DEFAULT '',
    images_count INTEGER NOT NULL DEFAULT 0,
    car_number TEXT NOT NULL DEFAULT '',
    car_vin TEXT NOT NULL DEFAULT '',
    datetime_found TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// Safe to call on every open; all statements are idempotent.
pub fn initialize_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
