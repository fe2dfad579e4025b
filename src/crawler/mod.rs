//! Crawling engine for the listing harvester
//!
//! This module contains the heart of the harvester:
//! - HTTP fetching with retry, pacing and anti-block backoff
//! - CSS-selector field extraction from listing and detail pages
//! - A bounded worker pool for concurrent detail fetches
//! - The crawl loop that pages through the listing until it runs dry

mod coordinator;
mod extractor;
mod fetcher;
mod pool;

pub use coordinator::{Coordinator, RunSummary, StopReason};
pub use extractor::{extract_car, extract_listing_links, only_digits, parse_odometer, parse_price};
pub use fetcher::{build_http_client, human_delay, FetchError, HttpFetcher, PageFetcher};
pub use pool::extract_batch;
