//! Crawl loop coordination
//!
//! This module drives a complete run: it walks listing pages by number,
//! dedupes their links against the store, fans the unseen detail pages out
//! over the worker pool, and persists what comes back. A run ends when a
//! listing page yields no links or cannot be fetched.

use crate::config::Config;
use crate::crawler::extractor::extract_listing_links;
use crate::crawler::fetcher::{human_delay, PageFetcher};
use crate::crawler::pool::extract_batch;
use crate::storage::ListingStore;
use crate::HarvestError;
use std::sync::{Arc, Mutex};
use tracing::{error, info};
use url::Url;

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A listing page produced zero detail links
    NoMoreListings,
    /// A listing page could not be fetched
    ListingFetchFailed,
}

/// Counters for one complete run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Listing pages successfully fetched
    pub pages_visited: u64,
    /// Detail pages fetched and parsed into records
    pub records_extracted: u64,
    /// Records actually written, after duplicate skipping
    pub records_inserted: u64,
    pub stop_reason: StopReason,
}

/// Drives the listing crawl from start page to stop condition
pub struct Coordinator<F: ?Sized, S> {
    fetcher: Arc<F>,
    storage: Arc<Mutex<S>>,
    config: Arc<Config>,
}

impl<F, S> Coordinator<F, S>
where
    F: PageFetcher + ?Sized + 'static,
    S: ListingStore,
{
    /// Creates a new coordinator
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Page source shared with the worker pool
    /// * `storage` - Dedup gateway to the persistent store
    /// * `config` - Run configuration (start URL, pacing, concurrency)
    pub fn new(fetcher: Arc<F>, storage: Arc<Mutex<S>>, config: Arc<Config>) -> Self {
        Self {
            fetcher,
            storage,
            config,
        }
    }

    /// Runs the crawl to completion
    ///
    /// Walks listing pages starting from `start_page`, appending the page
    /// number as a `page` query parameter. Per page: extract detail links,
    /// skip URLs already stored, fetch and parse the remainder through the
    /// bounded pool, insert the results. Storage failures abort the run;
    /// individual detail page failures do not.
    pub async fn run(&self) -> Result<RunSummary, HarvestError> {
        let start_url = Url::parse(&self.config.source.start_url)?;
        let concurrency = self.config.source.concurrency;

        let mut page = self.config.source.start_page;
        let mut pages_visited = 0u64;
        let mut records_extracted = 0u64;
        let mut records_inserted = 0u64;

        info!(
            start_url = %start_url,
            start_page = page,
            concurrency,
            "Run started"
        );

        let stop_reason = loop {
            let listing_url = listing_page_url(&start_url, page);
            info!(page, url = %listing_url, "Listing page");

            let html = match self.fetcher.fetch(listing_url.as_str()).await {
                Ok(html) => html,
                Err(e) => {
                    error!(page, url = %listing_url, error = %e, "Failed to fetch listing page");
                    break StopReason::ListingFetchFailed;
                }
            };
            pages_visited += 1;

            let links = extract_listing_links(&html, &listing_url);
            info!(page, count = links.len(), "Links found");

            if links.is_empty() {
                info!("No more links. Stop.");
                break StopReason::NoMoreListings;
            }

            let existing = {
                let storage = self.storage.lock().unwrap();
                storage.existing_urls(&links)?
            };
            let to_fetch: Vec<String> = links
                .iter()
                .filter(|url| !existing.contains(*url))
                .cloned()
                .collect();

            info!(
                page,
                existing = existing.len(),
                new = to_fetch.len(),
                "Dedupe"
            );

            let records = extract_batch(Arc::clone(&self.fetcher), to_fetch, concurrency).await;
            records_extracted += records.len() as u64;

            let inserted = {
                let mut storage = self.storage.lock().unwrap();
                storage.insert_new(&records)?
            };
            records_inserted += inserted as u64;

            info!(page, extracted = records.len(), inserted, "Persisted");

            human_delay(self.config.http.page_delay_range).await;
            page += 1;
        };

        info!(
            pages_visited,
            records_extracted,
            records_inserted,
            stop_reason = ?stop_reason,
            "Run finished"
        );

        Ok(RunSummary {
            pages_visited,
            records_extracted,
            records_inserted,
            stop_reason,
        })
    }
}

/// Builds the URL of a numbered listing page
///
/// The page number is appended as a `page` query parameter, keeping any
/// query parameters already on the start URL.
fn listing_page_url(base: &Url, page: u32) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("page", &page.to_string());
    url
}
