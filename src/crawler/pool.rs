//! Bounded concurrent detail page extraction
//!
//! Fans a batch of detail URLs out over spawned tasks while a semaphore
//! caps how many fetches are in flight at once. Each URL is isolated: a
//! fetch or parse failure is logged with its URL and dropped, and never
//! affects the rest of the batch.

use crate::crawler::extractor::extract_car;
use crate::crawler::fetcher::PageFetcher;
use crate::storage::CarRecord;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Result of one detail page worker
struct ItemOutcome {
    url: String,
    result: Result<CarRecord, String>,
}

/// Fetches and extracts a batch of detail pages concurrently
///
/// # Arguments
///
/// * `fetcher` - Page source shared by all workers
/// * `urls` - Detail page URLs to process
/// * `concurrency` - Maximum number of fetches in flight at once
///
/// # Returns
///
/// Records for every URL that fetched and parsed successfully, in batch
/// order. Failed URLs are logged and omitted.
pub async fn extract_batch<F>(
    fetcher: Arc<F>,
    urls: Vec<String>,
    concurrency: usize,
) -> Vec<CarRecord>
where
    F: PageFetcher + ?Sized + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut handles = Vec::with_capacity(urls.len());

    for url in urls {
        let fetcher = Arc::clone(&fetcher);
        let semaphore = Arc::clone(&semaphore);

        handles.push(tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    return ItemOutcome {
                        url,
                        result: Err(e.to_string()),
                    }
                }
            };

            debug!(url = %url, "Fetch car");

            let result = match fetcher.fetch(&url).await {
                Ok(html) => {
                    let record = extract_car(&html, &url);
                    debug!(title = %record.title, url = %url, "Parsed ok");
                    Ok(record)
                }
                Err(e) => Err(e.to_string()),
            };

            ItemOutcome { url, result }
        }));
    }

    let mut records = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(outcome) => match outcome.result {
                Ok(record) => records.push(record),
                Err(reason) => {
                    warn!(url = %outcome.url, reason = %reason, "Failed to fetch/parse car");
                }
            },
            Err(e) => warn!(error = %e, "Detail worker panicked"),
        }
    }

    records
}
