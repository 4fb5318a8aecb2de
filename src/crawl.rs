//! Batch orchestration of the crawl.
//!
//! Links that are not already in the [`Store`] are processed in fixed-size
//! batches. Every item of a batch runs concurrently on the current task
//! (fetch, extract, append); the next batch starts only after the whole
//! batch is done and a pacing delay has passed. Each item also waits a
//! short delay before fetching.
//!
//! An item that fails for any reason (download, extraction, write, or a
//! panic) is logged and counted as not processed. It never stops the run.

use crate::config::{BATCH_DELAY, BATCH_SIZE, ITEM_DELAY};
use crate::outputs::store::Store;
use crate::scrapers::fetch::PageSource;
use crate::scrapers::table::extract_question;
use futures::FutureExt;
use futures::future::join_all;
use itertools::Itertools;
use scraper::Html;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Batch size and pacing.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub batch_size: usize,
    /// Pause between two batches.
    pub batch_delay: Duration,
    /// Pause before each page fetch.
    pub item_delay: Duration,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            batch_size: BATCH_SIZE,
            batch_delay: BATCH_DELAY,
            item_delay: ITEM_DELAY,
        }
    }
}

/// Counts reported at the end of a crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Links found on the listing page, repeats included.
    pub discovered: usize,
    /// Distinct links that were already stored before this run.
    pub already_known: usize,
    /// Distinct links this run tried to process.
    pub queued: usize,
    /// Newly stored records.
    pub processed: usize,
    /// Queued links that produced nothing.
    pub failed: usize,
    /// Records in the store after the run.
    pub total_stored: usize,
}

/// Drives question pages from a [`PageSource`] into a [`Store`].
#[derive(Debug)]
pub struct Crawler<P> {
    source: P,
    settings: CrawlSettings,
}

impl<P: PageSource> Crawler<P> {
    pub fn new(source: P) -> Self {
        Self::with_settings(source, CrawlSettings::default())
    }

    pub fn with_settings(source: P, settings: CrawlSettings) -> Self {
        Self { source, settings }
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    /// Process every link in `links` that `store` does not already hold.
    #[instrument(level = "info", skip_all, fields(discovered = links.len()))]
    pub async fn run(&self, links: &[String], store: &Store) -> CrawlSummary {
        let known = store.known_urls().await;
        let unique: Vec<&str> = links.iter().map(String::as_str).unique().collect();
        if unique.len() < links.len() {
            warn!(duplicates = links.len() - unique.len(), "Listing repeats some links");
        }
        let to_process: Vec<&str> = unique
            .iter()
            .copied()
            .filter(|link| !known.contains(*link))
            .collect();

        let mut summary = CrawlSummary {
            discovered: links.len(),
            already_known: unique.len() - to_process.len(),
            queued: to_process.len(),
            ..Default::default()
        };
        info!(
            known = known.len(),
            queued = summary.queued,
            distinct = unique.len(),
            "Links to process"
        );

        let batch_size = self.settings.batch_size.max(1);
        let batch_count = to_process.len().div_ceil(batch_size);
        for (i, batch) in to_process.chunks(batch_size).enumerate() {
            let first = i * batch_size + 1;
            info!(
                batch = i + 1,
                of = batch_count,
                range = %format!("{}-{}/{}", first, first + batch.len() - 1, to_process.len()),
                "Processing batch"
            );

            let outcomes = join_all(batch.iter().map(|link| self.guarded(link, store))).await;
            summary.processed += outcomes.into_iter().filter(|stored| *stored).count();

            if i + 1 < batch_count {
                sleep(self.settings.batch_delay).await;
            }
        }

        summary.failed = summary.queued - summary.processed;
        summary.total_stored = store.len().await;
        info!(
            processed = summary.processed,
            failed = summary.failed,
            total_stored = summary.total_stored,
            "Crawl finished"
        );
        summary
    }

    async fn guarded(&self, link: &str, store: &Store) -> bool {
        match AssertUnwindSafe(self.process_link(link, store))
            .catch_unwind()
            .await
        {
            Ok(stored) => stored,
            Err(_) => {
                error!(%link, "Processing panicked; skipping");
                false
            }
        }
    }

    /// Fetch, extract and store one page. `true` if a new record was stored.
    #[instrument(level = "info", skip(self, store))]
    async fn process_link(&self, link: &str, store: &Store) -> bool {
        if store.contains(link).await {
            warn!("Skipped already stored URL");
            return false;
        }

        sleep(self.settings.item_delay).await;

        let Some(body) = self.source.fetch_page(link).await else {
            warn!("Page could not be fetched");
            return false;
        };
        let record = {
            let document = Html::parse_document(&body);
            extract_question(&document, link)
        };
        let Some(record) = record else {
            warn!("Page yielded no question");
            return false;
        };

        match store.append(record).await {
            Ok(true) => {
                let total = store.len().await;
                info!(path = %store.path().display(), total, "Saved question");
                true
            }
            Ok(false) => false,
            Err(e) => {
                error!(error = %e, "Failed to persist question");
                false
            }
        }
    }
}
