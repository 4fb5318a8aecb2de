//! Deduplicating, append-only store of extracted questions.
//!
//! The store keeps every [`QuestionRecord`] in memory together with the
//! set of URLs already seen, and mirrors the whole list to `data.json`
//! after each append. Restarting the crawler reloads that file, which is
//! what makes a run resumable.
//!
//! Many crawl items share one store. Appends take the state lock, update
//! the list and queue the snapshot before releasing it, so snapshots reach
//! the [`SnapshotWriter`] in the same order the list grew.

use crate::models::QuestionRecord;
use crate::outputs::json::{LoadError, SnapshotError, SnapshotWriter, load_snapshot};
use std::collections::HashSet;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

#[derive(Debug, Default)]
struct StoreState {
    records: Vec<QuestionRecord>,
    known_urls: HashSet<String>,
}

/// In-memory question list backed by a JSON snapshot file.
#[derive(Debug)]
pub struct Store {
    state: Mutex<StoreState>,
    writer: SnapshotWriter,
}

impl Store {
    /// Rebuild the store from `path`.
    ///
    /// A missing file or one that is not valid JSON yields an empty store.
    /// Any other read failure (permissions, a directory in the way) is returned.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, LoadError> {
        let records = match load_snapshot::<QuestionRecord>(path).await {
            Ok(records) => records,
            Err(LoadError::Missing(_)) => {
                info!("No existing store; starting empty");
                Vec::new()
            }
            Err(e @ LoadError::Corrupt { .. }) => {
                warn!(error = %e, "Existing store is unreadable; starting empty");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let mut state = StoreState::default();
        for record in records {
            if state.known_urls.insert(record.url.clone()) {
                state.records.push(record);
            } else {
                warn!(url = %record.url, "Dropping duplicate URL found in existing store");
            }
        }
        info!(
            records = state.records.len(),
            unique_urls = state.known_urls.len(),
            "Loaded existing records"
        );

        Ok(Self {
            state: Mutex::new(state),
            writer: SnapshotWriter::spawn(path),
        })
    }

    pub async fn contains(&self, url: &str) -> bool {
        self.state.lock().await.known_urls.contains(url)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// A copy of every known URL.
    pub async fn known_urls(&self) -> HashSet<String> {
        self.state.lock().await.known_urls.clone()
    }

    /// A copy of the stored records, in append order.
    pub async fn records(&self) -> Vec<QuestionRecord> {
        self.state.lock().await.records.clone()
    }

    /// Add `record` and wait for the resulting snapshot to be written.
    ///
    /// Returns `Ok(false)` without writing when the URL is already stored
    /// or the record has no variants.
    pub async fn append(&self, record: QuestionRecord) -> Result<bool, SnapshotError> {
        if record.variants_en.is_empty() {
            warn!(url = %record.url, "Refusing to store a record without variants");
            return Ok(false);
        }

        let pending = {
            let mut state = self.state.lock().await;
            if !state.known_urls.insert(record.url.clone()) {
                warn!(url = %record.url, "Skipped duplicate URL");
                return Ok(false);
            }
            state.records.push(record);
            self.writer.enqueue(&state.records)?
        };
        pending.wait().await?;
        Ok(true)
    }

    /// Write the current state to disk.
    pub async fn persist(&self) -> Result<(), SnapshotError> {
        let pending = {
            let state = self.state.lock().await;
            self.writer.enqueue(&state.records)?
        };
        pending.wait().await
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }
}
