//! JSON snapshot files.
//!
//! Both output files (`data.json` and `dataRu.json`) hold a single
//! top-level array and are always rewritten in full. A [`SnapshotWriter`]
//! owns one file: it runs as a spawned task fed by a channel, so writes
//! are applied strictly one at a time in the order they were queued.
//!
//! Each write goes to a sibling `*.tmp` file that is then renamed over
//! the target, so a reader (or the next run) only ever sees a complete
//! snapshot.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, instrument};

/// Failure to write a snapshot.
#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot writer for {0} has stopped")]
    WriterClosed(PathBuf),
}

/// Failure to read a snapshot back.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("{0} does not exist")]
    Missing(PathBuf),
    #[error("{path} is not a valid JSON array: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

struct WriteRequest {
    bytes: Vec<u8>,
    done: oneshot::Sender<io::Result<()>>,
}

/// Single-consumer writer that owns one JSON file.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    path: PathBuf,
    tx: mpsc::UnboundedSender<WriteRequest>,
}

/// A queued write. Await [`PendingWrite::wait`] to learn whether it landed.
#[must_use = "a queued snapshot should be awaited"]
pub struct PendingWrite {
    path: PathBuf,
    done: oneshot::Receiver<io::Result<()>>,
}

impl PendingWrite {
    pub async fn wait(self) -> Result<(), SnapshotError> {
        match self.done.await {
            Ok(res) => res.map_err(SnapshotError::from),
            Err(_) => Err(SnapshotError::WriterClosed(self.path)),
        }
    }
}

impl SnapshotWriter {
    /// Start the writer task for `path`. Must be called inside a tokio runtime.
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<WriteRequest>();
        let target = path.clone();

        tokio::spawn(async move {
            while let Some(req) = rx.recv().await {
                let res = replace_file(&target, &req.bytes).await;
                if let Err(e) = &res {
                    error!(path = %target.display(), error = %e, "Failed to write snapshot");
                }
                let _ = req.done.send(res);
            }
            debug!(path = %target.display(), "Snapshot writer stopped");
        });

        Self { path, tx }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize `items` now and queue the write.
    ///
    /// Callers that need ordering across tasks must call this while holding
    /// whatever lock guards `items`: the queue order is the order of calls.
    pub fn enqueue<T: Serialize>(&self, items: &[T]) -> Result<PendingWrite, SnapshotError> {
        let bytes = serde_json::to_vec_pretty(items)?;
        let (done, rx) = oneshot::channel();
        self.tx
            .send(WriteRequest { bytes, done })
            .map_err(|_| SnapshotError::WriterClosed(self.path.clone()))?;
        Ok(PendingWrite {
            path: self.path.clone(),
            done: rx,
        })
    }

    /// Queue a snapshot of `items` and wait until it is on disk.
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display(), count = items.len()))]
    pub async fn write<T: Serialize>(&self, items: &[T]) -> Result<(), SnapshotError> {
        self.enqueue(items)?.wait().await
    }
}

async fn replace_file(target: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = target.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes).await?;
    fs::rename(&tmp, target).await
}

/// Read a JSON array snapshot.
pub async fn load_snapshot<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, LoadError> {
    let raw = match fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(LoadError::Missing(path.to_path_buf()));
        }
        Err(source) => {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_slice(&raw).map_err(|source| LoadError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}
