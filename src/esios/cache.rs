//! On-disk cache of upstream documents and the cache-backed fetcher
//!
//! One file per endpoint and calendar day, `<endpoint>_<YYYYMMDD>.json`.
//! Entries are never updated, evicted or invalidated. Writes go through a
//! bounded background worker, so a freshly fetched document becomes visible
//! on disk eventually; until then it is served from the worker's pending set.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

use crate::error::{PvpcError, Result};
use crate::esios::client::RemoteSource;
use crate::esios::types::{Endpoint, has_values};
use crate::logging::{StructuredLogger, get_logger};
use crate::persistence::{load_json, store_json};

type PendingKey = (Endpoint, NaiveDate);
type PendingMap = Arc<Mutex<HashMap<PendingKey, serde_json::Value>>>;

/// Local store of raw upstream documents
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the cache file for an endpoint and date
    pub fn file_path(&self, endpoint: Endpoint, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", endpoint, date.format("%Y%m%d")))
    }

    /// Read a cached document; `DocumentNotFound` on miss
    pub fn get_document(&self, endpoint: Endpoint, date: NaiveDate) -> Result<serde_json::Value> {
        let path = self.file_path(endpoint, date);
        if !path.exists() {
            return Err(PvpcError::document_not_found(
                endpoint.to_string(),
                date.format("%Y%m%d").to_string(),
            ));
        }
        load_json(&path)
    }

    /// Persist a document
    pub fn put_document(
        &self,
        endpoint: Endpoint,
        date: NaiveDate,
        document: &serde_json::Value,
    ) -> Result<()> {
        store_json(document, &self.file_path(endpoint, date))
    }
}

enum WriteJob {
    Put {
        endpoint: Endpoint,
        date: NaiveDate,
        document: serde_json::Value,
    },
    Flush(oneshot::Sender<()>),
}

/// Bounded background writer for cache documents.
///
/// A single task drains the queue, so writes from this process never
/// interleave. Enqueueing never waits: when the queue is full the write is
/// skipped and the document will simply be fetched again next time.
#[derive(Clone)]
pub struct CacheWriter {
    tx: mpsc::Sender<WriteJob>,
    store: Arc<CacheStore>,
    pending: PendingMap,
    logger: StructuredLogger,
}

impl CacheWriter {
    /// Spawn the writer task on the current tokio runtime
    pub fn spawn(store: Arc<CacheStore>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let logger = get_logger("cache");

        tokio::spawn(run_writer(rx, store.clone(), pending.clone(), logger.clone()));

        Self {
            tx,
            store,
            pending,
            logger,
        }
    }

    /// Queue a document for persistence without waiting for the write
    pub fn enqueue(&self, endpoint: Endpoint, date: NaiveDate, document: serde_json::Value) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert((endpoint, date), document.clone());
        }

        let job = WriteJob::Put {
            endpoint,
            date,
            document,
        };
        match self.tx.try_send(job) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.forget(endpoint, date);
                self.logger.warn(&format!(
                    "Cache write queue full, dropping {} for {}",
                    endpoint, date
                ));
            }
            Err(mpsc::error::TrySendError::Closed(WriteJob::Put { document, .. })) => {
                // Worker gone (runtime shutting down): write inline
                if let Err(e) = self.store.put_document(endpoint, date, &document) {
                    self.logger
                        .error(&format!("Inline cache write failed: {}", e));
                }
                self.forget(endpoint, date);
            }
            Err(mpsc::error::TrySendError::Closed(WriteJob::Flush(_))) => {}
        }
    }

    /// Document queued but not yet written, if any
    pub fn pending(&self, endpoint: Endpoint, date: NaiveDate) -> Option<serde_json::Value> {
        self.pending
            .lock()
            .ok()
            .and_then(|p| p.get(&(endpoint, date)).cloned())
    }

    /// Wait until every previously queued write has been attempted
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(WriteJob::Flush(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
    }

    fn forget(&self, endpoint: Endpoint, date: NaiveDate) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&(endpoint, date));
        }
    }
}

async fn run_writer(
    mut rx: mpsc::Receiver<WriteJob>,
    store: Arc<CacheStore>,
    pending: PendingMap,
    logger: StructuredLogger,
) {
    while let Some(job) = rx.recv().await {
        match job {
            WriteJob::Put {
                endpoint,
                date,
                document,
            } => {
                let write_store = store.clone();
                let result = tokio::task::spawn_blocking(move || {
                    write_store.put_document(endpoint, date, &document)
                })
                .await;
                match result {
                    Ok(Ok(())) => logger.debug(&format!("Cached {} for {}", endpoint, date)),
                    Ok(Err(e)) => logger.error(&format!(
                        "Failed to cache {} for {}: {}",
                        endpoint, date, e
                    )),
                    Err(e) => logger.error(&format!("Cache write task failed: {}", e)),
                }
                if let Ok(mut p) = pending.lock() {
                    p.remove(&(endpoint, date));
                }
            }
            WriteJob::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

/// Cache-backed fetcher: local store first, one remote call on miss
pub struct CachedFetcher {
    store: Arc<CacheStore>,
    writer: CacheWriter,
    remote: Arc<dyn RemoteSource>,
    logger: StructuredLogger,
}

impl CachedFetcher {
    pub fn new(store: Arc<CacheStore>, writer: CacheWriter, remote: Arc<dyn RemoteSource>) -> Self {
        Self {
            store,
            writer,
            remote,
            logger: get_logger("cache"),
        }
    }

    pub fn writer(&self) -> &CacheWriter {
        &self.writer
    }

    /// Get the document for `endpoint` on `date`.
    ///
    /// Only documents with at least one value are persisted, so empty
    /// placeholder responses for unpublished days are retried next time.
    /// An undecodable cache file counts as a miss and is overwritten.
    pub async fn get(&self, endpoint: Endpoint, date: NaiveDate) -> Result<serde_json::Value> {
        if let Some(doc) = self.writer.pending(endpoint, date) {
            return Ok(doc);
        }

        match self.store.get_document(endpoint, date) {
            Ok(doc) => {
                self.logger
                    .trace(&format!("Cache hit {} for {}", endpoint, date));
                return Ok(doc);
            }
            Err(e) if e.is_cache_miss() => {}
            Err(e @ PvpcError::Serialization { .. }) => {
                self.logger.warn(&format!(
                    "Unreadable cached {} for {}, refetching: {}",
                    endpoint, date, e
                ));
            }
            Err(e) => return Err(e),
        }

        let doc = self.remote.fetch(endpoint, date).await?;
        if has_values(&doc) {
            self.writer.enqueue(endpoint, date, doc.clone());
        } else {
            self.logger.info(&format!(
                "Empty {} response for {}, not caching",
                endpoint, date
            ));
        }
        Ok(doc)
    }
}
