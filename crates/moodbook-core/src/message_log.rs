//! The capped message log.
//!
//! The log has no existence between calls: [`MessageLog::append`] and
//! [`MessageLog::list`] each re-fetch the blob, and `append` rewrites the
//! whole collection. Two rules hold for every stored log:
//!
//! - at most [`LOG_CAPACITY`] entries; the oldest by `time` are dropped first;
//! - readers get entries newest first, whatever the storage order.
//!
//! # Concurrent appends
//!
//! Fetch, merge and replace are separate round-trips. With
//! [`WriteMode::LastWriterWins`] the replace is unconditional, so two
//! overlapping appends can both start from the same snapshot and the later
//! replace silently discards the earlier one's entry (a lost update).
//! [`WriteMode::Optimistic`] closes that window by making the replace
//! conditional on the version read at fetch time and retrying the cycle when
//! another writer got there first.

use std::cmp::Reverse;
use std::sync::Arc;

use bytes::Bytes;
use strum::{Display, EnumString};
use tracing::{debug, info, warn};

use crate::classify::Classifier;
use crate::clock::{Clock, SystemClock};
use crate::codec;
use crate::entry::{Entry, NewMessage};
use crate::error::LogError;
use crate::store::{BlobStore, Precondition, StoreError};

/// Maximum number of entries kept in the stored log.
pub const LOG_CAPACITY: usize = 20;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// How [`MessageLog::append`] writes the updated collection back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum WriteMode {
    /// Unconditional overwrite. Concurrent appends may lose entries.
    #[default]
    LastWriterWins,
    /// Conditional overwrite on the fetched version, retried on conflict.
    Optimistic,
}

pub struct MessageLog {
    store: Arc<dyn BlobStore>,
    classifier: Arc<dyn Classifier>,
    clock: Arc<dyn Clock>,
    key: String,
    write_mode: WriteMode,
    max_attempts: u32,
}

impl std::fmt::Debug for MessageLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageLog")
            .field("key", &self.key)
            .field("write_mode", &self.write_mode)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl MessageLog {
    pub fn new(store: Arc<dyn BlobStore>, classifier: Arc<dyn Classifier>, key: impl Into<String>) -> Self {
        Self {
            store,
            classifier,
            clock: Arc::new(SystemClock),
            key: key.into(),
            write_mode: WriteMode::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    /// Upper bound on fetch-merge-replace cycles in optimistic mode (min 1).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Classify, timestamp and store a new message.
    ///
    /// The label is obtained before anything is read from the store and is
    /// never revisited; a failed classification stores `unknown`.
    pub async fn append(&self, submitted: NewMessage) -> Result<Entry, LogError> {
        let emotion = self.classifier.classify(&submitted.message).await;
        let entry = Entry::new(submitted, emotion, self.clock.now());
        debug!(id = %entry.id, time = entry.time, %emotion, "appending entry");

        match self.write_mode {
            WriteMode::LastWriterWins => {
                let (entries, _) = self.load().await?;
                self.store_merged(entries, entry.clone(), Precondition::None).await?;
            }
            WriteMode::Optimistic => self.append_optimistic(&entry).await?,
        }

        info!(id = %entry.id, %emotion, "message stored");
        Ok(entry)
    }

    /// All stored entries, newest first.
    pub async fn list(&self) -> Result<Vec<Entry>, LogError> {
        let (entries, _) = self.load().await?;
        Ok(newest_first(entries))
    }

    async fn append_optimistic(&self, entry: &Entry) -> Result<(), LogError> {
        for attempt in 1..=self.max_attempts {
            let (entries, version) = self.load().await?;
            let precondition = match version {
                Some(v) => Precondition::Matches(v),
                None => Precondition::Absent,
            };

            match self.store_merged(entries, entry.clone(), precondition).await {
                Ok(()) => return Ok(()),
                Err(LogError::Storage(StoreError::PreconditionFailed { .. })) => {
                    warn!(key = %self.key, attempt, "concurrent write detected; retrying append");
                }
                Err(e) => return Err(e),
            }
        }
        Err(LogError::Contention {
            attempts: self.max_attempts,
        })
    }

    /// Fetch and decode the stored log; a missing object is an empty log.
    async fn load(&self) -> Result<(Vec<Entry>, Option<String>), LogError> {
        match self.store.fetch(&self.key).await? {
            Some(blob) => Ok((codec::decode(&blob.bytes)?, blob.version)),
            None => {
                debug!(key = %self.key, "no stored log yet");
                Ok((Vec::new(), None))
            }
        }
    }

    async fn store_merged(&self, entries: Vec<Entry>, entry: Entry, precondition: Precondition) -> Result<(), LogError> {
        let merged = merge(entries, entry);
        let bytes = codec::encode(&merged)?;
        self.store.replace(&self.key, Bytes::from(bytes), precondition).await?;
        Ok(())
    }
}

/// Add `entry` to `entries` and enforce the capacity bound.
///
/// Entries are ranked by `time`; among equal timestamps the one stored later
/// counts as newer. The [`LOG_CAPACITY`] newest survive and are returned
/// oldest first. An entry whose id is already present is not added again.
pub fn merge(mut entries: Vec<Entry>, entry: Entry) -> Vec<Entry> {
    if !entries.iter().any(|e| e.id == entry.id) {
        entries.push(entry);
    }
    let mut kept = newest_first(entries);
    kept.truncate(LOG_CAPACITY);
    kept.reverse();
    kept
}

/// Sort by `time` descending; ties keep the later-stored entry first.
pub fn newest_first(entries: Vec<Entry>) -> Vec<Entry> {
    let mut ranked: Vec<(usize, Entry)> = entries.into_iter().enumerate().collect();
    ranked.sort_by_key(|(pos, e)| Reverse((e.time, *pos)));
    ranked.into_iter().map(|(_, e)| e).collect()
}

// ── Tests ──────────────────────────────────────────────────────────────────────
