//! moodbook-core – a small, capped, time-ordered message log.
//!
//! The log lives in a single object-store blob. Every operation re-fetches
//! the blob, works on the decoded collection, and (for appends) rewrites the
//! whole thing. Each message is labelled with an [`Emotion`] obtained from a
//! [`Classifier`] before it is stored.
//!
//! Layering, leaves first:
//! - [`store`] – fetch / replace one named object ([`BlobStore`]).
//! - [`classify`] – best-effort text classification ([`Classifier`]).
//! - [`message_log`] – the capacity and ordering rules ([`MessageLog`]).

pub mod classify;
pub mod clock;
pub mod codec;
pub mod entry;
pub mod error;
pub mod message_log;
pub mod store;

pub use classify::{Classifier, ClassifyError, OpenAiClassifier, OpenAiConfig};
pub use clock::{Clock, SystemClock};
pub use entry::{Emotion, Entry, NewMessage};
pub use error::LogError;
pub use message_log::{LOG_CAPACITY, MessageLog, WriteMode};
pub use store::{BlobStore, InMemoryBlobStore, Precondition, S3BlobStore, S3Config, StoreError, VersionedBlob};
