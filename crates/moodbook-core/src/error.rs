use thiserror::Error;

use crate::store::StoreError;

/// Failures of a [`crate::MessageLog`] operation.
///
/// Classification problems never show up here; they are absorbed into the
/// `unknown` label.
#[derive(Debug, Error)]
pub enum LogError {
    /// The blob store could not be read or written.
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    /// The stored blob (or the collection to store) is not valid log JSON.
    #[error("stored log is not valid JSON: {0}")]
    Codec(#[from] serde_json::Error),

    /// Every optimistic write attempt lost to a concurrent writer.
    #[error("gave up after {attempts} conflicting write attempts")]
    Contention { attempts: u32 },
}

impl LogError {
    /// Whether the stored log could not be read (as opposed to written).
    pub fn is_read_failure(&self) -> bool {
        matches!(
            self,
            LogError::Storage(StoreError::Backend { operation: "fetch", .. }) | LogError::Codec(_)
        )
    }
}
