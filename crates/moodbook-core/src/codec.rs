//! Byte encoding of the stored log.
//!
//! The blob is a JSON array of [`Entry`] objects, pretty-printed with
//! two-space indentation, oldest first.

use crate::entry::Entry;

/// Encode the full collection for storage.
pub fn encode(entries: &[Entry]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(entries)
}

/// Decode a stored blob.
///
/// An empty (or whitespace-only) blob is an empty log. Anything else must be
/// a valid JSON array of entries.
pub fn decode(bytes: &[u8]) -> Result<Vec<Entry>, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(bytes)
}
