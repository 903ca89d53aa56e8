use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the capture path and from snapshot serialization.
///
/// Decoders never produce errors: malformed frames are declines, handled at
/// the decoder boundary.  Snapshot failures are logged and skipped by the
/// daemon; only a capture failure is fatal.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Capture error: {0}")]
    Capture(#[from] pcap::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
