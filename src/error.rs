//! Error types for printer operations.
//!
//! Callers are expected to branch on the variant rather than on message
//! text, so every failure cause gets its own entry.

use std::time::Duration;
use thiserror::Error;

/// Main error type for printer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// USB communication error.
    ///
    /// Wraps underlying rusb errors for device communication issues,
    /// timeouts, or permission problems.
    #[error(transparent)]
    UsbError(#[from] rusb::Error),

    /// The request was malformed before any device interaction happened.
    #[error("invalid print request: {0}")]
    Validation(String),

    /// Device unreachable, or a transport failure that survived the
    /// retry budget.
    #[error("device unreachable: {0}")]
    Connection(String),

    /// Transient read/write failure on the channel. Polling loops retry
    /// these internally with backoff before escalating to
    /// [`Error::Connection`].
    #[error("channel failure: {0}")]
    Channel(String),

    /// A fault reported by the device itself, with the raw status word
    /// and its decoded text.
    #[error("device fault: {text} (status 0x{raw:08X})")]
    DeviceFault { raw: u32, text: &'static str },

    /// A wait exceeded its budget without resolving. Never silently
    /// equated with success or failure.
    #[error("timed out after {0:?} waiting for the printer")]
    Timeout(Duration),

    /// The device rejected a page submission with a result code outside
    /// the accepted whitelist.
    #[error("page submission rejected with code 0x{code:X} (copy {copy})")]
    SubmitRejected { copy: u32, code: u32 },

    /// The printer is already working on another job.
    #[error("printer is busy with another job")]
    DeviceBusy,

    #[error("printer is offline")]
    Offline,

    /// The job was aborted through its cancellation token.
    #[error("job cancelled")]
    Cancelled,
}

impl Error {
    /// Whether retrying the same operation may succeed without operator
    /// intervention.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Channel(_))
    }
}
