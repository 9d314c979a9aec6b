//! Error types for ca-session

use thiserror::Error;

/// Errors reported by `ProcessVariable` implementations
///
/// The session layer never constructs these for an unreachable PV — a
/// resolution that times out yields `Ok(None)` plus one diagnostic line on
/// the output sink. `CaError` carries everything the underlying collaborator
/// can fail at (reads, writes, metadata fetches), which the session
/// propagates upward unchanged.
#[derive(Debug, Error)]
pub enum CaError {
    /// Transport or channel-level failure
    #[error("Channel error: {0}")]
    Channel(String),

    /// Value read failure
    #[error("Failed to read '{pv}': {reason}")]
    Get {
        pv: String,
        reason: String,
    },

    /// Value write failure
    #[error("Failed to write '{pv}': {reason}")]
    Put {
        pv: String,
        reason: String,
    },

    /// A waited put did not complete within its timeout
    #[error("Put to '{pv}' did not complete within {timeout_ms}ms")]
    PutTimeout {
        pv: String,
        timeout_ms: u64,
    },

    /// Control-variable metadata fetch failure
    #[error("Metadata fetch failed for '{pv}': {reason}")]
    Metadata {
        pv: String,
        reason: String,
    },

    /// Provider-specific backend error
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Result type alias for channel-access operations
pub type Result<T> = std::result::Result<T, CaError>;
