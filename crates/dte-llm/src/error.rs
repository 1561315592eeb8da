//! Provider error taxonomy (§7): transient errors are retried, permanent
//! ones are not.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ProviderError {
    /// Network error, 5xx, or timeout. Retried with exponential backoff.
    #[error("transient provider error: {0}")]
    Transient(String),

    /// Auth or 4xx-class error. Failed immediately, logged once per
    /// endpoint per session by the caller.
    #[error("permanent provider error: {0}")]
    Permanent(String),
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Transient(_))
    }
}
