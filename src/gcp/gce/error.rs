use reqwest::StatusCode;
use thiserror::Error;

/// Errors from a single Compute API call.
///
/// `NotFound` is deliberately its own variant: for lookups it is the designed
/// signal that triggers creation in the idempotent-ensure path, not a failure.
#[derive(Debug, Error)]
pub enum GceError {
    /// The resource does not exist (HTTP 404 on a lookup).
    #[error("not found: {0}")]
    NotFound(String),

    /// The API rejected the call (any non-2xx other than 404).
    #[error("GCE API error ({status}): {body}")]
    Api { status: StatusCode, body: String },

    /// Network or decoding failure before a usable API response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl GceError {
    /// Whether this error is the not-found signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GceError::NotFound(_))
    }
}
