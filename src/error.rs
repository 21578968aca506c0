//! Error types for the `did-acc` crate.
use thiserror::Error;

/// Error type for `did-acc`.
///
/// Every variant corresponds to exactly one failure class so that a
/// resolver or registrar facade can map errors 1:1 to HTTP statuses
/// (400 invalid, 404 not found, 410 deactivated, 403 unauthorized).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Malformed or unsupported DID. Caller error, not retryable.
    #[error("invalid DID `{did}`: {reason}")]
    InvalidDID { did: String, reason: String },
    /// No valid entries exist for the DID's data account.
    #[error("DID not found: {0}")]
    NotFound(String),
    /// The DID has been deactivated. Returned only by call sites that
    /// want hard-fail semantics; the primary representation of
    /// deactivation is a tombstone [`DIDResolutionResult`].
    ///
    /// [`DIDResolutionResult`]: crate::resolution::DIDResolutionResult
    #[error("DID is deactivated: {0}")]
    Deactivated(String),
    /// Stored content hash disagrees with the recomputed canonical hash.
    /// Integrity failure, always fatal.
    #[error("content hash mismatch: expected {expected}, got {actual}")]
    ContentHashMismatch { expected: String, actual: String },
    /// Author key page does not match the authorization policy.
    #[error("unauthorized: expected {expected}, got {actual}")]
    Unauthorized { expected: String, actual: String },
    /// Input that cannot be represented as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Failure reported by the ledger client collaborator.
    #[error(transparent)]
    Ledger(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn invalid_did(did: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidDID {
            did: did.into(),
            reason: reason.into(),
        }
    }
}
