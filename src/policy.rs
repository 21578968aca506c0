//! Authorization policies for DID document writes.

use crate::did::normalize_did;
use crate::error::Error;

/// Maps a DID to the key page authorized to author changes to it.
pub trait AuthorizationPolicy {
    /// Returns the key page identifier required to author changes to
    /// `did`.
    fn required_key_page(&self, did: &str) -> Result<String, Error>;

    /// Checks that `author_key_page` is authorized for `did`.
    fn validate_authorization(&self, did: &str, author_key_page: &str) -> Result<(), Error> {
        let expected = self.required_key_page(did)?;
        if author_key_page != expected {
            return Err(Error::Unauthorized {
                expected,
                actual: author_key_page.to_string(),
            });
        }
        Ok(())
    }
}

/// Policy v1: only `<adi>/book/1` may author DID document updates.
///
/// A fixed single-authority rule. The policy is pure and stateless;
/// later policy versions may vary the book index.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyV1;

impl AuthorizationPolicy for PolicyV1 {
    fn required_key_page(&self, did: &str) -> Result<String, Error> {
        let normalized = normalize_did(did)?;
        Ok(format!("{}/book/1", normalized.adi))
    }
}
