//! DID registration operations: create, update, deactivate.
//!
//! Each operation validates the author against the authorization
//! policy, produces the write payload (an [`Envelope`] for create and
//! update, a canonical tombstone document for deactivate), submits it
//! through the ledger client, and returns the resulting version id,
//! content hash, and transaction id.

use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::canon;
use crate::did::{data_account_url, normalize_did};
use crate::envelope::Envelope;
use crate::error::Error;
use crate::ledger::LedgerClient;
use crate::policy::{AuthorizationPolicy, PolicyV1};
use crate::resolution::DID_CONTEXT;

/// Outcome of a registrar operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationResult {
    /// The normalized DID the operation applied to.
    pub did: String,
    pub version_id: String,
    pub content_hash: String,
    pub txid: String,
}

/// Registrar for `did:acc` DIDs.
pub struct Registrar<C, P = PolicyV1> {
    client: C,
    policy: P,
}

impl<C: LedgerClient> Registrar<C> {
    /// Creates a registrar with the default v1 authorization policy.
    pub fn new(client: C) -> Self {
        Self {
            client,
            policy: PolicyV1,
        }
    }
}

impl<C: LedgerClient, P: AuthorizationPolicy> Registrar<C, P> {
    pub fn with_policy(client: C, policy: P) -> Self {
        Self { client, policy }
    }

    /// Registers a new DID document.
    pub async fn create(
        &self,
        did: &str,
        document: Map<String, Value>,
        author_key_page: &str,
    ) -> Result<RegistrationResult, Error> {
        self.write_envelope(did, document, None, author_key_page, "created")
            .await
    }

    /// Replaces the DID document with a new version.
    pub async fn update(
        &self,
        did: &str,
        document: Map<String, Value>,
        previous_version_id: Option<String>,
        author_key_page: &str,
    ) -> Result<RegistrationResult, Error> {
        self.write_envelope(did, document, previous_version_id, author_key_page, "updated")
            .await
    }

    /// Deactivates a DID by appending a canonical tombstone document.
    ///
    /// The tombstone is written bare, not wrapped in an envelope; the
    /// resolver recognizes it by its `deactivated` property.
    pub async fn deactivate(
        &self,
        did: &str,
        reason: Option<&str>,
        author_key_page: &str,
    ) -> Result<RegistrationResult, Error> {
        let normalized = normalize_did(did)?;
        self.policy
            .validate_authorization(&normalized.did, author_key_page)?;

        let now = Utc::now();
        let mut tombstone = json!({
            "@context": [DID_CONTEXT],
            "id": normalized.did,
            "deactivated": true,
            "deactivatedAt": now.to_rfc3339(),
        });
        if let Some(reason) = reason.filter(|r| !r.is_empty()) {
            tombstone["reason"] = json!(reason);
        }

        let content_hash = canon::content_hash(&tombstone)?;
        let data = serde_json::to_vec(&tombstone)?;
        let account_url = data_account_url(&normalized.did)?;
        let txid = self
            .client
            .write_data_entry(&account_url, &data)
            .await
            .map_err(Error::Ledger)?;

        log::info!("DID deactivated: did={} txid={txid}", normalized.did);
        Ok(RegistrationResult {
            did: normalized.did,
            version_id: format!("{}-deactivated", now.timestamp()),
            content_hash,
            txid,
        })
    }

    async fn write_envelope(
        &self,
        did: &str,
        document: Map<String, Value>,
        previous_version_id: Option<String>,
        author_key_page: &str,
        action: &str,
    ) -> Result<RegistrationResult, Error> {
        let normalized = normalize_did(did)?;
        match document.get("id").and_then(Value::as_str) {
            Some(id) if id == normalized.did => {}
            Some(id) => {
                return Err(Error::invalid_did(
                    did,
                    format!("document id `{id}` does not match DID"),
                ))
            }
            None => return Err(Error::invalid_did(did, "document is missing an id")),
        }
        self.policy
            .validate_authorization(&normalized.did, author_key_page)?;

        let mut envelope = Envelope::new(document, author_key_page, previous_version_id)?;
        let data = serde_json::to_vec(&envelope)?;
        let account_url = data_account_url(&normalized.did)?;
        let txid = self
            .client
            .write_data_entry(&account_url, &data)
            .await
            .map_err(Error::Ledger)?;
        envelope.set_transaction_id(txid.clone());

        log::info!(
            "DID {action}: did={} version={} txid={txid}",
            normalized.did,
            envelope.meta.version_id,
        );
        Ok(RegistrationResult {
            did: normalized.did,
            version_id: envelope.meta.version_id.clone(),
            content_hash: envelope.content_hash().to_string(),
            txid,
        })
    }
}
