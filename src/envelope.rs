//! Versioned, hash-proofed envelopes around DID documents.
//!
//! An [`Envelope`] is the write payload persisted to a data account. It
//! wraps the DID document with a version id, timestamp, the authoring
//! key page, and a proof carrying the canonical content hash of the
//! document. The transaction id is stamped in once, after the ledger
//! accepts the write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::canon;
use crate::error::Error;
use crate::resolution::TYPE_DID_JSON;

/// Proof type identifying the Accumulate ledger.
pub const PROOF_TYPE: &str = "accumulate";

/// A DID document entry envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub content_type: String,
    pub document: Map<String, Value>,
    pub meta: EnvelopeMeta,
}

/// Envelope metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeMeta {
    pub version_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_version_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub author_key_page: String,
    pub proof: Proof,
}

/// Envelope proof data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub type_: String,
    #[serde(default)]
    pub txid: String,
    pub content_hash: String,
}

impl Envelope {
    /// Builds a new envelope for a DID document.
    ///
    /// The proof's content hash is computed from the canonical JSON of
    /// `document`; the transaction id is left empty until
    /// [`set_transaction_id`](Self::set_transaction_id) is called.
    pub fn new(
        document: Map<String, Value>,
        author_key_page: impl Into<String>,
        previous_version_id: Option<String>,
    ) -> Result<Self, Error> {
        let timestamp = Utc::now();
        let content_hash = canon::content_hash(&document)?;
        Ok(Envelope {
            content_type: TYPE_DID_JSON.to_string(),
            document,
            meta: EnvelopeMeta {
                version_id: generate_version_id(timestamp),
                previous_version_id,
                timestamp,
                author_key_page: author_key_page.into(),
                proof: Proof {
                    type_: PROOF_TYPE.to_string(),
                    txid: String::new(),
                    content_hash,
                },
            },
        })
    }

    /// Stamps the transaction id into the proof after the ledger write
    /// succeeds. Called exactly once.
    pub fn set_transaction_id(&mut self, txid: impl Into<String>) {
        self.meta.proof.txid = txid.into();
    }

    /// Returns the content hash stored in the proof.
    pub fn content_hash(&self) -> &str {
        &self.meta.proof.content_hash
    }

    /// Recomputes the content hash from the current document and checks
    /// it against the stored proof. Detects tampering or corruption.
    pub fn validate_content_hash(&self) -> Result<(), Error> {
        let expected = canon::content_hash(&self.document)?;
        if expected != self.meta.proof.content_hash {
            return Err(Error::ContentHashMismatch {
                expected,
                actual: self.meta.proof.content_hash.clone(),
            });
        }
        Ok(())
    }
}

/// Generates a version id of the form `<unix-seconds>-<hex8>`.
///
/// The suffix is the first 8 hex chars of the zero-padded unix seconds,
/// kept for compatibility with existing envelopes. Two envelopes built
/// within the same second therefore share a version id.
fn generate_version_id(timestamp: DateTime<Utc>) -> String {
    let unix = timestamp.timestamp();
    let hex = format!("{unix:08x}");
    format!("{unix}-{}", &hex[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_document() -> Map<String, Value> {
        json!({
            "@context": ["https://www.w3.org/ns/did/v1"],
            "id": "did:acc:alice",
            "verificationMethod": [{
                "id": "did:acc:alice#key-1",
                "type": "Ed25519VerificationKey2020",
                "controller": "did:acc:alice",
                "publicKeyMultibase": "z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK"
            }]
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn round_trips_content_hash() {
        let envelope = Envelope::new(test_document(), "alice/book/1", None).unwrap();
        envelope.validate_content_hash().unwrap();
        assert!(envelope.content_hash().starts_with("sha256:"));
        assert!(envelope.meta.proof.txid.is_empty());
        assert_eq!(envelope.meta.proof.type_, PROOF_TYPE);
    }

    #[test]
    fn detects_document_tampering() {
        let mut envelope = Envelope::new(test_document(), "alice/book/1", None).unwrap();
        envelope
            .document
            .insert("service".to_string(), json!([{"id": "#rogue"}]));
        let err = envelope.validate_content_hash().unwrap_err();
        match err {
            Error::ContentHashMismatch { expected, actual } => {
                assert_ne!(expected, actual);
                assert_eq!(actual, envelope.meta.proof.content_hash);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn version_id_format() {
        let envelope = Envelope::new(test_document(), "alice/book/1", None).unwrap();
        let (unix, suffix) = envelope.meta.version_id.split_once('-').unwrap();
        let unix: i64 = unix.parse().unwrap();
        assert_eq!(unix, envelope.meta.timestamp.timestamp());
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn stamps_transaction_id_after_write() {
        let mut envelope = Envelope::new(test_document(), "alice/book/1", None).unwrap();
        envelope.set_transaction_id("acc://txid-abc123");
        assert_eq!(envelope.meta.proof.txid, "acc://txid-abc123");
        // The document hash is unaffected by stamping.
        envelope.validate_content_hash().unwrap();
    }

    #[test]
    fn serialized_shape() {
        let mut envelope = Envelope::new(
            test_document(),
            "alice/book/1",
            Some("1700000000-65439c00".to_string()),
        )
        .unwrap();
        envelope.set_transaction_id("txid-1");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["contentType"], "application/did+json");
        assert_eq!(value["meta"]["previousVersionId"], "1700000000-65439c00");
        assert_eq!(value["meta"]["authorKeyPage"], "alice/book/1");
        assert_eq!(value["meta"]["proof"]["type"], "accumulate");
        assert_eq!(value["meta"]["proof"]["txid"], "txid-1");
        assert!(value["meta"]["proof"]["contentHash"]
            .as_str()
            .unwrap()
            .starts_with("sha256:"));

        // previousVersionId is omitted entirely when absent.
        let envelope = Envelope::new(test_document(), "alice/book/1", None).unwrap();
        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value["meta"].get("previousVersionId").is_none());
    }

    #[test]
    fn deserializes_own_output() {
        let envelope = Envelope::new(test_document(), "alice/book/1", None).unwrap();
        let bytes = serde_json::to_vec(&envelope).unwrap();
        let decoded: Envelope = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, envelope);
        decoded.validate_content_hash().unwrap();
    }
}
