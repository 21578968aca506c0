//! Deterministic DID resolution.
//!
//! A data account may hold any number of entries, including malformed
//! or concurrent writes. The resolver filters out entries that do not
//! parse as JSON objects, orders the survivors with a deterministic
//! comparator, and selects the last as the canonical current document.
//! Given the same set of entries, every resolver instance selects the
//! same entry.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::did::normalize_did;
use crate::error::Error;
use crate::ledger::{DataEntry, EntryConstraint, LedgerClient};

/// Media type for a [DID Document in JSON
/// representation](https://www.w3.org/TR/did-core/#application-did-json).
pub const TYPE_DID_JSON: &str = "application/did+json";

/// URI required as the first value of the `@context` property of a DID
/// document in JSON-LD representation.
pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// Ordering strategy for selecting the latest entry of a data account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveOrder {
    /// Order by chain sequence number, falling back to timestamp when
    /// sequences are equal or absent.
    #[default]
    Sequence,
    /// Order by ledger timestamp only.
    Timestamp,
}

/// A W3C DID resolution result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DIDResolutionResult {
    pub did_document: Option<Value>,
    pub did_document_metadata: DocumentMetadata,
    pub did_resolution_metadata: ResolutionMetadata,
}

/// [DID document metadata](https://www.w3.org/TR/did-core/#did-document-metadata),
/// recomputed from the selected entry on every resolve call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub updated: DateTime<Utc>,
    pub deactivated: bool,
    pub canonical_id: String,
    pub content_hash: String,
    pub sequence: Option<u64>,
    pub version_id: Option<String>,
}

/// [DID resolution metadata](https://www.w3.org/TR/did-core/#did-resolution-metadata).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMetadata {
    pub content_type: String,
    pub retrieved: DateTime<Utc>,
    pub version_id: Option<String>,
}

/// Deterministic DID resolver with a configurable ordering strategy.
pub struct DeterministicResolver<C> {
    client: C,
    order: ResolveOrder,
}

impl<C: LedgerClient> DeterministicResolver<C> {
    pub fn new(client: C, order: ResolveOrder) -> Self {
        Self { client, order }
    }

    /// Resolves a DID to its canonical current document.
    ///
    /// When `version_time` is given, entry selection is constrained to
    /// entries valid as of that instant; the constraint is passed
    /// through to the ledger client and the same selection algorithm is
    /// applied to the constrained set.
    ///
    /// A deactivated DID resolves to a tombstone result: a minimal
    /// document with `deactivated: true` in the document metadata. This
    /// is distinct from [`Error::NotFound`].
    pub async fn resolve(
        &self,
        did: &str,
        version_time: Option<DateTime<Utc>>,
    ) -> Result<DIDResolutionResult, Error> {
        let normalized = normalize_did(did)?;
        let account_url = crate::did::data_account_url(&normalized.did)?;

        let constraint = version_time.map(|t| EntryConstraint {
            version_time: Some(t),
        });
        let entries = match self.client.get_data_entries(&account_url, constraint).await {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("entry fetch failed for {}: {err:#}", normalized.did);
                return Err(Error::NotFound(normalized.did));
            }
        };
        if entries.is_empty() {
            return Err(Error::NotFound(normalized.did));
        }

        let (document, entry, valid_entries) = match self.select_latest(&entries, &normalized.did) {
            Some(selected) => selected,
            None => return Err(Error::NotFound(normalized.did)),
        };

        let deactivated = document
            .get("deactivated")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let version_id = document
            .get("versionId")
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        log::info!(
            "DID resolved: did={} sequence={:?} timestamp={} hash={} deactivated={} valid_entries={}",
            normalized.did,
            entry.sequence,
            entry.timestamp.to_rfc3339(),
            entry.content_hash,
            deactivated,
            valid_entries,
        );

        let did_document = if deactivated {
            // Tombstone: minimal document only.
            json!({
                "@context": [DID_CONTEXT],
                "id": normalized.did.clone(),
            })
        } else {
            Value::Object(document)
        };

        Ok(DIDResolutionResult {
            did_document: Some(did_document),
            did_document_metadata: DocumentMetadata {
                updated: entry.timestamp,
                deactivated,
                canonical_id: normalized.did,
                content_hash: entry.content_hash.clone(),
                sequence: entry.sequence,
                version_id: version_id.clone(),
            },
            did_resolution_metadata: ResolutionMetadata {
                content_type: TYPE_DID_JSON.to_string(),
                retrieved: Utc::now(),
                version_id,
            },
        })
    }

    /// Like [`resolve`](Self::resolve), but returns
    /// [`Error::Deactivated`] instead of a tombstone result. For
    /// callers that want hard-fail semantics.
    pub async fn resolve_live(
        &self,
        did: &str,
        version_time: Option<DateTime<Utc>>,
    ) -> Result<DIDResolutionResult, Error> {
        let result = self.resolve(did, version_time).await?;
        if result.did_document_metadata.deactivated {
            return Err(Error::Deactivated(
                result.did_document_metadata.canonical_id,
            ));
        }
        Ok(result)
    }

    /// Filters malformed entries and selects the latest valid one under
    /// the configured ordering. Returns the parsed document, the entry,
    /// and the number of valid entries.
    fn select_latest<'a>(
        &self,
        entries: &'a [DataEntry],
        did: &str,
    ) -> Option<(Map<String, Value>, &'a DataEntry, usize)> {
        let mut valid: Vec<(Map<String, Value>, &DataEntry)> = Vec::new();
        for entry in entries {
            match serde_json::from_slice::<Map<String, Value>>(&entry.data) {
                Ok(document) => valid.push((document, entry)),
                Err(err) => {
                    // Malformed writes are append-only noise; skip them.
                    log::warn!("skipping malformed entry for {did}: {err}");
                }
            }
        }
        if valid.is_empty() {
            return None;
        }
        let count = valid.len();
        valid.sort_by(|(_, a), (_, b)| compare_entries(self.order, a, b));
        let (document, entry) = valid.pop()?;
        Some((document, entry, count))
    }
}

/// Deterministic entry comparator. `Less` means the left entry is older.
///
/// In `Sequence` mode, entries with sequence numbers compare
/// numerically, an entry without a sequence sorts before one with, and
/// equal or absent sequences fall through to the timestamp comparison.
/// Equal timestamps break the tie on lexicographic content hash, which
/// is arbitrary but stable across resolver instances. The result is a
/// strict weak ordering over entries.
fn compare_entries(order: ResolveOrder, a: &DataEntry, b: &DataEntry) -> Ordering {
    if order == ResolveOrder::Sequence {
        match (a.sequence, b.sequence) {
            (Some(x), Some(y)) if x != y => return x.cmp(&y),
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            _ => {}
        }
    }
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.content_hash.cmp(&b.content_hash))
}
