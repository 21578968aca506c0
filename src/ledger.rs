//! Ledger client capability.
//!
//! The core consumes the Accumulate ledger through this interface only.
//! Real implementations own transaction building, signing, submission,
//! and retry/backoff; the core performs a single round-trip per
//! operation and no retries of its own. Implementations must guarantee
//! read-after-write consistency per account: a write that returns
//! success is visible to a subsequent read issued after it returns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single raw write to a data account.
///
/// Entries are immutable once written; the ledger only ever appends.
#[derive(Debug, Clone, PartialEq)]
pub struct DataEntry {
    /// Raw entry payload.
    pub data: Vec<u8>,
    /// Time the entry was accepted by the ledger.
    pub timestamp: DateTime<Utc>,
    /// Chain sequence number, when the ledger exposes one.
    pub sequence: Option<u64>,
    /// `sha256:<hex>` hash of `data`.
    pub content_hash: String,
}

/// Bound on which entries a read should return.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EntryConstraint {
    /// Only entries valid as of this point in time.
    pub version_time: Option<DateTime<Utc>>,
}

/// State of an Accumulate key page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPageState {
    pub url: String,
    pub threshold: u64,
    pub keys: Vec<KeyPageKey>,
    pub height: u64,
}

/// A key held by a key page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPageKey {
    pub public_key: String,
    pub key_type: String,
}

/// Client capability for Accumulate data account operations.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait LedgerClient: Send + Sync {
    /// Writes a data entry to `account_url`, returning the transaction
    /// id once the ledger accepts it.
    async fn write_data_entry(&self, account_url: &str, data: &[u8]) -> anyhow::Result<String>;

    /// Returns all data entries for `account_url`, optionally bounded
    /// by `constraint`.
    async fn get_data_entries(
        &self,
        account_url: &str,
        constraint: Option<EntryConstraint>,
    ) -> anyhow::Result<Vec<DataEntry>>;

    /// Fetches the state of a key page.
    async fn get_key_page_state(&self, key_page_url: &str) -> anyhow::Result<KeyPageState>;
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl<'a, T: LedgerClient> LedgerClient for &'a T {
    async fn write_data_entry(&self, account_url: &str, data: &[u8]) -> anyhow::Result<String> {
        T::write_data_entry(*self, account_url, data).await
    }

    async fn get_data_entries(
        &self,
        account_url: &str,
        constraint: Option<EntryConstraint>,
    ) -> anyhow::Result<Vec<DataEntry>> {
        T::get_data_entries(*self, account_url, constraint).await
    }

    async fn get_key_page_state(&self, key_page_url: &str) -> anyhow::Result<KeyPageState> {
        T::get_key_page_state(*self, key_page_url).await
    }
}
