//! did:acc DID and DID URL normalization.
//!
//! A `did:acc` DID has the form `did:acc:<adi>[/path][?query][#fragment]`
//! where `<adi>` is an Accumulate Digital Identifier label. The ADI is
//! case-insensitive; it is normalized to lowercase with one trailing dot
//! stripped, and must then match `[a-z0-9._-]+` with no leading,
//! trailing, or doubled dots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Name of the DID method implemented by this crate.
pub const DID_METHOD_NAME: &str = "acc";

/// Prefix of every `did:acc` DID.
const DID_PREFIX: &str = "did:acc:";

/// URL scheme of Accumulate ledger accounts.
const LEDGER_SCHEME: &str = "acc";

/// Account path segment backing a DID when the DID carries no explicit
/// path.
const DEFAULT_DATA_PATH: &str = "did";

/// A DID normalized according to the `did:acc` method rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDID {
    /// The reconstructed DID: `did:acc:` + normalized ADI + the original
    /// path/query/fragment suffix, unnormalized.
    pub did: String,
    /// The normalized ADI label.
    pub adi: String,
}

/// A DID URL parsed and normalized into structured components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedDIDURL {
    pub scheme: String,
    pub method: String,
    pub method_specific_id: String,
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub fragment: String,
}

/// Normalizes a DID according to the `did:acc` method rules.
pub fn normalize_did(did: &str) -> Result<NormalizedDID, Error> {
    let remainder = did
        .strip_prefix(DID_PREFIX)
        .ok_or_else(|| Error::invalid_did(did, "not a did:acc DID"))?;

    let (raw_adi, rest) = split_method_specific(remainder);
    if raw_adi.is_empty() {
        return Err(Error::invalid_did(did, "empty ADI name"));
    }

    let adi = normalize_adi(raw_adi);
    validate_adi_name(&adi).map_err(|reason| Error::invalid_did(did, reason))?;

    Ok(NormalizedDID {
        did: format!("{DID_PREFIX}{adi}{rest}"),
        adi,
    })
}

/// Parses a DID URL into normalized components.
pub fn normalize_did_url(did_url: &str) -> Result<NormalizedDIDURL, Error> {
    let remainder = match did_url.strip_prefix("did:") {
        Some(r) => r,
        None => {
            return Err(Error::invalid_did(
                did_url,
                "invalid scheme: expected `did`",
            ))
        }
    };
    let (method, method_specific) = remainder
        .split_once(':')
        .ok_or_else(|| Error::invalid_did(did_url, "missing method-specific-id"))?;
    if method != DID_METHOD_NAME {
        return Err(Error::invalid_did(
            did_url,
            format!("invalid method: expected `acc`, got `{method}`"),
        ));
    }

    let (raw_adi, rest) = split_method_specific(method_specific);
    if raw_adi.is_empty() {
        return Err(Error::invalid_did(did_url, "empty method-specific-id"));
    }
    let adi = normalize_adi(raw_adi);
    validate_adi_name(&adi).map_err(|reason| Error::invalid_did(did_url, reason))?;

    // Split the suffix into path, query and fragment. The fragment is
    // everything after the first `#`; the query sits between `?` and the
    // fragment; the path is whatever precedes the query.
    let (before_fragment, fragment) = match rest.split_once('#') {
        Some((before, fragment)) => (before, fragment),
        None => (rest, ""),
    };
    let (path, raw_query) = match before_fragment.split_once('?') {
        Some((path, query)) => (path, query),
        None => (before_fragment, ""),
    };

    let mut query = BTreeMap::new();
    if !raw_query.is_empty() {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw_query)
            .map_err(|e| Error::invalid_did(did_url, format!("invalid query: {e}")))?;
        for (key, value) in pairs {
            // First value wins on duplicate keys.
            query.entry(key).or_insert(value);
        }
    }

    Ok(NormalizedDIDURL {
        scheme: "did".to_string(),
        method: DID_METHOD_NAME.to_string(),
        method_specific_id: adi,
        path: path.to_string(),
        query,
        fragment: fragment.to_string(),
    })
}

/// Derives the ledger data account URL backing a DID.
///
/// The default data path segment is `did` unless the DID carries an
/// explicit path. The resolver and registrar both derive account
/// addresses through this function, so a given ADI + path pair always
/// maps to one canonical address.
pub fn data_account_url(did: &str) -> Result<String, Error> {
    let normalized = normalize_did(did)?;
    let rest = &normalized.did[DID_PREFIX.len() + normalized.adi.len()..];
    let path = rest
        .strip_prefix('/')
        .map(|p| match p.find(['?', '#', ';']) {
            Some(idx) => &p[..idx],
            None => p,
        })
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_DATA_PATH);
    Ok(format!("{LEDGER_SCHEME}://{}/{path}", normalized.adi))
}

/// Formats a DID from an ADI label and an optional data account path.
pub fn format_did(adi: &str, path: &str) -> String {
    if path.is_empty() || path == DEFAULT_DATA_PATH {
        format!("{DID_PREFIX}{adi}")
    } else {
        format!("{DID_PREFIX}{adi}/{path}")
    }
}

/// Splits a method-specific identifier into the ADI label and the
/// trailing path/query/fragment suffix. The ADI ends at the first `/`,
/// `?`, `#` or `;`.
fn split_method_specific(remainder: &str) -> (&str, &str) {
    match remainder.find(['/', '?', '#', ';']) {
        Some(idx) => remainder.split_at(idx),
        None => (remainder, ""),
    }
}

/// Lowercases an ADI label and strips one trailing dot.
fn normalize_adi(adi: &str) -> String {
    let normalized = adi.to_lowercase();
    match normalized.strip_suffix('.') {
        Some(stripped) => stripped.to_string(),
        None => normalized,
    }
}

/// Validates a normalized ADI label against the method's character and
/// dot-placement rules.
fn validate_adi_name(adi: &str) -> Result<(), String> {
    if adi.is_empty() {
        return Err("ADI name cannot be empty".to_string());
    }
    for (i, c) in adi.char_indices() {
        if !is_valid_adi_char(c) {
            return Err(format!("invalid character `{c}` at position {i}"));
        }
    }
    if adi.starts_with('.') || adi.ends_with('.') {
        return Err("ADI name cannot start or end with a dot".to_string());
    }
    if adi.contains("..") {
        return Err("ADI name cannot contain consecutive dots".to_string());
    }
    Ok(())
}

fn is_valid_adi_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_trailing_dot() {
        let n = normalize_did("did:acc:ALICE.").unwrap();
        assert_eq!(n.did, "did:acc:alice");
        assert_eq!(n.adi, "alice");
    }

    #[test]
    fn preserves_path_query_fragment() {
        let n = normalize_did("did:acc:Beastmode.ACME/Custom?versionTime=2024#key-1").unwrap();
        assert_eq!(
            n.did,
            "did:acc:beastmode.acme/Custom?versionTime=2024#key-1"
        );
        assert_eq!(n.adi, "beastmode.acme");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_did("did:acc:Alice.Acme./svc?a=1#f").unwrap();
        let twice = normalize_did(&once.did).unwrap();
        assert_eq!(once.did, twice.did);
        assert_eq!(once.adi, twice.adi);
    }

    #[test]
    fn rejects_malformed_dids() {
        for did in [
            "did:web:alice",
            "did:acc:",
            "did:acc:.alice",
            "did:acc:ali..ce",
            "did:acc:al ice",
            "did:acc:alice!",
            "did:acc:.",
            "not-a-did",
        ] {
            let err = normalize_did(did).unwrap_err();
            assert!(matches!(err, Error::InvalidDID { .. }), "{did}: {err}");
        }
    }

    #[test]
    fn single_trailing_dot_only() {
        // One trailing dot is normalization; two is a doubled dot.
        assert!(normalize_did("did:acc:alice.").is_ok());
        assert!(normalize_did("did:acc:alice..").is_err());
    }

    #[test]
    fn parses_did_url_components() {
        let url =
            normalize_did_url("did:acc:ALICE/path/to/svc?service=files&versionId=abc#key-1")
                .unwrap();
        assert_eq!(url.scheme, "did");
        assert_eq!(url.method, "acc");
        assert_eq!(url.method_specific_id, "alice");
        assert_eq!(url.path, "/path/to/svc");
        assert_eq!(url.query.get("service").map(String::as_str), Some("files"));
        assert_eq!(url.query.get("versionId").map(String::as_str), Some("abc"));
        assert_eq!(url.fragment, "key-1");
    }

    #[test]
    fn duplicate_query_keys_first_value_wins() {
        let url = normalize_did_url("did:acc:alice?service=files&service=agent").unwrap();
        assert_eq!(url.query.len(), 1);
        assert_eq!(url.query.get("service").map(String::as_str), Some("files"));
    }

    #[test]
    fn did_url_without_suffix() {
        let url = normalize_did_url("did:acc:alice").unwrap();
        assert_eq!(url.method_specific_id, "alice");
        assert!(url.path.is_empty());
        assert!(url.query.is_empty());
        assert!(url.fragment.is_empty());
    }

    #[test]
    fn did_url_rejects_wrong_method() {
        assert!(matches!(
            normalize_did_url("did:key:z6Mk").unwrap_err(),
            Error::InvalidDID { .. }
        ));
        assert!(matches!(
            normalize_did_url("https://example.com").unwrap_err(),
            Error::InvalidDID { .. }
        ));
    }

    #[test]
    fn derives_data_account_urls() {
        assert_eq!(data_account_url("did:acc:alice").unwrap(), "acc://alice/did");
        assert_eq!(
            data_account_url("did:acc:ALICE.").unwrap(),
            "acc://alice/did"
        );
        assert_eq!(
            data_account_url("did:acc:alice/custom").unwrap(),
            "acc://alice/custom"
        );
        assert_eq!(
            data_account_url("did:acc:alice/custom?versionTime=x#f").unwrap(),
            "acc://alice/custom"
        );
        // A bare trailing slash falls back to the default path.
        assert_eq!(
            data_account_url("did:acc:alice/").unwrap(),
            "acc://alice/did"
        );
    }

    #[test]
    fn formats_dids() {
        assert_eq!(format_did("alice", ""), "did:acc:alice");
        assert_eq!(format_did("alice", "did"), "did:acc:alice");
        assert_eq!(format_did("alice", "custom"), "did:acc:alice/custom");
    }
}
