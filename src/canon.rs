//! Canonical JSON serialization and content hashing.
//!
//! RFC8785-style canonicalization: object keys are sorted
//! lexicographically (byte-wise on the UTF-8 key), array order is
//! preserved, scalars pass through as decoded, and the output carries no
//! insignificant whitespace and no trailing newline. Numeric literal
//! formatting is *not* re-normalized: a number hashes as `serde_json`
//! decoded it, which matches the behavior of the other producers of
//! `did:acc` envelopes.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::Error;

/// Returns the canonical JSON bytes of `value`.
///
/// Canonicalization is idempotent: parsing the output and
/// canonicalizing again yields byte-identical output.
pub fn canonicalize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    let value = serde_json::to_value(value)?;
    let mut out = Vec::new();
    write_canonical(&value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) -> Result<(), Error> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, key)?;
                out.push(b':');
                write_canonical(&map[key.as_str()], out)?;
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
        }
        // serde_json does not HTML-escape `<`, `>` or `&`, and writes
        // numbers exactly as decoded.
        scalar => serde_json::to_writer(&mut *out, scalar)?,
    }
    Ok(())
}

/// Returns the content hash of `value`: `sha256:` followed by the
/// lowercase hex SHA-256 of its canonical JSON bytes.
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    Ok(hash_bytes(&canonicalize(value)?))
}

/// Hashes raw bytes into the same `sha256:<hex>` format used by
/// [`content_hash`]. Used for ledger entry data that is already
/// serialized.
pub fn hash_bytes(data: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(data)))
}
