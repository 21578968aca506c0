//! # did:acc DID Method
//!
//! Resolution and registration of DIDs backed by Accumulate data
//! accounts. A DID `did:acc:<adi>` maps to the data account
//! `acc://<adi>/did`; every write to that account is a candidate
//! version of the DID document, and the [deterministic
//! resolver](resolution::DeterministicResolver) selects the canonical
//! current one with stable, reproducible tie-breaking.
//!
//! The ledger itself is consumed through the
//! [`LedgerClient`](ledger::LedgerClient) capability; this crate
//! contains no transport, signing, or retry logic.

pub mod canon;
pub mod did;
pub mod envelope;
mod error;
pub mod ledger;
pub mod policy;
pub mod registration;
pub mod resolution;

pub use did::{normalize_did, normalize_did_url, NormalizedDID, NormalizedDIDURL};
pub use envelope::Envelope;
pub use error::Error;
pub use ledger::{DataEntry, EntryConstraint, KeyPageState, LedgerClient};
pub use policy::{AuthorizationPolicy, PolicyV1};
pub use registration::{Registrar, RegistrationResult};
pub use resolution::{DIDResolutionResult, DeterministicResolver, ResolveOrder};
