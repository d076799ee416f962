//! # curfew-crypto: Confidential primitives for `curfew`
//!
//! - [`confidential`]: the [`ConfidentialEngine`] port over encrypted handles
//! - [`clear`]: [`ClearEngine`], a plaintext stand-in behind the same port,
//!   and [`ClearOracle`] for resolving disclosed values
//! - [`attestation`]: Ed25519 input proofs binding a ciphertext to its
//!   submitter and policy instance
//!
//! Nothing in this crate returns plaintext for a handle that has not been made
//! publicly decryptable.

pub mod attestation;
pub mod clear;
pub mod confidential;
pub mod error;

pub use attestation::{
    Ed25519ProofVerifier, ExternalInput, InputAttestor, InputProof, ProofVerifier,
    attestation_digest,
};
pub use clear::{ClearEngine, ClearOracle};
pub use confidential::{CiphertextKind, ConfidentialEngine};
pub use error::{CryptoError, Result};
