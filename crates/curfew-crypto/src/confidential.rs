//! The confidential arithmetic port.
//!
//! [`ConfidentialEngine`] is the boundary between policy logic and whatever
//! actually holds ciphertexts: an external homomorphic coprocessor in
//! production, or [`crate::ClearEngine`] in tests. Policy code only ever sees
//! handles.
//!
//! Every operation yields a fresh handle. Engines enforce an access list:
//! operands must be allowed to the engine's executor, and results are allowed
//! to it automatically.
//!
//! Only [`EncryptedBool`] values can be made publicly decryptable, so a
//! schedule (an [`EncryptedU32`]) can never be disclosed by accident.

use std::fmt::Display;

use curfew_types::{CiphertextHandle, EncryptedBool, EncryptedU32, Identity};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Plaintext type behind a ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CiphertextKind {
    Uint32,
    Bool,
}

impl Display for CiphertextKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CiphertextKind::Uint32 => write!(f, "euint32"),
            CiphertextKind::Bool => write!(f, "ebool"),
        }
    }
}

/// Homomorphic operations over opaque handles.
pub trait ConfidentialEngine {
    /// Identity the engine computes on behalf of.
    fn executor(&self) -> Identity;

    /// Admits an externally submitted ciphertext as a 32-bit integer.
    ///
    /// Fails if the handle is unknown or holds another type. Callers must
    /// have verified the input proof first.
    fn import_u32(&mut self, handle: CiphertextHandle) -> Result<EncryptedU32>;

    /// Wraps a public constant as a ciphertext.
    fn trivial_u32(&mut self, value: u32) -> Result<EncryptedU32>;

    /// Bitwise AND of two integers.
    fn bit_and(&mut self, lhs: EncryptedU32, rhs: EncryptedU32) -> Result<EncryptedU32>;

    /// Unsigned `lhs > rhs`.
    fn gt(&mut self, lhs: EncryptedU32, rhs: EncryptedU32) -> Result<EncryptedBool>;

    /// Boolean AND.
    fn and(&mut self, lhs: EncryptedBool, rhs: EncryptedBool) -> Result<EncryptedBool>;

    /// Grants `grantee` permission to use `handle`.
    fn allow(&mut self, handle: CiphertextHandle, grantee: Identity) -> Result<()>;

    fn is_allowed(&self, handle: CiphertextHandle, identity: Identity) -> bool;

    /// Marks a boolean as resolvable by anyone. Irreversible.
    fn make_publicly_decryptable(&mut self, value: EncryptedBool) -> Result<()>;

    fn is_publicly_decryptable(&self, handle: CiphertextHandle) -> bool;
}
