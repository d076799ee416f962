//! Error types for confidential engine and attestation operations.

use curfew_types::{CiphertextHandle, Identity};
use thiserror::Error;

use crate::confidential::CiphertextKind;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("unknown ciphertext handle {0}")]
    UnknownHandle(CiphertextHandle),

    #[error("ciphertext {handle} holds {actual}, expected {expected}")]
    TypeMismatch {
        handle: CiphertextHandle,
        expected: CiphertextKind,
        actual: CiphertextKind,
    },

    #[error("identity {identity} may not operate on ciphertext {handle}")]
    AccessDenied {
        handle: CiphertextHandle,
        identity: Identity,
    },

    #[error("input proof rejected: {0}")]
    InvalidProof(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("ciphertext {0} is not publicly decryptable")]
    NotPublic(CiphertextHandle),

    #[error("engine state lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, CryptoError>;
