//! Input attestation.
//!
//! A confidential input arrives as a ciphertext handle plus an [`InputProof`].
//! The proof is an Ed25519 signature by the input gateway over
//!
//! ```text
//! BLAKE3("curfew.input.v1" || handle || submitter || policy)
//! ```
//!
//! which binds the ciphertext to the identity that submitted it and to the
//! policy instance it was produced for. Replaying the same input under another
//! caller or another policy fails verification.

use curfew_types::{CiphertextHandle, Identity};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, Result};

/// Domain separator for input attestation digests.
pub const INPUT_DOMAIN: &[u8] = b"curfew.input.v1";

/// Computes the digest an input gateway signs.
pub fn attestation_digest(
    handle: CiphertextHandle,
    submitter: Identity,
    policy: Identity,
) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(INPUT_DOMAIN);
    hasher.update(handle.as_bytes());
    hasher.update(submitter.as_bytes());
    hasher.update(policy.as_bytes());
    *hasher.finalize().as_bytes()
}

/// Ed25519 signature attesting an input, stored as its `R` and `s` halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputProof {
    r: [u8; 32],
    s: [u8; 32],
}

impl InputProof {
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Self { r, s }
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..].copy_from_slice(&self.s);
        bytes
    }
}

/// A ciphertext submitted from outside, with its proof of honest construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalInput {
    pub handle: CiphertextHandle,
    pub proof: InputProof,
}

/// Checks that an [`ExternalInput`] was attested for `submitter` and `policy`.
pub trait ProofVerifier {
    fn verify(&self, input: &ExternalInput, submitter: Identity, policy: Identity) -> Result<()>;
}

/// Gateway side: signs attestations for inputs it has seen encrypted.
pub struct InputAttestor {
    key: SigningKey,
}

// Manual Debug implementation to avoid exposing key material
impl std::fmt::Debug for InputAttestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputAttestor")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl InputAttestor {
    /// Generates a fresh gateway key from system randomness.
    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Builds a gateway key from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self> {
        if seed == &[0u8; 32] {
            return Err(CryptoError::InvalidKey(
                "attestor seed is all zeros".to_string(),
            ));
        }
        Ok(Self {
            key: SigningKey::from_bytes(seed),
        })
    }

    /// Public key that verifiers must trust.
    pub fn verifying_key_bytes(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    /// Attests `handle` for `submitter` on `policy`.
    pub fn attest(
        &self,
        handle: CiphertextHandle,
        submitter: Identity,
        policy: Identity,
    ) -> ExternalInput {
        let digest = attestation_digest(handle, submitter, policy);
        let signature = self.key.sign(&digest);
        ExternalInput {
            handle,
            proof: InputProof::from_bytes(&signature.to_bytes()),
        }
    }
}

/// Verifies input proofs against one trusted gateway key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ed25519ProofVerifier {
    trusted: VerifyingKey,
}

impl Ed25519ProofVerifier {
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        if bytes == &[0u8; 32] {
            return Err(CryptoError::InvalidKey(
                "gateway public key is all zeros".to_string(),
            ));
        }
        let trusted =
            VerifyingKey::from_bytes(bytes).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self { trusted })
    }

    pub fn for_attestor(attestor: &InputAttestor) -> Self {
        Self {
            trusted: attestor.key.verifying_key(),
        }
    }
}

impl ProofVerifier for Ed25519ProofVerifier {
    fn verify(&self, input: &ExternalInput, submitter: Identity, policy: Identity) -> Result<()> {
        let digest = attestation_digest(input.handle, submitter, policy);
        let signature = Signature::from_bytes(&input.proof.to_bytes());
        // Strict verification rejects non-canonical signatures
        self.trusted
            .verify_strict(&digest, &signature)
            .map_err(|_| CryptoError::InvalidProof("signature verification failed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn handle() -> CiphertextHandle {
        CiphertextHandle::from_bytes([3; 32])
    }

    fn alice() -> Identity {
        Identity::from_bytes([1; 32])
    }

    fn bob() -> Identity {
        Identity::from_bytes([2; 32])
    }

    fn policy() -> Identity {
        Identity::from_bytes([0xcc; 32])
    }

    #[test]
    fn attested_input_verifies() {
        let attestor = InputAttestor::generate();
        let verifier = Ed25519ProofVerifier::for_attestor(&attestor);
        let input = attestor.attest(handle(), alice(), policy());
        assert!(verifier.verify(&input, alice(), policy()).is_ok());
    }

    #[test_case(bob(), policy(); "other submitter")]
    #[test_case(alice(), Identity::from_bytes([0xdd; 32]); "other policy")]
    fn rebinding_fails(submitter: Identity, target: Identity) {
        let attestor = InputAttestor::generate();
        let verifier = Ed25519ProofVerifier::for_attestor(&attestor);
        let input = attestor.attest(handle(), alice(), policy());
        assert!(matches!(
            verifier.verify(&input, submitter, target),
            Err(CryptoError::InvalidProof(_))
        ));
    }

    #[test]
    fn swapped_handle_fails() {
        let attestor = InputAttestor::generate();
        let verifier = Ed25519ProofVerifier::for_attestor(&attestor);
        let mut input = attestor.attest(handle(), alice(), policy());
        input.handle = CiphertextHandle::from_bytes([4; 32]);
        assert!(verifier.verify(&input, alice(), policy()).is_err());
    }

    #[test]
    fn untrusted_gateway_fails() {
        let rogue = InputAttestor::generate();
        let trusted = InputAttestor::generate();
        let verifier = Ed25519ProofVerifier::for_attestor(&trusted);
        let input = rogue.attest(handle(), alice(), policy());
        assert!(verifier.verify(&input, alice(), policy()).is_err());
    }

    #[test]
    fn verifier_from_public_key_bytes() {
        let attestor = InputAttestor::from_seed(&[0x42; 32]).unwrap();
        let verifier = Ed25519ProofVerifier::from_bytes(&attestor.verifying_key_bytes()).unwrap();
        let input = attestor.attest(handle(), alice(), policy());
        assert!(verifier.verify(&input, alice(), policy()).is_ok());
    }

    #[test]
    fn degenerate_keys_rejected() {
        assert!(InputAttestor::from_seed(&[0; 32]).is_err());
        assert!(Ed25519ProofVerifier::from_bytes(&[0; 32]).is_err());
    }

    #[test]
    fn proof_bytes_roundtrip() {
        let attestor = InputAttestor::from_seed(&[0x42; 32]).unwrap();
        let input = attestor.attest(handle(), alice(), policy());
        let bytes = input.proof.to_bytes();
        assert_eq!(InputProof::from_bytes(&bytes), input.proof);
    }
}
