//! Plaintext stand-in for a homomorphic coprocessor.
//!
//! [`ClearEngine`] keeps values in the clear behind the same
//! [`ConfidentialEngine`] interface a real coprocessor would expose, so policy
//! logic can be exercised without FHE. Nothing in the engine hands plaintext
//! back to callers: the only read path is [`ClearOracle`], and it only answers
//! for handles that were made publicly decryptable.
//!
//! Handles are BLAKE3 digests over the operation, its operands and a
//! monotonically increasing nonce, so every operation produces a fresh handle
//! even when the plaintext repeats.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use curfew_types::{CiphertextHandle, EncryptedBool, EncryptedU32, Identity};

use crate::confidential::{CiphertextKind, ConfidentialEngine};
use crate::error::{CryptoError, Result};

const HANDLE_DOMAIN: &[u8] = b"curfew.ciphertext.v1";

#[derive(Debug, Clone, Copy)]
struct ClearValue {
    kind: CiphertextKind,
    bits: u32,
}

#[derive(Default)]
struct Ledger {
    values: HashMap<CiphertextHandle, ClearValue>,
    acl: HashSet<(CiphertextHandle, Identity)>,
    public: HashSet<CiphertextHandle>,
    nonce: u64,
}

impl Ledger {
    fn mint(&mut self, op: &[u8], operands: &[CiphertextHandle], value: ClearValue) -> CiphertextHandle {
        let mut hasher = blake3::Hasher::new();
        hasher.update(HANDLE_DOMAIN);
        hasher.update(op);
        for operand in operands {
            hasher.update(operand.as_bytes());
        }
        hasher.update(&self.nonce.to_le_bytes());
        self.nonce += 1;

        let handle = CiphertextHandle::from_bytes(*hasher.finalize().as_bytes());
        self.values.insert(handle, value);
        handle
    }

    fn load(&self, handle: CiphertextHandle, expected: CiphertextKind) -> Result<u32> {
        let value = self
            .values
            .get(&handle)
            .ok_or(CryptoError::UnknownHandle(handle))?;
        if value.kind != expected {
            return Err(CryptoError::TypeMismatch {
                handle,
                expected,
                actual: value.kind,
            });
        }
        Ok(value.bits)
    }

    fn load_allowed(
        &self,
        handle: CiphertextHandle,
        expected: CiphertextKind,
        executor: Identity,
    ) -> Result<u32> {
        let bits = self.load(handle, expected)?;
        if !self.acl.contains(&(handle, executor)) {
            return Err(CryptoError::AccessDenied {
                handle,
                identity: executor,
            });
        }
        Ok(bits)
    }
}

/// In-process confidential engine that computes on plaintext.
///
/// Cloning shares the underlying ciphertext ledger. The ledger only grows:
/// every operation adds a value and its ACL entries, and nothing is ever
/// evicted, so memory is unbounded over the engine's lifetime. Meant for
/// tests and local runs, not deployment.
#[derive(Clone)]
pub struct ClearEngine {
    executor: Identity,
    ledger: Arc<RwLock<Ledger>>,
}

// Manual Debug implementation to avoid exposing plaintext values
impl std::fmt::Debug for ClearEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClearEngine")
            .field("executor", &self.executor)
            .field("ledger", &"<redacted>")
            .finish()
    }
}

impl ClearEngine {
    /// Creates an empty engine computing on behalf of `executor`.
    pub fn new(executor: Identity) -> Self {
        Self {
            executor,
            ledger: Arc::new(RwLock::new(Ledger::default())),
        }
    }

    /// Encrypts a client-side input.
    ///
    /// The resulting ciphertext is allowed to nobody. It becomes usable once
    /// the policy verifies its input proof and grants itself access.
    pub fn encrypt_u32(&self, value: u32) -> Result<EncryptedU32> {
        let mut ledger = self.write()?;
        let handle = ledger.mint(
            b"input",
            &[],
            ClearValue {
                kind: CiphertextKind::Uint32,
                bits: value,
            },
        );
        Ok(EncryptedU32::new(handle))
    }

    /// Returns a read-only view that resolves disclosed handles.
    pub fn oracle(&self) -> ClearOracle {
        ClearOracle {
            ledger: Arc::clone(&self.ledger),
        }
    }

    /// Number of ciphertexts minted so far.
    pub fn ciphertext_count(&self) -> Result<usize> {
        Ok(self.read()?.values.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Ledger>> {
        self.ledger.read().map_err(|_| CryptoError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Ledger>> {
        self.ledger.write().map_err(|_| CryptoError::Poisoned)
    }

    fn binary(
        &self,
        op: &[u8],
        operands: (CiphertextHandle, CiphertextHandle),
        operand_kind: CiphertextKind,
        result_kind: CiphertextKind,
        f: impl FnOnce(u32, u32) -> u32,
    ) -> Result<CiphertextHandle> {
        let (lhs, rhs) = operands;
        let mut ledger = self.write()?;
        let a = ledger.load_allowed(lhs, operand_kind, self.executor)?;
        let b = ledger.load_allowed(rhs, operand_kind, self.executor)?;

        let handle = ledger.mint(
            op,
            &[lhs, rhs],
            ClearValue {
                kind: result_kind,
                bits: f(a, b),
            },
        );
        ledger.acl.insert((handle, self.executor));
        Ok(handle)
    }
}

impl ConfidentialEngine for ClearEngine {
    fn executor(&self) -> Identity {
        self.executor
    }

    fn import_u32(&mut self, handle: CiphertextHandle) -> Result<EncryptedU32> {
        self.read()?.load(handle, CiphertextKind::Uint32)?;
        Ok(EncryptedU32::new(handle))
    }

    fn trivial_u32(&mut self, value: u32) -> Result<EncryptedU32> {
        let mut ledger = self.write()?;
        let handle = ledger.mint(
            b"trivial",
            &[],
            ClearValue {
                kind: CiphertextKind::Uint32,
                bits: value,
            },
        );
        ledger.acl.insert((handle, self.executor));
        Ok(EncryptedU32::new(handle))
    }

    fn bit_and(&mut self, lhs: EncryptedU32, rhs: EncryptedU32) -> Result<EncryptedU32> {
        self.binary(
            b"and",
            (lhs.handle(), rhs.handle()),
            CiphertextKind::Uint32,
            CiphertextKind::Uint32,
            |a, b| a & b,
        )
        .map(EncryptedU32::new)
    }

    fn gt(&mut self, lhs: EncryptedU32, rhs: EncryptedU32) -> Result<EncryptedBool> {
        self.binary(
            b"gt",
            (lhs.handle(), rhs.handle()),
            CiphertextKind::Uint32,
            CiphertextKind::Bool,
            |a, b| u32::from(a > b),
        )
        .map(EncryptedBool::new)
    }

    fn and(&mut self, lhs: EncryptedBool, rhs: EncryptedBool) -> Result<EncryptedBool> {
        self.binary(
            b"bool_and",
            (lhs.handle(), rhs.handle()),
            CiphertextKind::Bool,
            CiphertextKind::Bool,
            |a, b| u32::from(a != 0 && b != 0),
        )
        .map(EncryptedBool::new)
    }

    fn allow(&mut self, handle: CiphertextHandle, grantee: Identity) -> Result<()> {
        let mut ledger = self.write()?;
        if !ledger.values.contains_key(&handle) {
            return Err(CryptoError::UnknownHandle(handle));
        }
        ledger.acl.insert((handle, grantee));
        Ok(())
    }

    fn is_allowed(&self, handle: CiphertextHandle, identity: Identity) -> bool {
        self.read()
            .is_ok_and(|ledger| ledger.acl.contains(&(handle, identity)))
    }

    fn make_publicly_decryptable(&mut self, value: EncryptedBool) -> Result<()> {
        let mut ledger = self.write()?;
        ledger.load_allowed(value.handle(), CiphertextKind::Bool, self.executor)?;
        ledger.public.insert(value.handle());
        Ok(())
    }

    fn is_publicly_decryptable(&self, handle: CiphertextHandle) -> bool {
        self.read()
            .is_ok_and(|ledger| ledger.public.contains(&handle))
    }
}

/// Read-only resolver over a [`ClearEngine`] ledger.
///
/// Answers only for publicly decryptable booleans.
#[derive(Clone)]
pub struct ClearOracle {
    ledger: Arc<RwLock<Ledger>>,
}

impl std::fmt::Debug for ClearOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClearOracle").finish_non_exhaustive()
    }
}

impl ClearOracle {
    /// Returns the plaintext of a disclosed boolean.
    pub fn public_bool(&self, handle: CiphertextHandle) -> Result<bool> {
        let ledger = self.ledger.read().map_err(|_| CryptoError::Poisoned)?;
        if !ledger.public.contains(&handle) {
            return Err(CryptoError::NotPublic(handle));
        }
        Ok(ledger.load(handle, CiphertextKind::Bool)? != 0)
    }
}
