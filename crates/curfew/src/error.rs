//! Error type for the `curfew` facade.

use curfew_config::ConfigError;
use curfew_crypto::CryptoError;
use curfew_kernel::KernelError;
use thiserror::Error;

use crate::audit::AuditError;
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, CurfewError>;

#[derive(Debug, Error)]
pub enum CurfewError {
    /// The kernel rejected the command. Nothing was committed.
    #[error(transparent)]
    Kernel(#[from] KernelError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// From a command: its audit record could not be written, so the
    /// command was not committed.
    #[error("audit log error: {0}")]
    Audit(#[from] AuditError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CurfewError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True when the kernel refused the caller's role.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Kernel(KernelError::Unauthorized { .. }))
    }

    pub fn is_invalid_day(&self) -> bool {
        matches!(self, Self::Kernel(KernelError::InvalidDay(_)))
    }

    pub fn is_invalid_proof(&self) -> bool {
        matches!(self, Self::Kernel(KernelError::InvalidProof(_)))
    }
}
