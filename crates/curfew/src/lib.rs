//! # curfew
//!
//! Confidential time-window access policy.
//!
//! Two parties, a supervisor and a subject, each hold an encrypted weekly
//! schedule: seven 32-bit masks whose low 24 bits mark permitted hours. A
//! query for an instant intersects the two masks homomorphically and
//! discloses a single boolean. The schedules themselves are never decrypted.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                            Curfew                             │
//! │  ┌──────────┐   ┌───────────┐   ┌──────────┐   ┌───────────┐  │
//! │  │ Command  │ → │  Kernel   │ → │  Store   │ → │   Audit   │  │
//! │  │ (caller) │   │(pure FSM) │   │(handles) │   │ (append)  │  │
//! │  └──────────┘   └─────┬─────┘   └──────────┘   └───────────┘  │
//! │                       │ ConfidentialEngine                    │
//! └───────────────────────┼───────────────────────────────────────┘
//!                         ▼
//!           disclosed DecisionHandle → Relayer → bool
//! ```
//!
//! # Modules
//!
//! - [`Curfew`]: the policy facade and its ordered write path
//! - [`store`]: [`ScheduleStore`] with memory and JSON-file backends
//! - [`audit`]: [`AuditLog`] with memory and JSON-lines backends
//! - [`relayer`]: off-path resolution of disclosed decisions

pub mod audit;
mod curfew;
mod error;
pub mod relayer;
pub mod store;

pub use audit::{AuditError, AuditLog, AuditRecord, JsonlAuditLog, MemoryAuditLog};
pub use curfew::Curfew;
pub use error::{CurfewError, Result};
pub use relayer::{DecryptionService, Relayer, RelayerError};
pub use store::{FileScheduleStore, MemoryScheduleStore, ScheduleStore, StoreError, WriteBatch};

// Re-export core types
pub use curfew_types::{
    AuditAction, CiphertextHandle, DecisionHandle, EncryptedBool, EncryptedU32, Hour, Identity,
    Party, QueryContext, Timestamp, Weekday,
};

// Re-export confidential primitives
pub use curfew_crypto::{
    ClearEngine, ClearOracle, ConfidentialEngine, Ed25519ProofVerifier, ExternalInput,
    InputAttestor, InputProof, ProofVerifier,
};

// Re-export kernel surface
pub use curfew_kernel::{Command, DayHandles, KernelError, Role, RoleAssignments};

pub use curfew_config::{AttestationConfig, ConfigLoader, CurfewConfig, RelayerConfig};
