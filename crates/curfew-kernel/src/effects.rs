//! Effects produced by the kernel.
//!
//! The kernel is pure with respect to persistence: it returns effects and
//! the facade executes them after the new state is committed.

use curfew_types::{AuditAction, DecisionHandle, EncryptedU32, Party, QueryContext, Weekday};
use serde::{Deserialize, Serialize};

use crate::authorize::RoleAssignments;

/// An effect to be executed by the runtime.
///
/// Produced by [`super::kernel::apply_committed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Persist a party's mask for one weekday.
    SlotWrite {
        party: Party,
        weekday: Weekday,
        value: EncryptedU32,
    },

    /// Persist the role table.
    RolesWrite(RoleAssignments),

    /// A decision was made public; report it to the requester.
    DecisionDisclosed {
        handle: DecisionHandle,
        context: QueryContext,
    },

    /// Append an entry to the audit trail.
    AuditLogAppend(AuditAction),
}

impl Effect {
    /// True for effects that change durable policy state.
    pub fn is_persistent(&self) -> bool {
        matches!(self, Effect::SlotWrite { .. } | Effect::RolesWrite(_))
    }
}
