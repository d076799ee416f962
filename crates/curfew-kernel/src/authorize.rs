//! Role registry and capability checks.
//!
//! Every mutating command calls [`authorize`] before touching state or the
//! confidential engine.

use std::fmt::Display;

use curfew_types::{Identity, Party};
use serde::{Deserialize, Serialize};

use crate::kernel::KernelError;

/// A capability a caller may need to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Deploys the policy and designates the parties.
    Owner,
    /// Writes the supervisor's schedule.
    Supervisor,
    /// Writes the subject's schedule.
    Subject,
}

impl From<Party> for Role {
    fn from(party: Party) -> Self {
        match party {
            Party::Supervisor => Role::Supervisor,
            Party::Subject => Role::Subject,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Supervisor => write!(f, "supervisor"),
            Role::Subject => write!(f, "subject"),
        }
    }
}

/// Which identity holds each role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignments {
    pub owner: Identity,
    pub supervisor: Option<Identity>,
    pub subject: Option<Identity>,
}

impl RoleAssignments {
    /// Roles for a fresh policy: an owner and no parties.
    pub fn new(owner: Identity) -> Self {
        Self {
            owner,
            supervisor: None,
            subject: None,
        }
    }

    /// Returns the identity holding `role`, if assigned.
    pub fn holder(&self, role: Role) -> Option<Identity> {
        match role {
            Role::Owner => Some(self.owner),
            Role::Supervisor => self.supervisor,
            Role::Subject => self.subject,
        }
    }

    /// Returns a copy with `party` held by `identity`.
    pub fn with_party(mut self, party: Party, identity: Identity) -> Self {
        match party {
            Party::Supervisor => self.supervisor = Some(identity),
            Party::Subject => self.subject = Some(identity),
        }
        self
    }
}

/// Checks that `caller` holds `required`.
///
/// An unassigned role is held by nobody.
pub fn authorize(
    roles: &RoleAssignments,
    caller: Identity,
    required: Role,
) -> Result<(), KernelError> {
    match roles.holder(required) {
        Some(holder) if holder == caller => Ok(()),
        _ => Err(KernelError::Unauthorized { caller, required }),
    }
}
