//! Kernel state.
//!
//! State tracks the role table and, per (party, weekday), the handle of the
//! encrypted 24-bit hour mask. Transitions take ownership and return a new
//! state.

use std::collections::BTreeMap;

use curfew_types::{EncryptedU32, Identity, Party, Weekday};

use crate::authorize::RoleAssignments;

/// Both parties' handles for one weekday, as returned by `get_handles`.
///
/// `None` means the slot was never written. A cleared slot holds a handle to
/// an encrypted zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayHandles {
    pub weekday: Weekday,
    pub supervisor: Option<EncryptedU32>,
    pub subject: Option<EncryptedU32>,
}

/// The kernel's in-memory state for one policy instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    policy_id: Identity,
    roles: RoleAssignments,
    slots: BTreeMap<(Party, Weekday), EncryptedU32>,
}

impl State {
    /// Creates a policy with no parties and every slot unset.
    pub fn new(policy_id: Identity, owner: Identity) -> Self {
        Self {
            policy_id,
            roles: RoleAssignments::new(owner),
            slots: BTreeMap::new(),
        }
    }

    /// Rebuilds state from persisted parts.
    pub fn restore(
        policy_id: Identity,
        roles: RoleAssignments,
        slots: impl IntoIterator<Item = ((Party, Weekday), EncryptedU32)>,
    ) -> Self {
        Self {
            policy_id,
            roles,
            slots: slots.into_iter().collect(),
        }
    }

    /// Identity of this policy instance. Input proofs are bound to it.
    pub fn policy_id(&self) -> Identity {
        self.policy_id
    }

    pub fn roles(&self) -> &RoleAssignments {
        &self.roles
    }

    pub fn slot(&self, party: Party, weekday: Weekday) -> Option<EncryptedU32> {
        self.slots.get(&(party, weekday)).copied()
    }

    pub fn handles(&self, weekday: Weekday) -> DayHandles {
        DayHandles {
            weekday,
            supervisor: self.slot(Party::Supervisor, weekday),
            subject: self.slot(Party::Subject, weekday),
        }
    }

    /// Iterates written slots in (party, weekday) order.
    pub fn slots(&self) -> impl Iterator<Item = ((Party, Weekday), EncryptedU32)> + '_ {
        self.slots.iter().map(|(key, value)| (*key, *value))
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn with_slot(mut self, party: Party, weekday: Weekday, value: EncryptedU32) -> Self {
        self.slots.insert((party, weekday), value);
        self
    }

    pub(crate) fn with_roles(mut self, roles: RoleAssignments) -> Self {
        self.roles = roles;
        self
    }
}

#[cfg(test)]
mod tests {
    use curfew_types::CiphertextHandle;

    use super::*;

    fn handle(byte: u8) -> EncryptedU32 {
        EncryptedU32::new(CiphertextHandle::from_bytes([byte; 32]))
    }

    #[test]
    fn new_state_has_no_slots() {
        let state = State::new(Identity::from_bytes([1; 32]), Identity::from_bytes([2; 32]));
        assert_eq!(state.slot_count(), 0);
        for day in Weekday::all() {
            let handles = state.handles(day);
            assert_eq!(handles.supervisor, None);
            assert_eq!(handles.subject, None);
        }
        assert_eq!(state.roles().owner, Identity::from_bytes([2; 32]));
    }

    #[test]
    fn with_slot_replaces_only_its_key() {
        let state = State::new(Identity::from_bytes([1; 32]), Identity::from_bytes([2; 32]))
            .with_slot(Party::Subject, Weekday::MONDAY, handle(1))
            .with_slot(Party::Supervisor, Weekday::MONDAY, handle(2))
            .with_slot(Party::Subject, Weekday::MONDAY, handle(3));

        assert_eq!(state.slot_count(), 2);
        let monday = state.handles(Weekday::MONDAY);
        assert_eq!(monday.subject, Some(handle(3)));
        assert_eq!(monday.supervisor, Some(handle(2)));
        assert_eq!(state.handles(Weekday::TUESDAY).subject, None);
    }

    #[test]
    fn restore_roundtrips_parts() {
        let original = State::new(Identity::from_bytes([1; 32]), Identity::from_bytes([2; 32]))
            .with_slot(Party::Subject, Weekday::FRIDAY, handle(5));
        let restored = State::restore(
            original.policy_id(),
            *original.roles(),
            original.slots(),
        );
        assert_eq!(original, restored);
    }
}
