//! Deterministic state hashing.
//!
//! The hash covers the policy id, the role table and every written slot in
//! `BTreeMap` order, so the same command sequence against the same engine
//! history always yields the same hash. Snapshots carry it so a corrupted or
//! hand-edited file is caught on load.

use blake3::Hasher;
use curfew_types::{Identity, Party};

use crate::state::State;

const STATE_DOMAIN: &[u8] = b"curfew.state.v1";

fn hash_optional(hasher: &mut Hasher, identity: Option<Identity>) {
    match identity {
        Some(id) => {
            hasher.update(&[1u8]);
            hasher.update(id.as_bytes());
        }
        None => {
            hasher.update(&[0u8]);
        }
    }
}

impl State {
    /// Computes a 32-byte BLAKE3 hash of the entire state.
    ///
    /// # Examples
    ///
    /// ```
    /// use curfew_kernel::State;
    /// use curfew_types::Identity;
    ///
    /// let a = State::new(Identity::from_bytes([1; 32]), Identity::from_bytes([2; 32]));
    /// let b = State::new(Identity::from_bytes([1; 32]), Identity::from_bytes([2; 32]));
    /// assert_eq!(a.compute_state_hash(), b.compute_state_hash());
    /// ```
    pub fn compute_state_hash(&self) -> [u8; 32] {
        let mut hasher = Hasher::new();
        hasher.update(STATE_DOMAIN);
        hasher.update(self.policy_id().as_bytes());

        let roles = self.roles();
        hasher.update(roles.owner.as_bytes());
        hash_optional(&mut hasher, roles.supervisor);
        hash_optional(&mut hasher, roles.subject);

        hasher.update(&(self.slot_count() as u64).to_le_bytes());
        for ((party, weekday), value) in self.slots() {
            let tag = match party {
                Party::Supervisor => 0u8,
                Party::Subject => 1u8,
            };
            hasher.update(&[tag, weekday.index()]);
            hasher.update(value.handle().as_bytes());
        }

        *hasher.finalize().as_bytes()
    }
}
