//! Commands accepted by the kernel.
//!
//! A command carries the authenticated caller. Authentication itself happens
//! outside the kernel; the kernel only checks roles.

use curfew_crypto::ExternalInput;
use curfew_types::{Identity, Party, Timestamp};

/// A request to change or query policy state.
///
/// The `day` fields are raw so that out-of-range values reach the kernel and
/// are rejected there, before any engine work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Designate the identity acting as `party`. Owner only.
    AssignRole {
        caller: Identity,
        party: Party,
        identity: Identity,
    },

    /// Replace `party`'s mask for `day` with an attested ciphertext.
    SetSchedule {
        caller: Identity,
        party: Party,
        day: u8,
        input: ExternalInput,
    },

    /// Reset `party`'s mask for `day` to an encrypted zero.
    ClearSchedule {
        caller: Identity,
        party: Party,
        day: u8,
    },

    /// Evaluate and disclose the decision for the slot containing `timestamp`.
    QueryDecision {
        requester: Identity,
        timestamp: Timestamp,
    },
}

impl Command {
    pub fn assign_role(caller: Identity, party: Party, identity: Identity) -> Self {
        Self::AssignRole {
            caller,
            party,
            identity,
        }
    }

    pub fn set_schedule(caller: Identity, party: Party, day: u8, input: ExternalInput) -> Self {
        Self::SetSchedule {
            caller,
            party,
            day,
            input,
        }
    }

    pub fn clear_schedule(caller: Identity, party: Party, day: u8) -> Self {
        Self::ClearSchedule { caller, party, day }
    }

    pub fn query_decision(requester: Identity, timestamp: Timestamp) -> Self {
        Self::QueryDecision {
            requester,
            timestamp,
        }
    }

    /// Returns the identity issuing the command.
    pub fn caller(&self) -> Identity {
        match self {
            Self::AssignRole { caller, .. }
            | Self::SetSchedule { caller, .. }
            | Self::ClearSchedule { caller, .. } => *caller,
            Self::QueryDecision { requester, .. } => *requester,
        }
    }

    /// Short lowercase name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AssignRole { .. } => "assign_role",
            Self::SetSchedule { .. } => "set_schedule",
            Self::ClearSchedule { .. } => "clear_schedule",
            Self::QueryDecision { .. } => "query_decision",
        }
    }
}
