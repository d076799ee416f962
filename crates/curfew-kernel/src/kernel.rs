//! The kernel - functional core of `curfew`.
//!
//! The kernel applies committed commands to produce new state and effects.
//! It performs no IO and reads no clocks: timestamps arrive inside commands.
//! The only collaborator it drives is the [`ConfidentialEngine`], whose
//! operations are synchronous compute over handles.
//!
//! Every validation step runs before the first engine mutation, so a rejected
//! command leaves both state and engine access lists untouched.
//!
//! # Example
//!
//! ```ignore
//! let state = State::new(policy_id, owner);
//! let cmd = Command::query_decision(requester, Timestamp::now());
//!
//! let (new_state, effects) = apply_committed(state, cmd, &mut engine, &verifier)?;
//! // Runtime executes effects...
//! ```

use curfew_crypto::{ConfidentialEngine, CryptoError, ProofVerifier};
use curfew_types::{AuditAction, CiphertextHandle, Identity, QueryContext, Weekday};

use crate::authorize::{Role, authorize};
use crate::calendar;
use crate::command::Command;
use crate::disclosure::disclose;
use crate::effects::Effect;
use crate::evaluator::evaluate;
use crate::state::State;

/// Applies a committed command to the state, producing new state and effects.
///
/// Takes ownership of state, returns new state.
pub fn apply_committed<E, V>(
    state: State,
    cmd: Command,
    engine: &mut E,
    verifier: &V,
) -> Result<(State, Vec<Effect>), KernelError>
where
    E: ConfidentialEngine + ?Sized,
    V: ProofVerifier + ?Sized,
{
    let mut effects = Vec::new();

    match cmd {
        Command::AssignRole {
            caller,
            party,
            identity,
        } => {
            authorize(state.roles(), caller, Role::Owner)?;

            let roles = state.roles().with_party(party, identity);
            effects.push(Effect::RolesWrite(roles));
            effects.push(Effect::AuditLogAppend(AuditAction::RoleAssigned {
                party,
                identity,
            }));

            let new_state = state.with_roles(roles);

            // Postcondition: the designated identity now holds the role
            debug_assert_eq!(new_state.roles().holder(party.into()), Some(identity));

            Ok((new_state, effects))
        }

        Command::SetSchedule {
            caller,
            party,
            day,
            input,
        } => {
            let weekday = parse_day(day)?;
            authorize(state.roles(), caller, party.into())?;
            verifier
                .verify(&input, caller, state.policy_id())
                .map_err(|e| match e {
                    CryptoError::InvalidProof(reason) => KernelError::InvalidProof(reason),
                    other => KernelError::InvalidProof(other.to_string()),
                })?;

            let value = engine.import_u32(input.handle)?;
            grant(engine, value.handle(), caller)?;

            effects.push(Effect::SlotWrite {
                party,
                weekday,
                value,
            });
            effects.push(Effect::AuditLogAppend(AuditAction::ScheduleUpdated {
                party,
                weekday,
                handle: value,
            }));

            // Postcondition: slot write + audit
            debug_assert_eq!(effects.len(), 2);

            let new_state = state.with_slot(party, weekday, value);
            debug_assert_eq!(new_state.slot(party, weekday), Some(value));

            Ok((new_state, effects))
        }

        Command::ClearSchedule { caller, party, day } => {
            let weekday = parse_day(day)?;
            authorize(state.roles(), caller, party.into())?;

            let zero = engine.trivial_u32(0)?;
            grant(engine, zero.handle(), caller)?;

            effects.push(Effect::SlotWrite {
                party,
                weekday,
                value: zero,
            });
            effects.push(Effect::AuditLogAppend(AuditAction::ScheduleCleared {
                party,
                weekday,
            }));

            debug_assert_eq!(effects.len(), 2);

            Ok((state.with_slot(party, weekday, zero), effects))
        }

        Command::QueryDecision {
            requester,
            timestamp,
        } => {
            let (weekday, hour) = calendar::resolve(timestamp);
            let day = state.handles(weekday);

            // Unset slots evaluate against an encrypted zero. The fill value is
            // minted on every query so the engine sees the same sequence
            // whether or not the slots were ever written.
            let fill = engine.trivial_u32(0)?;
            let supervisor = day.supervisor.unwrap_or(fill);
            let subject = day.subject.unwrap_or(fill);

            let decision = evaluate(engine, supervisor, subject, hour)?;
            let handle = disclose(engine, decision)?;

            let context = QueryContext {
                requester,
                weekday,
                hour,
                timestamp,
            };
            effects.push(Effect::DecisionDisclosed { handle, context });
            effects.push(Effect::AuditLogAppend(AuditAction::DecisionRecorded {
                requester,
                weekday,
                hour,
                handle,
            }));

            // Postcondition: queries never touch policy state
            debug_assert!(effects.iter().all(|e| !e.is_persistent()));

            Ok((state, effects))
        }
    }
}

/// Validates a raw weekday index.
pub fn parse_day(day: u8) -> Result<Weekday, KernelError> {
    Weekday::try_from(day).map_err(|_| KernelError::InvalidDay(day))
}

/// Lets both the engine's executor and the writing party use `handle`.
fn grant<E: ConfidentialEngine + ?Sized>(
    engine: &mut E,
    handle: CiphertextHandle,
    writer: Identity,
) -> Result<(), CryptoError> {
    let executor = engine.executor();
    engine.allow(handle, executor)?;
    if writer != executor {
        engine.allow(handle, writer)?;
    }
    Ok(())
}

/// Errors that can occur when applying commands to the kernel.
#[derive(thiserror::Error, Debug)]
pub enum KernelError {
    #[error("weekday {0} is out of range (expected 0..=6)")]
    InvalidDay(u8),

    #[error("{caller} does not hold the {required} role")]
    Unauthorized { caller: Identity, required: Role },

    #[error("invalid input proof: {0}")]
    InvalidProof(String),

    #[error("confidential engine error: {0}")]
    Engine(#[from] CryptoError),
}
