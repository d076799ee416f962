//! Main entry point for a curfew policy.
//!
//! [`Curfew`] owns the kernel state, the confidential engine, the proof
//! verifier and the persistence/audit sinks. Every command runs under one
//! write lock, which gives all operations a single global order: a query
//! observes exactly the schedules committed before it.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use curfew_config::{AuditBackend, CurfewConfig, StoreBackend};
use curfew_crypto::{ConfidentialEngine, Ed25519ProofVerifier, ExternalInput, ProofVerifier};
use curfew_kernel::{
    Command, DayHandles, Effect, RoleAssignments, State as KernelState, apply_committed, parse_day,
};
use curfew_types::{DecisionHandle, Identity, Party, Timestamp};

use crate::audit::{AuditLog, AuditRecord, JsonlAuditLog, MemoryAuditLog};
use crate::error::{CurfewError, Result};
use crate::store::{FileScheduleStore, MemoryScheduleStore, ScheduleStore, WriteBatch};

/// State shared by all clones of a [`Curfew`].
pub(crate) struct CurfewInner<E, V> {
    name: String,
    state: KernelState,
    engine: E,
    verifier: V,
    store: Box<dyn ScheduleStore>,
    audit: Box<dyn AuditLog>,
}

impl<E, V> CurfewInner<E, V> {
    /// Appends the audit actions among `effects`.
    ///
    /// Runs before the store commit: a command whose audit record cannot be
    /// written is not committed.
    fn append_audit(&mut self, effects: &[Effect]) -> Result<()> {
        let now = Timestamp::now();
        for effect in effects {
            if let Effect::AuditLogAppend(action) = effect {
                let record = self.audit.append(action.clone(), now)?;
                tracing::debug!(sequence = record.sequence, "audit record appended");
            }
        }
        Ok(())
    }

    /// Executes the remaining effects of a committed command.
    ///
    /// Returns the disclosed decision, if the command produced one.
    fn execute_effects(&self, effects: Vec<Effect>) -> Option<DecisionHandle> {
        let mut decision = None;

        for effect in effects {
            match effect {
                Effect::SlotWrite {
                    party,
                    weekday,
                    value,
                } => {
                    tracing::debug!(
                        policy = %self.name,
                        %party,
                        %weekday,
                        handle = %value.handle(),
                        "slot written"
                    );
                }
                Effect::RolesWrite(roles) => {
                    tracing::debug!(policy = %self.name, ?roles, "roles written");
                }
                Effect::DecisionDisclosed { handle, context } => {
                    tracing::debug!(
                        policy = %self.name,
                        %handle,
                        requester = %context.requester,
                        weekday = %context.weekday,
                        hour = %context.hour,
                        "decision disclosed"
                    );
                    decision = Some(handle);
                }
                // Already appended by `append_audit`
                Effect::AuditLogAppend(_) => {}
            }
        }

        decision
    }
}

/// A confidential time-window access policy.
///
/// # Example
///
/// ```ignore
/// let policy = Curfew::in_memory(owner, engine, verifier)?;
/// policy.assign_role(owner, Party::Subject, subject)?;
/// policy.set_schedule(subject, Party::Subject, 0, input)?;
///
/// let decision = policy.query_now(anyone)?;
/// let allowed = relayer.resolve(decision).await?;
/// ```
pub struct Curfew<E, V> {
    inner: Arc<RwLock<CurfewInner<E, V>>>,
}

impl<E, V> Clone for Curfew<E, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E, V> Curfew<E, V>
where
    E: ConfidentialEngine,
    V: ProofVerifier,
{
    /// Creates a policy with in-memory store and audit log.
    ///
    /// The engine's executor identity doubles as the policy id that input
    /// proofs are bound to.
    pub fn in_memory(owner: Identity, engine: E, verifier: V) -> Result<Self> {
        Self::with_backends(
            "curfew",
            owner,
            engine,
            verifier,
            Box::new(MemoryScheduleStore::new()),
            Box::new(MemoryAuditLog::new()),
        )
    }

    /// Creates or reopens a policy over explicit backends.
    ///
    /// If `store` already holds a snapshot, state is restored from it and
    /// `owner` is ignored; the stored role table wins.
    pub fn with_backends(
        name: impl Into<String>,
        owner: Identity,
        engine: E,
        verifier: V,
        mut store: Box<dyn ScheduleStore>,
        audit: Box<dyn AuditLog>,
    ) -> Result<Self> {
        let name = name.into();
        let policy_id = engine.executor();

        let state = match store.load()? {
            Some(snapshot) => {
                if snapshot.policy_id != policy_id {
                    return Err(crate::store::StoreError::PolicyMismatch {
                        expected: policy_id,
                        found: snapshot.policy_id,
                    }
                    .into());
                }
                let state = snapshot.into_state()?;
                tracing::info!(
                    policy = %name,
                    slots = state.slot_count(),
                    "policy restored from store"
                );
                state
            }
            None => {
                let state = KernelState::new(policy_id, owner);
                store.commit(&WriteBatch::genesis(&state))?;
                tracing::info!(policy = %name, %owner, "policy created");
                state
            }
        };

        Ok(Self {
            inner: Arc::new(RwLock::new(CurfewInner {
                name,
                state,
                engine,
                verifier,
                store,
                audit,
            })),
        })
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Designates the identity acting as `party`. Owner only.
    pub fn assign_role(&self, caller: Identity, party: Party, identity: Identity) -> Result<()> {
        self.submit(Command::assign_role(caller, party, identity))
            .map(|_| ())
    }

    /// Replaces `party`'s schedule for weekday `day` (0 = Monday).
    pub fn set_schedule(
        &self,
        caller: Identity,
        party: Party,
        day: u8,
        input: ExternalInput,
    ) -> Result<()> {
        self.submit(Command::set_schedule(caller, party, day, input))
            .map(|_| ())
    }

    /// Resets `party`'s schedule for `day` to an encrypted zero.
    pub fn clear_schedule(&self, caller: Identity, party: Party, day: u8) -> Result<()> {
        self.submit(Command::clear_schedule(caller, party, day))
            .map(|_| ())
    }

    /// Evaluates the slot containing `timestamp` and discloses the result.
    ///
    /// Every call yields a fresh handle; nothing is cached.
    pub fn query_decision(&self, requester: Identity, timestamp: Timestamp) -> Result<DecisionHandle> {
        self.submit(Command::query_decision(requester, timestamp))?
            .ok_or_else(|| CurfewError::internal("query produced no decision"))
    }

    /// [`Self::query_decision`] at the current wall-clock time.
    pub fn query_now(&self, requester: Identity) -> Result<DecisionHandle> {
        self.query_decision(requester, Timestamp::now())
    }

    /// Submits a command to the kernel and executes resulting effects.
    ///
    /// This is the core write path: command → kernel → audit → store → state.
    pub fn submit(&self, command: Command) -> Result<Option<DecisionHandle>> {
        let mut guard = self.write()?;
        let inner = &mut *guard;

        let kind = command.kind();
        let caller = command.caller();
        let (party, day) = match &command {
            Command::SetSchedule { party, day, .. } | Command::ClearSchedule { party, day, .. } => {
                (Some(*party), Some(*day))
            }
            Command::AssignRole { party, .. } => (Some(*party), None),
            Command::QueryDecision { .. } => (None, None),
        };

        // Apply command to kernel
        let (new_state, effects) = match apply_committed(
            inner.state.clone(),
            command,
            &mut inner.engine,
            &inner.verifier,
        ) {
            Ok(applied) => applied,
            Err(e) => {
                tracing::warn!(
                    policy = %inner.name,
                    command = kind,
                    %caller,
                    ?party,
                    ?day,
                    error = %e,
                    "command rejected"
                );
                return Err(e.into());
            }
        };

        // Audit, then persist, then publish the new state
        if let Err(e) = inner.append_audit(&effects) {
            tracing::warn!(
                policy = %inner.name,
                command = kind,
                %caller,
                error = %e,
                "audit append failed, command not committed"
            );
            return Err(e);
        }
        let batch = WriteBatch::from_effects(&new_state, &effects);
        if !batch.is_empty() {
            inner.store.commit(&batch)?;
        }
        inner.state = new_state;

        tracing::info!(
            policy = %inner.name,
            command = kind,
            %caller,
            ?party,
            ?day,
            "command committed"
        );

        Ok(inner.execute_effects(effects))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Opaque handles of both parties' schedules for weekday `day`.
    pub fn get_handles(&self, day: u8) -> Result<DayHandles> {
        let weekday = parse_day(day)?;
        Ok(self.read()?.state.handles(weekday))
    }

    pub fn roles(&self) -> Result<RoleAssignments> {
        Ok(*self.read()?.state.roles())
    }

    pub fn policy_id(&self) -> Result<Identity> {
        Ok(self.read()?.state.policy_id())
    }

    /// BLAKE3 hash of the committed state.
    pub fn state_hash(&self) -> Result<[u8; 32]> {
        Ok(self.read()?.state.compute_state_hash())
    }

    pub fn audit_records(&self) -> Result<Vec<AuditRecord>> {
        Ok(self.read()?.audit.records()?)
    }

    /// Runs `f` with shared access to the engine.
    pub fn with_engine<R>(&self, f: impl FnOnce(&E) -> R) -> Result<R> {
        Ok(f(&self.read()?.engine))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CurfewInner<E, V>>> {
        self.inner
            .read()
            .map_err(|_| CurfewError::internal("lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CurfewInner<E, V>>> {
        self.inner
            .write()
            .map_err(|_| CurfewError::internal("lock poisoned"))
    }
}

impl<E: ConfidentialEngine> Curfew<E, Ed25519ProofVerifier> {
    /// Opens a policy as described by `config`.
    ///
    /// The attestation key must be configured; store and audit backends
    /// follow `[store]` and `[audit]`.
    pub fn open(config: &CurfewConfig, owner: Identity, engine: E) -> Result<Self> {
        let key = config.attestation.trusted_key_bytes()?;
        let verifier = Ed25519ProofVerifier::from_bytes(&key)?;

        let store: Box<dyn ScheduleStore> = match config.store.backend {
            StoreBackend::Memory => Box::new(MemoryScheduleStore::new()),
            StoreBackend::File => Box::new(FileScheduleStore::open(&config.store.data_dir)?),
        };
        let audit: Box<dyn AuditLog> = match config.audit.backend {
            AuditBackend::Memory => Box::new(MemoryAuditLog::new()),
            AuditBackend::Jsonl => Box::new(JsonlAuditLog::open(&config.audit.file)?),
        };

        Self::with_backends(
            config.policy.name.clone(),
            owner,
            engine,
            verifier,
            store,
            audit,
        )
    }
}

#[cfg(test)]
mod tests {
    use curfew_crypto::{ClearEngine, InputAttestor};
    use curfew_types::Weekday;

    use super::*;

    fn id(byte: u8) -> Identity {
        Identity::from_bytes([byte; 32])
    }

    fn policy() -> (Curfew<ClearEngine, Ed25519ProofVerifier>, InputAttestor) {
        let gateway = InputAttestor::from_seed(&[9; 32]).unwrap();
        let verifier = Ed25519ProofVerifier::for_attestor(&gateway);
        let policy = Curfew::in_memory(id(1), ClearEngine::new(id(0xC0)), verifier).unwrap();
        (policy, gateway)
    }

    #[test]
    fn rejected_command_changes_nothing() {
        let (policy, _) = policy();
        let hash = policy.state_hash().unwrap();
        let records = policy.audit_records().unwrap().len();

        let err = policy.clear_schedule(id(7), Party::Subject, 0).unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(policy.state_hash().unwrap(), hash);
        assert_eq!(policy.audit_records().unwrap().len(), records);
    }

    #[test]
    fn commands_audit_in_order() {
        let (policy, gateway) = policy();
        policy.assign_role(id(1), Party::Subject, id(3)).unwrap();

        let ct = policy.with_engine(|e| e.encrypt_u32(0x40)).unwrap().unwrap();
        let input = gateway.attest(ct.handle(), id(3), policy.policy_id().unwrap());
        policy.set_schedule(id(3), Party::Subject, 0, input).unwrap();
        policy.clear_schedule(id(3), Party::Subject, 0).unwrap();

        let records = policy.audit_records().unwrap();
        let sequences: Vec<u64> = records.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert!(matches!(
            records[2].action,
            curfew_types::AuditAction::ScheduleCleared {
                party: Party::Subject,
                weekday: Weekday::MONDAY
            }
        ));
    }

    #[test]
    fn get_handles_validates_day() {
        let (policy, _) = policy();
        assert!(policy.get_handles(7).unwrap_err().is_invalid_day());
        let monday = policy.get_handles(0).unwrap();
        assert_eq!(monday.weekday, Weekday::MONDAY);
        assert_eq!(monday.supervisor, None);
    }

    #[test]
    fn clones_share_state() {
        let (policy, _) = policy();
        let other = policy.clone();
        policy.assign_role(id(1), Party::Supervisor, id(2)).unwrap();
        assert_eq!(other.roles().unwrap().supervisor, Some(id(2)));
    }
}
