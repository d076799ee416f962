//! End-to-end policy behaviour through the public facade.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use curfew::{
    AuditAction, ClearEngine, ConfidentialEngine, Curfew, DecisionHandle, Ed25519ProofVerifier,
    ExternalInput, Hour, Identity, InputAttestor, Party, Relayer, Timestamp, Weekday,
};
use test_case::test_case;

/// 2024-01-01T00:00:00Z, a Monday.
const MONDAY: u64 = 1_704_067_200;
const HOUR: u64 = 3_600;
const DAY: u64 = 86_400;

fn owner() -> Identity {
    Identity::from_bytes([0x01; 32])
}

fn supervisor() -> Identity {
    Identity::from_bytes([0x02; 32])
}

fn subject() -> Identity {
    Identity::from_bytes([0x03; 32])
}

fn observer() -> Identity {
    Identity::from_bytes([0x0B; 32])
}

struct Harness {
    policy: Curfew<ClearEngine, Ed25519ProofVerifier>,
    engine: ClearEngine,
    gateway: InputAttestor,
}

impl Harness {
    fn new() -> Self {
        let engine = ClearEngine::new(Identity::from_bytes([0xC0; 32]));
        let gateway = InputAttestor::from_seed(&[0x42; 32]).unwrap();
        let verifier = Ed25519ProofVerifier::for_attestor(&gateway);
        let policy = Curfew::in_memory(owner(), engine.clone(), verifier).unwrap();
        policy
            .assign_role(owner(), Party::Supervisor, supervisor())
            .unwrap();
        policy.assign_role(owner(), Party::Subject, subject()).unwrap();
        Self {
            policy,
            engine,
            gateway,
        }
    }

    fn input(&self, caller: Identity, mask: u32) -> ExternalInput {
        let ct = self.engine.encrypt_u32(mask).unwrap();
        self.gateway
            .attest(ct.handle(), caller, self.policy.policy_id().unwrap())
    }

    fn set(&self, party: Party, day: u8, mask: u32) {
        let caller = match party {
            Party::Supervisor => supervisor(),
            Party::Subject => subject(),
        };
        self.policy
            .set_schedule(caller, party, day, self.input(caller, mask))
            .unwrap();
    }

    fn resolve(&self, handle: DecisionHandle) -> bool {
        self.engine.oracle().public_bool(handle.handle()).unwrap()
    }

    fn decide(&self, secs: u64) -> bool {
        let handle = self
            .policy
            .query_decision(observer(), Timestamp::from_secs(secs))
            .unwrap();
        self.resolve(handle)
    }
}

#[test_case(6, true; "both permit 06:00")]
#[test_case(5, false; "subject forbids 05:00")]
#[test_case(7, false; "nobody permits 07:00")]
fn supervisor_and_subject_masks_intersect(hour: u64, expected: bool) {
    let h = Harness::new();
    h.set(Party::Supervisor, 0, 0x60);
    h.set(Party::Subject, 0, 0x40);

    assert_eq!(h.decide(MONDAY + hour * HOUR), expected);
}

#[test]
fn cleared_schedule_denies_every_hour() {
    let h = Harness::new();
    h.set(Party::Supervisor, 2, 0x00FF_FFFF);
    h.set(Party::Subject, 2, 0x00FF_FFFF);
    h.policy.clear_schedule(subject(), Party::Subject, 2).unwrap();

    let wednesday = MONDAY + 2 * DAY;
    for hour in 0..24 {
        assert!(!h.decide(wednesday + hour * HOUR), "hour {hour}");
    }

    // Cleared slots still expose a handle; never-set slots expose none
    let handles = h.policy.get_handles(2).unwrap();
    assert!(handles.subject.is_some());
    assert!(h.policy.get_handles(3).unwrap().subject.is_none());
}

#[test]
fn non_owner_write_rejected_and_schedule_unchanged() {
    let h = Harness::new();
    h.set(Party::Subject, 0, 0x40);
    h.set(Party::Supervisor, 0, 0x40);
    let before = h.policy.get_handles(0).unwrap();

    let forged = h.input(supervisor(), 0);
    let err = h
        .policy
        .set_schedule(supervisor(), Party::Subject, 0, forged)
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(h.policy.get_handles(0).unwrap(), before);
    assert!(h.decide(MONDAY + 6 * HOUR));
}

#[test]
fn invalid_day_and_proof_rejected() {
    let h = Harness::new();

    let err = h
        .policy
        .set_schedule(subject(), Party::Subject, 7, h.input(subject(), 1))
        .unwrap_err();
    assert!(err.is_invalid_day());

    // Proof minted for the supervisor, replayed by the subject
    let replayed = h.input(supervisor(), 1);
    let err = h
        .policy
        .set_schedule(subject(), Party::Subject, 0, replayed)
        .unwrap_err();
    assert!(err.is_invalid_proof());

    assert!(h.policy.get_handles(0).unwrap().subject.is_none());
}

#[test]
fn repeated_queries_resolve_identically() {
    let h = Harness::new();
    h.set(Party::Supervisor, 4, 0x0F00);
    h.set(Party::Subject, 4, 0x0300);
    let at = Timestamp::from_secs(MONDAY + 4 * DAY + 9 * HOUR);

    let first = h.policy.query_decision(observer(), at).unwrap();
    let second = h.policy.query_decision(observer(), at).unwrap();

    assert_ne!(first, second, "queries are never deduplicated");
    assert_eq!(h.resolve(first), h.resolve(second));
    assert!(h.resolve(first));
}

#[test]
fn epoch_resolves_to_thursday_midnight() {
    let h = Harness::new();
    h.set(Party::Supervisor, 3, 0x1);
    h.set(Party::Subject, 3, 0x1);

    let handle = h.policy.query_decision(observer(), Timestamp::EPOCH).unwrap();
    assert!(h.resolve(handle));

    let records = h.policy.audit_records().unwrap();
    let last = records.last().unwrap();
    assert_eq!(
        last.action,
        AuditAction::DecisionRecorded {
            requester: observer(),
            weekday: Weekday::THURSDAY,
            hour: Hour::try_from(0u8).unwrap(),
            handle,
        }
    );
}

#[test]
fn schedules_are_never_disclosed() {
    let h = Harness::new();
    h.set(Party::Supervisor, 0, 0x60);
    h.set(Party::Subject, 0, 0x40);
    for hour in 0..24 {
        h.decide(MONDAY + hour * HOUR);
    }

    let handles = h.policy.get_handles(0).unwrap();
    for slot in [handles.supervisor.unwrap(), handles.subject.unwrap()] {
        assert!(!h.engine.is_publicly_decryptable(slot.handle()));
        assert!(h.engine.oracle().public_bool(slot.handle()).is_err());
    }
}

#[test]
fn audit_trail_matches_operations() {
    let h = Harness::new();
    h.set(Party::Subject, 1, 0x10);
    h.policy.clear_schedule(subject(), Party::Subject, 1).unwrap();
    let handle = h.policy.query_now(observer()).unwrap();

    let actions: Vec<AuditAction> = h
        .policy
        .audit_records()
        .unwrap()
        .into_iter()
        .map(|r| r.action)
        .collect();

    assert_eq!(actions.len(), 5);
    assert!(matches!(actions[0], AuditAction::RoleAssigned { party: Party::Supervisor, .. }));
    assert!(matches!(actions[1], AuditAction::RoleAssigned { party: Party::Subject, .. }));
    assert!(matches!(
        actions[2],
        AuditAction::ScheduleUpdated { party: Party::Subject, weekday: Weekday::TUESDAY, .. }
    ));
    assert_eq!(
        actions[3],
        AuditAction::ScheduleCleared {
            party: Party::Subject,
            weekday: Weekday::TUESDAY
        }
    );
    assert!(matches!(
        actions[4],
        AuditAction::DecisionRecorded { handle: h2, .. } if h2 == handle
    ));
}

#[test]
fn concurrent_writers_and_readers_serialize() {
    let h = Arc::new(Harness::new());
    h.set(Party::Supervisor, 0, 0x00FF_FFFF);

    let writer = {
        let h = Arc::clone(&h);
        thread::spawn(move || {
            for i in 0..20u32 {
                h.set(Party::Subject, 0, if i % 2 == 0 { 0x40 } else { 0x00 });
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let h = Arc::clone(&h);
            thread::spawn(move || {
                for _ in 0..20 {
                    // Either value is fine; every query must still succeed
                    h.decide(MONDAY + 6 * HOUR);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    // Last write was 0x00
    assert!(!h.decide(MONDAY + 6 * HOUR));
}

#[tokio::test]
async fn relayer_resolves_disclosed_decision() {
    let h = Harness::new();
    h.set(Party::Supervisor, 0, 0x60);
    h.set(Party::Subject, 0, 0x40);

    let handle = h
        .policy
        .query_decision(observer(), Timestamp::from_secs(MONDAY + 6 * HOUR))
        .unwrap();

    let relayer = Relayer::new(h.engine.oracle(), 3, Duration::from_millis(1));
    assert!(relayer.resolve(handle).await.unwrap());
}

proptest::proptest! {
    #![proptest_config(proptest::prelude::ProptestConfig::with_cases(32))]

    #[test]
    fn decision_matches_plaintext_intersection(
        supervisor_mask in proptest::prelude::any::<u32>(),
        subject_mask in proptest::prelude::any::<u32>(),
        day in 0u64..7,
        hour in 0u64..24,
        offset in 0u64..3_600,
    ) {
        let h = Harness::new();
        h.set(Party::Supervisor, day as u8, supervisor_mask);
        h.set(Party::Subject, day as u8, subject_mask);

        let bit = 1u32 << hour;
        let expected = supervisor_mask & bit != 0 && subject_mask & bit != 0;
        let at = MONDAY + day * DAY + hour * HOUR + offset;
        proptest::prop_assert_eq!(h.decide(at), expected);
    }
}
