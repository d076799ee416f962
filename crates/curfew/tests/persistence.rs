//! Durable backends: reopen a policy from its data directory.

use curfew::{
    AttestationConfig, AuditAction, ClearEngine, Curfew, CurfewConfig, CurfewError, Ed25519ProofVerifier, Identity,
    InputAttestor, Party, Timestamp,
};
use tempfile::TempDir;

const MONDAY_06: u64 = 1_704_067_200 + 6 * 3_600;

fn owner() -> Identity {
    Identity::from_bytes([0x01; 32])
}

fn subject() -> Identity {
    Identity::from_bytes([0x03; 32])
}

fn supervisor() -> Identity {
    Identity::from_bytes([0x02; 32])
}

fn durable_config(dir: &TempDir, gateway: &InputAttestor) -> CurfewConfig {
    let mut config = CurfewConfig::durable(dir.path());
    config.attestation.trusted_key = AttestationConfig::encode_key(&gateway.verifying_key_bytes());
    config
}

fn set(
    policy: &Curfew<ClearEngine, Ed25519ProofVerifier>,
    gateway: &InputAttestor,
    caller: Identity,
    party: Party,
    mask: u32,
) {
    let ct = policy.with_engine(|e| e.encrypt_u32(mask)).unwrap().unwrap();
    let input = gateway.attest(ct.handle(), caller, policy.policy_id().unwrap());
    policy.set_schedule(caller, party, 0, input).unwrap();
}

#[test]
fn reopened_policy_keeps_schedules_and_audit() {
    let dir = TempDir::new().unwrap();
    let gateway = InputAttestor::from_seed(&[0x42; 32]).unwrap();
    let config = durable_config(&dir, &gateway);
    // The engine's ciphertext ledger outlives the policy process
    let engine = ClearEngine::new(Identity::from_bytes([0xC0; 32]));

    let (hash, first) = {
        let policy = Curfew::open(&config, owner(), engine.clone()).unwrap();
        policy.assign_role(owner(), Party::Supervisor, supervisor()).unwrap();
        policy.assign_role(owner(), Party::Subject, subject()).unwrap();
        set(&policy, &gateway, supervisor(), Party::Supervisor, 0x60);
        set(&policy, &gateway, subject(), Party::Subject, 0x40);
        let first = policy
            .query_decision(owner(), Timestamp::from_secs(MONDAY_06))
            .unwrap();
        (policy.state_hash().unwrap(), first)
    };

    // Owner argument is ignored on reopen
    let policy = Curfew::open(&config, Identity::from_bytes([0xEE; 32]), engine.clone()).unwrap();
    assert_eq!(policy.state_hash().unwrap(), hash);
    assert_eq!(policy.roles().unwrap().owner, owner());

    let second = policy
        .query_decision(owner(), Timestamp::from_secs(MONDAY_06))
        .unwrap();
    let oracle = engine.oracle();
    assert!(oracle.public_bool(first.handle()).unwrap());
    assert!(oracle.public_bool(second.handle()).unwrap());

    let records = policy.audit_records().unwrap();
    assert_eq!(records.len(), 6);
    let sequences: Vec<u64> = records.iter().map(|r| r.sequence).collect();
    assert_eq!(sequences, (0..6).collect::<Vec<_>>());
    assert!(matches!(
        records[5].action,
        AuditAction::DecisionRecorded { handle, .. } if handle == second
    ));
}

#[test]
fn rejected_write_is_not_persisted() {
    let dir = TempDir::new().unwrap();
    let gateway = InputAttestor::from_seed(&[0x42; 32]).unwrap();
    let config = durable_config(&dir, &gateway);
    let engine = ClearEngine::new(Identity::from_bytes([0xC0; 32]));

    let hash = {
        let policy = Curfew::open(&config, owner(), engine.clone()).unwrap();
        let ct = policy.with_engine(|e| e.encrypt_u32(1)).unwrap().unwrap();
        let input = gateway.attest(ct.handle(), subject(), policy.policy_id().unwrap());
        // No subject assigned yet
        assert!(
            policy
                .set_schedule(subject(), Party::Subject, 0, input)
                .unwrap_err()
                .is_unauthorized()
        );
        policy.state_hash().unwrap()
    };

    let policy = Curfew::open(&config, owner(), engine).unwrap();
    assert_eq!(policy.state_hash().unwrap(), hash);
    assert!(policy.get_handles(0).unwrap().subject.is_none());
    assert!(policy.audit_records().unwrap().is_empty());
}

#[test]
fn store_bound_to_another_policy_is_refused() {
    let dir = TempDir::new().unwrap();
    let gateway = InputAttestor::from_seed(&[0x42; 32]).unwrap();
    let config = durable_config(&dir, &gateway);

    Curfew::open(&config, owner(), ClearEngine::new(Identity::from_bytes([0xC0; 32]))).unwrap();
    let err = Curfew::open(&config, owner(), ClearEngine::new(Identity::from_bytes([0xC1; 32])))
        .err()
        .unwrap();

    assert!(matches!(err, CurfewError::Store(_)));
}

#[test]
fn missing_trusted_key_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let config = CurfewConfig::durable(dir.path());

    let err = Curfew::open(&config, owner(), ClearEngine::new(Identity::from_bytes([0xC0; 32])))
        .err()
        .unwrap();

    assert!(matches!(err, CurfewError::Config(_)));
}

#[test]
fn config_file_drives_backends() {
    let dir = TempDir::new().unwrap();
    let gateway = InputAttestor::from_seed(&[0x42; 32]).unwrap();
    let key = AttestationConfig::encode_key(&gateway.verifying_key_bytes());
    std::fs::write(
        dir.path().join("curfew.toml"),
        format!(
            r#"
[policy]
name = "household"

[store]
backend = "file"

[audit]
backend = "jsonl"

[attestation]
trusted_key = "{key}"
"#
        ),
    )
    .unwrap();

    let config = curfew::ConfigLoader::new()
        .with_project_dir(dir.path())
        .without_user_config()
        .with_env_prefix("CURFEW_PERSISTENCE_TEST")
        .load()
        .unwrap();
    assert_eq!(config.policy.name, "household");
    assert!(config.store.data_dir.starts_with(dir.path()));

    let engine = ClearEngine::new(Identity::from_bytes([0xC0; 32]));
    let policy = Curfew::open(&config, owner(), engine).unwrap();
    policy.assign_role(owner(), Party::Subject, subject()).unwrap();

    assert!(config.audit.file.exists());
    assert!(config.store.data_dir.join("schedules.json").exists());
}
