//! Durable storage for roles and schedule handles.
//!
//! The store is keyed by (party, weekday) and only ever holds handles, never
//! plaintext. Each committed command becomes one [`WriteBatch`], applied
//! atomically: either every write in it lands or none does.
//!
//! [`FileScheduleStore`] keeps a JSON snapshot that carries the kernel state
//! hash. On load the hash is recomputed and a mismatch is reported as
//! [`StoreError::Corrupt`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use curfew_kernel::{Effect, RoleAssignments, State};
use curfew_types::{EncryptedU32, Identity, Party, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Snapshot file name inside the data directory.
pub const SNAPSHOT_FILE: &str = "schedules.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("snapshot is corrupt: {0}")]
    Corrupt(String),

    #[error("snapshot belongs to policy {found}, expected {expected}")]
    PolicyMismatch { expected: Identity, found: Identity },

    #[error("first batch for an empty store must carry the role table")]
    Uninitialized,
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// One key-value write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreWrite {
    Slot {
        party: Party,
        weekday: Weekday,
        value: EncryptedU32,
    },
    Roles(RoleAssignments),
}

/// The persistent writes produced by one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteBatch {
    pub policy_id: Identity,
    pub writes: Vec<StoreWrite>,
    /// Hash of the kernel state after this batch.
    pub state_hash: [u8; 32],
}

impl WriteBatch {
    /// Collects the persistent effects of a command.
    pub fn from_effects(state: &State, effects: &[Effect]) -> Self {
        let writes = effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::SlotWrite {
                    party,
                    weekday,
                    value,
                } => Some(StoreWrite::Slot {
                    party: *party,
                    weekday: *weekday,
                    value: *value,
                }),
                Effect::RolesWrite(roles) => Some(StoreWrite::Roles(*roles)),
                Effect::DecisionDisclosed { .. } | Effect::AuditLogAppend(_) => None,
            })
            .collect();
        Self {
            policy_id: state.policy_id(),
            writes,
            state_hash: state.compute_state_hash(),
        }
    }

    /// The batch that seeds an empty store with `state`.
    pub fn genesis(state: &State) -> Self {
        let mut writes = vec![StoreWrite::Roles(*state.roles())];
        writes.extend(
            state
                .slots()
                .map(|((party, weekday), value)| StoreWrite::Slot {
                    party,
                    weekday,
                    value,
                }),
        );
        Self {
            policy_id: state.policy_id(),
            writes,
            state_hash: state.compute_state_hash(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// A stored (party, weekday) entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub party: Party,
    pub weekday: Weekday,
    pub value: EncryptedU32,
}

/// Everything needed to rebuild kernel state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub policy_id: Identity,
    pub roles: RoleAssignments,
    pub slots: Vec<SlotEntry>,
    pub state_hash: [u8; 32],
}

impl Snapshot {
    pub fn of(state: &State) -> Self {
        Self {
            policy_id: state.policy_id(),
            roles: *state.roles(),
            slots: state
                .slots()
                .map(|((party, weekday), value)| SlotEntry {
                    party,
                    weekday,
                    value,
                })
                .collect(),
            state_hash: state.compute_state_hash(),
        }
    }

    /// Applies `batch` on top of `base`, or starts fresh when there is none.
    fn apply(base: Option<Snapshot>, batch: &WriteBatch) -> Result<Snapshot> {
        let mut snapshot = match base {
            Some(snapshot) => {
                if snapshot.policy_id != batch.policy_id {
                    return Err(StoreError::PolicyMismatch {
                        expected: snapshot.policy_id,
                        found: batch.policy_id,
                    });
                }
                snapshot
            }
            None => {
                let roles = batch
                    .writes
                    .iter()
                    .find_map(|w| match w {
                        StoreWrite::Roles(roles) => Some(*roles),
                        StoreWrite::Slot { .. } => None,
                    })
                    .ok_or(StoreError::Uninitialized)?;
                Snapshot {
                    policy_id: batch.policy_id,
                    roles,
                    slots: Vec::new(),
                    state_hash: [0; 32],
                }
            }
        };

        for write in &batch.writes {
            match *write {
                StoreWrite::Roles(roles) => snapshot.roles = roles,
                StoreWrite::Slot {
                    party,
                    weekday,
                    value,
                } => match snapshot
                    .slots
                    .iter_mut()
                    .find(|e| e.party == party && e.weekday == weekday)
                {
                    Some(entry) => entry.value = value,
                    None => snapshot.slots.push(SlotEntry {
                        party,
                        weekday,
                        value,
                    }),
                },
            }
        }
        snapshot.slots.sort_by_key(|e| (e.party, e.weekday));
        snapshot.state_hash = batch.state_hash;
        Ok(snapshot)
    }

    /// Rebuilds kernel state, checking the recorded hash.
    pub fn into_state(self) -> Result<State> {
        let state = State::restore(
            self.policy_id,
            self.roles,
            self.slots
                .into_iter()
                .map(|e| ((e.party, e.weekday), e.value)),
        );
        if state.compute_state_hash() != self.state_hash {
            return Err(StoreError::Corrupt(
                "state hash does not match snapshot contents".to_string(),
            ));
        }
        Ok(state)
    }
}

/// Persistence port for policy state.
pub trait ScheduleStore: Send + Sync {
    /// Returns the last committed snapshot, if any.
    fn load(&self) -> Result<Option<Snapshot>>;

    /// Atomically applies one command's writes.
    fn commit(&mut self, batch: &WriteBatch) -> Result<()>;
}

/// Volatile store for tests and ephemeral policies.
#[derive(Debug, Default)]
pub struct MemoryScheduleStore {
    current: Option<Snapshot>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScheduleStore for MemoryScheduleStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        Ok(self.current.clone())
    }

    fn commit(&mut self, batch: &WriteBatch) -> Result<()> {
        self.current = Some(Snapshot::apply(self.current.clone(), batch)?);
        Ok(())
    }
}

/// JSON snapshot on disk, replaced atomically on each commit.
#[derive(Debug)]
pub struct FileScheduleStore {
    path: PathBuf,
    current: Option<Snapshot>,
}

impl FileScheduleStore {
    /// Opens (or prepares) the snapshot in `data_dir`.
    ///
    /// Creates the directory if needed. An existing snapshot is read and
    /// verified immediately.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = data_dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(SNAPSHOT_FILE);
        let current = Self::read(&path)?;
        Ok(Self { path, current })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(path: &Path) -> Result<Option<Snapshot>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let snapshot: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", path.display())))?;

        // Verify before handing it out
        snapshot.clone().into_state()?;
        Ok(Some(snapshot))
    }

    fn write_atomic(&self, snapshot: &Snapshot) -> Result<()> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        let tmp = self.path.with_extension("json.tmp");
        let encoded = serde_json::to_vec_pretty(snapshot)?;

        let mut file = fs::File::create(&tmp).map_err(io_err)?;
        file.write_all(&encoded).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl ScheduleStore for FileScheduleStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        Ok(self.current.clone())
    }

    fn commit(&mut self, batch: &WriteBatch) -> Result<()> {
        let next = Snapshot::apply(self.current.clone(), batch)?;
        self.write_atomic(&next)?;
        self.current = Some(next);
        Ok(())
    }
}
