//! # curfew-types: Core types for `curfew`
//!
//! This crate contains shared types used across the `curfew` workspace:
//! - Identities ([`Identity`])
//! - Confidential value references ([`CiphertextHandle`], [`EncryptedU32`],
//!   [`EncryptedBool`], [`DecisionHandle`])
//! - Policy coordinates ([`Party`], [`Weekday`], [`Hour`])
//! - Temporal types ([`Timestamp`])
//! - Query and audit records ([`QueryContext`], [`AuditAction`])

use std::{
    fmt::{Debug, Display},
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

/// Writes `bytes` as lowercase hex.
fn write_hex(f: &mut std::fmt::Formatter<'_>, bytes: &[u8]) -> std::fmt::Result {
    for byte in bytes {
        write!(f, "{byte:02x}")?;
    }
    Ok(())
}

// ============================================================================
// Identity - Copy (fixed 32-byte value)
// ============================================================================

/// Length of identities and ciphertext handles in bytes.
pub const ID_LENGTH: usize = 32;

/// An account that submits commands or queries.
///
/// Identities are opaque 32-byte values. The role registry decides which
/// identity acts as [`Party::Supervisor`] or [`Party::Subject`]; the type
/// itself carries no privileges.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity([u8; ID_LENGTH]);

impl Identity {
    pub fn from_bytes(bytes: [u8; ID_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
        &self.0
    }
}

impl Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Identity(")?;
        write_hex(f, &self.0[..6])?;
        write!(f, "..)")
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_hex(f, &self.0)
    }
}

impl From<[u8; ID_LENGTH]> for Identity {
    fn from(bytes: [u8; ID_LENGTH]) -> Self {
        Self(bytes)
    }
}

// ============================================================================
// Confidential Handles
// ============================================================================

/// Opaque reference to a value held by a confidential engine.
///
/// A handle never encodes its plaintext. Two handles for semantically equal
/// values are usually different, because every engine operation produces a
/// fresh ciphertext.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CiphertextHandle([u8; ID_LENGTH]);

impl CiphertextHandle {
    pub fn from_bytes(bytes: [u8; ID_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
        &self.0
    }
}

impl Debug for CiphertextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // First 8 bytes are enough to tell handles apart in logs
        write!(f, "CiphertextHandle(")?;
        write_hex(f, &self.0[..8])?;
        write!(f, "...)")
    }
}

impl Display for CiphertextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_hex(f, &self.0)
    }
}

impl From<[u8; ID_LENGTH]> for CiphertextHandle {
    fn from(bytes: [u8; ID_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for CiphertextHandle {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Handle to a confidential 32-bit unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EncryptedU32(CiphertextHandle);

impl EncryptedU32 {
    pub fn new(handle: CiphertextHandle) -> Self {
        Self(handle)
    }

    pub fn handle(&self) -> CiphertextHandle {
        self.0
    }
}

/// Handle to a confidential boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EncryptedBool(CiphertextHandle);

impl EncryptedBool {
    pub fn new(handle: CiphertextHandle) -> Self {
        Self(handle)
    }

    pub fn handle(&self) -> CiphertextHandle {
        self.0
    }
}

/// Handle to a disclosed policy decision.
///
/// Only produced by the disclosure step, after the underlying boolean has been
/// marked publicly decryptable. Any observer may resolve it through an
/// off-path decryption service; the schedules behind it stay confidential.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DecisionHandle(CiphertextHandle);

impl DecisionHandle {
    pub fn new(handle: CiphertextHandle) -> Self {
        Self(handle)
    }

    pub fn handle(&self) -> CiphertextHandle {
        self.0
    }
}

impl Debug for DecisionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DecisionHandle(")?;
        write_hex(f, &self.0.as_bytes()[..8])?;
        write!(f, "...)")
    }
}

impl Display for DecisionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

// ============================================================================
// Policy Coordinates
// ============================================================================

/// One of the two rule holders whose schedules are intersected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Party {
    /// The supervising party.
    Supervisor,
    /// The supervised party.
    Subject,
}

impl Party {
    pub const ALL: [Party; 2] = [Party::Supervisor, Party::Subject];
}

impl Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Party::Supervisor => write!(f, "supervisor"),
            Party::Subject => write!(f, "subject"),
        }
    }
}

/// A value fell outside its permitted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    pub what: &'static str,
    pub value: u8,
    pub max: u8,
}

impl Display for OutOfRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} out of range [0, {}]", self.what, self.value, self.max)
    }
}

impl std::error::Error for OutOfRange {}

/// Day of the week, Monday = 0 through Sunday = 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Weekday(u8);

impl Weekday {
    pub const MONDAY: Weekday = Weekday(0);
    pub const TUESDAY: Weekday = Weekday(1);
    pub const WEDNESDAY: Weekday = Weekday(2);
    pub const THURSDAY: Weekday = Weekday(3);
    pub const FRIDAY: Weekday = Weekday(4);
    pub const SATURDAY: Weekday = Weekday(5);
    pub const SUNDAY: Weekday = Weekday(6);

    /// Number of days in a week.
    pub const COUNT: u8 = 7;

    /// Returns the zero-based index (Monday = 0).
    pub fn index(self) -> u8 {
        self.0
    }

    /// Builds a weekday from any day count, reducing it modulo 7.
    pub fn from_index_wrapping(index: u64) -> Self {
        Self((index % u64::from(Self::COUNT)) as u8)
    }

    /// Iterates Monday through Sunday.
    pub fn all() -> impl Iterator<Item = Weekday> {
        (0..Self::COUNT).map(Weekday)
    }
}

impl TryFrom<u8> for Weekday {
    type Error = OutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value < Self::COUNT {
            Ok(Self(value))
        } else {
            Err(OutOfRange {
                what: "weekday",
                value,
                max: Self::COUNT - 1,
            })
        }
    }
}

impl From<Weekday> for u8 {
    fn from(day: Weekday) -> Self {
        day.0
    }
}

impl Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
        write!(f, "{}", NAMES[self.0 as usize])
    }
}

/// Hour of the day in UTC, 0 through 23.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Hour(u8);

impl Hour {
    /// Number of hours in a day.
    pub const COUNT: u8 = 24;

    pub fn as_u8(self) -> u8 {
        self.0
    }

    /// Builds an hour from any hour count, reducing it modulo 24.
    pub fn from_index_wrapping(index: u64) -> Self {
        Self((index % u64::from(Self::COUNT)) as u8)
    }

    /// Iterates 0 through 23.
    pub fn all() -> impl Iterator<Item = Hour> {
        (0..Self::COUNT).map(Hour)
    }
}

impl TryFrom<u8> for Hour {
    type Error = OutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value < Self::COUNT {
            Ok(Self(value))
        } else {
            Err(OutOfRange {
                what: "hour",
                value,
                max: Self::COUNT - 1,
            })
        }
    }
}

impl From<Hour> for u8 {
    fn from(hour: Hour) -> Self {
        hour.0
    }
}

impl Display for Hour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

// ============================================================================
// Timestamp - Copy (seconds since Unix epoch, UTC)
// ============================================================================

/// Wall-clock instant in whole seconds since the Unix epoch (UTC).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The Unix epoch (1970-01-01 00:00:00 UTC).
    pub const EPOCH: Timestamp = Timestamp(0);

    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Creates a timestamp for the current time.
    ///
    /// A system clock set before the epoch reads as [`Timestamp::EPOCH`].
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self(secs)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

// ============================================================================
// Query & Audit
// ============================================================================

/// Who asked, and which (weekday, hour) slot the query resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    pub requester: Identity,
    pub weekday: Weekday,
    pub hour: Hour,
    pub timestamp: Timestamp,
}

/// Actions recorded in the append-only audit trail.
///
/// Audit actions reference confidential values by handle only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    /// A party replaced one of its day schedules.
    ScheduleUpdated {
        party: Party,
        weekday: Weekday,
        handle: EncryptedU32,
    },
    /// A party reset one of its day schedules to zero.
    ScheduleCleared { party: Party, weekday: Weekday },
    /// A query produced a disclosed decision.
    DecisionRecorded {
        requester: Identity,
        weekday: Weekday,
        hour: Hour,
        handle: DecisionHandle,
    },
    /// The policy owner designated the identity acting as a party.
    RoleAssigned { party: Party, identity: Identity },
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn weekday_accepts_zero_through_six() {
        for i in 0..7u8 {
            let day = Weekday::try_from(i).expect("in range");
            assert_eq!(day.index(), i);
        }
        assert_eq!(Weekday::all().count(), 7);
    }

    #[test_case(7; "just past sunday")]
    #[test_case(200; "far out")]
    #[test_case(u8::MAX; "max")]
    fn weekday_rejects_out_of_range(value: u8) {
        let err = Weekday::try_from(value).unwrap_err();
        assert_eq!(err.what, "weekday");
        assert_eq!(err.value, value);
        assert_eq!(err.max, 6);
    }

    #[test]
    fn hour_bounds() {
        assert!(Hour::try_from(0).is_ok());
        assert!(Hour::try_from(23).is_ok());
        assert!(Hour::try_from(24).is_err());
        assert_eq!(Hour::all().count(), 24);
    }

    #[test]
    fn weekday_serde_rejects_invalid_index() {
        let ok: Weekday = serde_json::from_str("4").unwrap();
        assert_eq!(ok, Weekday::FRIDAY);
        assert!(serde_json::from_str::<Weekday>("9").is_err());
        assert!(serde_json::from_str::<Hour>("24").is_err());
    }

    #[test]
    fn handle_display_is_full_hex() {
        let handle = CiphertextHandle::from_bytes([0xab; ID_LENGTH]);
        let shown = handle.to_string();
        assert_eq!(shown.len(), ID_LENGTH * 2);
        assert!(shown.chars().all(|c| c == 'a' || c == 'b'));
        assert!(format!("{handle:?}").ends_with("...)"));
    }

    #[test]
    fn weekday_display() {
        assert_eq!(Weekday::MONDAY.to_string(), "Mon");
        assert_eq!(Weekday::SUNDAY.to_string(), "Sun");
        assert_eq!(Hour::try_from(7).unwrap().to_string(), "07:00");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn weekday_roundtrips_through_u8(value in 0u8..7) {
                let day = Weekday::try_from(value).unwrap();
                prop_assert_eq!(u8::from(day), value);
            }
        }
    }
}
