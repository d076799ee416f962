//! Homomorphic evaluation of a single (weekday, hour) slot.
//!
//! A slot is permitted iff both parties' masks have the hour bit set:
//!
//! ```text
//! ((A & bit) > 0) AND ((B & bit) > 0)
//! ```
//!
//! The operation sequence is identical for every input, so the shape of the
//! computation reveals nothing about the schedules behind it.

use curfew_crypto::{ConfidentialEngine, CryptoError};
use curfew_types::{EncryptedBool, EncryptedU32, Hour};

/// Returns the mask bit for `hour`. Bits 24..=31 are never produced.
pub fn hour_bit(hour: Hour) -> u32 {
    1u32 << hour.as_u8()
}

/// Computes the encrypted decision for `hour` from two day masks.
///
/// Issues, in order: two trivial encryptions (bit, zero), then
/// `bit_and` + `gt` per party, then one boolean `and`.
pub fn evaluate<E: ConfidentialEngine + ?Sized>(
    engine: &mut E,
    supervisor: EncryptedU32,
    subject: EncryptedU32,
    hour: Hour,
) -> Result<EncryptedBool, CryptoError> {
    let bit = engine.trivial_u32(hour_bit(hour))?;
    let zero = engine.trivial_u32(0)?;

    let supervisor_masked = engine.bit_and(supervisor, bit)?;
    let supervisor_allows = engine.gt(supervisor_masked, zero)?;

    let subject_masked = engine.bit_and(subject, bit)?;
    let subject_allows = engine.gt(subject_masked, zero)?;

    engine.and(supervisor_allows, subject_allows)
}
