//! Public disclosure of decisions.

use curfew_crypto::{ConfidentialEngine, CryptoError};
use curfew_types::{DecisionHandle, EncryptedBool};

/// Marks `decision` publicly decryptable and returns its handle.
///
/// This is the only path by which the kernel makes anything public. It takes
/// an [`EncryptedBool`], so a schedule mask cannot be passed in.
pub fn disclose<E: ConfidentialEngine + ?Sized>(
    engine: &mut E,
    decision: EncryptedBool,
) -> Result<DecisionHandle, CryptoError> {
    engine.make_publicly_decryptable(decision)?;
    Ok(DecisionHandle::new(decision.handle()))
}
