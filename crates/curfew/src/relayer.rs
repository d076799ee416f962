//! Off-path resolution of disclosed decisions.
//!
//! Disclosure inside the policy only marks a boolean as publicly decryptable.
//! Turning a [`DecisionHandle`] into `true`/`false` happens here, outside the
//! ordered command path, through a [`DecryptionService`]. A decision may not
//! be resolvable the moment it is disclosed, so [`Relayer`] polls with a
//! fixed interval up to a bounded number of attempts. There is no
//! cancellation and no expiry: a disclosed handle stays resolvable.

use std::future::Future;
use std::time::Duration;

use curfew_config::RelayerConfig;
use curfew_crypto::{ClearOracle, CryptoError};
use curfew_types::DecisionHandle;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayerError {
    /// The handle has not (yet) been made publicly decryptable.
    #[error("decision {0} is not yet publicly decryptable")]
    NotYetPublic(DecisionHandle),

    #[error("decryption service failed: {0}")]
    Service(String),

    #[error("decision {handle} still unresolved after {attempts} attempts")]
    Exhausted {
        handle: DecisionHandle,
        attempts: u32,
    },
}

/// Asynchronous public decryption of disclosed decisions.
pub trait DecryptionService {
    fn public_decrypt(
        &self,
        handle: DecisionHandle,
    ) -> impl Future<Output = Result<bool, RelayerError>> + Send;
}

impl DecryptionService for ClearOracle {
    async fn public_decrypt(&self, handle: DecisionHandle) -> Result<bool, RelayerError> {
        self.public_bool(handle.handle()).map_err(|e| match e {
            CryptoError::NotPublic(_) => RelayerError::NotYetPublic(handle),
            other => RelayerError::Service(other.to_string()),
        })
    }
}

/// Retrying client over a [`DecryptionService`].
#[derive(Debug, Clone)]
pub struct Relayer<D> {
    service: D,
    max_attempts: u32,
    retry_interval: Duration,
}

impl<D: DecryptionService> Relayer<D> {
    pub fn new(service: D, max_attempts: u32, retry_interval: Duration) -> Self {
        Self {
            service,
            max_attempts: max_attempts.max(1),
            retry_interval,
        }
    }

    pub fn from_config(service: D, config: &RelayerConfig) -> Self {
        Self::new(service, config.max_attempts, config.retry_interval())
    }

    /// Resolves `handle`, retrying while it is not yet public.
    ///
    /// Any other service error is returned immediately.
    pub async fn resolve(&self, handle: DecisionHandle) -> Result<bool, RelayerError> {
        for attempt in 1..=self.max_attempts {
            match self.service.public_decrypt(handle).await {
                Ok(value) => {
                    tracing::debug!(%handle, attempt, "decision resolved");
                    return Ok(value);
                }
                Err(RelayerError::NotYetPublic(_)) if attempt < self.max_attempts => {
                    tracing::debug!(%handle, attempt, "decision not yet public, retrying");
                    tokio::time::sleep(self.retry_interval).await;
                }
                Err(RelayerError::NotYetPublic(_)) => break,
                Err(e) => {
                    tracing::warn!(%handle, attempt, error = %e, "decryption failed");
                    return Err(e);
                }
            }
        }

        Err(RelayerError::Exhausted {
            handle,
            attempts: self.max_attempts,
        })
    }
}
