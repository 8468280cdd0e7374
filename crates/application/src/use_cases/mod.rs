pub mod delegation;
pub mod dsync;
pub mod keys;

// Re-export use cases
pub use delegation::{
    delegation_data_changed, dnskeys_changed, AnalyseDelegationUseCase, SyncDelegationUseCase,
};
pub use dsync::DsyncDiscoveryUseCase;
pub use keys::{
    BootstrapOutcome, BootstrapSig0KeyUseCase, ManageKeysUseCase, PublishSig0KeyUseCase,
    RolloverAction, RolloverOutcome, RolloverSig0KeyUseCase,
};

use crate::ports::KeyStoreTx;
use ferrous_dsync_domain::DomainError;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::warn;

/// Waits for an engine's reply, bounded by `limit`.
pub(crate) async fn await_reply<T>(
    rx: oneshot::Receiver<T>,
    limit: Duration,
    engine: &str,
) -> Result<T, DomainError> {
    match tokio::time::timeout(limit, rx).await {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(_)) => Err(DomainError::ChannelClosed(format!(
            "{} dropped the reply channel",
            engine
        ))),
        Err(_) => Err(DomainError::TransportTimeout(format!(
            "{} did not answer within {:?}",
            engine, limit
        ))),
    }
}

/// Commits on success, rolls back on failure and returns the original
/// result.
pub(crate) async fn finish_tx<T>(
    tx: Box<dyn KeyStoreTx>,
    result: Result<T, DomainError>,
) -> Result<T, DomainError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "Rollback failed");
            }
            Err(e)
        }
    }
}
