mod bootstrap;
mod manage;
mod publish;
mod rollover;

pub use bootstrap::{BootstrapOutcome, BootstrapSig0KeyUseCase};
pub use manage::ManageKeysUseCase;
pub use publish::PublishSig0KeyUseCase;
pub use rollover::{RolloverAction, RolloverOutcome, RolloverSig0KeyUseCase};

use crate::ports::KeyStore;
use crate::use_cases::finish_tx;
use ferrous_dsync_domain::{Algorithm, DomainError, KeyState, PrivateKeyCache};
use std::sync::Arc;
use tracing::warn;

/// Generates a SIG(0) key and commits it as `created` in its own short
/// transaction. A `created` key never signs anything on its own.
async fn stage_sig0_key(
    keys: &dyn KeyStore,
    zone: &str,
    algorithm: Algorithm,
    creator: &str,
) -> Result<Arc<PrivateKeyCache>, DomainError> {
    let mut tx = keys.begin().await?;
    let record = tx
        .generate_sig0_key(zone, algorithm, KeyState::Created, creator)
        .await;
    let record = finish_tx(tx, record).await?;
    Ok(Arc::new(keys.sig0_key_from_record(&record)?))
}

/// Moves a staged key to `state` once the parent accepted it, or drops it
/// when the parent did not. Returns the outcome of the exchange.
async fn settle_sig0_key<T>(
    keys: &dyn KeyStore,
    zone: &str,
    key_id: u16,
    state: KeyState,
    exchange: Result<T, DomainError>,
) -> Result<T, DomainError> {
    let mut tx = keys.begin().await?;
    match exchange {
        Ok(value) => {
            let moved = tx.set_sig0_key_state(zone, key_id, state).await;
            finish_tx(tx, moved).await?;
            Ok(value)
        }
        Err(e) => {
            let dropped = tx.delete_sig0_key(zone, key_id).await;
            if let Err(cleanup) = finish_tx(tx, dropped).await {
                warn!(zone = %zone, key_id, error = %cleanup, "Staged SIG(0) key left behind");
            }
            Err(e)
        }
    }
}
