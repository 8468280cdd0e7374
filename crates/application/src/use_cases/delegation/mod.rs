mod analyse;
mod changes;
mod sync;

pub use analyse::AnalyseDelegationUseCase;
pub use changes::{delegation_data_changed, dnskeys_changed};
pub use sync::{SyncDelegationUseCase, SYNC_RECORD_TTL};
