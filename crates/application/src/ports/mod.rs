mod dns_messenger;
mod key_store;
mod notify_queue;
mod zone_signer;
mod zone_store;

pub use dns_messenger::{DnsMessenger, QueryResponse};
pub use key_store::{KeyStore, KeyStoreTx};
pub use notify_queue::{NotifyQueue, NotifyRequest, NotifyResponse};
pub use zone_signer::ZoneSigner;
pub use zone_store::{
    Delegation, ZoneData, ZoneStore, ZoneUpdateCmd, ZoneUpdateQueue, ZoneUpdateRequest,
    ZoneUpdateResponse,
};
