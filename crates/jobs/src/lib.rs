pub mod delegation_check;
pub mod delegation_syncher;
pub mod key_bootstrapper;
pub mod notifier;
pub mod queues;
pub mod requests;
pub mod runner;
pub mod zone_updater;

pub use delegation_check::DelegationCheckJob;
pub use delegation_syncher::DelegationSyncherJob;
pub use key_bootstrapper::KeyBootstrapperJob;
pub use notifier::NotifierJob;
pub use queues::{
    delegation_sync_channel, key_lifecycle_channel, notify_channel, zone_update_channel,
    ChannelNotifyQueue, ChannelZoneUpdateQueue, DelegationSyncHandle, KeyLifecycleHandle,
};
pub use requests::{
    DelegationSyncRequest, DelegationSyncResponse, KeyLifecycleCommand, KeyLifecycleRequest,
    KeyLifecycleResponse, SyncCommand,
};
pub use runner::JobRunner;
pub use zone_updater::ZoneUpdaterJob;
