#![allow(dead_code)]
#![allow(unused_imports)]

mod mock_keys;
mod mock_messenger;
mod mock_queues;
mod mock_zone;

pub use mock_keys::{FakeSigner, MockKeyStore};
pub use mock_messenger::{response, rr, MockDnsMessenger};
pub use mock_queues::{MockNotifyQueue, MockZoneUpdateQueue};
pub use mock_zone::{MockZone, MockZoneStore};
