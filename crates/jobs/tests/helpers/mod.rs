#![allow(dead_code)]

mod mock_messenger;
mod zones;

pub use mock_messenger::MockDnsMessenger;
pub use zones::{child_zone, parent_zone, rr, CHILD_ZONE, PARENT_ZONE};
