#![allow(dead_code)]

mod builders;
mod dns_server_mock;

pub use builders::{rr, sig0_keys, test_key_store, test_pool, TestKey};
pub use dns_server_mock::{MockDnsServer, Reply};
