pub mod key_cache;
pub mod key_store;

pub use key_cache::KeyCache;
pub use key_store::{SqliteKeyStore, SqliteKeyStoreTx};
