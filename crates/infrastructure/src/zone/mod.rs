pub mod loader;
pub mod store;

pub use loader::{load_zone_file, parse_zone};
pub use store::{MemoryZone, MemoryZoneStore, RRTypeStore};
