pub mod differ;
pub mod sync_records;
pub mod update_builder;

pub use differ::{rrset_differ, RRsetDiff};
pub use sync_records::{
    cds_records, csync_record, delete_cds_record, replace_rrset_actions,
};
pub use update_builder::create_update;
