//! Resource record model.

pub mod dsync;
pub mod rdata;
pub mod record;
pub mod record_type;
pub mod wire;

pub use dsync::{DsyncRdata, MsignerRdata, MsignerScheme, MsignerState, SyncScheme};
pub use rdata::{CsyncRdata, DsRdata, KeyRdata, RecordData, SigRdata, SoaRdata};
pub use record::{OwnerData, RRset, ResourceRecord};
pub use record_type::{RecordClass, RecordType, DSYNC_TYPE_CODE, MSIGNER_TYPE_CODE};
