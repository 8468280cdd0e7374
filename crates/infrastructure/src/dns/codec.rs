//! Bridge between `hickory-proto` records and the domain record model.
//!
//! Both directions go through uncompressed wire form, so record kinds
//! hickory only knows as opaque rdata (KEY, SIG, DSYNC, ...) survive.

use ferrous_dsync_domain::{DomainError, ResourceRecord};
use hickory_proto::rr::Record;
use hickory_proto::serialize::binary::{BinDecodable, BinDecoder, BinEncodable, BinEncoder};

pub fn to_hickory(rr: &ResourceRecord) -> Result<Record, DomainError> {
    let wire = rr.to_wire();
    let mut decoder = BinDecoder::new(&wire);
    Record::read(&mut decoder)
        .map_err(|e| DomainError::InvalidRecord(format!("cannot encode {}: {}", rr, e)))
}

pub fn from_hickory(record: &Record) -> Result<ResourceRecord, DomainError> {
    let mut buffer = Vec::with_capacity(64);
    {
        let mut encoder = BinEncoder::new(&mut buffer);
        encoder.set_canonical_names(true);
        record
            .emit(&mut encoder)
            .map_err(|e| DomainError::InvalidDnsResponse(format!("cannot re-encode record: {}", e)))?;
    }
    ResourceRecord::from_wire(&buffer)
}
