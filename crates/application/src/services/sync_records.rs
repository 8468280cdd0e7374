//! CDS and CSYNC records the child publishes for a parent that polls or is
//! notified.

use ferrous_dsync_domain::rr::rdata::{CSYNC_FLAG_IMMEDIATE, CSYNC_FLAG_SOAMINIMUM};
use ferrous_dsync_domain::rr::wire::name_to_wire;
use ferrous_dsync_domain::rr::{CsyncRdata, DsRdata};
use ferrous_dsync_domain::{Algorithm, DomainError, RecordData, RecordType, ResourceRecord};
use sha2::{Digest, Sha256};

pub const DIGEST_SHA256: u8 = 2;

/// CDS records (SHA-256) for every SEP key in `dnskeys`. With no DNSKEY
/// at all the answer is the RFC 8078 delete request.
///
/// # Errors
///
/// * `DomainError::NoActiveKey` - if there are DNSKEYs but none has the
///   SEP flag
pub fn cds_records(
    zone: &str,
    dnskeys: &[ResourceRecord],
    ttl: u32,
) -> Result<Vec<ResourceRecord>, DomainError> {
    if !dnskeys.iter().any(|rr| rr.record_type() == RecordType::DNSKEY) {
        return Ok(vec![delete_cds_record(zone, ttl)]);
    }
    let mut out = Vec::new();
    for rr in dnskeys {
        let key = match &rr.data {
            RecordData::Dnskey(key) if key.is_sep() => key,
            _ => continue,
        };
        let mut input = Vec::new();
        name_to_wire(&rr.name, &mut input);
        input.extend_from_slice(&key.to_wire());
        let digest = Sha256::digest(&input).to_vec();
        out.push(ResourceRecord::new(
            zone,
            ttl,
            RecordData::Cds(DsRdata {
                key_tag: key.key_tag(),
                algorithm: key.algorithm,
                digest_type: DIGEST_SHA256,
                digest,
            }),
        ));
    }
    if out.is_empty() {
        return Err(DomainError::NoActiveKey {
            zone: zone.to_string(),
            kind: "KSK",
        });
    }
    Ok(out)
}

/// `CDS 0 0 0 00`: asks the parent to remove the DS RRset.
pub fn delete_cds_record(zone: &str, ttl: u32) -> ResourceRecord {
    ResourceRecord::new(
        zone,
        ttl,
        RecordData::Cds(DsRdata {
            key_tag: 0,
            algorithm: Algorithm::Unknown(0),
            digest_type: 0,
            digest: vec![0],
        }),
    )
}

/// CSYNC asking the parent to copy NS, A and AAAA once it sees `serial`.
pub fn csync_record(zone: &str, serial: u32, ttl: u32) -> ResourceRecord {
    ResourceRecord::new(
        zone,
        ttl,
        RecordData::Csync(CsyncRdata {
            serial,
            flags: CSYNC_FLAG_IMMEDIATE | CSYNC_FLAG_SOAMINIMUM,
            types: vec![RecordType::A, RecordType::NS, RecordType::AAAA],
        }),
    )
}

/// Actions that replace the apex RRset of `rtype` with `records`.
pub fn replace_rrset_actions(
    zone: &str,
    rtype: RecordType,
    records: Vec<ResourceRecord>,
) -> Vec<ResourceRecord> {
    let mut actions = vec![ResourceRecord::delete_rrset(zone, rtype)];
    actions.extend(records);
    actions
}
