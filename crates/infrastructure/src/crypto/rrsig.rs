use super::sig0::unix_now;
use super::{serial_le, verify_signature};
use ferrous_dsync_application::ports::ZoneSigner;
use ferrous_dsync_domain::name::{fqdn, labels};
use ferrous_dsync_domain::rr::wire::{encode_rdata, encode_sig_fields, name_to_wire};
use ferrous_dsync_domain::rr::SigRdata;
use ferrous_dsync_domain::{
    DnssecActiveKeys, DomainError, RRset, RecordData, RecordType, ResourceRecord,
};

/// Signatures start this far in the past to absorb clock skew.
const RRSIG_INCEPTION_OFFSET: u32 = 3600;

/// Online RRSIG generation with the zone's active DNSSEC keys.
pub struct RingZoneSigner {
    validity: u32,
}

impl RingZoneSigner {
    pub fn new(validity: u32) -> Self {
        Self { validity }
    }
}

impl ZoneSigner for RingZoneSigner {
    fn sign_rrset(
        &self,
        zone: &str,
        rrset: &RRset,
        keys: &DnssecActiveKeys,
    ) -> Result<Vec<ResourceRecord>, DomainError> {
        if rrset.is_empty() {
            return Ok(Vec::new());
        }
        let signing_keys = match rrset.rtype {
            RecordType::DNSKEY | RecordType::CDS | RecordType::CDNSKEY => &keys.ksks,
            _ => &keys.zsks,
        };

        let now = unix_now();
        let original_ttl = rrset.ttl();
        let mut rrsigs = Vec::with_capacity(signing_keys.len());
        for key in signing_keys {
            let mut sig = SigRdata {
                type_covered: rrset.rtype,
                algorithm: key.algorithm,
                labels: owner_labels(&rrset.name),
                original_ttl,
                expiration: now.wrapping_add(self.validity),
                inception: now.wrapping_sub(RRSIG_INCEPTION_OFFSET),
                key_tag: key.key_id,
                signer_name: fqdn(zone),
                signature: Vec::new(),
            };
            let data = signed_data(&sig, rrset);
            sig.signature = key.signer.sign(&data)?;
            rrsigs.push(ResourceRecord::new(
                &rrset.name,
                original_ttl,
                RecordData::Rrsig(sig),
            ));
        }
        Ok(rrsigs)
    }
}

/// Checks one RRSIG over `rrset` with a DNSKEY record.
pub fn verify_rrsig(
    rrset: &RRset,
    rrsig: &ResourceRecord,
    dnskey: &ResourceRecord,
) -> Result<bool, DomainError> {
    let (Some(sig), Some(key)) = (rrsig.data.as_sig(), dnskey.data.as_key()) else {
        return Err(DomainError::InvalidRecord(
            "expected an RRSIG and a DNSKEY".to_string(),
        ));
    };
    if sig.key_tag != key.key_tag() || sig.algorithm != key.algorithm {
        return Ok(false);
    }
    let now = unix_now();
    if !serial_le(sig.inception, now) || !serial_le(now, sig.expiration) {
        return Ok(false);
    }
    verify_signature(key.algorithm, &key.public_key, &signed_data(sig, rrset), &sig.signature)
}

fn owner_labels(name: &str) -> u8 {
    let labels = labels(name);
    let count = if labels.first() == Some(&"*") {
        labels.len() - 1
    } else {
        labels.len()
    };
    count as u8
}

/// RFC 4034 section 3.1.8.1: RRSIG rdata without the signature, then the
/// RRset in canonical order with the original TTL.
fn signed_data(sig: &SigRdata, rrset: &RRset) -> Vec<u8> {
    let mut rdatas: Vec<Vec<u8>> = rrset.records.iter().map(|rr| encode_rdata(&rr.data)).collect();
    rdatas.sort();
    rdatas.dedup();

    let mut owner = Vec::new();
    name_to_wire(&rrset.name, &mut owner);
    let class = rrset
        .records
        .first()
        .map(|rr| rr.class.code())
        .unwrap_or(1);

    let mut out = encode_sig_fields(sig);
    for rdata in rdatas {
        out.extend_from_slice(&owner);
        out.extend_from_slice(&rrset.rtype.code().to_be_bytes());
        out.extend_from_slice(&class.to_be_bytes());
        out.extend_from_slice(&sig.original_ttl.to_be_bytes());
        out.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        out.extend_from_slice(&rdata);
    }
    out
}
