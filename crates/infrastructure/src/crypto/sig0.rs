//! RFC 2931 SIG(0) transaction signatures.

use super::{serial_le, verify_signature};
use ferrous_dsync_domain::rr::wire::{encode_sig_fields, WireReader};
use ferrous_dsync_domain::rr::SigRdata;
use ferrous_dsync_domain::{
    DomainError, RecordClass, RecordData, RecordType, ResourceRecord, Sig0ActiveKeys,
};

/// Slack applied on both ends of the validity window.
pub const SIG0_CLOCK_SKEW: u32 = 60;

const HEADER_LEN: usize = 12;
const ARCOUNT_OFFSET: usize = 10;

pub fn unix_now() -> u32 {
    chrono::Utc::now().timestamp() as u32
}

/// Appends one SIG(0) per key to `wire`. Each signature covers the message
/// as it stands when that signature is added, so the last one covers all
/// earlier ones.
pub fn sign_message(
    wire: &[u8],
    keys: &Sig0ActiveKeys,
    validity: u32,
    now: u32,
) -> Result<Vec<u8>, DomainError> {
    if wire.len() < HEADER_LEN {
        return Err(DomainError::InvalidDnsResponse(
            "message shorter than a DNS header".to_string(),
        ));
    }
    let mut message = wire.to_vec();
    for key in &keys.keys {
        let mut sig = SigRdata {
            type_covered: RecordType::from(0u16),
            algorithm: key.algorithm,
            labels: 0,
            original_ttl: 0,
            expiration: now.wrapping_add(validity).wrapping_add(SIG0_CLOCK_SKEW),
            inception: now.wrapping_sub(SIG0_CLOCK_SKEW),
            key_tag: key.key_id,
            signer_name: key.signer_name().to_string(),
            signature: Vec::new(),
        };
        let mut signed = encode_sig_fields(&sig);
        signed.extend_from_slice(&message);
        sig.signature = key.signer.sign(&signed)?;

        let rr = ResourceRecord {
            name: ".".to_string(),
            class: RecordClass::ANY,
            ttl: 0,
            data: RecordData::Sig(sig),
        };
        message.extend_from_slice(&rr.to_wire());
        adjust_arcount(&mut message, 1)?;
    }
    Ok(message)
}

/// Checks the final SIG(0) of `wire` against `key_rr` (a KEY record).
pub fn verify_message(wire: &[u8], key_rr: &ResourceRecord, now: u32) -> Result<(), DomainError> {
    let key = key_rr
        .data
        .as_key()
        .ok_or_else(|| DomainError::InvalidRecord(format!("{} is not a KEY record", key_rr)))?;

    let (start, last) = last_record(wire)?;
    let sig = match last.data {
        RecordData::Sig(sig) if sig.type_covered.code() == 0 => sig,
        _ => {
            return Err(DomainError::SignatureError(
                "message carries no SIG(0)".to_string(),
            ))
        }
    };

    if sig.key_tag != key.key_tag() || sig.algorithm != key.algorithm {
        return Err(DomainError::SignatureError(format!(
            "SIG(0) made by key {} ({}), expected {} ({})",
            sig.key_tag,
            sig.algorithm,
            key.key_tag(),
            key.algorithm
        )));
    }
    if sig.signer_name != key_rr.name {
        return Err(DomainError::SignatureError(format!(
            "SIG(0) signer {} does not own key {}",
            sig.signer_name, key_rr.name
        )));
    }
    if !serial_le(sig.inception, now) || !serial_le(now, sig.expiration) {
        return Err(DomainError::SignatureError(
            "SIG(0) outside its validity window".to_string(),
        ));
    }

    let mut unsigned = wire[..start].to_vec();
    adjust_arcount(&mut unsigned, -1)?;
    let mut signed = encode_sig_fields(&sig);
    signed.extend_from_slice(&unsigned);

    if verify_signature(key.algorithm, &key.public_key, &signed, &sig.signature)? {
        Ok(())
    } else {
        Err(DomainError::SignatureError(
            "SIG(0) signature does not verify".to_string(),
        ))
    }
}

fn adjust_arcount(message: &mut [u8], delta: i32) -> Result<(), DomainError> {
    let current = u16::from_be_bytes([message[ARCOUNT_OFFSET], message[ARCOUNT_OFFSET + 1]]);
    let updated = u16::try_from(current as i32 + delta).map_err(|_| {
        DomainError::InvalidDnsResponse("additional record count out of range".to_string())
    })?;
    message[ARCOUNT_OFFSET..ARCOUNT_OFFSET + 2].copy_from_slice(&updated.to_be_bytes());
    Ok(())
}

/// Offset and contents of the last record in the message.
fn last_record(wire: &[u8]) -> Result<(usize, ResourceRecord), DomainError> {
    let mut reader = WireReader::new(wire);
    let _id = reader.read_u16()?;
    let _flags = reader.read_u16()?;
    let qdcount = reader.read_u16()?;
    let mut total = 0usize;
    for _ in 0..3 {
        total += reader.read_u16()? as usize;
    }

    for _ in 0..qdcount {
        reader.read_name()?;
        reader.read_u16()?;
        reader.read_u16()?;
    }
    if total == 0 {
        return Err(DomainError::SignatureError(
            "message carries no records".to_string(),
        ));
    }
    // Earlier records may use compression inside their rdata; only skip them.
    for _ in 1..total {
        reader.read_name()?;
        reader.read_bytes(8)?;
        let rdlength = reader.read_u16()? as usize;
        reader.read_bytes(rdlength)?;
    }
    let start = reader.position();
    Ok((start, ResourceRecord::read(&mut reader)?))
}
