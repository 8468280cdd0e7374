//! Uncompressed wire encoding of names and rdata.
//!
//! Everything here produces the canonical form of RFC 4034 section 6.2
//! (lower-case names, no compression), which is what signatures are
//! computed over. Decoding accepts compression pointers so whole messages
//! can be walked with the same reader.

use super::dsync::{DsyncRdata, MsignerRdata};
use super::rdata::{CsyncRdata, DsRdata, KeyRdata, RecordData, SigRdata, SoaRdata};
use super::record_type::RecordType;
use crate::keys::Algorithm;
use crate::name::{fqdn, labels};
use crate::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr};

const MAX_POINTER_HOPS: usize = 64;

pub fn name_to_wire(name: &str, out: &mut Vec<u8>) {
    for label in labels(&fqdn(name)) {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
}

pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn truncated(&self, what: &str) -> DomainError {
        DomainError::InvalidDnsResponse(format!("truncated {} at offset {}", what, self.pos))
    }

    pub fn read_u8(&mut self) -> Result<u8, DomainError> {
        let byte = *self.buf.get(self.pos).ok_or_else(|| self.truncated("u8"))?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_u16(&mut self) -> Result<u16, DomainError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, DomainError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DomainError> {
        let end = self.pos.checked_add(len).ok_or_else(|| self.truncated("data"))?;
        let bytes = self.buf.get(self.pos..end).ok_or_else(|| self.truncated("data"))?;
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_rest(&mut self) -> &'a [u8] {
        let rest = &self.buf[self.pos.min(self.buf.len())..];
        self.pos = self.buf.len();
        rest
    }

    /// Reads a possibly compressed name and returns it lower-cased and
    /// absolute.
    pub fn read_name(&mut self) -> Result<String, DomainError> {
        let mut labels: Vec<String> = Vec::new();
        let mut cursor = self.pos;
        let mut jumped = false;
        let mut hops = 0;
        loop {
            let len = *self.buf.get(cursor).ok_or_else(|| self.truncated("name"))? as usize;
            if len == 0 {
                cursor += 1;
                break;
            }
            if len & 0xC0 == 0xC0 {
                let low = *self.buf.get(cursor + 1).ok_or_else(|| self.truncated("name"))?;
                if !jumped {
                    self.pos = cursor + 2;
                    jumped = true;
                }
                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(DomainError::InvalidDnsResponse(
                        "name compression loop".to_string(),
                    ));
                }
                cursor = ((len & 0x3F) << 8) | low as usize;
                continue;
            }
            let label = self
                .buf
                .get(cursor + 1..cursor + 1 + len)
                .ok_or_else(|| self.truncated("label"))?;
            labels.push(String::from_utf8_lossy(label).to_ascii_lowercase());
            cursor += 1 + len;
        }
        if !jumped {
            self.pos = cursor;
        }
        if labels.is_empty() {
            return Ok(".".to_string());
        }
        Ok(format!("{}.", labels.join(".")))
    }
}

pub fn encode_rdata(data: &RecordData) -> Vec<u8> {
    let mut out = Vec::new();
    match data {
        RecordData::A(addr) => out.extend_from_slice(&addr.octets()),
        RecordData::Aaaa(addr) => out.extend_from_slice(&addr.octets()),
        RecordData::Ns(target) => name_to_wire(target, &mut out),
        RecordData::Soa(soa) => {
            name_to_wire(&soa.mname, &mut out);
            name_to_wire(&soa.rname, &mut out);
            for value in [soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum] {
                out.extend_from_slice(&value.to_be_bytes());
            }
        }
        RecordData::Key(k) | RecordData::Dnskey(k) | RecordData::Cdnskey(k) => {
            out.extend_from_slice(&k.to_wire())
        }
        RecordData::Ds(ds) | RecordData::Cds(ds) => {
            out.extend_from_slice(&ds.key_tag.to_be_bytes());
            out.push(ds.algorithm.code());
            out.push(ds.digest_type);
            out.extend_from_slice(&ds.digest);
        }
        RecordData::Sig(sig) | RecordData::Rrsig(sig) => {
            out.extend_from_slice(&encode_sig_fields(sig));
            out.extend_from_slice(&sig.signature);
        }
        RecordData::Csync(csync) => {
            out.extend_from_slice(&csync.serial.to_be_bytes());
            out.extend_from_slice(&csync.flags.to_be_bytes());
            encode_type_bitmap(&csync.types, &mut out);
        }
        RecordData::Dsync(dsync) => {
            out.extend_from_slice(&dsync.rrtype.code().to_be_bytes());
            out.push(dsync.scheme.code());
            out.extend_from_slice(&dsync.port.to_be_bytes());
            name_to_wire(&dsync.target, &mut out);
        }
        RecordData::Msigner(msigner) => {
            out.push(msigner.state.code());
            out.push(msigner.scheme.code());
            name_to_wire(&msigner.target, &mut out);
        }
        RecordData::Unknown { data, .. } => out.extend_from_slice(data),
        RecordData::Empty(_) => {}
    }
    out
}

/// SIG/RRSIG rdata up to and including the signer name.
pub fn encode_sig_fields(sig: &SigRdata) -> Vec<u8> {
    let mut out = Vec::with_capacity(18 + sig.signer_name.len() + 2);
    out.extend_from_slice(&sig.type_covered.code().to_be_bytes());
    out.push(sig.algorithm.code());
    out.push(sig.labels);
    out.extend_from_slice(&sig.original_ttl.to_be_bytes());
    out.extend_from_slice(&sig.expiration.to_be_bytes());
    out.extend_from_slice(&sig.inception.to_be_bytes());
    out.extend_from_slice(&sig.key_tag.to_be_bytes());
    name_to_wire(&sig.signer_name, &mut out);
    out
}

pub fn decode_rdata(rtype: RecordType, data: &[u8]) -> Result<RecordData, DomainError> {
    if data.is_empty() {
        return Ok(RecordData::Empty(rtype));
    }
    let mut r = WireReader::new(data);
    let decoded = match rtype {
        RecordType::A => {
            let b = r.read_bytes(4)?;
            RecordData::A(Ipv4Addr::new(b[0], b[1], b[2], b[3]))
        }
        RecordType::AAAA => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(r.read_bytes(16)?);
            RecordData::Aaaa(Ipv6Addr::from(octets))
        }
        RecordType::NS => RecordData::Ns(r.read_name()?),
        RecordType::SOA => RecordData::Soa(SoaRdata {
            mname: r.read_name()?,
            rname: r.read_name()?,
            serial: r.read_u32()?,
            refresh: r.read_u32()?,
            retry: r.read_u32()?,
            expire: r.read_u32()?,
            minimum: r.read_u32()?,
        }),
        RecordType::KEY => RecordData::Key(decode_key(&mut r)?),
        RecordType::DNSKEY => RecordData::Dnskey(decode_key(&mut r)?),
        RecordType::CDNSKEY => RecordData::Cdnskey(decode_key(&mut r)?),
        RecordType::DS => RecordData::Ds(decode_ds(&mut r)?),
        RecordType::CDS => RecordData::Cds(decode_ds(&mut r)?),
        RecordType::SIG => RecordData::Sig(decode_sig(&mut r)?),
        RecordType::RRSIG => RecordData::Rrsig(decode_sig(&mut r)?),
        RecordType::CSYNC => RecordData::Csync(CsyncRdata {
            serial: r.read_u32()?,
            flags: r.read_u16()?,
            types: decode_type_bitmap(&mut r)?,
        }),
        RecordType::DSYNC => RecordData::Dsync(DsyncRdata {
            rrtype: RecordType::from(r.read_u16()?),
            scheme: r.read_u8()?.into(),
            port: r.read_u16()?,
            target: r.read_name()?,
        }),
        RecordType::MSIGNER => RecordData::Msigner(MsignerRdata {
            state: r.read_u8()?.try_into()?,
            scheme: r.read_u8()?.try_into()?,
            target: r.read_name()?,
        }),
        other => {
            return Ok(RecordData::Unknown {
                rtype: other,
                data: data.to_vec(),
            })
        }
    };
    if r.remaining() != 0 {
        return Err(DomainError::InvalidRecord(format!(
            "{} rdata has {} trailing octets",
            rtype,
            r.remaining()
        )));
    }
    Ok(decoded)
}

fn decode_key(r: &mut WireReader<'_>) -> Result<KeyRdata, DomainError> {
    Ok(KeyRdata {
        flags: r.read_u16()?,
        protocol: r.read_u8()?,
        algorithm: Algorithm::from(r.read_u8()?),
        public_key: r.read_rest().to_vec(),
    })
}

fn decode_ds(r: &mut WireReader<'_>) -> Result<DsRdata, DomainError> {
    Ok(DsRdata {
        key_tag: r.read_u16()?,
        algorithm: Algorithm::from(r.read_u8()?),
        digest_type: r.read_u8()?,
        digest: r.read_rest().to_vec(),
    })
}

fn decode_sig(r: &mut WireReader<'_>) -> Result<SigRdata, DomainError> {
    Ok(SigRdata {
        type_covered: RecordType::from(r.read_u16()?),
        algorithm: Algorithm::from(r.read_u8()?),
        labels: r.read_u8()?,
        original_ttl: r.read_u32()?,
        expiration: r.read_u32()?,
        inception: r.read_u32()?,
        key_tag: r.read_u16()?,
        signer_name: r.read_name()?,
        signature: r.read_rest().to_vec(),
    })
}

fn encode_type_bitmap(types: &[RecordType], out: &mut Vec<u8>) {
    let mut codes: Vec<u16> = types.iter().map(|t| t.code()).collect();
    codes.sort_unstable();
    codes.dedup();

    let mut window: Option<u8> = None;
    let mut bitmap = [0u8; 32];
    let mut used = 0usize;
    for code in codes {
        let this_window = (code >> 8) as u8;
        if window != Some(this_window) {
            if let Some(w) = window {
                out.push(w);
                out.push(used as u8);
                out.extend_from_slice(&bitmap[..used]);
            }
            window = Some(this_window);
            bitmap = [0u8; 32];
            used = 0;
        }
        let low = (code & 0xFF) as usize;
        bitmap[low / 8] |= 0x80 >> (low % 8);
        used = used.max(low / 8 + 1);
    }
    if let Some(w) = window {
        out.push(w);
        out.push(used as u8);
        out.extend_from_slice(&bitmap[..used]);
    }
}

fn decode_type_bitmap(r: &mut WireReader<'_>) -> Result<Vec<RecordType>, DomainError> {
    let mut types = Vec::new();
    while r.remaining() > 0 {
        let window = r.read_u8()? as u16;
        let len = r.read_u8()? as usize;
        if len == 0 || len > 32 {
            return Err(DomainError::InvalidRecord(format!(
                "type bitmap window length {}",
                len
            )));
        }
        for (i, byte) in r.read_bytes(len)?.iter().enumerate() {
            for bit in 0..8 {
                if byte & (0x80 >> bit) != 0 {
                    types.push(RecordType::from((window << 8) | (i * 8 + bit) as u16));
                }
            }
        }
    }
    Ok(types)
}
