use super::dsync::{DsyncRdata, MsignerRdata};
use super::record_type::RecordType;
use crate::keys::{Algorithm, DNSKEY_FLAG_SEP, DNSKEY_FLAG_ZONE};
use crate::name::fqdn;
use crate::DomainError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, NaiveDateTime};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoaRdata {
    pub mname: String,
    pub rname: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

/// Shared shape of KEY, DNSKEY and CDNSKEY rdata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRdata {
    pub flags: u16,
    pub protocol: u8,
    pub algorithm: Algorithm,
    pub public_key: Vec<u8>,
}

impl KeyRdata {
    pub fn new(flags: u16, algorithm: Algorithm, public_key: Vec<u8>) -> Self {
        Self {
            flags,
            protocol: 3,
            algorithm,
            public_key,
        }
    }

    pub fn is_sep(&self) -> bool {
        self.flags & DNSKEY_FLAG_SEP != 0
    }

    pub fn is_zone_key(&self) -> bool {
        self.flags & DNSKEY_FLAG_ZONE != 0
    }

    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.public_key.len());
        out.extend_from_slice(&self.flags.to_be_bytes());
        out.push(self.protocol);
        out.push(self.algorithm.code());
        out.extend_from_slice(&self.public_key);
        out
    }

    /// RFC 4034 Appendix B key tag.
    pub fn key_tag(&self) -> u16 {
        let wire = self.to_wire();
        let mut acc: u32 = 0;
        for (i, byte) in wire.iter().enumerate() {
            if i & 1 == 0 {
                acc += (*byte as u32) << 8;
            } else {
                acc += *byte as u32;
            }
        }
        acc += (acc >> 16) & 0xFFFF;
        (acc & 0xFFFF) as u16
    }
}

/// Shared shape of DS and CDS rdata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsRdata {
    pub key_tag: u16,
    pub algorithm: Algorithm,
    pub digest_type: u8,
    pub digest: Vec<u8>,
}

/// Shared shape of SIG and RRSIG rdata. Times are seconds since the epoch
/// modulo 2^32.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigRdata {
    pub type_covered: RecordType,
    pub algorithm: Algorithm,
    pub labels: u8,
    pub original_ttl: u32,
    pub expiration: u32,
    pub inception: u32,
    pub key_tag: u16,
    pub signer_name: String,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsyncRdata {
    pub serial: u32,
    pub flags: u16,
    pub types: Vec<RecordType>,
}

/// CSYNC flag: only act if the SOA serial is at least `serial`.
pub const CSYNC_FLAG_IMMEDIATE: u16 = 0x0001;
/// CSYNC flag: the parent should compare against `serial`.
pub const CSYNC_FLAG_SOAMINIMUM: u16 = 0x0002;

/// Typed rdata for the record kinds the synchronization core inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
    Ns(String),
    Soa(SoaRdata),
    Key(KeyRdata),
    Dnskey(KeyRdata),
    Cdnskey(KeyRdata),
    Ds(DsRdata),
    Cds(DsRdata),
    Sig(SigRdata),
    Rrsig(SigRdata),
    Csync(CsyncRdata),
    Dsync(DsyncRdata),
    Msigner(MsignerRdata),
    Unknown { rtype: RecordType, data: Vec<u8> },
    /// Zero-length rdata, as used by UPDATE "delete RRset" entries.
    Empty(RecordType),
}

impl RecordData {
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordData::A(_) => RecordType::A,
            RecordData::Aaaa(_) => RecordType::AAAA,
            RecordData::Ns(_) => RecordType::NS,
            RecordData::Soa(_) => RecordType::SOA,
            RecordData::Key(_) => RecordType::KEY,
            RecordData::Dnskey(_) => RecordType::DNSKEY,
            RecordData::Cdnskey(_) => RecordType::CDNSKEY,
            RecordData::Ds(_) => RecordType::DS,
            RecordData::Cds(_) => RecordType::CDS,
            RecordData::Sig(_) => RecordType::SIG,
            RecordData::Rrsig(_) => RecordType::RRSIG,
            RecordData::Csync(_) => RecordType::CSYNC,
            RecordData::Dsync(_) => RecordType::DSYNC,
            RecordData::Msigner(_) => RecordType::MSIGNER,
            RecordData::Unknown { rtype, .. } => *rtype,
            RecordData::Empty(rtype) => *rtype,
        }
    }

    /// Key material of KEY/DNSKEY/CDNSKEY records.
    pub fn as_key(&self) -> Option<&KeyRdata> {
        match self {
            RecordData::Key(k) | RecordData::Dnskey(k) | RecordData::Cdnskey(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_sig(&self) -> Option<&SigRdata> {
        match self {
            RecordData::Sig(s) | RecordData::Rrsig(s) => Some(s),
            _ => None,
        }
    }

    /// Target of an NS record.
    pub fn ns_target(&self) -> Option<&str> {
        match self {
            RecordData::Ns(target) => Some(target),
            _ => None,
        }
    }

    /// Parses presentation-format rdata. Relative names are completed with
    /// `origin`; `@` stands for the origin itself.
    pub fn from_tokens(
        rtype: RecordType,
        tokens: &[&str],
        origin: &str,
    ) -> Result<Self, DomainError> {
        if tokens.is_empty() {
            return Ok(RecordData::Empty(rtype));
        }
        if tokens[0] == "\\#" {
            return parse_generic(rtype, &tokens[1..]);
        }
        let mut t = Tokens::new(rtype, tokens);
        let data = match rtype {
            RecordType::A => RecordData::A(t.parse("IPv4 address")?),
            RecordType::AAAA => RecordData::Aaaa(t.parse("IPv6 address")?),
            RecordType::NS => RecordData::Ns(absolute_name(t.next("target")?, origin)),
            RecordType::SOA => RecordData::Soa(SoaRdata {
                mname: absolute_name(t.next("mname")?, origin),
                rname: absolute_name(t.next("rname")?, origin),
                serial: t.parse("serial")?,
                refresh: t.parse("refresh")?,
                retry: t.parse("retry")?,
                expire: t.parse("expire")?,
                minimum: t.parse("minimum")?,
            }),
            RecordType::KEY => RecordData::Key(parse_key(&mut t)?),
            RecordType::DNSKEY => RecordData::Dnskey(parse_key(&mut t)?),
            RecordType::CDNSKEY => RecordData::Cdnskey(parse_key(&mut t)?),
            RecordType::DS => RecordData::Ds(parse_ds(&mut t)?),
            RecordType::CDS => RecordData::Cds(parse_ds(&mut t)?),
            RecordType::SIG => RecordData::Sig(parse_sig(&mut t, origin)?),
            RecordType::RRSIG => RecordData::Rrsig(parse_sig(&mut t, origin)?),
            RecordType::CSYNC => {
                let serial = t.parse("serial")?;
                let flags = t.parse("flags")?;
                let types = t
                    .rest()
                    .iter()
                    .map(|s| s.parse::<RecordType>())
                    .collect::<Result<Vec<_>, _>>()?;
                RecordData::Csync(CsyncRdata {
                    serial,
                    flags,
                    types,
                })
            }
            RecordType::DSYNC => RecordData::Dsync(DsyncRdata {
                rrtype: t.parse("type")?,
                scheme: t.parse("scheme")?,
                port: t.parse("port")?,
                target: absolute_name(t.next("target")?, origin),
            }),
            RecordType::MSIGNER => RecordData::Msigner(MsignerRdata {
                state: t.parse("state")?,
                scheme: t.parse("scheme")?,
                target: absolute_name(t.next("target")?, origin),
            }),
            other => {
                return Err(DomainError::InvalidRecord(format!(
                    "{} rdata must use the generic \\# form",
                    other
                )))
            }
        };
        Ok(data)
    }
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordData::A(addr) => write!(f, "{}", addr),
            RecordData::Aaaa(addr) => write!(f, "{}", addr),
            RecordData::Ns(target) => f.write_str(target),
            RecordData::Soa(soa) => write!(
                f,
                "{} {} {} {} {} {} {}",
                soa.mname, soa.rname, soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum
            ),
            RecordData::Key(k) | RecordData::Dnskey(k) | RecordData::Cdnskey(k) => write!(
                f,
                "{} {} {} {}",
                k.flags,
                k.protocol,
                k.algorithm.code(),
                BASE64.encode(&k.public_key)
            ),
            RecordData::Ds(ds) | RecordData::Cds(ds) => write!(
                f,
                "{} {} {} {}",
                ds.key_tag,
                ds.algorithm.code(),
                ds.digest_type,
                hex::encode_upper(&ds.digest)
            ),
            RecordData::Sig(sig) | RecordData::Rrsig(sig) => write!(
                f,
                "{} {} {} {} {} {} {} {} {}",
                sig.type_covered,
                sig.algorithm.code(),
                sig.labels,
                sig.original_ttl,
                format_sig_time(sig.expiration),
                format_sig_time(sig.inception),
                sig.key_tag,
                sig.signer_name,
                BASE64.encode(&sig.signature)
            ),
            RecordData::Csync(csync) => {
                write!(f, "{} {}", csync.serial, csync.flags)?;
                for rtype in &csync.types {
                    write!(f, " {}", rtype)?;
                }
                Ok(())
            }
            RecordData::Dsync(dsync) => write!(f, "{}", dsync),
            RecordData::Msigner(msigner) => write!(f, "{}", msigner),
            RecordData::Unknown { data, .. } => {
                write!(f, "\\# {}", data.len())?;
                if !data.is_empty() {
                    write!(f, " {}", hex::encode_upper(data))?;
                }
                Ok(())
            }
            RecordData::Empty(_) => Ok(()),
        }
    }
}

/// Completes a presentation-format name against `origin`.
pub fn absolute_name(token: &str, origin: &str) -> String {
    if token == "@" {
        return fqdn(origin);
    }
    if token.ends_with('.') {
        return fqdn(token);
    }
    let origin = fqdn(origin);
    if origin == "." {
        fqdn(token)
    } else {
        fqdn(&format!("{}.{}", token, origin))
    }
}

pub fn format_sig_time(secs: u32) -> String {
    match DateTime::from_timestamp(secs as i64, 0) {
        Some(ts) => ts.format("%Y%m%d%H%M%S").to_string(),
        None => secs.to_string(),
    }
}

pub fn parse_sig_time(token: &str) -> Result<u32, DomainError> {
    if token.len() == 14 && token.bytes().all(|b| b.is_ascii_digit()) {
        let parsed = NaiveDateTime::parse_from_str(token, "%Y%m%d%H%M%S").map_err(|e| {
            DomainError::InvalidRecord(format!("bad signature time '{}': {}", token, e))
        })?;
        return Ok(parsed.and_utc().timestamp() as u32);
    }
    token
        .parse::<u32>()
        .map_err(|_| DomainError::InvalidRecord(format!("bad signature time '{}'", token)))
}

struct Tokens<'a> {
    rtype: RecordType,
    tokens: &'a [&'a str],
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(rtype: RecordType, tokens: &'a [&'a str]) -> Self {
        Self {
            rtype,
            tokens,
            pos: 0,
        }
    }

    fn next(&mut self, field: &str) -> Result<&'a str, DomainError> {
        let token = self.tokens.get(self.pos).ok_or_else(|| {
            DomainError::InvalidRecord(format!("{} rdata is missing {}", self.rtype, field))
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn parse<T: std::str::FromStr>(&mut self, field: &str) -> Result<T, DomainError> {
        let rtype = self.rtype;
        let token = self.next(field)?;
        token.parse::<T>().map_err(|_| {
            DomainError::InvalidRecord(format!("{} rdata has invalid {} '{}'", rtype, field, token))
        })
    }

    fn rest(&mut self) -> &'a [&'a str] {
        let rest = &self.tokens[self.pos.min(self.tokens.len())..];
        self.pos = self.tokens.len();
        rest
    }

    fn base64_rest(&mut self, field: &str) -> Result<Vec<u8>, DomainError> {
        let joined: String = self.rest().concat();
        if joined.is_empty() {
            return Err(DomainError::InvalidRecord(format!(
                "{} rdata is missing {}",
                self.rtype, field
            )));
        }
        BASE64
            .decode(joined.as_bytes())
            .map_err(|e| DomainError::InvalidRecord(format!("{} {}: {}", self.rtype, field, e)))
    }
}

fn parse_algorithm(t: &mut Tokens<'_>) -> Result<Algorithm, DomainError> {
    t.next("algorithm")?.parse::<Algorithm>()
}

fn parse_key(t: &mut Tokens<'_>) -> Result<KeyRdata, DomainError> {
    let flags = t.parse("flags")?;
    let protocol = t.parse("protocol")?;
    let algorithm = parse_algorithm(t)?;
    let public_key = t.base64_rest("public key")?;
    Ok(KeyRdata {
        flags,
        protocol,
        algorithm,
        public_key,
    })
}

fn parse_ds(t: &mut Tokens<'_>) -> Result<DsRdata, DomainError> {
    let key_tag = t.parse("key tag")?;
    let algorithm = parse_algorithm(t)?;
    let digest_type = t.parse("digest type")?;
    let digest_hex: String = t.rest().concat();
    let digest = hex::decode(&digest_hex)
        .map_err(|e| DomainError::InvalidRecord(format!("DS digest: {}", e)))?;
    Ok(DsRdata {
        key_tag,
        algorithm,
        digest_type,
        digest,
    })
}

fn parse_sig(t: &mut Tokens<'_>, origin: &str) -> Result<SigRdata, DomainError> {
    let type_covered = t.parse("type covered")?;
    let algorithm = parse_algorithm(t)?;
    let labels = t.parse("labels")?;
    let original_ttl = t.parse("original TTL")?;
    let expiration = parse_sig_time(t.next("expiration")?)?;
    let inception = parse_sig_time(t.next("inception")?)?;
    let key_tag = t.parse("key tag")?;
    let signer_name = absolute_name(t.next("signer name")?, origin);
    let signature = t.base64_rest("signature")?;
    Ok(SigRdata {
        type_covered,
        algorithm,
        labels,
        original_ttl,
        expiration,
        inception,
        key_tag,
        signer_name,
        signature,
    })
}

/// RFC 3597 `\# <len> <hex>` form. Known types are decoded from the bytes.
fn parse_generic(rtype: RecordType, tokens: &[&str]) -> Result<RecordData, DomainError> {
    let len: usize = tokens
        .first()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| DomainError::InvalidRecord("\\# form needs a length".to_string()))?;
    let data = hex::decode(tokens[1..].concat())
        .map_err(|e| DomainError::InvalidRecord(format!("\\# form: {}", e)))?;
    if data.len() != len {
        return Err(DomainError::InvalidRecord(format!(
            "\\# form declares {} octets but carries {}",
            len,
            data.len()
        )));
    }
    super::wire::decode_rdata(rtype, &data)
}
