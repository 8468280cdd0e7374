use super::rdata::RecordData;
use super::record_type::{RecordClass, RecordType};
use super::wire::{self, name_to_wire, WireReader};
use crate::name::fqdn;
use crate::DomainError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A single resource record. Owner names are lower-case and absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: String,
    pub class: RecordClass,
    pub ttl: u32,
    pub data: RecordData,
}

impl ResourceRecord {
    pub fn new(name: &str, ttl: u32, data: RecordData) -> Self {
        Self {
            name: fqdn(name),
            class: RecordClass::IN,
            ttl,
            data,
        }
    }

    pub fn record_type(&self) -> RecordType {
        self.data.record_type()
    }

    /// Same owner, class and rdata. TTL is not compared.
    pub fn is_duplicate(&self, other: &ResourceRecord) -> bool {
        self.name == other.name && self.class == other.class && self.data == other.data
    }

    /// Copy marked for "delete this RR" in an UPDATE (class NONE, TTL 0).
    pub fn as_delete(&self) -> Self {
        Self {
            name: self.name.clone(),
            class: RecordClass::NONE,
            ttl: 0,
            data: self.data.clone(),
        }
    }

    /// "Delete the whole RRset" entry for an UPDATE (class ANY, no rdata).
    pub fn delete_rrset(name: &str, rtype: RecordType) -> Self {
        Self {
            name: fqdn(name),
            class: RecordClass::ANY,
            ttl: 0,
            data: RecordData::Empty(rtype),
        }
    }

    /// Canonical wire form: owner, type, class, TTL, rdlength, rdata.
    pub fn to_wire(&self) -> Vec<u8> {
        let rdata = wire::encode_rdata(&self.data);
        let mut out = Vec::with_capacity(self.name.len() + 12 + rdata.len());
        name_to_wire(&self.name, &mut out);
        out.extend_from_slice(&self.record_type().code().to_be_bytes());
        out.extend_from_slice(&self.class.code().to_be_bytes());
        out.extend_from_slice(&self.ttl.to_be_bytes());
        out.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        out.extend_from_slice(&rdata);
        out
    }

    pub fn read(reader: &mut WireReader<'_>) -> Result<Self, DomainError> {
        let name = reader.read_name()?;
        let rtype = RecordType::from(reader.read_u16()?);
        let class = RecordClass::from(reader.read_u16()?);
        let ttl = reader.read_u32()?;
        let rdlength = reader.read_u16()? as usize;
        let rdata = reader.read_bytes(rdlength)?;
        Ok(Self {
            name,
            class,
            ttl,
            data: wire::decode_rdata(rtype, rdata)?,
        })
    }

    pub fn from_wire(buf: &[u8]) -> Result<Self, DomainError> {
        Self::read(&mut WireReader::new(buf))
    }

    /// Parses one record in presentation format, completing relative names
    /// with `origin`. The TTL and class may appear in either order and are
    /// optional (`default_ttl`, IN).
    pub fn parse_with_origin(
        line: &str,
        origin: &str,
        default_ttl: u32,
    ) -> Result<Self, DomainError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let owner = tokens
            .first()
            .ok_or_else(|| DomainError::InvalidRecord("empty record".to_string()))?;
        let name = super::rdata::absolute_name(owner, origin);

        let mut ttl = default_ttl;
        let mut class = RecordClass::IN;
        let mut idx = 1;
        let rtype = loop {
            let token = tokens.get(idx).ok_or_else(|| {
                DomainError::InvalidRecord(format!("record '{}' has no type", line))
            })?;
            idx += 1;
            if let Ok(value) = token.parse::<u32>() {
                ttl = value;
                continue;
            }
            // "ANY" is both a class and a type; it is a class only when a
            // type follows.
            if let Ok(parsed) = token.parse::<RecordClass>() {
                let next_is_type = tokens
                    .get(idx)
                    .map(|t| t.parse::<RecordType>().is_ok())
                    .unwrap_or(false);
                if next_is_type || token.parse::<RecordType>().is_err() {
                    class = parsed;
                    continue;
                }
            }
            break token.parse::<RecordType>()?;
        };

        let data = RecordData::from_tokens(rtype, &tokens[idx..], origin)?;
        Ok(Self {
            name,
            class,
            ttl,
            data,
        })
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.name,
            self.ttl,
            self.class,
            self.record_type()
        )?;
        let rdata = self.data.to_string();
        if !rdata.is_empty() {
            write!(f, "\t{}", rdata)?;
        }
        Ok(())
    }
}

impl FromStr for ResourceRecord {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with_origin(s, ".", 3600)
    }
}

/// Records of one owner and type, with their covering RRSIGs kept apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RRset {
    pub name: String,
    pub rtype: RecordType,
    pub records: Vec<ResourceRecord>,
    pub rrsigs: Vec<ResourceRecord>,
}

impl RRset {
    pub fn new(name: &str, rtype: RecordType) -> Self {
        Self {
            name: fqdn(name),
            rtype,
            records: Vec::new(),
            rrsigs: Vec::new(),
        }
    }

    pub fn from_records(name: &str, rtype: RecordType, records: Vec<ResourceRecord>) -> Self {
        let mut rrset = Self::new(name, rtype);
        for rr in records {
            rrset.push(rr);
        }
        rrset
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Adds a record unless an identical one is present. RRSIGs covering
    /// this type go to `rrsigs`.
    pub fn push(&mut self, rr: ResourceRecord) {
        let target = match &rr.data {
            RecordData::Rrsig(sig) if sig.type_covered == self.rtype => &mut self.rrsigs,
            _ => &mut self.records,
        };
        if !target.iter().any(|existing| existing.is_duplicate(&rr)) {
            target.push(rr);
        }
    }

    /// Removes records duplicating `rr`; returns whether anything changed.
    pub fn remove(&mut self, rr: &ResourceRecord) -> bool {
        let before = self.records.len();
        self.records.retain(|existing| {
            !(existing.name == rr.name && existing.data == rr.data)
        });
        before != self.records.len()
    }

    pub fn ttl(&self) -> u32 {
        self.records.first().map(|rr| rr.ttl).unwrap_or(0)
    }
}

/// All RRsets at one owner name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerData {
    pub name: String,
    pub rrtypes: BTreeMap<RecordType, RRset>,
}

impl OwnerData {
    pub fn new(name: &str) -> Self {
        Self {
            name: fqdn(name),
            rrtypes: BTreeMap::new(),
        }
    }

    pub fn get(&self, rtype: RecordType) -> Option<&RRset> {
        self.rrtypes.get(&rtype)
    }

    pub fn is_empty(&self) -> bool {
        self.rrtypes.values().all(RRset::is_empty)
    }
}
