use crate::DomainError;
use std::fmt;
use std::str::FromStr;

pub const DSYNC_TYPE_CODE: u16 = 0x0F9B;
pub const MSIGNER_TYPE_CODE: u16 = 0x0F9C;

/// RR types the synchronization core inspects. Everything else is carried
/// through as `Unknown` with its numeric code.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    A,
    NS,
    CNAME,
    SOA,
    SIG,
    KEY,
    AAAA,
    DS,
    RRSIG,
    DNSKEY,
    CDS,
    CDNSKEY,
    CSYNC,
    ANY,
    DSYNC,
    MSIGNER,
    Unknown(u16),
}

impl RecordType {
    pub fn code(&self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::SIG => 24,
            RecordType::KEY => 25,
            RecordType::AAAA => 28,
            RecordType::DS => 43,
            RecordType::RRSIG => 46,
            RecordType::DNSKEY => 48,
            RecordType::CDS => 59,
            RecordType::CDNSKEY => 60,
            RecordType::CSYNC => 62,
            RecordType::ANY => 255,
            RecordType::DSYNC => DSYNC_TYPE_CODE,
            RecordType::MSIGNER => MSIGNER_TYPE_CODE,
            RecordType::Unknown(code) => *code,
        }
    }

    pub fn is_signature(&self) -> bool {
        matches!(self, RecordType::RRSIG | RecordType::SIG)
    }

    pub fn is_address(&self) -> bool {
        matches!(self, RecordType::A | RecordType::AAAA)
    }
}

impl From<u16> for RecordType {
    fn from(code: u16) -> Self {
        match code {
            1 => RecordType::A,
            2 => RecordType::NS,
            5 => RecordType::CNAME,
            6 => RecordType::SOA,
            24 => RecordType::SIG,
            25 => RecordType::KEY,
            28 => RecordType::AAAA,
            43 => RecordType::DS,
            46 => RecordType::RRSIG,
            48 => RecordType::DNSKEY,
            59 => RecordType::CDS,
            60 => RecordType::CDNSKEY,
            62 => RecordType::CSYNC,
            255 => RecordType::ANY,
            DSYNC_TYPE_CODE => RecordType::DSYNC,
            MSIGNER_TYPE_CODE => RecordType::MSIGNER,
            other => RecordType::Unknown(other),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordType::A => "A",
            RecordType::NS => "NS",
            RecordType::CNAME => "CNAME",
            RecordType::SOA => "SOA",
            RecordType::SIG => "SIG",
            RecordType::KEY => "KEY",
            RecordType::AAAA => "AAAA",
            RecordType::DS => "DS",
            RecordType::RRSIG => "RRSIG",
            RecordType::DNSKEY => "DNSKEY",
            RecordType::CDS => "CDS",
            RecordType::CDNSKEY => "CDNSKEY",
            RecordType::CSYNC => "CSYNC",
            RecordType::ANY => "ANY",
            RecordType::DSYNC => "DSYNC",
            RecordType::MSIGNER => "MSIGNER",
            RecordType::Unknown(code) => return write!(f, "TYPE{}", code),
        };
        f.write_str(s)
    }
}

impl FromStr for RecordType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        let rtype = match upper.as_str() {
            "A" => RecordType::A,
            "NS" => RecordType::NS,
            "CNAME" => RecordType::CNAME,
            "SOA" => RecordType::SOA,
            "SIG" => RecordType::SIG,
            "KEY" => RecordType::KEY,
            "AAAA" => RecordType::AAAA,
            "DS" => RecordType::DS,
            "RRSIG" => RecordType::RRSIG,
            "DNSKEY" => RecordType::DNSKEY,
            "CDS" => RecordType::CDS,
            "CDNSKEY" => RecordType::CDNSKEY,
            "CSYNC" => RecordType::CSYNC,
            "ANY" => RecordType::ANY,
            "DSYNC" => RecordType::DSYNC,
            "MSIGNER" => RecordType::MSIGNER,
            other => match other.strip_prefix("TYPE").map(str::parse::<u16>) {
                Some(Ok(code)) => RecordType::from(code),
                _ => {
                    return Err(DomainError::InvalidRecord(format!(
                        "unknown RR type '{}'",
                        s
                    )))
                }
            },
        };
        Ok(rtype)
    }
}

/// DNS class. UPDATE uses `NONE` and `ANY` to encode deletions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordClass {
    IN,
    CH,
    NONE,
    ANY,
    Other(u16),
}

impl RecordClass {
    pub fn code(&self) -> u16 {
        match self {
            RecordClass::IN => 1,
            RecordClass::CH => 3,
            RecordClass::NONE => 254,
            RecordClass::ANY => 255,
            RecordClass::Other(code) => *code,
        }
    }
}

impl From<u16> for RecordClass {
    fn from(code: u16) -> Self {
        match code {
            1 => RecordClass::IN,
            3 => RecordClass::CH,
            254 => RecordClass::NONE,
            255 => RecordClass::ANY,
            other => RecordClass::Other(other),
        }
    }
}

impl fmt::Display for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordClass::IN => f.write_str("IN"),
            RecordClass::CH => f.write_str("CH"),
            RecordClass::NONE => f.write_str("NONE"),
            RecordClass::ANY => f.write_str("ANY"),
            RecordClass::Other(code) => write!(f, "CLASS{}", code),
        }
    }
}

impl FromStr for RecordClass {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "IN" => Ok(RecordClass::IN),
            "CH" => Ok(RecordClass::CH),
            "NONE" => Ok(RecordClass::NONE),
            "ANY" => Ok(RecordClass::ANY),
            other => other
                .strip_prefix("CLASS")
                .and_then(|n| n.parse::<u16>().ok())
                .map(RecordClass::from)
                .ok_or_else(|| DomainError::InvalidRecord(format!("unknown class '{}'", s))),
        }
    }
}
