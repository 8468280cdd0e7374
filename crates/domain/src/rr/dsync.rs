//! Private RR types DSYNC (0x0F9B) and MSIGNER (0x0F9C).

use super::record_type::RecordType;
use crate::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a parent wants to be told about delegation changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SyncScheme {
    Notify,
    Update,
    Api,
    Unknown(u8),
}

impl SyncScheme {
    pub fn code(&self) -> u8 {
        match self {
            SyncScheme::Notify => 1,
            SyncScheme::Update => 2,
            SyncScheme::Api => 3,
            SyncScheme::Unknown(code) => *code,
        }
    }
}

impl From<u8> for SyncScheme {
    fn from(code: u8) -> Self {
        match code {
            1 => SyncScheme::Notify,
            2 => SyncScheme::Update,
            3 => SyncScheme::Api,
            other => SyncScheme::Unknown(other),
        }
    }
}

impl fmt::Display for SyncScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncScheme::Notify => f.write_str("NOTIFY"),
            SyncScheme::Update => f.write_str("UPDATE"),
            SyncScheme::Api => f.write_str("API"),
            SyncScheme::Unknown(code) => write!(f, "{}", code),
        }
    }
}

impl FromStr for SyncScheme {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NOTIFY" => Ok(SyncScheme::Notify),
            "UPDATE" => Ok(SyncScheme::Update),
            "API" => Ok(SyncScheme::Api),
            other => other
                .parse::<u8>()
                .map(SyncScheme::from)
                .map_err(|_| DomainError::Configuration(format!("unknown sync scheme '{}'", s))),
        }
    }
}

impl TryFrom<String> for SyncScheme {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SyncScheme> for String {
    fn from(value: SyncScheme) -> Self {
        value.to_string().to_ascii_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsyncRdata {
    /// RR type the advertised scheme applies to; `ANY` matches every type.
    pub rrtype: RecordType,
    pub scheme: SyncScheme,
    pub port: u16,
    pub target: String,
}

impl DsyncRdata {
    pub fn matches(&self, rrtype: RecordType, scheme: SyncScheme) -> bool {
        self.scheme == scheme
            && (self.rrtype == rrtype || self.rrtype == RecordType::ANY || rrtype == RecordType::ANY)
    }
}

impl fmt::Display for DsyncRdata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.rrtype, self.scheme, self.port, self.target
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsignerState {
    Off,
    On,
}

impl MsignerState {
    pub fn code(&self) -> u8 {
        match self {
            MsignerState::Off => 0,
            MsignerState::On => 1,
        }
    }
}

impl TryFrom<u8> for MsignerState {
    type Error = DomainError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(MsignerState::Off),
            1 => Ok(MsignerState::On),
            other => Err(DomainError::InvalidRecord(format!(
                "MSIGNER state {} out of range",
                other
            ))),
        }
    }
}

impl FromStr for MsignerState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ON" => Ok(MsignerState::On),
            "OFF" => Ok(MsignerState::Off),
            _ => Err(DomainError::InvalidRecord(format!(
                "unknown MSIGNER state '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for MsignerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MsignerState::On => f.write_str("ON"),
            MsignerState::Off => f.write_str("OFF"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsignerScheme {
    Dns,
    Api,
}

impl MsignerScheme {
    pub fn code(&self) -> u8 {
        match self {
            MsignerScheme::Dns => 1,
            MsignerScheme::Api => 2,
        }
    }
}

impl TryFrom<u8> for MsignerScheme {
    type Error = DomainError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(MsignerScheme::Dns),
            2 => Ok(MsignerScheme::Api),
            other => Err(DomainError::InvalidRecord(format!(
                "MSIGNER scheme {} out of range",
                other
            ))),
        }
    }
}

impl FromStr for MsignerScheme {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DNS" => Ok(MsignerScheme::Dns),
            "API" => Ok(MsignerScheme::Api),
            _ => Err(DomainError::InvalidRecord(format!(
                "unknown MSIGNER scheme '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for MsignerScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MsignerScheme::Dns => f.write_str("DNS"),
            MsignerScheme::Api => f.write_str("API"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsignerRdata {
    pub state: MsignerState,
    pub scheme: MsignerScheme,
    pub target: String,
}

impl fmt::Display for MsignerRdata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.state, self.scheme, self.target)
    }
}
