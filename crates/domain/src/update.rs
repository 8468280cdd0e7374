use crate::rcode::Rcode;
use crate::rr::{RecordClass, ResourceRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An RFC 2136 UPDATE for one zone. Class IN adds, NONE deletes one RR,
/// ANY deletes a whole RRset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateMessage {
    pub zone: String,
    pub actions: Vec<ResourceRecord>,
}

impl UpdateMessage {
    pub fn new(zone: &str) -> Self {
        Self {
            zone: crate::name::fqdn(zone),
            actions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn additions(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.actions.iter().filter(|rr| rr.class == RecordClass::IN)
    }

    pub fn deletions(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.actions.iter().filter(|rr| rr.class != RecordClass::IN)
    }
}

/// RFC 8914 Extended DNS Error carried in an OPT record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedError {
    pub code: u16,
    pub text: String,
}

impl ExtendedError {
    pub const OPTION_CODE: u16 = 15;

    pub fn code_name(&self) -> &'static str {
        match self.code {
            0 => "Other Error",
            1 => "Unsupported DNSKEY Algorithm",
            2 => "Unsupported DS Digest Type",
            3 => "Stale Answer",
            4 => "Forged Answer",
            5 => "DNSSEC Indeterminate",
            6 => "DNSSEC Bogus",
            7 => "Signature Expired",
            8 => "Signature Not Yet Valid",
            9 => "DNSKEY Missing",
            10 => "RRSIGs Missing",
            11 => "No Zone Key Bit Set",
            12 => "NSEC Missing",
            13 => "Cached Error",
            14 => "Not Ready",
            15 => "Blocked",
            16 => "Censored",
            17 => "Filtered",
            18 => "Prohibited",
            19 => "Stale NXDomain Answer",
            20 => "Not Authoritative",
            21 => "Not Supported",
            22 => "No Reachable Authority",
            23 => "Network Error",
            24 => "Invalid Data",
            _ => "Unknown",
        }
    }

    /// Decodes the option payload: INFO-CODE followed by UTF-8 EXTRA-TEXT.
    pub fn from_option_data(data: &[u8]) -> Option<Self> {
        if data.len() < 2 {
            return None;
        }
        Some(Self {
            code: u16::from_be_bytes([data[0], data[1]]),
            text: String::from_utf8_lossy(&data[2..]).trim_end_matches('\0').to_string(),
        })
    }
}

/// Outcome of one destination address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetStatus {
    pub rcode: Option<Rcode>,
    pub error: bool,
    pub error_msg: Option<String>,
    pub ede_found: bool,
    pub ede_code: u16,
    pub ede_text: String,
    pub ede_sender: String,
}

impl TargetStatus {
    pub fn with_ede(mut self, ede: Option<ExtendedError>, sender: &str) -> Self {
        if let Some(ede) = ede {
            self.ede_found = true;
            self.ede_code = ede.code;
            self.ede_text = ede.text;
            self.ede_sender = sender.to_string();
        }
        self
    }
}

/// Per-attempt transport outcome across all destination addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub rcode: Option<Rcode>,
    pub targets: BTreeMap<String, TargetStatus>,
}

impl UpdateResult {
    pub fn succeeded(&self) -> bool {
        self.rcode.map(|r| r.is_success()).unwrap_or(false)
    }

    pub fn record(&mut self, addr: &str, status: TargetStatus) {
        self.targets.insert(addr.to_string(), status);
    }

    pub fn errored(&self) -> usize {
        self.targets.values().filter(|t| t.error).count()
    }

    /// One line per failed target, for log messages and status replies.
    pub fn failure_summary(&self) -> String {
        self.targets
            .iter()
            .filter(|(_, status)| status.error)
            .map(|(addr, status)| {
                let mut line = format!(
                    "{}: {}",
                    addr,
                    status.error_msg.as_deref().unwrap_or("failed")
                );
                if status.ede_found {
                    line.push_str(&format!(" (EDE {}: {})", status.ede_code, status.ede_text));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}
