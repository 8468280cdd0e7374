use crate::rcode::Rcode;
use crate::rr::{DsyncRdata, RecordData, RecordType, ResourceRecord, SyncScheme};
use crate::update::UpdateResult;
use chrono::{DateTime, Utc};

/// Snapshot comparing a child's delegation data with what the parent
/// publishes (or with an earlier local snapshot). Never persisted.
#[derive(Debug, Clone)]
pub struct DelegationSyncStatus {
    pub zone: String,
    pub parent: String,
    pub in_sync: bool,
    pub time: DateTime<Utc>,
    pub ns_adds: Vec<ResourceRecord>,
    pub ns_removes: Vec<ResourceRecord>,
    pub a_adds: Vec<ResourceRecord>,
    pub a_removes: Vec<ResourceRecord>,
    pub aaaa_adds: Vec<ResourceRecord>,
    pub aaaa_removes: Vec<ResourceRecord>,
    pub dnskey_adds: Vec<ResourceRecord>,
    pub dnskey_removes: Vec<ResourceRecord>,
    pub message: String,
    pub error: bool,
    pub error_msg: String,
    pub rcode: Option<Rcode>,
    pub update_result: Option<UpdateResult>,
}

impl DelegationSyncStatus {
    pub fn new(zone: &str, parent: &str) -> Self {
        Self {
            zone: zone.to_string(),
            parent: parent.to_string(),
            in_sync: true,
            time: Utc::now(),
            ns_adds: Vec::new(),
            ns_removes: Vec::new(),
            a_adds: Vec::new(),
            a_removes: Vec::new(),
            aaaa_adds: Vec::new(),
            aaaa_removes: Vec::new(),
            dnskey_adds: Vec::new(),
            dnskey_removes: Vec::new(),
            message: String::new(),
            error: false,
            error_msg: String::new(),
            rcode: None,
            update_result: None,
        }
    }

    pub fn failed(zone: &str, parent: &str, error_msg: impl Into<String>) -> Self {
        let mut status = Self::new(zone, parent);
        status.in_sync = false;
        status.error = true;
        status.error_msg = error_msg.into();
        status
    }

    /// True if any of the NS/A/AAAA lists is non-empty.
    pub fn has_delegation_changes(&self) -> bool {
        !(self.ns_adds.is_empty()
            && self.ns_removes.is_empty()
            && self.a_adds.is_empty()
            && self.a_removes.is_empty()
            && self.aaaa_adds.is_empty()
            && self.aaaa_removes.is_empty())
    }

    pub fn has_dnskey_changes(&self) -> bool {
        !(self.dnskey_adds.is_empty() && self.dnskey_removes.is_empty())
    }

    pub fn update_in_sync(&mut self) {
        self.in_sync = !self.has_delegation_changes() && !self.has_dnskey_changes();
    }

    /// All additions, NS first, then glue.
    pub fn adds(&self) -> Vec<ResourceRecord> {
        self.ns_adds
            .iter()
            .chain(&self.a_adds)
            .chain(&self.aaaa_adds)
            .cloned()
            .collect()
    }

    /// All removals, NS first, then glue.
    pub fn removes(&self) -> Vec<ResourceRecord> {
        self.ns_removes
            .iter()
            .chain(&self.a_removes)
            .chain(&self.aaaa_removes)
            .cloned()
            .collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "NS +{}/-{}, A +{}/-{}, AAAA +{}/-{}, DNSKEY +{}/-{}",
            self.ns_adds.len(),
            self.ns_removes.len(),
            self.a_adds.len(),
            self.a_removes.len(),
            self.aaaa_adds.len(),
            self.aaaa_removes.len(),
            self.dnskey_adds.len(),
            self.dnskey_removes.len()
        )
    }
}

/// A DSYNC record with its target resolved to `addr:port` strings.
#[derive(Debug, Clone)]
pub struct DsyncTarget {
    pub name: String,
    pub scheme: SyncScheme,
    pub port: u16,
    pub addresses: Vec<String>,
    pub rr: ResourceRecord,
}

/// Outcome of the DSYNC discovery walk.
#[derive(Debug, Clone, Default)]
pub struct DsyncLookup {
    pub qname: String,
    pub records: Vec<ResourceRecord>,
    pub parent: String,
}

impl DsyncLookup {
    pub fn dsync_records(&self) -> impl Iterator<Item = (&ResourceRecord, &DsyncRdata)> {
        self.records.iter().filter_map(|rr| match &rr.data {
            RecordData::Dsync(dsync) => Some((rr, dsync)),
            _ => None,
        })
    }

    /// First record advertising `scheme` for `rrtype`.
    pub fn find(
        &self,
        rrtype: RecordType,
        scheme: SyncScheme,
    ) -> Option<(&ResourceRecord, &DsyncRdata)> {
        self.dsync_records()
            .find(|(_, dsync)| dsync.matches(rrtype, scheme))
    }

    pub fn schemes(&self) -> Vec<SyncScheme> {
        let mut schemes = Vec::new();
        for (_, dsync) in self.dsync_records() {
            if !schemes.contains(&dsync.scheme) {
                schemes.push(dsync.scheme);
            }
        }
        schemes
    }
}
