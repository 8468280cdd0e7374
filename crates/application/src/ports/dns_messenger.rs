use async_trait::async_trait;
use ferrous_dsync_domain::{
    DomainError, ExtendedError, Rcode, RecordData, RecordType, ResourceRecord, Sig0ActiveKeys,
    UpdateMessage, UpdateResult,
};

/// Parsed answer to a single query.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub server: String,
    pub rcode: Rcode,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
    pub ede: Option<ExtendedError>,
}

impl QueryResponse {
    pub fn empty(server: &str, rcode: Rcode) -> Self {
        Self {
            server: server.to_string(),
            rcode,
            answers: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            ede: None,
        }
    }

    /// Answer records of `rtype` owned by `name`.
    pub fn answers_for(&self, name: &str, rtype: RecordType) -> Vec<ResourceRecord> {
        select(&self.answers, name, rtype)
    }

    /// Records of `rtype` owned by `name` from the answer, authority and
    /// additional sections, in that order. Referrals carry NS in authority
    /// and glue in additional.
    pub fn records_anywhere(&self, name: &str, rtype: RecordType) -> Vec<ResourceRecord> {
        let mut out = select(&self.answers, name, rtype);
        for rr in select(&self.authority, name, rtype)
            .into_iter()
            .chain(select(&self.additional, name, rtype))
        {
            if !out.iter().any(|existing| existing.is_duplicate(&rr)) {
                out.push(rr);
            }
        }
        out
    }

    /// Owner of the first SOA in the authority section.
    pub fn authority_soa_owner(&self) -> Option<String> {
        self.authority
            .iter()
            .find(|rr| matches!(rr.data, RecordData::Soa(_)))
            .map(|rr| rr.name.clone())
    }

    /// Owner of the first SOA in the answer or authority section.
    pub fn soa_owner(&self) -> Option<String> {
        self.answers
            .iter()
            .find(|rr| matches!(rr.data, RecordData::Soa(_)))
            .map(|rr| rr.name.clone())
            .or_else(|| self.authority_soa_owner())
    }
}

fn select(records: &[ResourceRecord], name: &str, rtype: RecordType) -> Vec<ResourceRecord> {
    let name = ferrous_dsync_domain::name::fqdn(name);
    records
        .iter()
        .filter(|rr| rr.name == name && rr.record_type() == rtype)
        .cloned()
        .collect()
}

/// Outbound DNS: plain queries, signed UPDATEs and NOTIFYs.
#[async_trait]
pub trait DnsMessenger: Send + Sync {
    /// Single exchange with `server` ("ip:port"), bounded by the configured
    /// timeout.
    async fn query(
        &self,
        server: &str,
        qname: &str,
        qtype: RecordType,
    ) -> Result<QueryResponse, DomainError>;

    /// Sends `msg` to each target in order until one answers NOERROR.
    /// The message carries one SIG(0) per key in `keys`; an empty key set
    /// sends it unsigned. When every target fails the error is
    /// `DomainError::AllTargetsFailed` with the per-target diagnostics.
    async fn send_update(
        &self,
        msg: &UpdateMessage,
        keys: &Sig0ActiveKeys,
        targets: &[String],
    ) -> Result<UpdateResult, DomainError>;

    /// NOTIFY for `zone` with `rrtype` in the question, same fallback as
    /// [`DnsMessenger::send_update`].
    async fn send_notify(
        &self,
        zone: &str,
        rrtype: RecordType,
        targets: &[String],
    ) -> Result<UpdateResult, DomainError>;

    /// Resolves `host` and pairs every address with `port`.
    async fn resolve_host(&self, host: &str, port: u16) -> Result<Vec<String>, DomainError>;
}
