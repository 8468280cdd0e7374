use async_trait::async_trait;
use ferrous_dsync_application::ports::{DnsMessenger, QueryResponse};
use ferrous_dsync_domain::{
    DomainError, Rcode, RecordType, ResourceRecord, Sig0ActiveKeys, TargetStatus, UpdateMessage,
    UpdateResult,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

pub fn rr(text: &str) -> ResourceRecord {
    text.parse().unwrap()
}

pub fn response(server: &str, rcode: Rcode, answers: &[&str], authority: &[&str]) -> QueryResponse {
    let mut resp = QueryResponse::empty(server, rcode);
    resp.answers = answers.iter().map(|t| rr(t)).collect();
    resp.authority = authority.iter().map(|t| rr(t)).collect();
    resp
}

#[derive(Debug, Clone)]
pub struct SentUpdate {
    pub msg: UpdateMessage,
    pub signers: Vec<u16>,
    pub targets: Vec<String>,
}

// ============================================================================
// Mock DnsMessenger
// ============================================================================

/// Scripted by `(server, qname, qtype)`. Unscripted queries answer
/// NXDOMAIN; servers marked silent time out.
#[derive(Clone, Default)]
pub struct MockDnsMessenger {
    responses: Arc<RwLock<HashMap<(String, String, RecordType), QueryResponse>>>,
    silent: Arc<RwLock<Vec<String>>>,
    hosts: Arc<RwLock<HashMap<String, Vec<String>>>>,
    update_outcomes: Arc<RwLock<VecDeque<Rcode>>>,
    update_delay: Arc<RwLock<Option<Duration>>>,
    queries: Arc<RwLock<Vec<(String, String, RecordType)>>>,
    updates: Arc<RwLock<Vec<SentUpdate>>>,
    notifies: Arc<RwLock<Vec<(String, RecordType, Vec<String>)>>>,
}

impl MockDnsMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_response(&self, server: &str, qname: &str, qtype: RecordType, resp: QueryResponse) {
        self.responses
            .write()
            .await
            .insert((server.to_string(), qname.to_string(), qtype), resp);
    }

    pub async fn set_silent(&self, server: &str) {
        self.silent.write().await.push(server.to_string());
    }

    pub async fn set_host(&self, host: &str, addresses: &[&str]) {
        self.hosts.write().await.insert(
            host.to_string(),
            addresses.iter().map(|a| a.to_string()).collect(),
        );
    }

    /// Rcode of the next UPDATE; anything but NOERROR fails all targets.
    pub async fn push_update_outcome(&self, rcode: Rcode) {
        self.update_outcomes.write().await.push_back(rcode);
    }

    /// Holds every UPDATE for `delay` after recording it.
    pub async fn set_update_delay(&self, delay: Duration) {
        *self.update_delay.write().await = Some(delay);
    }

    pub async fn queries(&self) -> Vec<(String, String, RecordType)> {
        self.queries.read().await.clone()
    }

    pub async fn updates(&self) -> Vec<SentUpdate> {
        self.updates.read().await.clone()
    }

    pub async fn notifies(&self) -> Vec<(String, RecordType, Vec<String>)> {
        self.notifies.read().await.clone()
    }
}

#[async_trait]
impl DnsMessenger for MockDnsMessenger {
    async fn query(
        &self,
        server: &str,
        qname: &str,
        qtype: RecordType,
    ) -> Result<QueryResponse, DomainError> {
        self.queries
            .write()
            .await
            .push((server.to_string(), qname.to_string(), qtype));
        if self.silent.read().await.iter().any(|s| s == server) {
            return Err(DomainError::TransportTimeout(server.to_string()));
        }
        Ok(self
            .responses
            .read()
            .await
            .get(&(server.to_string(), qname.to_string(), qtype))
            .cloned()
            .unwrap_or_else(|| QueryResponse::empty(server, Rcode::NXDOMAIN)))
    }

    async fn send_update(
        &self,
        msg: &UpdateMessage,
        keys: &Sig0ActiveKeys,
        targets: &[String],
    ) -> Result<UpdateResult, DomainError> {
        self.updates.write().await.push(SentUpdate {
            msg: msg.clone(),
            signers: keys.keys.iter().map(|k| k.key_id).collect(),
            targets: targets.to_vec(),
        });
        let delay = *self.update_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let rcode = self
            .update_outcomes
            .write()
            .await
            .pop_front()
            .unwrap_or(Rcode::NOERROR);
        outcome(&msg.zone, rcode, targets)
    }

    async fn send_notify(
        &self,
        zone: &str,
        rrtype: RecordType,
        targets: &[String],
    ) -> Result<UpdateResult, DomainError> {
        self.notifies
            .write()
            .await
            .push((zone.to_string(), rrtype, targets.to_vec()));
        outcome(zone, Rcode::NOERROR, targets)
    }

    async fn resolve_host(&self, host: &str, port: u16) -> Result<Vec<String>, DomainError> {
        match self.hosts.read().await.get(host) {
            Some(addrs) => Ok(addrs.iter().map(|a| format!("{}:{}", a, port)).collect()),
            None => Err(DomainError::InvalidDomainName(format!("{} does not resolve", host))),
        }
    }
}

fn outcome(zone: &str, rcode: Rcode, targets: &[String]) -> Result<UpdateResult, DomainError> {
    let mut result = UpdateResult::default();
    for target in targets {
        result.record(
            target,
            TargetStatus {
                rcode: Some(rcode),
                error: !rcode.is_success(),
                error_msg: (!rcode.is_success()).then(|| rcode.to_string()),
                ..Default::default()
            },
        );
        if rcode.is_success() {
            result.rcode = Some(rcode);
            return Ok(result);
        }
    }
    result.rcode = Some(rcode);
    Err(DomainError::AllTargetsFailed {
        zone: zone.to_string(),
        result,
    })
}
