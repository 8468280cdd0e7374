use async_trait::async_trait;
use ferrous_dsync_application::ports::{DnsMessenger, QueryResponse};
use ferrous_dsync_domain::{
    DomainError, Rcode, RecordType, ResourceRecord, Sig0ActiveKeys, TargetStatus, UpdateMessage,
    UpdateResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// Records queries, NOTIFYs and UPDATEs; answers NOERROR unless told to
/// fail. Queries without a scripted answer get NXDOMAIN.
#[derive(Default)]
pub struct MockDnsMessenger {
    answers: RwLock<HashMap<(String, RecordType), Vec<ResourceRecord>>>,
    queries: RwLock<Vec<(String, RecordType)>>,
    notifies: RwLock<Vec<(String, RecordType, Vec<String>)>>,
    updates: RwLock<Vec<(UpdateMessage, Vec<String>)>>,
    update_delay: RwLock<Option<Duration>>,
    fail: AtomicBool,
}

impl MockDnsMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let mock = Self::default();
        mock.fail.store(true, Ordering::SeqCst);
        mock
    }

    /// Answers `qname`/`qtype` with `record` from every server.
    pub async fn set_answer(&self, qname: &str, qtype: RecordType, record: &str) {
        self.answers
            .write()
            .await
            .entry((qname.to_string(), qtype))
            .or_default()
            .push(record.parse().unwrap());
    }

    /// Holds every UPDATE for `delay` after recording it.
    pub async fn set_update_delay(&self, delay: Duration) {
        *self.update_delay.write().await = Some(delay);
    }

    pub async fn queries(&self) -> Vec<(String, RecordType)> {
        self.queries.read().await.clone()
    }

    pub async fn notifies(&self) -> Vec<(String, RecordType, Vec<String>)> {
        self.notifies.read().await.clone()
    }

    pub async fn updates(&self) -> Vec<UpdateMessage> {
        self.updates.read().await.iter().map(|(msg, _)| msg.clone()).collect()
    }

    /// UPDATEs together with the addresses they were sent to.
    pub async fn update_targets(&self) -> Vec<(UpdateMessage, Vec<String>)> {
        self.updates.read().await.clone()
    }

    fn outcome(&self, zone: &str, targets: &[String]) -> Result<UpdateResult, DomainError> {
        let mut result = UpdateResult::default();
        if self.fail.load(Ordering::SeqCst) {
            result.rcode = Some(Rcode::REFUSED);
            for target in targets {
                result.record(
                    target,
                    TargetStatus {
                        rcode: Some(Rcode::REFUSED),
                        error: true,
                        error_msg: Some("refused".to_string()),
                        ..Default::default()
                    },
                );
            }
            return Err(DomainError::AllTargetsFailed {
                zone: zone.to_string(),
                result,
            });
        }
        result.rcode = Some(Rcode::NOERROR);
        if let Some(target) = targets.first() {
            result.record(
                target,
                TargetStatus {
                    rcode: Some(Rcode::NOERROR),
                    ..Default::default()
                },
            );
        }
        Ok(result)
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
        self.queries.write().await.push((qname.to_string(), qtype));
        match self.answers.read().await.get(&(qname.to_string(), qtype)) {
            Some(records) => {
                let mut resp = QueryResponse::empty(server, Rcode::NOERROR);
                resp.answers = records.clone();
                Ok(resp)
            }
            None => Ok(QueryResponse::empty(server, Rcode::NXDOMAIN)),
        }
    }

    async fn send_update(
        &self,
        msg: &UpdateMessage,
        _keys: &Sig0ActiveKeys,
        targets: &[String],
    ) -> Result<UpdateResult, DomainError> {
        self.updates
            .write()
            .await
            .push((msg.clone(), targets.to_vec()));
        let delay = *self.update_delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome(&msg.zone, targets)
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
        self.outcome(zone, targets)
    }

    async fn resolve_host(&self, _host: &str, port: u16) -> Result<Vec<String>, DomainError> {
        Ok(vec![format!("192.0.2.53:{}", port)])
    }
}
