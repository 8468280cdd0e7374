use super::ZoneData;
use async_trait::async_trait;
use ferrous_dsync_domain::{DomainError, RecordType, UpdateResult};
use std::sync::Arc;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Default)]
pub struct NotifyResponse {
    pub error: bool,
    pub error_msg: String,
    pub suppressed: bool,
    pub result: Option<UpdateResult>,
}

/// Hand-off to the notifier engine.
pub struct NotifyRequest {
    pub zone_name: String,
    pub zone: Option<Arc<dyn ZoneData>>,
    pub rrtype: RecordType,
    pub targets: Vec<String>,
    pub urgent: bool,
    pub response: Option<oneshot::Sender<NotifyResponse>>,
}

impl std::fmt::Debug for NotifyRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyRequest")
            .field("zone_name", &self.zone_name)
            .field("rrtype", &self.rrtype)
            .field("targets", &self.targets)
            .field("urgent", &self.urgent)
            .finish()
    }
}

#[async_trait]
pub trait NotifyQueue: Send + Sync {
    async fn submit(&self, request: NotifyRequest) -> Result<(), DomainError>;
}
