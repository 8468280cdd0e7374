use async_trait::async_trait;
use ferrous_dsync_application::ports::{
    NotifyQueue, NotifyRequest, NotifyResponse, ZoneData, ZoneUpdateQueue, ZoneUpdateRequest,
    ZoneUpdateResponse,
};
use ferrous_dsync_domain::{DomainError, RecordType, ResourceRecord, UpdateResult};
use std::sync::Arc;
use tokio::sync::RwLock;

// ============================================================================
// Mock zone update queue
// ============================================================================

/// Applies the actions to the zone right away and answers the request.
#[derive(Clone)]
pub struct MockZoneUpdateQueue {
    zone: Arc<dyn ZoneData>,
    received: Arc<RwLock<Vec<Vec<ResourceRecord>>>>,
}

impl MockZoneUpdateQueue {
    pub fn new(zone: Arc<dyn ZoneData>) -> Self {
        Self {
            zone,
            received: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn received(&self) -> Vec<Vec<ResourceRecord>> {
        self.received.read().await.clone()
    }
}

#[async_trait]
impl ZoneUpdateQueue for MockZoneUpdateQueue {
    async fn submit(&self, request: ZoneUpdateRequest) -> Result<(), DomainError> {
        self.received.write().await.push(request.actions.clone());
        let reply = match self.zone.apply_actions(&request.actions) {
            Ok(changed) => ZoneUpdateResponse {
                changed: !changed.is_empty(),
                serial: self.zone.soa_serial(),
                ..Default::default()
            },
            Err(e) => ZoneUpdateResponse {
                error: true,
                error_msg: e.to_string(),
                ..Default::default()
            },
        };
        if let Some(tx) = request.response {
            let _ = tx.send(reply);
        }
        Ok(())
    }
}

// ============================================================================
// Mock notify queue
// ============================================================================

#[derive(Clone, Default)]
pub struct MockNotifyQueue {
    received: Arc<RwLock<Vec<(String, RecordType, Vec<String>, bool)>>>,
}

impl MockNotifyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn received(&self) -> Vec<(String, RecordType, Vec<String>, bool)> {
        self.received.read().await.clone()
    }
}

#[async_trait]
impl NotifyQueue for MockNotifyQueue {
    async fn submit(&self, request: NotifyRequest) -> Result<(), DomainError> {
        self.received.write().await.push((
            request.zone_name.clone(),
            request.rrtype,
            request.targets.clone(),
            request.urgent,
        ));
        if let Some(tx) = request.response {
            let _ = tx.send(NotifyResponse {
                result: Some(UpdateResult::default()),
                ..Default::default()
            });
        }
        Ok(())
    }
}
