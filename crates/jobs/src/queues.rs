//! Channel-backed implementations of the engine queue ports.

use crate::requests::{
    DelegationSyncRequest, DelegationSyncResponse, KeyLifecycleCommand, KeyLifecycleRequest,
    KeyLifecycleResponse, SyncCommand,
};
use async_trait::async_trait;
use ferrous_dsync_application::ports::{
    NotifyQueue, NotifyRequest, ZoneUpdateQueue, ZoneUpdateRequest,
};
use ferrous_dsync_domain::DomainError;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

fn closed(engine: &str) -> DomainError {
    DomainError::ChannelClosed(format!("{} is not running", engine))
}

async fn await_response<T>(
    rx: oneshot::Receiver<T>,
    limit: Duration,
    engine: &str,
) -> Result<T, DomainError> {
    match tokio::time::timeout(limit, rx).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(_)) => Err(DomainError::ChannelClosed(format!(
            "{} dropped the reply channel",
            engine
        ))),
        Err(_) => Err(DomainError::TransportTimeout(format!(
            "{} did not answer within {:?}",
            engine, limit
        ))),
    }
}

#[derive(Clone)]
pub struct ChannelZoneUpdateQueue {
    tx: mpsc::Sender<ZoneUpdateRequest>,
}

#[async_trait]
impl ZoneUpdateQueue for ChannelZoneUpdateQueue {
    async fn submit(&self, request: ZoneUpdateRequest) -> Result<(), DomainError> {
        self.tx.send(request).await.map_err(|_| closed("zone updater"))
    }
}

pub fn zone_update_channel(
    capacity: usize,
) -> (ChannelZoneUpdateQueue, mpsc::Receiver<ZoneUpdateRequest>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ChannelZoneUpdateQueue { tx }, rx)
}

#[derive(Clone)]
pub struct ChannelNotifyQueue {
    tx: mpsc::Sender<NotifyRequest>,
}

#[async_trait]
impl NotifyQueue for ChannelNotifyQueue {
    async fn submit(&self, request: NotifyRequest) -> Result<(), DomainError> {
        self.tx.send(request).await.map_err(|_| closed("notifier"))
    }
}

pub fn notify_channel(capacity: usize) -> (ChannelNotifyQueue, mpsc::Receiver<NotifyRequest>) {
    let (tx, rx) = mpsc::channel(capacity);
    (ChannelNotifyQueue { tx }, rx)
}

/// Sending side of the delegation syncher's queue.
#[derive(Clone)]
pub struct DelegationSyncHandle {
    tx: mpsc::Sender<DelegationSyncRequest>,
}

impl DelegationSyncHandle {
    pub async fn submit(&self, request: DelegationSyncRequest) -> Result<(), DomainError> {
        self.tx
            .send(request)
            .await
            .map_err(|_| closed("delegation syncher"))
    }

    /// Queues without waiting; a full queue drops the request. Used by
    /// engines the syncher itself may be waiting on.
    pub fn try_submit(&self, request: DelegationSyncRequest) -> bool {
        match self.tx.try_send(request) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(request)) => {
                warn!(zone = %request.zone_name, command = %request.command, "Delegation sync queue full, trigger dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Submits `command` for `zone` and waits up to `limit` for the reply.
    pub async fn request(
        &self,
        command: SyncCommand,
        zone: &str,
        limit: Duration,
    ) -> Result<DelegationSyncResponse, DomainError> {
        let (tx, rx) = oneshot::channel();
        let mut request = DelegationSyncRequest::new(command, zone);
        request.response = Some(tx);
        self.submit(request).await?;
        await_response(rx, limit, "delegation syncher").await
    }
}

pub fn delegation_sync_channel(
    capacity: usize,
) -> (DelegationSyncHandle, mpsc::Receiver<DelegationSyncRequest>) {
    let (tx, rx) = mpsc::channel(capacity);
    (DelegationSyncHandle { tx }, rx)
}

/// Sending side of the key bootstrapper's queue.
#[derive(Clone)]
pub struct KeyLifecycleHandle {
    tx: mpsc::Sender<KeyLifecycleRequest>,
}

impl KeyLifecycleHandle {
    pub async fn submit(&self, request: KeyLifecycleRequest) -> Result<(), DomainError> {
        self.tx
            .send(request)
            .await
            .map_err(|_| closed("key bootstrapper"))
    }

    /// Submits `command` for `zone` and waits up to `limit` for the reply.
    pub async fn request(
        &self,
        command: KeyLifecycleCommand,
        zone: &str,
        limit: Duration,
    ) -> Result<KeyLifecycleResponse, DomainError> {
        let (tx, rx) = oneshot::channel();
        let mut request = KeyLifecycleRequest::new(command, zone);
        request.response = Some(tx);
        self.submit(request).await?;
        await_response(rx, limit, "key bootstrapper").await
    }
}

pub fn key_lifecycle_channel(
    capacity: usize,
) -> (KeyLifecycleHandle, mpsc::Receiver<KeyLifecycleRequest>) {
    let (tx, rx) = mpsc::channel(capacity);
    (KeyLifecycleHandle { tx }, rx)
}
