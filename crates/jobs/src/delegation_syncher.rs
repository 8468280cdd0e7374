use crate::queues::KeyLifecycleHandle;
use crate::requests::{
    DelegationSyncRequest, DelegationSyncResponse, KeyLifecycleCommand, SyncCommand,
};
use ferrous_dsync_application::ports::{ZoneData, ZoneStore};
use ferrous_dsync_application::use_cases::{
    AnalyseDelegationUseCase, PublishSig0KeyUseCase, SyncDelegationUseCase,
};
use ferrous_dsync_domain::config::ZoneOption;
use ferrous_dsync_domain::{DelegationSyncStatus, DomainError};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

/// Serialises all delegation work for all zones: one request at a time,
/// in arrival order.
pub struct DelegationSyncherJob {
    zones: Arc<dyn ZoneStore>,
    analyse: Arc<AnalyseDelegationUseCase>,
    sync: Arc<SyncDelegationUseCase>,
    publish: Arc<PublishSig0KeyUseCase>,
    keys: KeyLifecycleHandle,
    key_reply_timeout: Duration,
    rx: mpsc::Receiver<DelegationSyncRequest>,
    shutdown: CancellationToken,
}

impl DelegationSyncherJob {
    pub fn new(
        zones: Arc<dyn ZoneStore>,
        analyse: Arc<AnalyseDelegationUseCase>,
        sync: Arc<SyncDelegationUseCase>,
        publish: Arc<PublishSig0KeyUseCase>,
        keys: KeyLifecycleHandle,
        rx: mpsc::Receiver<DelegationSyncRequest>,
    ) -> Self {
        Self {
            zones,
            analyse,
            sync,
            publish,
            keys,
            key_reply_timeout: Duration::from_secs(30),
            rx,
            shutdown: CancellationToken::new(),
        }
    }

    /// How long SETUP waits for the key bootstrapper.
    pub fn with_key_reply_timeout(mut self, limit: Duration) -> Self {
        self.key_reply_timeout = limit;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn start(mut self) -> JoinHandle<()> {
        info!("Starting delegation syncher");
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("DelegationSyncherJob: shutting down");
                        break;
                    }
                    request = self.rx.recv() => {
                        let Some(request) = request else {
                            info!("DelegationSyncherJob: queue closed");
                            break;
                        };
                        let zone = request.zone_name.clone();
                        let command = request.command;
                        if AssertUnwindSafe(self.handle(request)).catch_unwind().await.is_err() {
                            error!(zone = %zone, command = %command, "Delegation sync handler panicked");
                        }
                    }
                }
            }
        })
    }

    async fn handle(&self, mut request: DelegationSyncRequest) {
        let reply = request.response.take();
        let response = match self
            .dispatch(request.command, &request.zone_name, request.sync_status)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!(zone = %request.zone_name, command = %request.command, error = %e, "Delegation sync failed");
                DelegationSyncResponse::failed(&request.zone_name, &e)
            }
        };
        if let Some(reply) = reply {
            let _ = reply.send(response);
        }
    }

    #[instrument(skip(self, sync_status))]
    async fn dispatch(
        &self,
        command: SyncCommand,
        zone_name: &str,
        sync_status: Option<DelegationSyncStatus>,
    ) -> Result<DelegationSyncResponse, DomainError> {
        let zone = self
            .zones
            .get(zone_name)
            .ok_or_else(|| DomainError::ZoneNotFound(zone_name.to_string()))?;
        let name = zone.name().to_string();

        let (status, message) = match command {
            SyncCommand::Setup => self.setup(zone.as_ref()).await?,
            SyncCommand::Status => {
                let status = self.analyse.execute(zone.as_ref()).await?;
                let message = if status.in_sync {
                    "delegation in sync with parent".to_string()
                } else {
                    format!("delegation out of sync: {}", status.summary())
                };
                (status, message)
            }
            SyncCommand::SyncDelegation => {
                if !zone.has_option(ZoneOption::DelegationSyncChild) {
                    return Err(DomainError::Configuration(format!(
                        "zone {} does not have the {} option",
                        name,
                        ZoneOption::DelegationSyncChild
                    )));
                }
                let status = match sync_status {
                    Some(status) => status,
                    None => self.analyse.execute(zone.as_ref()).await?,
                };
                self.push(zone, status).await?
            }
            SyncCommand::ExplicitSyncDelegation => {
                let status = self.analyse.execute(zone.as_ref()).await?;
                self.push(zone, status).await?
            }
            SyncCommand::SyncDnskeyRrset => {
                let status = self.sync.sync_dnskey_rrset(zone).await?;
                let message = status.message.clone();
                (status, message)
            }
        };

        Ok(DelegationSyncResponse {
            zone: name,
            error: status.error,
            error_msg: status.error_msg.clone(),
            message,
            status: Some(status),
        })
    }

    async fn setup(
        &self,
        zone: &dyn ZoneData,
    ) -> Result<(DelegationSyncStatus, String), DomainError> {
        let published = self.publish.execute(zone).await?;
        let mut message = if published {
            "SIG(0) key published".to_string()
        } else {
            "SIG(0) key already published".to_string()
        };
        if zone.has_option(ZoneOption::DelegationSyncChild) {
            message = format!("{}; {}", message, self.bootstrap(zone.name()).await);
        }
        match self.analyse.execute(zone).await {
            Ok(status) => {
                let message = format!("{}; {}", message, status.summary());
                Ok((status, message))
            }
            Err(e) => {
                warn!(zone = %zone.name(), error = %e, "Delegation status unavailable after setup");
                let status = DelegationSyncStatus::failed(
                    zone.name(),
                    &zone.parent().unwrap_or_default(),
                    e.to_string(),
                );
                Ok((status, message))
            }
        }
    }

    /// Bootstraps the zone's key with the parent. A failure only ends up
    /// in the SETUP message.
    async fn bootstrap(&self, zone: &str) -> String {
        match self
            .keys
            .request(KeyLifecycleCommand::Bootstrap, zone, self.key_reply_timeout)
            .await
        {
            Ok(response) if !response.error => response.message,
            Ok(response) => {
                warn!(zone = %zone, error = %response.error_msg, "SIG(0) bootstrap with parent failed");
                format!("bootstrap with parent failed: {}", response.error_msg)
            }
            Err(e) => {
                warn!(zone = %zone, error = %e, "SIG(0) bootstrap with parent failed");
                format!("bootstrap with parent failed: {}", e)
            }
        }
    }

    async fn push(
        &self,
        zone: Arc<dyn ZoneData>,
        status: DelegationSyncStatus,
    ) -> Result<(DelegationSyncStatus, String), DomainError> {
        let status = self.sync.execute(zone, status).await?;
        let message = status.message.clone();
        Ok((status, message))
    }
}
