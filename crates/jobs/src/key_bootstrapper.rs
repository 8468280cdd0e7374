use crate::requests::{KeyLifecycleCommand, KeyLifecycleRequest, KeyLifecycleResponse};
use ferrous_dsync_application::ports::ZoneStore;
use ferrous_dsync_application::use_cases::{BootstrapSig0KeyUseCase, RolloverSig0KeyUseCase};
use ferrous_dsync_domain::DomainError;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

/// Owns every SIG(0) bootstrap and rollover: one at a time, in arrival
/// order, so two key transitions for a zone never interleave.
pub struct KeyBootstrapperJob {
    zones: Arc<dyn ZoneStore>,
    bootstrap: Arc<BootstrapSig0KeyUseCase>,
    rollover: Arc<RolloverSig0KeyUseCase>,
    rx: mpsc::Receiver<KeyLifecycleRequest>,
    shutdown: CancellationToken,
}

impl KeyBootstrapperJob {
    pub fn new(
        zones: Arc<dyn ZoneStore>,
        bootstrap: Arc<BootstrapSig0KeyUseCase>,
        rollover: Arc<RolloverSig0KeyUseCase>,
        rx: mpsc::Receiver<KeyLifecycleRequest>,
    ) -> Self {
        Self {
            zones,
            bootstrap,
            rollover,
            rx,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn start(mut self) -> JoinHandle<()> {
        info!("Starting key bootstrapper");
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("KeyBootstrapperJob: shutting down");
                        break;
                    }
                    request = self.rx.recv() => {
                        let Some(request) = request else {
                            info!("KeyBootstrapperJob: queue closed");
                            break;
                        };
                        let zone = request.zone_name.clone();
                        let command = request.command;
                        if AssertUnwindSafe(self.handle(request)).catch_unwind().await.is_err() {
                            error!(zone = %zone, command = %command, "Key lifecycle handler panicked");
                        }
                    }
                }
            }
        })
    }

    async fn handle(&self, mut request: KeyLifecycleRequest) {
        let reply = request.response.take();
        let response = match self.dispatch(request.command, &request.zone_name).await {
            Ok(response) => response,
            Err(e) => {
                error!(zone = %request.zone_name, command = %request.command, error = %e, "Key lifecycle command failed");
                KeyLifecycleResponse::failed(&request.zone_name, &e)
            }
        };
        if let Some(reply) = reply {
            let _ = reply.send(response);
        }
    }

    #[instrument(skip(self), fields(command = %command))]
    async fn dispatch(
        &self,
        command: KeyLifecycleCommand,
        zone_name: &str,
    ) -> Result<KeyLifecycleResponse, DomainError> {
        let zone = self
            .zones
            .get(zone_name)
            .ok_or_else(|| DomainError::ZoneNotFound(zone_name.to_string()))?;
        let mut response = KeyLifecycleResponse {
            zone: zone.name().to_string(),
            ..Default::default()
        };

        match command {
            KeyLifecycleCommand::Bootstrap => {
                let outcome = self.bootstrap.execute(zone.as_ref()).await?;
                response.message = format!(
                    "SIG(0) key {} {} with parent {}",
                    outcome.key_id,
                    if outcome.generated {
                        "generated and bootstrapped"
                    } else {
                        "bootstrapped"
                    },
                    outcome.parent
                );
                response.bootstrap = Some(outcome);
            }
            KeyLifecycleCommand::Rollover(action) => {
                let outcome = self.rollover.execute(zone.as_ref(), action).await?;
                response.message = if outcome.completed {
                    format!(
                        "SIG(0) rollover completed: key {} replaced key {}",
                        outcome.new_key_id, outcome.old_key_id
                    )
                } else {
                    format!(
                        "new SIG(0) key {} published at parent; key {} still active",
                        outcome.new_key_id, outcome.old_key_id
                    )
                };
                response.rollover = Some(outcome);
            }
        }
        Ok(response)
    }
}
