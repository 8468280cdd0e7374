use ferrous_dsync_application::ports::{DnsMessenger, NotifyRequest, NotifyResponse};
use ferrous_dsync_domain::{DomainError, RecordType};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Sends NOTIFY messages on behalf of the other engines.
///
/// Non-urgent requests for a (zone, type) pair already notified within
/// `min_interval` are answered as suppressed.
pub struct NotifierJob {
    messenger: Arc<dyn DnsMessenger>,
    min_interval: Duration,
    last_sent: HashMap<(String, RecordType), Instant>,
    rx: mpsc::Receiver<NotifyRequest>,
    shutdown: CancellationToken,
}

impl NotifierJob {
    pub fn new(messenger: Arc<dyn DnsMessenger>, rx: mpsc::Receiver<NotifyRequest>) -> Self {
        Self {
            messenger,
            min_interval: Duration::from_secs(60),
            last_sent: HashMap::new(),
            rx,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub fn start(mut self) -> JoinHandle<()> {
        info!(min_interval = ?self.min_interval, "Starting notifier");
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("NotifierJob: shutting down");
                        break;
                    }
                    request = self.rx.recv() => {
                        let Some(request) = request else {
                            info!("NotifierJob: queue closed");
                            break;
                        };
                        let zone = request.zone_name.clone();
                        if AssertUnwindSafe(self.handle(request)).catch_unwind().await.is_err() {
                            error!(zone = %zone, "Notify handler panicked");
                        }
                    }
                }
            }
        })
    }

    async fn handle(&mut self, mut request: NotifyRequest) {
        let reply = request.response.take();
        let response = self.notify(&request).await;
        if let Some(reply) = reply {
            let _ = reply.send(response);
        }
    }

    async fn notify(&mut self, request: &NotifyRequest) -> NotifyResponse {
        if request.targets.is_empty() {
            return NotifyResponse {
                error: true,
                error_msg: format!("no NOTIFY targets for {}", request.zone_name),
                ..Default::default()
            };
        }

        let key = (request.zone_name.clone(), request.rrtype);
        if !request.urgent {
            if let Some(last) = self.last_sent.get(&key) {
                if last.elapsed() < self.min_interval {
                    debug!(zone = %request.zone_name, rrtype = %request.rrtype, "NOTIFY suppressed");
                    return NotifyResponse {
                        suppressed: true,
                        ..Default::default()
                    };
                }
            }
        }

        match self
            .messenger
            .send_notify(&request.zone_name, request.rrtype, &request.targets)
            .await
        {
            Ok(result) => {
                self.last_sent.insert(key, Instant::now());
                info!(zone = %request.zone_name, rrtype = %request.rrtype, "NOTIFY delivered");
                NotifyResponse {
                    result: Some(result),
                    ..Default::default()
                }
            }
            Err(DomainError::AllTargetsFailed { result, .. }) => {
                warn!(zone = %request.zone_name, rrtype = %request.rrtype, failures = %result.failure_summary(), "NOTIFY not accepted");
                NotifyResponse {
                    error: true,
                    error_msg: result.failure_summary(),
                    result: Some(result),
                    ..Default::default()
                }
            }
            Err(e) => {
                error!(zone = %request.zone_name, error = %e, "NOTIFY failed");
                NotifyResponse {
                    error: true,
                    error_msg: e.to_string(),
                    ..Default::default()
                }
            }
        }
    }
}
