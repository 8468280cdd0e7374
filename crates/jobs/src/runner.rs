use crate::{
    DelegationCheckJob, DelegationSyncherJob, KeyBootstrapperJob, NotifierJob, ZoneUpdaterJob,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Central orchestrator for the engines.
///
/// Use the builder pattern to register engines, then call `.start()` once.
///
/// # Example
///
/// ```rust,ignore
/// let handles = JobRunner::new()
///     .with_zone_updater(zone_updater)
///     .with_notifier(notifier)
///     .with_key_bootstrapper(bootstrapper)
///     .with_delegation_syncher(syncher)
///     .with_delegation_check(check)
///     .start()
///     .await;
/// ```
#[derive(Default)]
pub struct JobRunner {
    zone_updater: Option<ZoneUpdaterJob>,
    notifier: Option<NotifierJob>,
    key_bootstrapper: Option<KeyBootstrapperJob>,
    delegation_syncher: Option<DelegationSyncherJob>,
    delegation_check: Option<DelegationCheckJob>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone_updater(mut self, job: ZoneUpdaterJob) -> Self {
        self.zone_updater = Some(job);
        self
    }

    pub fn with_notifier(mut self, job: NotifierJob) -> Self {
        self.notifier = Some(job);
        self
    }

    pub fn with_key_bootstrapper(mut self, job: KeyBootstrapperJob) -> Self {
        self.key_bootstrapper = Some(job);
        self
    }

    pub fn with_delegation_syncher(mut self, job: DelegationSyncherJob) -> Self {
        self.delegation_syncher = Some(job);
        self
    }

    pub fn with_delegation_check(mut self, job: DelegationCheckJob) -> Self {
        self.delegation_check = Some(job);
        self
    }

    /// Starts all registered engines and returns their task handles.
    pub async fn start(self) -> Vec<JoinHandle<()>> {
        info!("Starting engines");
        let mut handles = Vec::new();

        if let Some(job) = self.zone_updater {
            handles.push(job.start());
        }
        if let Some(job) = self.notifier {
            handles.push(job.start());
        }
        if let Some(job) = self.key_bootstrapper {
            handles.push(job.start());
        }
        if let Some(job) = self.delegation_syncher {
            handles.push(job.start());
        }
        if let Some(job) = self.delegation_check {
            handles.push(Arc::new(job).start());
        }

        info!(engines = handles.len(), "All engines started");
        handles
    }
}
