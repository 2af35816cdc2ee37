use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::StreamExt;
use serde_json::Value;
use tokio::time::interval;
use tracing::{debug, info, warn};

use super::processor::{CHECKS_COLLECTION, OutcomeProcessor};
use super::prober::Prober;
use super::validation::validate;
use crate::alerts::Notifier;
use crate::store::{LogStore, RecordStore};

/// Timer settings for the two worker loops, plus the fan-out ceiling.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// How often every check is probed.
    pub probe_interval: Duration,
    /// How often active logs are rotated into archives.
    pub rotation_interval: Duration,
    /// Upper bound on in-flight probes within one tick. Fan-out is
    /// otherwise unbounded by design, so this is the only cap on
    /// simultaneous outbound connections.
    pub max_concurrent_probes: usize,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(30),
            rotation_interval: Duration::from_secs(24 * 60 * 60),
            max_concurrent_probes: 64,
        }
    }
}

/// The uptime-monitoring worker: drives probe passes over every stored
/// check and periodic log rotation.
///
/// All collaborators are injected at construction; the worker owns no
/// global state. Within a pass each check runs its own independent
/// read → validate → probe → process pipeline, so one slow endpoint
/// never holds up the rest. Overlapping ticks racing on the same check
/// resolve as last-writer-wins.
pub struct Worker {
    records: Arc<RecordStore>,
    logs: Arc<LogStore>,
    prober: Arc<Prober>,
    processor: OutcomeProcessor,
    settings: WorkerSettings,
}

impl Worker {
    pub fn new(
        records: Arc<RecordStore>,
        logs: Arc<LogStore>,
        prober: Arc<Prober>,
        notifier: Arc<dyn Notifier>,
        settings: WorkerSettings,
    ) -> Self {
        let processor =
            OutcomeProcessor::new(Arc::clone(&records), Arc::clone(&logs), notifier);
        Self { records, logs, prober, processor, settings }
    }

    /// Run both loops for the life of the process.
    ///
    /// `tokio::time::interval` completes its first tick immediately,
    /// which gives the required probe and rotation pass at t=0.
    pub async fn run(self) -> Result<()> {
        info!(
            probe_interval = ?self.settings.probe_interval,
            rotation_interval = ?self.settings.rotation_interval,
            "starting uptime worker"
        );

        let worker = Arc::new(self);

        let probe_loop = {
            let worker = Arc::clone(&worker);
            tokio::spawn(async move {
                let mut timer = interval(worker.settings.probe_interval);
                loop {
                    timer.tick().await;
                    worker.run_probe_pass().await;
                }
            })
        };

        let rotation_loop = {
            let worker = Arc::clone(&worker);
            tokio::spawn(async move {
                let mut timer = interval(worker.settings.rotation_interval);
                loop {
                    timer.tick().await;
                    worker.rotate_logs().await;
                }
            })
        };

        let (probe, rotation) = tokio::join!(probe_loop, rotation_loop);
        probe?;
        rotation?;
        Ok(())
    }

    /// One full probe pass: fan out an independent pipeline per check,
    /// capped at `max_concurrent_probes` in flight.
    pub async fn run_probe_pass(&self) {
        let ids = match self.records.list(CHECKS_COLLECTION).await {
            Ok(ids) => ids,
            Err(err) => {
                warn!("could not list checks: {err}");
                return;
            }
        };

        if ids.is_empty() {
            debug!("no checks to process");
            return;
        }

        debug!(checks = ids.len(), "starting probe pass");
        futures::stream::iter(ids)
            .for_each_concurrent(self.settings.max_concurrent_probes, |id| async move {
                self.run_check(&id).await;
            })
            .await;
    }

    /// One check's pipeline. Every failure is contained here so
    /// sibling pipelines and the scheduler loop never see it.
    async fn run_check(&self, id: &str) {
        let raw: Value = match self.records.read(CHECKS_COLLECTION, id).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(check = %id, "could not read check record: {err}");
                return;
            }
        };

        let check = match validate(&raw) {
            Ok(check) => check,
            Err(err) => {
                warn!(check = %id, "skipping malformed check: {err}");
                return;
            }
        };

        let outcome = self.prober.probe(&check).await;

        if let Err(err) = self.processor.process(check, outcome).await {
            warn!(check = %id, "failed to process outcome: {err}");
        }
    }

    /// One rotation pass: compress every active log to a timestamped
    /// archive, then truncate it. A log is only truncated after its
    /// archive is durably written, so a crash mid-rotation loses
    /// nothing.
    pub async fn rotate_logs(&self) {
        let names = match self.logs.list(false).await {
            Ok(names) => names,
            Err(err) => {
                warn!("could not list logs for rotation: {err}");
                return;
            }
        };

        if names.is_empty() {
            debug!("no logs to rotate");
            return;
        }

        for name in names {
            let archive = format!("{name}-{}", chrono::Utc::now().timestamp_millis());

            if let Err(err) = self.logs.compress(&name, &archive).await {
                warn!(log = %name, "failed to compress log, leaving it in place: {err}");
                continue;
            }

            match self.logs.truncate(&name).await {
                Ok(()) => debug!(log = %name, archive = %archive, "rotated log"),
                Err(err) => warn!(log = %name, "failed to truncate rotated log: {err}"),
            }
        }
    }
}
