use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::types::{Check, CheckState, LogEntry, Outcome};
use crate::alerts::{Notifier, alert_message};
use crate::store::{LogStore, RecordStore};

/// Collection holding check records.
pub const CHECKS_COLLECTION: &str = "checks";

/// Fold a probe outcome into a check: compute the new state and decide
/// whether the owner should be alerted.
///
/// A check is up iff the probe had no transport error and the response
/// code is one of its success codes. An alert is warranted only on a
/// state change, and never on the very first probe (`lastChecked`
/// unset), so a fresh deployment does not alert every owner at once.
pub fn evaluate(old: &Check, outcome: &Outcome, now: i64) -> (Check, bool) {
    let state = match outcome.response_code {
        Some(code) if !outcome.had_error && old.success_codes.contains(&code) => CheckState::Up,
        _ => CheckState::Down,
    };

    let alert_warranted = old.last_checked.is_some() && old.state != state;

    let mut updated = old.clone();
    updated.state = state;
    // lastChecked never moves backwards, even if the clock does.
    updated.last_checked = Some(old.last_checked.map_or(now, |previous| now.max(previous)));

    (updated, alert_warranted)
}

/// Persists probe outcomes and dispatches alerts.
///
/// Every processed outcome updates the check record and appends one
/// log entry; the alert itself is conditional. Failures here never
/// propagate to the scheduler: a failed persist leaves the check stale
/// until the next tick, a failed notification is logged and dropped.
pub struct OutcomeProcessor {
    records: Arc<RecordStore>,
    logs: Arc<LogStore>,
    notifier: Arc<dyn Notifier>,
}

impl OutcomeProcessor {
    pub fn new(
        records: Arc<RecordStore>,
        logs: Arc<LogStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { records, logs, notifier }
    }

    /// Apply one outcome: log it, persist the updated check, alert if
    /// warranted.
    pub async fn process(&self, old: Check, outcome: Outcome) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let (updated, alert_warranted) = evaluate(&old, &outcome, now);

        self.log_outcome(&old, &outcome, updated.state, alert_warranted, now).await;

        self.records
            .update(CHECKS_COLLECTION, &updated.id, &updated)
            .await
            .with_context(|| format!("persisting outcome for check {}", updated.id))?;

        if alert_warranted {
            self.alert(&updated).await;
        } else {
            debug!(check = %updated.id, state = %updated.state, "state unchanged, no alert");
        }

        Ok(())
    }

    /// Append one log entry for the probe; logging failures are
    /// non-fatal.
    async fn log_outcome(
        &self,
        check: &Check,
        outcome: &Outcome,
        state: CheckState,
        alert: bool,
        time: i64,
    ) {
        let entry =
            LogEntry { check: check.clone(), outcome: outcome.clone(), state, alert, time };

        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(err) => {
                warn!(check = %check.id, "failed to serialize log entry: {err}");
                return;
            }
        };

        if let Err(err) = self.logs.append(&check.id, &line).await {
            warn!(check = %check.id, "failed to append check log: {err}");
        }
    }

    /// Best-effort notification; the state update is already durable
    /// and is never rolled back when delivery fails.
    async fn alert(&self, check: &Check) {
        let message = alert_message(check);
        match self.notifier.send(&check.owner_ref, &message).await {
            Ok(()) => {
                info!(check = %check.id, owner = %check.owner_ref, "alerted owner: {message}");
            }
            Err(err) => {
                warn!(check = %check.id, "failed to alert owner: {err}");
            }
        }
    }
}
