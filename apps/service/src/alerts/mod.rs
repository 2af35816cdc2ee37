/// User notification on check state transitions.
///
/// The worker only knows the `Notifier` seam; what actually carries
/// the message (Twilio SMS, or just the process log when no
/// credentials are configured) is injected at startup.
pub mod sms;

pub use sms::SmsNotifier;

use anyhow::Result;
use tracing::info;

use crate::monitoring::types::Check;

/// Delivery contract for alerts. Implementations must stay bounded:
/// the scheduler never waits on a notifier beyond its own timeout.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, destination: &str, message: &str) -> Result<()>;
}

/// Human-readable alert text for a check's new state.
pub fn alert_message(check: &Check) -> String {
    format!(
        "Alert: your check for {} {} is currently {}",
        check.method.as_upper(),
        check.request_url(),
        check.state
    )
}

/// Fallback notifier that writes alerts to the process log. Used when
/// no SMS credentials are configured, and handy in tests.
pub struct TracingNotifier;

#[async_trait::async_trait]
impl Notifier for TracingNotifier {
    async fn send(&self, destination: &str, message: &str) -> Result<()> {
        info!(destination, "{message}");
        Ok(())
    }
}
