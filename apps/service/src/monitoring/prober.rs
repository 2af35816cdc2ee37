use std::time::Duration;

use anyhow::Result;

use super::types::{Check, Outcome};

/// Executes a single outbound probe per check.
///
/// One shared `reqwest` client carries the connection pool; the
/// per-check timeout is enforced by the prober itself so the
/// response / transport-error / timeout race stays explicit.
pub struct Prober {
    client: reqwest::Client,
}

impl Prober {
    pub fn new() -> Result<Self> {
        // No client-level timeout: each check brings its own deadline.
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }

    /// Probe the check's endpoint and return exactly one outcome.
    ///
    /// Three completion sources compete: a response, a transport
    /// error, and the check's own deadline. The select! below is the
    /// whole arbitration; whichever fires first becomes the outcome and
    /// the losers are dropped. A failed or timed-out probe is a valid
    /// `down` outcome, never an error to retry.
    pub async fn probe(&self, check: &Check) -> Outcome {
        let request =
            self.client.request(check.method.as_reqwest(), check.request_url()).send();
        let deadline = tokio::time::sleep(Duration::from_secs(check.timeout_seconds));

        tokio::select! {
            result = request => match result {
                Ok(response) => Outcome::response(response.status().as_u16()),
                Err(err) if err.is_timeout() => Outcome::timeout(),
                Err(err) => Outcome::transport(err.to_string()),
            },
            () = deadline => Outcome::timeout(),
        }
    }
}
