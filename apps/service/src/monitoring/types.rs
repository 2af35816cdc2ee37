use serde::{Deserialize, Serialize};

/// Length of a check ID as minted by the CRUD layer.
pub const CHECK_ID_LEN: usize = 20;

/// Bounds on a check's probe timeout, in seconds.
pub const TIMEOUT_SECONDS_MIN: u64 = 1;
pub const TIMEOUT_SECONDS_MAX: u64 = 5;

/// Transport used for the outbound probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Https => write!(f, "https"),
        }
    }
}

/// HTTP method of the probe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }

    /// Uppercased name, the form the probe request and alert messages
    /// use.
    pub fn as_upper(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// Liveness state of a check between two probes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Up,
    #[default]
    Down,
}

impl std::fmt::Display for CheckState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckState::Up => write!(f, "up"),
            CheckState::Down => write!(f, "down"),
        }
    }
}

/// A monitored endpoint configuration plus its last known state.
///
/// Persisted as one camelCase JSON document per check in the `checks`
/// collection. `state` and `lastChecked` are absent until the worker
/// has probed the check once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    pub id: String,
    /// Opaque reference to the owning user (the CRUD layer stores a
    /// phone number or email hash here; the worker only passes it to
    /// the notifier).
    pub owner_ref: String,
    pub protocol: Protocol,
    /// Host and path without a scheme, e.g. `example.com/health`.
    pub url: String,
    pub method: Method,
    pub success_codes: Vec<u16>,
    pub timeout_seconds: u64,
    #[serde(default)]
    pub state: CheckState,
    #[serde(default)]
    pub last_checked: Option<i64>,
}

impl Check {
    /// Full request URL, scheme included.
    pub fn request_url(&self) -> String {
        format!("{}://{}", self.protocol, self.url)
    }
}

/// Raw result of a single probe. Ephemeral: folded into the check's
/// `state` by the outcome processor, and snapshotted into log entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub had_error: bool,
    pub error_detail: Option<String>,
    pub response_code: Option<u16>,
}

impl Outcome {
    /// A response arrived; its status code is the outcome.
    pub fn response(code: u16) -> Self {
        Self { had_error: false, error_detail: None, response_code: Some(code) }
    }

    /// The request failed below HTTP (DNS, connect, TLS, ...).
    pub fn transport(detail: impl Into<String>) -> Self {
        Self { had_error: true, error_detail: Some(detail.into()), response_code: None }
    }

    /// The probe's deadline elapsed before any other signal.
    pub fn timeout() -> Self {
        Self { had_error: true, error_detail: Some("timeout".to_string()), response_code: None }
    }
}

/// One immutable line in a check's append-only log.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub check: Check,
    pub outcome: Outcome,
    pub state: CheckState,
    pub alert: bool,
    pub time: i64,
}
