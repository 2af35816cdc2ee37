//! Sanity checking of raw check records before they are probed.
//!
//! Records come out of the record store as untyped JSON; a record that
//! was tampered with or half-written by an older version must be
//! skipped, never probed. Validation is typed per field and reports
//! every failing field at once.

use std::fmt;

use serde_json::Value;
use url::Url;

use super::types::{
    CHECK_ID_LEN, Check, CheckState, Method, Protocol, TIMEOUT_SECONDS_MAX, TIMEOUT_SECONDS_MIN,
};

/// One field that failed validation, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub reason: String,
}

/// Aggregated validation failure for a whole record. Non-fatal: the
/// caller logs it and skips the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "check failed validation:")?;
        for issue in &self.issues {
            write!(f, " [{}: {}]", issue.field, issue.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Validate and normalize a raw check record.
///
/// String fields are trimmed and enums matched case-sensitively in
/// their lowercase wire form, the shape the CRUD layer writes.
/// `state` and `lastChecked` default instead of rejecting, since both
/// are absent until the first probe. Idempotent: feeding a normalized
/// check back through yields the same check.
pub fn validate(raw: &Value) -> Result<Check, ValidationError> {
    let Some(record) = raw.as_object() else {
        return Err(ValidationError {
            issues: vec![FieldIssue {
                field: "record",
                reason: "not a JSON object".to_string(),
            }],
        });
    };

    let mut issues = Vec::new();
    let mut issue = |field: &'static str, reason: String| {
        issues.push(FieldIssue { field, reason });
    };

    let id = match record.get("id").and_then(Value::as_str).map(str::trim) {
        Some(id) if id.len() == CHECK_ID_LEN => Some(id.to_string()),
        Some(_) => {
            issue("id", format!("must be a {CHECK_ID_LEN}-character string"));
            None
        }
        None => {
            issue("id", "missing or not a string".to_string());
            None
        }
    };

    let owner_ref = match record.get("ownerRef").and_then(Value::as_str).map(str::trim) {
        Some(owner) if !owner.is_empty() => Some(owner.to_string()),
        Some(_) => {
            issue("ownerRef", "must not be empty".to_string());
            None
        }
        None => {
            issue("ownerRef", "missing or not a string".to_string());
            None
        }
    };

    let protocol = match record.get("protocol").and_then(Value::as_str).map(str::trim) {
        Some("http") => Some(Protocol::Http),
        Some("https") => Some(Protocol::Https),
        Some(other) => {
            issue("protocol", format!("unsupported protocol: {other}"));
            None
        }
        None => {
            issue("protocol", "missing or not a string".to_string());
            None
        }
    };

    let url = match record.get("url").and_then(Value::as_str).map(str::trim) {
        Some(url) if !url.is_empty() => {
            // The stored url carries no scheme; it must still form a
            // well-formed request URL once one is attached.
            match Url::parse(&format!("http://{url}")) {
                Ok(_) => Some(url.to_string()),
                Err(err) => {
                    issue("url", format!("not a valid URL: {err}"));
                    None
                }
            }
        }
        Some(_) => {
            issue("url", "must not be empty".to_string());
            None
        }
        None => {
            issue("url", "missing or not a string".to_string());
            None
        }
    };

    let method = match record.get("method").and_then(Value::as_str).map(str::trim) {
        Some("get") => Some(Method::Get),
        Some("post") => Some(Method::Post),
        Some("put") => Some(Method::Put),
        Some("delete") => Some(Method::Delete),
        Some(other) => {
            issue("method", format!("unsupported method: {other}"));
            None
        }
        None => {
            issue("method", "missing or not a string".to_string());
            None
        }
    };

    let success_codes = match record.get("successCodes").and_then(Value::as_array) {
        Some(codes) if !codes.is_empty() => {
            let parsed: Option<Vec<u16>> = codes
                .iter()
                .map(|code| code.as_u64().and_then(|code| u16::try_from(code).ok()))
                .collect();
            match parsed {
                Some(parsed) => Some(parsed),
                None => {
                    issue("successCodes", "must contain only HTTP status codes".to_string());
                    None
                }
            }
        }
        Some(_) => {
            issue("successCodes", "must not be empty".to_string());
            None
        }
        None => {
            issue("successCodes", "missing or not an array".to_string());
            None
        }
    };

    let timeout_seconds = match record.get("timeoutSeconds").and_then(Value::as_u64) {
        Some(timeout) if (TIMEOUT_SECONDS_MIN..=TIMEOUT_SECONDS_MAX).contains(&timeout) => {
            Some(timeout)
        }
        Some(timeout) => {
            issue(
                "timeoutSeconds",
                format!(
                    "{timeout} is outside [{TIMEOUT_SECONDS_MIN}, {TIMEOUT_SECONDS_MAX}] seconds"
                ),
            );
            None
        }
        None => {
            issue("timeoutSeconds", "missing or not an integer".to_string());
            None
        }
    };

    // First-run fields: the worker may never have seen this check, so
    // absence (or garbage) defaults rather than rejects.
    let state = match record.get("state").and_then(Value::as_str) {
        Some("up") => CheckState::Up,
        _ => CheckState::Down,
    };
    let last_checked = record.get("lastChecked").and_then(Value::as_i64);

    if !issues.is_empty() {
        return Err(ValidationError { issues });
    }

    // All Nones produced an issue above, so unwrapping here is safe,
    // but stay explicit rather than panic on a logic slip.
    match (id, owner_ref, protocol, url, method, success_codes, timeout_seconds) {
        (
            Some(id),
            Some(owner_ref),
            Some(protocol),
            Some(url),
            Some(method),
            Some(success_codes),
            Some(timeout_seconds),
        ) => Ok(Check {
            id,
            owner_ref,
            protocol,
            url,
            method,
            success_codes,
            timeout_seconds,
            state,
            last_checked,
        }),
        _ => Err(ValidationError {
            issues: vec![FieldIssue {
                field: "record",
                reason: "incomplete after validation".to_string(),
            }],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_check() -> Value {
        json!({
            "id": "abcdefghij0123456789",
            "ownerRef": "5551234567",
            "protocol": "http",
            "url": "example.com",
            "method": "get",
            "successCodes": [200, 201],
            "timeoutSeconds": 3
        })
    }

    #[test]
    fn valid_record_normalizes_with_defaults() {
        let check = validate(&raw_check()).unwrap();

        assert_eq!(check.id, "abcdefghij0123456789");
        assert_eq!(check.state, CheckState::Down);
        assert_eq!(check.last_checked, None);
        assert_eq!(check.success_codes, vec![200, 201]);
    }

    #[test]
    fn validation_is_idempotent() {
        let mut raw = raw_check();
        raw["url"] = json!("  example.com  ");
        raw["state"] = json!("up");
        raw["lastChecked"] = json!(1700000000000_i64);

        let once = validate(&raw).unwrap();
        let twice = validate(&serde_json::to_value(&once).unwrap()).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn wrong_id_length_is_rejected() {
        let mut raw = raw_check();
        raw["id"] = json!("short");

        let err = validate(&raw).unwrap_err();
        assert!(err.issues.iter().any(|issue| issue.field == "id"));
    }

    #[test]
    fn empty_success_codes_are_rejected() {
        let mut raw = raw_check();
        raw["successCodes"] = json!([]);

        let err = validate(&raw).unwrap_err();
        assert!(err.issues.iter().any(|issue| issue.field == "successCodes"));
    }

    #[test]
    fn timeout_out_of_range_is_rejected() {
        for timeout in [0, 6, 3600] {
            let mut raw = raw_check();
            raw["timeoutSeconds"] = json!(timeout);

            let err = validate(&raw).unwrap_err();
            assert!(err.issues.iter().any(|issue| issue.field == "timeoutSeconds"));
        }
    }

    #[test]
    fn all_failing_fields_are_reported_together() {
        let raw = json!({
            "id": "short",
            "ownerRef": "",
            "protocol": "gopher",
            "url": "",
            "method": "trace",
            "successCodes": [],
            "timeoutSeconds": 0
        });

        let err = validate(&raw).unwrap_err();
        let fields: Vec<_> = err.issues.iter().map(|issue| issue.field).collect();

        for field in
            ["id", "ownerRef", "protocol", "url", "method", "successCodes", "timeoutSeconds"]
        {
            assert!(fields.contains(&field), "missing issue for {field}");
        }
    }

    #[test]
    fn invalid_state_defaults_to_down_without_rejecting() {
        let mut raw = raw_check();
        raw["state"] = json!("sideways");

        let check = validate(&raw).unwrap();
        assert_eq!(check.state, CheckState::Down);
    }

    #[test]
    fn non_object_record_is_rejected() {
        let err = validate(&json!("not a record")).unwrap_err();
        assert_eq!(err.issues[0].field, "record");
    }
}
