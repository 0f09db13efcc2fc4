//! Error taxonomy and the remote-error value shared by every fallible
//! operation in the client.
//!
//! A flat set of [`ErrorCategory`] values maps one-to-one to process exit
//! codes. Every fallible operation in the core returns a value classified
//! into one category; propagation is by value (`Result<T, ClientError>`),
//! never by panicking for control flow.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

/// The six observable failure categories, mapped one-to-one to process
/// exit codes by [`ErrorCategory::exit_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorCategory {
    Success,
    UserError,
    ApiError,
    NetError,
    AuthError,
    PartialFailure,
}

impl ErrorCategory {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCategory::Success => 0,
            ErrorCategory::UserError => 1,
            ErrorCategory::ApiError => 2,
            ErrorCategory::NetError => 3,
            ErrorCategory::AuthError => 4,
            ErrorCategory::PartialFailure => 5,
        }
    }

    /// Classify an HTTP status code into the taxonomy's remote-error
    /// categories (401/403 -> auth, any other >=400 -> api).
    pub fn from_status(status: u16) -> ErrorCategory {
        match status {
            401 | 403 => ErrorCategory::AuthError,
            400..=599 => ErrorCategory::ApiError,
            _ => ErrorCategory::ApiError,
        }
    }
}

/// The sole error shape surfaced by the transport and decoded from the
/// remote service's `{errorMessages, errors}` envelope on `status >= 400`.
#[derive(Debug, Clone, Serialize, Default)]
pub struct RemoteError {
    pub status: u16,
    pub phrase: String,
    pub messages: Vec<String>,
    pub errors: BTreeMap<String, String>,
    pub raw_body: Option<String>,
    pub method: String,
    pub path: String,
}

impl RemoteError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_status(self.status)
    }

    /// `<method> <path>: <status> <phrase> - <messages-joined-by-semicolons>`
    pub fn display_line(&self) -> String {
        let joined = self.messages.join("; ");
        format!(
            "{} {}: {} {} - {}",
            self.method, self.path, self.status, self.phrase, joined
        )
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display_line())
    }
}

impl std::error::Error for RemoteError {}

/// Top-level error returned by every core operation.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{0}")]
    User(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("network error: {0}")]
    Net(String),
}

impl ClientError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ClientError::User(_) => ErrorCategory::UserError,
            ClientError::Remote(e) => e.category(),
            ClientError::Net(_) => ErrorCategory::NetError,
        }
    }

    /// User-visible single-line failure format (§7).
    pub fn display_line(&self) -> String {
        match self {
            ClientError::User(msg) => msg.clone(),
            ClientError::Remote(e) => e.display_line(),
            ClientError::Net(msg) => msg.clone(),
        }
    }

    /// JSON-mode failure object: `status`, `method`, `path`, `messages`,
    /// `errors`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ClientError::User(msg) => serde_json::json!({
                "status": serde_json::Value::Null,
                "method": serde_json::Value::Null,
                "path": serde_json::Value::Null,
                "messages": [msg],
                "errors": {},
            }),
            ClientError::Remote(e) => serde_json::json!({
                "status": e.status,
                "method": e.method,
                "path": e.path,
                "messages": e.messages,
                "errors": e.errors,
            }),
            ClientError::Net(msg) => serde_json::json!({
                "status": serde_json::Value::Null,
                "method": serde_json::Value::Null,
                "path": serde_json::Value::Null,
                "messages": [msg],
                "errors": {},
            }),
        }
    }
}

/// Aggregate several categories (e.g. from a batch run) into the single
/// category that the top level should exit with.
///
/// `Success` iff every outcome is `Success`; `PartialFailure` iff at least
/// one success and at least one non-success category are both present;
/// otherwise the most severe (highest-ranked) category observed.
pub fn aggregate(categories: &[ErrorCategory]) -> ErrorCategory {
    if categories.is_empty() {
        return ErrorCategory::Success;
    }
    let any_success = categories.iter().any(|c| *c == ErrorCategory::Success);
    let any_failure = categories.iter().any(|c| *c != ErrorCategory::Success);

    if any_success && any_failure {
        return ErrorCategory::PartialFailure;
    }
    if !any_failure {
        return ErrorCategory::Success;
    }

    categories
        .iter()
        .copied()
        .filter(|c| *c != ErrorCategory::Success)
        .max()
        .unwrap_or(ErrorCategory::ApiError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_taxonomy() {
        assert_eq!(ErrorCategory::Success.exit_code(), 0);
        assert_eq!(ErrorCategory::UserError.exit_code(), 1);
        assert_eq!(ErrorCategory::ApiError.exit_code(), 2);
        assert_eq!(ErrorCategory::NetError.exit_code(), 3);
        assert_eq!(ErrorCategory::AuthError.exit_code(), 4);
        assert_eq!(ErrorCategory::PartialFailure.exit_code(), 5);
    }

    #[test]
    fn status_401_and_403_are_auth_errors() {
        assert_eq!(ErrorCategory::from_status(401), ErrorCategory::AuthError);
        assert_eq!(ErrorCategory::from_status(403), ErrorCategory::AuthError);
    }

    #[test]
    fn other_4xx_5xx_are_api_errors() {
        assert_eq!(ErrorCategory::from_status(404), ErrorCategory::ApiError);
        assert_eq!(ErrorCategory::from_status(500), ErrorCategory::ApiError);
        assert_eq!(ErrorCategory::from_status(429), ErrorCategory::ApiError);
    }

    #[test]
    fn display_line_omits_messages_segment_when_empty() {
        let e = RemoteError {
            status: 0,
            phrase: String::new(),
            messages: vec![],
            errors: BTreeMap::new(),
            raw_body: None,
            method: "GET".into(),
            path: "/rest/api/3/issue/X".into(),
        };
        assert_eq!(e.display_line(), "GET /rest/api/3/issue/X: 0  - ");
    }

    #[test]
    fn aggregate_all_success() {
        let cats = [ErrorCategory::Success, ErrorCategory::Success];
        assert_eq!(aggregate(&cats), ErrorCategory::Success);
    }

    #[test]
    fn aggregate_all_failure_is_dominant_category() {
        let cats = [ErrorCategory::ApiError, ErrorCategory::AuthError];
        assert_eq!(aggregate(&cats), ErrorCategory::AuthError);
    }

    #[test]
    fn aggregate_mixed_is_partial_failure() {
        let cats = [ErrorCategory::Success, ErrorCategory::ApiError];
        assert_eq!(aggregate(&cats), ErrorCategory::PartialFailure);
    }

    #[test]
    fn aggregate_empty_is_success() {
        assert_eq!(aggregate(&[]), ErrorCategory::Success);
    }
}
