//! Error types for the fetch layer.
//!
//! Every failure the executor can observe collapses into one of three
//! [`FetchError`] variants: `Http` (the server responded with a failure
//! status), `Runtime` (a local fault: transport error, timeout, malformed
//! or unserializable JSON), or `Unknown` (a defensive catch-all for
//! opaque values surfaced by custom transports). Normalization itself
//! never fails; a body that cannot be decoded degrades to `None` instead
//! of propagating.

use bytes::Bytes;
use thiserror::Error;

use crate::body::{ParsedBody, read_body};
use crate::classify::BodyKind;

/// The universal return contract of the executor: exactly one side is
/// populated, and nothing escapes through any other channel.
pub type FetchOutcome = Result<ParsedBody, FetchError>;

const TIMEOUT_MESSAGE: &str = "request timed out";

/// Normalized failure shape for the whole request pipeline.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The server was reachable and responded with a non-success status.
    #[error("HTTP {status} {status_text} for {url}")]
    Http {
        status: u16,
        status_text: String,
        url: String,
        /// Best-effort decoded response body; `None` when decoding failed.
        body: Option<ParsedBody>,
    },

    /// A local fault: transport error, timeout, serialization or parse
    /// failure.
    #[error("{message}")]
    Runtime {
        message: String,
        /// Lower-level source description when one exists.
        detail: Option<String>,
    },

    /// A failure value that fits neither shape, carried verbatim.
    #[error("unknown failure: {value}")]
    Unknown { value: serde_json::Value },
}

impl FetchError {
    pub(crate) fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
            detail: None,
        }
    }

    /// Wrap an opaque value that is neither an HTTP failure nor a
    /// recognizable runtime fault.
    pub fn unknown(value: serde_json::Value) -> Self {
        Self::Unknown { value }
    }

    /// Build the `Http` variant from a failed response, capturing the
    /// body on a best-effort basis: the classified read first, a plain
    /// text read second, `None` if both are unusable.
    pub fn from_response(
        status: u16,
        status_text: &str,
        url: &str,
        kind: BodyKind,
        bytes: &Bytes,
    ) -> Self {
        let body = read_body(kind, bytes)
            .ok()
            .or_else(|| read_body(BodyKind::Text, bytes).ok());
        Self::Http {
            status,
            status_text: status_text.to_string(),
            url: url.to_string(),
            body,
        }
    }

    /// HTTP status code, present only for the `Http` variant.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http { .. })
    }

    /// Whether this fault was produced by an expired timeout guard. The
    /// retry loop does not consult this; timeouts and transport faults
    /// spend the same budget.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Runtime { message, .. } if message == TIMEOUT_MESSAGE)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        let detail = std::error::Error::source(&err).map(|s| s.to_string());
        Self::Runtime {
            message: err.to_string(),
            detail,
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Runtime {
            message: err.to_string(),
            detail: None,
        }
    }
}

impl From<tokio::time::error::Elapsed> for FetchError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Self::runtime(TIMEOUT_MESSAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_response_decodes_json_body() {
        let bytes = Bytes::from_static(br#"{"error":"nope"}"#);
        let err = FetchError::from_response(422, "Unprocessable Entity", "/submit", BodyKind::Json, &bytes);
        assert_eq!(err.status_code(), Some(422));
        match err {
            FetchError::Http { body: Some(ParsedBody::Json(v)), .. } => {
                assert_eq!(v["error"], "nope");
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn from_response_falls_back_to_text_on_malformed_json() {
        let bytes = Bytes::from_static(b"<html>gateway</html>");
        let err = FetchError::from_response(502, "Bad Gateway", "/x", BodyKind::Json, &bytes);
        match err {
            FetchError::Http { body: Some(ParsedBody::Text(t)), .. } => {
                assert_eq!(t, "<html>gateway</html>");
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn timeout_is_recognizable() {
        async fn never() {
            std::future::pending::<()>().await
        }
        let err = tokio_test::block_on(async {
            tokio::time::timeout(std::time::Duration::from_millis(1), never())
                .await
                .map_err(FetchError::from)
                .unwrap_err()
        });
        assert!(err.is_timeout());
        assert!(!err.is_http());
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn unknown_carries_the_value_verbatim() {
        let err = FetchError::unknown(serde_json::json!({"weird": [1, 2]}));
        match err {
            FetchError::Unknown { value } => assert_eq!(value["weird"][1], 2),
            other => panic!("unexpected shape: {other:?}"),
        }
    }
}
