use std::fmt;

use crate::types::MediaContext;

/// Provider bodies are kept whole for diagnostics but truncated for display.
const BODY_DISPLAY_LIMIT: usize = 256;

/// One media upload that did not succeed.
#[derive(Clone, Debug)]
pub struct UploadFailure {
    pub context: MediaContext,
    /// HTTP status of the rejection, when one was received at all.
    pub http_status: Option<u16>,
    pub detail: String,
}

impl fmt::Display for UploadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.http_status {
            Some(status) => write!(
                f,
                "{} (HTTP {status}): {}",
                self.context,
                truncated(&self.detail)
            ),
            None => write!(f, "{}: {}", self.context, truncated(&self.detail)),
        }
    }
}

/// Error raised by the verification flow.
///
/// Messages may carry the session id, HTTP status, and provider body; the
/// shared HMAC secret never appears in any variant.
#[derive(Debug)]
pub enum Error {
    /// Required caller input was missing or empty; nothing was sent upstream.
    Precondition { missing: Vec<String> },
    /// Invalid configuration or argument values.
    Validation { detail: String },
    /// The provider rejected session creation.
    SessionCreate { http_status: u16, body: String },
    /// One or more media uploads did not succeed.
    Upload { failures: Vec<UploadFailure> },
    /// The id is not a 36-character provider session id.
    InvalidSessionId { id: String },
    /// The provider body could not be parsed or lacked required fields.
    MalformedResponse { detail: String, body: String },
    /// Decision fetch was rejected with an HTTP error other than 404.
    DecisionFetch { http_status: u16, body: String },
    /// The provider rejected the request signature or client key (HTTP 401).
    /// Carries enough context to tell key misconfiguration from a transient
    /// failure, without the secret itself.
    AuthMismatch {
        client_key_hint: String,
        payload_len: usize,
    },
    /// Network-level failure talking to the provider, timeouts included.
    Transport {
        operation: &'static str,
        source: reqwest::Error,
    },
}

/// Coarse error classification, used for retry decisions and test assertions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    Precondition,
    Validation,
    SessionCreate,
    Upload,
    InvalidSessionId,
    MalformedResponse,
    DecisionFetch,
    AuthMismatch,
    Transport,
}

impl Error {
    pub fn validation(detail: impl Into<String>) -> Self {
        Error::Validation {
            detail: detail.into(),
        }
    }

    pub fn precondition(missing: Vec<String>) -> Self {
        Error::Precondition { missing }
    }

    pub(crate) fn session_create(http_status: u16, body: impl Into<String>) -> Self {
        Error::SessionCreate {
            http_status,
            body: body.into(),
        }
    }

    pub(crate) fn upload_one(
        context: MediaContext,
        http_status: Option<u16>,
        detail: impl Into<String>,
    ) -> Self {
        Error::Upload {
            failures: vec![UploadFailure {
                context,
                http_status,
                detail: detail.into(),
            }],
        }
    }

    pub(crate) fn upload(failures: Vec<UploadFailure>) -> Self {
        Error::Upload { failures }
    }

    pub(crate) fn invalid_session_id(id: impl Into<String>) -> Self {
        Error::InvalidSessionId { id: id.into() }
    }

    pub(crate) fn malformed_response(detail: impl Into<String>, body: impl Into<String>) -> Self {
        Error::MalformedResponse {
            detail: detail.into(),
            body: body.into(),
        }
    }

    pub(crate) fn decision_fetch(http_status: u16, body: impl Into<String>) -> Self {
        Error::DecisionFetch {
            http_status,
            body: body.into(),
        }
    }

    pub(crate) fn auth_mismatch(client_key_hint: String, payload_len: usize) -> Self {
        Error::AuthMismatch {
            client_key_hint,
            payload_len,
        }
    }

    pub(crate) fn transport(operation: &'static str, source: reqwest::Error) -> Self {
        Error::Transport { operation, source }
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Error::Precondition { .. } => Kind::Precondition,
            Error::Validation { .. } => Kind::Validation,
            Error::SessionCreate { .. } => Kind::SessionCreate,
            Error::Upload { .. } => Kind::Upload,
            Error::InvalidSessionId { .. } => Kind::InvalidSessionId,
            Error::MalformedResponse { .. } => Kind::MalformedResponse,
            Error::DecisionFetch { .. } => Kind::DecisionFetch,
            Error::AuthMismatch { .. } => Kind::AuthMismatch,
            Error::Transport { .. } => Kind::Transport,
        }
    }

    /// Whether the poll loop may retry after this error.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self.kind(), Kind::DecisionFetch | Kind::Transport)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Precondition { missing } => {
                write!(f, "missing required input: {}", missing.join(", "))
            }
            Error::Validation { detail } => write!(f, "{detail}"),
            Error::SessionCreate { http_status, body } => write!(
                f,
                "session creation failed (HTTP {http_status}): {}",
                truncated(body)
            ),
            Error::Upload { failures } => {
                write!(f, "media upload failed: ")?;
                for (i, failure) in failures.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{failure}")?;
                }
                Ok(())
            }
            Error::InvalidSessionId { id } => {
                write!(f, "invalid session id `{id}` (expected 36 characters)")
            }
            Error::MalformedResponse { detail, body } => {
                write!(f, "malformed provider response ({detail}): {}", truncated(body))
            }
            Error::DecisionFetch { http_status, body } => write!(
                f,
                "decision fetch failed (HTTP {http_status}): {}",
                truncated(body)
            ),
            Error::AuthMismatch {
                client_key_hint,
                payload_len,
            } => write!(
                f,
                "signature rejected (HTTP 401) for client key {client_key_hint} \
                 over a {payload_len}-byte payload; check the integration keys"
            ),
            Error::Transport { operation, source } => {
                write!(f, "transport failure during {operation}: {source}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::validation(format!("invalid URL: {err}"))
    }
}

fn truncated(body: &str) -> &str {
    if body.len() <= BODY_DISPLAY_LIMIT {
        return body;
    }
    let mut end = BODY_DISPLAY_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_error_names_every_failed_context() {
        let err = Error::upload(vec![
            UploadFailure {
                context: MediaContext::DocumentBack,
                http_status: Some(400),
                detail: "bad image".to_owned(),
            },
            UploadFailure {
                context: MediaContext::Face,
                http_status: None,
                detail: "connection reset".to_owned(),
            },
        ]);
        let message = err.to_string();
        assert!(message.contains("document-back"), "{message}");
        assert!(message.contains("face"), "{message}");
        assert!(message.contains("400"), "{message}");
    }

    #[test]
    fn transient_classification_covers_retryable_kinds_only() {
        assert!(Error::decision_fetch(500, "oops").is_transient());
        assert!(!Error::invalid_session_id("nope").is_transient());
        assert!(!Error::auth_mismatch("abc12345…".to_owned(), 36).is_transient());
        assert!(!Error::validation("bad config").is_transient());
    }

    #[test]
    fn long_bodies_are_truncated_for_display() {
        let body = "x".repeat(10_000);
        let message = Error::session_create(502, body).to_string();
        assert!(message.len() < 1_000, "display leaked the full body");
    }
}
