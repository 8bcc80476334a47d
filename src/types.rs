use std::fmt;
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::Error;

/// Length of every provider-assigned session id.
pub const SESSION_ID_LEN: usize = 36;

/// Provider-assigned verification session id.
///
/// Construction trims surrounding whitespace and enforces the provider's
/// 36-character format, so an id held by this type is usable verbatim in
/// every follow-up call. This is the single source of truth for the trimmed
/// id: uploads and decision lookups cannot drift apart.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.len() != SESSION_ID_LEN {
            return Err(Error::invalid_session_id(raw));
        }
        Ok(SessionId(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SessionId::parse(s)
    }
}

/// A verification session minted by the provider.
///
/// The id is a capability token, not mutable state; nothing in this crate
/// rewrites it after creation.
#[derive(Clone, Debug, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
}

/// Person hint forwarded to the provider at session creation.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
}

impl Person {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Person {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

/// Media slot a payload fills within a session.
///
/// Serialized in the provider's kebab-case vocabulary (`document-front`,
/// `document-back`, `face`).
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MediaContext {
    DocumentFront,
    DocumentBack,
    Face,
}

/// One media payload bound for upload.
#[derive(Clone)]
pub struct MediaAsset {
    pub context: MediaContext,
    pub content: Vec<u8>,
    pub mime_type: String,
}

impl MediaAsset {
    pub fn new(context: MediaContext, content: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        MediaAsset {
            context,
            content: content.into(),
            mime_type: mime_type.into(),
        }
    }

    /// MIME-type-tagged data URI embedded in the upload envelope.
    pub(crate) fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            BASE64.encode(&self.content)
        )
    }
}

impl fmt::Debug for MediaAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaAsset")
            .field("context", &self.context)
            .field("content_len", &self.content.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Acknowledgement for one media upload.
#[derive(Clone, Debug, Serialize)]
pub struct UploadAck {
    pub context: MediaContext,
    /// Provider-assigned media id, when the response carried one.
    pub media_id: Option<String>,
}

/// Result of the best-effort submission call.
///
/// The provider may finalize a session without an explicit submission, so a
/// failed ack is a warning for the caller to record, never a fatal error.
#[derive(Clone, Debug, Serialize)]
pub struct SubmitAck {
    pub status: SubmitStatus,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStatus {
    Submitted,
    SubmissionFailed {
        http_status: Option<u16>,
        detail: String,
    },
}

impl SubmitAck {
    pub(crate) fn submitted() -> Self {
        SubmitAck {
            status: SubmitStatus::Submitted,
        }
    }

    pub(crate) fn failed(http_status: Option<u16>, detail: impl Into<String>) -> Self {
        SubmitAck {
            status: SubmitStatus::SubmissionFailed {
                http_status,
                detail: detail.into(),
            },
        }
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        matches!(self.status, SubmitStatus::Submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Kind;

    const VALID_ID: &str = "76ae6fc4-8154-4e31-b8f1-1b23b3a1ec21";

    #[test]
    fn session_id_accepts_36_characters() {
        let id = SessionId::parse(VALID_ID).expect("valid id");
        assert_eq!(id.as_str(), VALID_ID);
    }

    #[test]
    fn session_id_trims_surrounding_whitespace() {
        let id = SessionId::parse(&format!("  {VALID_ID}\n")).expect("valid id");
        assert_eq!(id.as_str(), VALID_ID);
        assert_eq!(id.to_string(), VALID_ID);
    }

    #[test]
    fn session_id_rejects_wrong_lengths() {
        for raw in ["", "short", &VALID_ID[..35], &format!("{VALID_ID}0")] {
            let err = SessionId::parse(raw).expect_err("must reject");
            assert_eq!(err.kind(), Kind::InvalidSessionId, "raw: {raw:?}");
        }
    }

    #[test]
    fn context_uses_provider_vocabulary() {
        assert_eq!(MediaContext::DocumentFront.to_string(), "document-front");
        assert_eq!(MediaContext::DocumentBack.to_string(), "document-back");
        assert_eq!(MediaContext::Face.to_string(), "face");
        let json = serde_json::to_string(&MediaContext::DocumentBack).expect("serialize");
        assert_eq!(json, "\"document-back\"");
    }

    #[test]
    fn data_uri_tags_mime_type_and_base64_content() {
        let asset = MediaAsset::new(MediaContext::Face, b"hi".to_vec(), "image/png");
        assert_eq!(asset.data_uri(), "data:image/png;base64,aGk=");
    }

    #[test]
    fn asset_debug_hides_content_bytes() {
        let asset = MediaAsset::new(MediaContext::Face, vec![0u8; 128], "image/jpeg");
        let debug = format!("{asset:?}");
        assert!(debug.contains("content_len"), "{debug}");
        assert!(!debug.contains("[0, 0"), "{debug}");
    }
}
