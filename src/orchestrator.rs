//! End-to-end verification flow.
//!
//! Sequences session creation, concurrent media upload, best-effort
//! submission and bounded decision polling into one reported outcome.
//! Each run owns its session, assets and poll state; nothing is shared
//! across concurrent runs except the read-only configuration.

use std::fmt;

use bon::Builder;
use serde::Serialize;
use tracing::{info, warn};

use crate::Result;
use crate::client::SessionClient;
use crate::config::VeriffConfig;
use crate::decision::{self, DecisionEnvelope};
use crate::error::Error;
use crate::poll::{self, PollOutcome};
use crate::types::{MediaAsset, MediaContext, Person, SessionId, SubmitAck, UploadAck};

/// One image supplied by the caller.
#[derive(Clone)]
pub struct ImageInput {
    pub content: Vec<u8>,
    pub mime_type: String,
}

impl ImageInput {
    pub fn new(content: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        ImageInput {
            content: content.into(),
            mime_type: mime_type.into(),
        }
    }
}

impl fmt::Debug for ImageInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageInput")
            .field("content_len", &self.content.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

/// Caller inputs for one verification attempt: the person hint plus the
/// three media payloads the provider requires.
#[derive(Builder, Clone, Debug)]
pub struct VerificationRequest {
    pub person: Person,
    pub document_front: ImageInput,
    pub document_back: ImageInput,
    pub face: ImageInput,
}

impl VerificationRequest {
    // Names every missing field; nothing is sent upstream on failure.
    fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.person.first_name.trim().is_empty() {
            missing.push("person.first_name".to_owned());
        }
        if self.person.last_name.trim().is_empty() {
            missing.push("person.last_name".to_owned());
        }
        for (name, image) in [
            ("document_front", &self.document_front),
            ("document_back", &self.document_back),
            ("face", &self.face),
        ] {
            if image.content.is_empty() {
                missing.push(name.to_owned());
            }
            if image.mime_type.trim().is_empty() {
                missing.push(format!("{name}.mime_type"));
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::precondition(missing))
        }
    }

    fn assets(&self) -> [MediaAsset; 3] {
        [
            MediaAsset::new(
                MediaContext::DocumentFront,
                self.document_front.content.clone(),
                self.document_front.mime_type.clone(),
            ),
            MediaAsset::new(
                MediaContext::DocumentBack,
                self.document_back.content.clone(),
                self.document_back.mime_type.clone(),
            ),
            MediaAsset::new(
                MediaContext::Face,
                self.face.content.clone(),
                self.face.mime_type.clone(),
            ),
        ]
    }
}

/// Handle for resuming a deferred decision out-of-band.
#[derive(Clone, Debug, Serialize)]
pub struct StatusCheckHandle {
    pub session_id: SessionId,
}

/// Externally visible state of one submission run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// A terminal decision arrived within the poll budget.
    Completed,
    /// The poll budget ran out while the review was still open.
    Processing,
}

/// Aggregate outcome of one submission run.
#[derive(Clone, Debug, Serialize)]
pub struct SubmissionResult {
    pub status: SubmissionStatus,
    pub session_id: SessionId,
    pub decision: Option<DecisionEnvelope>,
    /// Per-asset acknowledgements, kept for diagnostics and resumption.
    pub uploads: Vec<UploadAck>,
    pub submit: SubmitAck,
    pub poll_attempts: u32,
    pub status_check: StatusCheckHandle,
}

/// Drives one verification attempt end to end.
#[derive(Clone, Debug)]
pub struct VerificationFlow {
    client: SessionClient,
}

impl VerificationFlow {
    pub fn new(config: VeriffConfig) -> Result<Self> {
        Ok(VerificationFlow {
            client: SessionClient::new(config)?,
        })
    }

    /// Builds a flow over an existing client (useful for custom HTTP
    /// clients or tests).
    #[must_use]
    pub fn with_client(client: SessionClient) -> Self {
        VerificationFlow { client }
    }

    #[must_use]
    pub fn client(&self) -> &SessionClient {
        &self.client
    }

    /// Runs the full flow: create session, upload the three assets
    /// concurrently, submit (best effort), then poll for the decision.
    ///
    /// Returns `Completed` with the decision when a terminal verdict
    /// arrives within the poll budget, or `Processing` with a
    /// [`StatusCheckHandle`] when the budget runs out first. Upload
    /// failures abort the run before submission, after all three uploads
    /// have been awaited for diagnostics.
    pub async fn submit(&self, request: &VerificationRequest) -> Result<SubmissionResult> {
        request.validate()?;

        let session = self.client.create_session(Some(&request.person)).await?;
        let uploads = self.upload_all(&session.id, request).await?;
        info!(session_id = %session.id, "all media uploaded");

        let submit = self.client.submit_session(&session.id).await?;

        let outcome =
            poll::poll_decision(&self.client, &session.id, &self.client.config().poll).await?;

        let status_check = StatusCheckHandle {
            session_id: session.id.clone(),
        };
        match outcome.terminal {
            Some(envelope) => {
                info!(
                    session_id = %session.id,
                    status = %envelope.status,
                    attempts = outcome.attempts_used,
                    "verification completed"
                );
                Ok(SubmissionResult {
                    status: SubmissionStatus::Completed,
                    session_id: session.id,
                    decision: Some(envelope),
                    uploads,
                    submit,
                    poll_attempts: outcome.attempts_used,
                    status_check,
                })
            }
            None => {
                info!(
                    session_id = %session.id,
                    attempts = outcome.attempts_used,
                    "decision still processing after poll budget"
                );
                Ok(SubmissionResult {
                    status: SubmissionStatus::Processing,
                    session_id: session.id,
                    decision: None,
                    uploads,
                    submit,
                    poll_attempts: outcome.attempts_used,
                    status_check,
                })
            }
        }
    }

    /// One signed status probe; a 404 surfaces as a pending envelope.
    pub async fn check_status(&self, session_id: &str) -> Result<DecisionEnvelope> {
        let session = SessionId::parse(session_id)?;
        let raw = self.client.fetch_decision(&session).await?;
        Ok(decision::normalize(raw))
    }

    /// Resumes bounded polling for a session submitted earlier, from the
    /// session id alone.
    pub async fn await_decision(&self, session_id: &str) -> Result<PollOutcome> {
        let session = SessionId::parse(session_id)?;
        poll::poll_decision(&self.client, &session, &self.client.config().poll).await
    }

    // Fan-out/fan-in: all three uploads run concurrently and all are
    // awaited, so a failed run still carries every context's diagnostics.
    async fn upload_all(
        &self,
        session: &SessionId,
        request: &VerificationRequest,
    ) -> Result<Vec<UploadAck>> {
        let [front, back, face] = request.assets();
        let (front, back, face) = futures::join!(
            self.client.upload_media(session, &front),
            self.client.upload_media(session, &back),
            self.client.upload_media(session, &face),
        );

        let mut acks = Vec::with_capacity(3);
        let mut failures = Vec::new();
        for outcome in [front, back, face] {
            match outcome {
                Ok(ack) => acks.push(ack),
                Err(Error::Upload { failures: mut f }) => failures.append(&mut f),
                Err(other) => return Err(other),
            }
        }

        if failures.is_empty() {
            Ok(acks)
        } else {
            warn!(
                session_id = %session,
                failed = failures.len(),
                "media upload failed; aborting before submission"
            );
            Err(Error::upload(failures))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> ImageInput {
        ImageInput::new(vec![0xffu8, 0xd8, 0xff], "image/jpeg")
    }

    #[test]
    fn validation_names_every_missing_field() {
        let request = VerificationRequest::builder()
            .person(Person::new("", "Doe"))
            .document_front(ImageInput::new(Vec::new(), "image/jpeg"))
            .document_back(image())
            .face(ImageInput::new(vec![1u8], ""))
            .build();

        let err = request.validate().expect_err("must reject");
        match err {
            Error::Precondition { missing } => {
                assert!(missing.contains(&"person.first_name".to_owned()), "{missing:?}");
                assert!(missing.contains(&"document_front".to_owned()), "{missing:?}");
                assert!(missing.contains(&"face.mime_type".to_owned()), "{missing:?}");
                assert!(!missing.contains(&"document_back".to_owned()), "{missing:?}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn complete_request_passes_validation() {
        let request = VerificationRequest::builder()
            .person(Person::new("Jane", "Doe"))
            .document_front(image())
            .document_back(image())
            .face(image())
            .build();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn assets_cover_the_three_required_contexts() {
        let request = VerificationRequest::builder()
            .person(Person::new("Jane", "Doe"))
            .document_front(image())
            .document_back(image())
            .face(image())
            .build();
        let contexts: Vec<MediaContext> =
            request.assets().iter().map(|asset| asset.context).collect();
        assert_eq!(
            contexts,
            vec![
                MediaContext::DocumentFront,
                MediaContext::DocumentBack,
                MediaContext::Face
            ]
        );
    }
}
