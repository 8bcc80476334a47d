//! Signed HTTP operations against the station API.
//!
//! One [`SessionClient`] issues the four calls a verification attempt needs:
//! create session, upload media, submit, fetch decision. Payload-bearing
//! requests are signed over the exact serialized body string that is then
//! transmitted; the decision fetch is signed over the bare session id.

use chrono::Utc;
use reqwest::Client as ReqwestClient;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::Result;
use crate::config::VeriffConfig;
use crate::decision::RawDecisionResponse;
use crate::error::Error;
use crate::signing;
use crate::types::{MediaAsset, MediaContext, Person, Session, SessionId, SubmitAck, UploadAck};

const AUTH_CLIENT_HEADER: &str = "X-AUTH-CLIENT";
const SIGNATURE_HEADER: &str = "X-HMAC-SIGNATURE";

#[derive(Serialize)]
struct SessionBody<'a> {
    verification: SessionVerification<'a>,
}

#[derive(Serialize)]
struct SessionVerification<'a> {
    callback: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    person: Option<&'a Person>,
}

#[derive(Deserialize)]
struct SessionResponse {
    verification: Option<CreatedVerification>,
}

#[derive(Deserialize)]
struct CreatedVerification {
    id: Option<String>,
}

#[derive(Serialize)]
struct MediaBody<'a> {
    image: MediaImage<'a>,
}

#[derive(Serialize)]
struct MediaImage<'a> {
    context: MediaContext,
    content: &'a str,
}

#[derive(Default, Deserialize)]
struct UploadResponse {
    status: Option<String>,
    image: Option<UploadedImage>,
}

#[derive(Deserialize)]
struct UploadedImage {
    id: Option<String>,
}

#[derive(Serialize)]
struct SubmitBody<'a> {
    verification: SubmitVerification<'a>,
}

#[derive(Serialize)]
struct SubmitVerification<'a> {
    status: &'a str,
}

/// Issues the session operations, signing each payload that needs it.
#[derive(Clone, Debug)]
pub struct SessionClient {
    config: VeriffConfig,
    http: ReqwestClient,
}

impl SessionClient {
    /// Creates a client with a stock HTTP client honoring the configured
    /// request timeout.
    pub fn new(config: VeriffConfig) -> Result<Self> {
        let http = ReqwestClient::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::transport("build http client", e))?;
        Ok(Self::with_client(config, http))
    }

    /// Creates a client over a caller-supplied HTTP client.
    #[must_use]
    pub fn with_client(config: VeriffConfig, http: ReqwestClient) -> Self {
        SessionClient { config, http }
    }

    #[must_use]
    pub fn config(&self) -> &VeriffConfig {
        &self.config
    }

    /// `POST /v1/sessions` with the required HTTPS callback and an optional
    /// person hint. The returned id is trimmed and validated before use.
    pub async fn create_session(&self, person: Option<&Person>) -> Result<Session> {
        let body = SessionBody {
            verification: SessionVerification {
                callback: self.config.callback_url.as_str(),
                person,
            },
        };

        let response = self
            .http
            .post(self.endpoint("v1/sessions")?)
            .header(AUTH_CLIENT_HEADER, self.config.credentials.client_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::transport("create session", e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::transport("create session", e))?;

        if !status.is_success() {
            return Err(Error::session_create(status.as_u16(), text));
        }

        let parsed: SessionResponse = serde_json::from_str(&text)
            .map_err(|e| Error::malformed_response(format!("session body: {e}"), text.clone()))?;
        let id = parsed
            .verification
            .and_then(|v| v.id)
            .ok_or_else(|| Error::malformed_response("session body lacks verification.id", text))?;
        let id = SessionId::parse(&id)?;

        debug!(session_id = %id, "verification session created");
        Ok(Session {
            id,
            created_at: Utc::now(),
        })
    }

    /// `POST /v1/sessions/{id}/media`, signed over the exact JSON body.
    ///
    /// Fails on any non-2xx, on transport errors, and on a 2xx whose
    /// `status` field is not `"success"`.
    pub async fn upload_media(&self, session: &SessionId, asset: &MediaAsset) -> Result<UploadAck> {
        let content = asset.data_uri();
        let body = MediaBody {
            image: MediaImage {
                context: asset.context,
                content: &content,
            },
        };
        let payload = serde_json::to_string(&body)
            .map_err(|e| Error::validation(format!("serialize media body: {e}")))?;
        let payload_len = payload.len();
        let signature = signing::sign(payload.as_bytes(), self.config.credentials.shared_secret());

        debug!(
            session_id = %session,
            context = %asset.context,
            payload_len,
            "uploading media"
        );

        let response = self
            .http
            .post(self.endpoint(&format!("v1/sessions/{session}/media"))?)
            .header(AUTH_CLIENT_HEADER, self.config.credentials.client_key())
            .header(SIGNATURE_HEADER, &signature)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| Error::upload_one(asset.context, None, format!("transport: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::upload_one(asset.context, None, format!("transport: {e}")))?;

        if status == StatusCode::UNAUTHORIZED {
            warn!(
                session_id = %session,
                client_key = %self.config.credentials.client_key_hint(),
                payload_len,
                "media upload signature rejected"
            );
            return Err(Error::auth_mismatch(
                self.config.credentials.client_key_hint(),
                payload_len,
            ));
        }
        if !status.is_success() {
            return Err(Error::upload_one(asset.context, Some(status.as_u16()), text));
        }

        let parsed: UploadResponse = serde_json::from_str(&text).unwrap_or_default();
        if parsed.status.as_deref() != Some("success") {
            return Err(Error::upload_one(asset.context, Some(status.as_u16()), text));
        }

        Ok(UploadAck {
            context: asset.context,
            media_id: parsed.image.and_then(|image| image.id),
        })
    }

    /// `PATCH /v1/sessions/{id}` marking the session submitted.
    ///
    /// Best-effort: the provider may finalize without an explicit
    /// submission, so every failure mode folds into the returned ack rather
    /// than an error.
    pub async fn submit_session(&self, session: &SessionId) -> Result<SubmitAck> {
        let body = SubmitBody {
            verification: SubmitVerification {
                status: "submitted",
            },
        };
        let payload = serde_json::to_string(&body)
            .map_err(|e| Error::validation(format!("serialize submit body: {e}")))?;
        let signature = signing::sign(payload.as_bytes(), self.config.credentials.shared_secret());

        let outcome = self
            .http
            .patch(self.endpoint(&format!("v1/sessions/{session}"))?)
            .header(AUTH_CLIENT_HEADER, self.config.credentials.client_key())
            .header(SIGNATURE_HEADER, &signature)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await;

        let ack = match outcome {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    debug!(session_id = %session, "session marked submitted");
                    SubmitAck::submitted()
                } else {
                    let text = response.text().await.unwrap_or_default();
                    warn!(
                        session_id = %session,
                        http_status = status.as_u16(),
                        "session submission rejected; provider may still finalize"
                    );
                    SubmitAck::failed(Some(status.as_u16()), text)
                }
            }
            Err(err) => {
                warn!(
                    session_id = %session,
                    error = %err,
                    "session submission failed; provider may still finalize"
                );
                SubmitAck::failed(None, err.to_string())
            }
        };
        Ok(ack)
    }

    /// `GET` on the configured decision route, signed over the bare session
    /// id string.
    ///
    /// A 404 is not an error: it signals "decision not ready" and surfaces
    /// as [`RawDecisionResponse::NotReady`].
    pub async fn fetch_decision(&self, session: &SessionId) -> Result<RawDecisionResponse> {
        let signature = signing::sign(
            session.as_str().as_bytes(),
            self.config.credentials.shared_secret(),
        );

        let response = self
            .http
            .get(self.endpoint(&self.config.decision_route.path(session))?)
            .header(AUTH_CLIENT_HEADER, self.config.credentials.client_key())
            .header(SIGNATURE_HEADER, &signature)
            .send()
            .await
            .map_err(|e| Error::transport("fetch decision", e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(session_id = %session, "decision not ready");
            return Ok(RawDecisionResponse::NotReady);
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::transport("fetch decision", e))?;

        if status == StatusCode::UNAUTHORIZED {
            warn!(
                session_id = %session,
                client_key = %self.config.credentials.client_key_hint(),
                payload_len = session.as_str().len(),
                "decision fetch signature rejected; check the integration keys"
            );
            return Err(Error::auth_mismatch(
                self.config.credentials.client_key_hint(),
                session.as_str().len(),
            ));
        }
        if !status.is_success() {
            return Err(Error::decision_fetch(status.as_u16(), text));
        }

        let body = serde_json::from_str(&text)
            .map_err(|e| Error::malformed_response(format!("decision body: {e}"), text))?;
        Ok(RawDecisionResponse::Body(body))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.config.base_url.join(path)?)
    }
}
