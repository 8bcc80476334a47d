//! Veriff identity verification client SDK.
//!
//! Drives one verification attempt end to end against the station API:
//! - create a verification session
//! - upload document and face media concurrently, HMAC-signing each payload
//! - mark the session submitted (best effort)
//! - poll the decision endpoint with a bounded attempt budget
//!
//! [`VerificationFlow`] is the high-level surface; [`SessionClient`] is
//! exported for callers that drive the protocol themselves. Decision
//! responses in every historical provider shape normalize into one
//! [`DecisionEnvelope`].

pub mod client;
pub mod config;
pub mod decision;
pub mod error;
pub mod orchestrator;
pub mod poll;
mod signing;
pub mod types;

pub use client::SessionClient;
pub use config::{Credentials, DecisionRoute, VeriffConfig};
pub use decision::{
    DecisionEnvelope, DecisionStatus, DocumentDetails, PersonDetails, RawDecisionResponse,
    RiskLabel, normalize,
};
pub use error::{Error, Kind as ErrorKind, UploadFailure};
pub use orchestrator::{
    ImageInput, StatusCheckHandle, SubmissionResult, SubmissionStatus, VerificationFlow,
    VerificationRequest,
};
pub use poll::{PollOutcome, PollPolicy};
pub use types::{
    MediaAsset, MediaContext, Person, Session, SessionId, SubmitAck, SubmitStatus, UploadAck,
};

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
