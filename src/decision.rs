//! Provider decision response normalization.
//!
//! The decision endpoint has shipped several response shapes over time:
//! an enveloped `{status:"success", verification:null|{..}}` form, and the
//! flat Full Auto form that carries the verdict at the top level. Every
//! shape is discriminated here, immediately after parsing, into one
//! [`DecisionEnvelope`]; nothing downstream probes optional fields again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw outcome of one decision fetch, before normalization.
#[derive(Clone, Debug)]
pub enum RawDecisionResponse {
    /// 404 from the decision endpoint: the review has not concluded yet.
    NotReady,
    /// Parsed 2xx body in one of the provider's shapes.
    Body(Value),
}

/// Normalized decision state.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DecisionStatus {
    Pending,
    Approved,
    Declined,
    ResubmissionRequested,
    Error,
    Unknown,
}

impl DecisionStatus {
    /// Terminal states end polling; `Pending` and `Unknown` never do.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DecisionStatus::Approved
                | DecisionStatus::Declined
                | DecisionStatus::ResubmissionRequested
        )
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "approved" => Some(DecisionStatus::Approved),
            "declined" => Some(DecisionStatus::Declined),
            "resubmission_requested" => Some(DecisionStatus::ResubmissionRequested),
            "error" | "fail" => Some(DecisionStatus::Error),
            _ => None,
        }
    }
}

/// Document fields the provider attaches to a terminal decision.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentDetails {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub number: Option<String>,
    pub country: Option<String>,
    pub valid_from: Option<String>,
    pub valid_until: Option<String>,
}

/// Person fields extracted from the verified document.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonDetails {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub nationality: Option<String>,
    pub id_number: Option<String>,
}

/// Risk label attached by the provider's screening.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RiskLabel {
    pub label: Option<String>,
    pub category: Option<String>,
}

// Terminal fields common to the enveloped and flat shapes. Everything is
// optional; shape mismatches degrade to `Unknown`, never to a parse error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct VerificationFields {
    status: Option<String>,
    decision: Option<String>,
    code: Option<i64>,
    reason: Option<String>,
    reason_code: Option<i64>,
    decision_score: Option<f64>,
    decision_time: Option<DateTime<Utc>>,
    acceptance_time: Option<DateTime<Utc>>,
    document: Option<DocumentDetails>,
    person: Option<PersonDetails>,
    risk_labels: Vec<RiskLabel>,
}

/// One normalized decision, however the provider chose to shape it.
/// Immutable once constructed.
#[derive(Clone, Debug, Serialize)]
pub struct DecisionEnvelope {
    pub status: DecisionStatus,
    pub code: Option<i64>,
    pub reason: Option<String>,
    pub reason_code: Option<i64>,
    /// Full Auto confidence score, when that variant produced the decision.
    pub decision_score: Option<f64>,
    pub decision_time: Option<DateTime<Utc>>,
    pub acceptance_time: Option<DateTime<Utc>>,
    pub document: Option<DocumentDetails>,
    pub person: Option<PersonDetails>,
    pub risk_labels: Vec<RiskLabel>,
    /// Provider body as received, retained for diagnostics.
    pub raw: Value,
}

impl DecisionEnvelope {
    fn bare(status: DecisionStatus, raw: Value) -> Self {
        DecisionEnvelope {
            status,
            code: None,
            reason: None,
            reason_code: None,
            decision_score: None,
            decision_time: None,
            acceptance_time: None,
            document: None,
            person: None,
            risk_labels: Vec::new(),
            raw,
        }
    }

    fn from_fields(status: DecisionStatus, fields: VerificationFields, raw: Value) -> Self {
        DecisionEnvelope {
            status,
            code: fields.code,
            reason: fields.reason,
            reason_code: fields.reason_code,
            decision_score: fields.decision_score,
            decision_time: fields.decision_time,
            acceptance_time: fields.acceptance_time,
            document: fields.document,
            person: fields.person,
            risk_labels: fields.risk_labels,
            raw,
        }
    }
}

/// Maps every known provider response shape onto one envelope.
///
/// A 404 (surfaced as [`RawDecisionResponse::NotReady`]) and an enveloped
/// `verification: null` both normalize to `Pending`. A body without a
/// recognized verdict is classified `Unknown` with the raw body attached,
/// never dropped.
#[must_use]
pub fn normalize(raw: RawDecisionResponse) -> DecisionEnvelope {
    let body = match raw {
        RawDecisionResponse::NotReady => {
            return DecisionEnvelope::bare(DecisionStatus::Pending, Value::Null);
        }
        RawDecisionResponse::Body(body) => body,
    };

    // Enveloped shape: the verdict lives under `verification`.
    if body.get("status").and_then(Value::as_str) == Some("success") {
        let verification = body
            .get("verification")
            .filter(|value| !value.is_null())
            .cloned();
        return match verification {
            None => DecisionEnvelope::bare(DecisionStatus::Pending, body),
            Some(fields) => normalize_fields(fields, body),
        };
    }

    // Flat / Full Auto shape: the verdict is at the top level, under
    // `decision` or `status`.
    normalize_fields(body.clone(), body)
}

fn normalize_fields(fields: Value, raw: Value) -> DecisionEnvelope {
    let Ok(fields) = serde_json::from_value::<VerificationFields>(fields) else {
        return DecisionEnvelope::bare(DecisionStatus::Unknown, raw);
    };

    let label = fields.decision.as_deref().or(fields.status.as_deref());
    match label.and_then(DecisionStatus::from_label) {
        Some(status) => DecisionEnvelope::from_fields(status, fields, raw),
        None => DecisionEnvelope::bare(DecisionStatus::Unknown, raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> RawDecisionResponse {
        RawDecisionResponse::Body(value)
    }

    #[test]
    fn not_ready_normalizes_to_pending() {
        let envelope = normalize(RawDecisionResponse::NotReady);
        assert_eq!(envelope.status, DecisionStatus::Pending);
        assert!(!envelope.status.is_terminal());
    }

    #[test]
    fn enveloped_null_verification_is_pending() {
        let envelope = normalize(body(json!({"status": "success", "verification": null})));
        assert_eq!(envelope.status, DecisionStatus::Pending);
    }

    #[test]
    fn enveloped_verification_unwraps_terminal_fields() {
        let envelope = normalize(body(json!({
            "status": "success",
            "verification": {
                "status": "approved",
                "code": 9001,
                "reason": null,
                "decisionTime": "2026-08-07T10:15:00.000Z",
                "acceptanceTime": "2026-08-07T10:05:00.000Z",
                "document": {"type": "DRIVERS_LICENSE", "number": "B0123456", "country": "US"},
                "person": {"firstName": "JANE", "lastName": "DOE"},
                "riskLabels": [{"label": "document_integration_risk", "category": "document"}]
            }
        })));

        assert_eq!(envelope.status, DecisionStatus::Approved);
        assert!(envelope.status.is_terminal());
        assert_eq!(envelope.code, Some(9001));
        assert_eq!(
            envelope.document.as_ref().and_then(|d| d.kind.as_deref()),
            Some("DRIVERS_LICENSE")
        );
        assert_eq!(
            envelope.person.as_ref().and_then(|p| p.first_name.as_deref()),
            Some("JANE")
        );
        assert_eq!(envelope.risk_labels.len(), 1);
        assert!(envelope.decision_time.is_some());
    }

    #[test]
    fn flat_shape_reads_fields_directly() {
        let envelope = normalize(body(json!({
            "decision": "approved",
            "decisionScore": 0.97,
            "document": {"type": "PASSPORT"}
        })));

        assert_eq!(envelope.status, DecisionStatus::Approved);
        assert_eq!(envelope.decision_score, Some(0.97));
        assert_eq!(
            envelope.document.as_ref().and_then(|d| d.kind.as_deref()),
            Some("PASSPORT")
        );
    }

    #[test]
    fn flat_declined_and_resubmission_labels() {
        let declined = normalize(body(json!({"decision": "declined", "reason": "document expired"})));
        assert_eq!(declined.status, DecisionStatus::Declined);
        assert_eq!(declined.reason.as_deref(), Some("document expired"));

        let resubmit = normalize(body(json!({"status": "resubmission_requested"})));
        assert_eq!(resubmit.status, DecisionStatus::ResubmissionRequested);
    }

    #[test]
    fn provider_error_body_maps_to_error_status() {
        let envelope = normalize(body(json!({"status": "fail", "code": 1104})));
        assert_eq!(envelope.status, DecisionStatus::Error);
        assert_eq!(envelope.code, Some(1104));
        assert!(!envelope.status.is_terminal());
    }

    #[test]
    fn unrecognized_body_passes_through_as_unknown() {
        let original = json!({"something": "else", "nested": {"a": 1}});
        let envelope = normalize(body(original.clone()));
        assert_eq!(envelope.status, DecisionStatus::Unknown);
        assert_eq!(envelope.raw, original);
    }

    #[test]
    fn enveloped_verification_without_verdict_is_unknown() {
        let envelope = normalize(body(json!({
            "status": "success",
            "verification": {"id": "76ae6fc4-8154-4e31-b8f1-1b23b3a1ec21"}
        })));
        assert_eq!(envelope.status, DecisionStatus::Unknown);
    }
}
