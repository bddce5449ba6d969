use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calls::ResolvedCall;
use crate::outcome::ExecutionOutcome;
use crate::request::{ExecutionMode, WorkflowRequest};
use crate::validation::ValidationResult;
use crate::verdict::GuardrailVerdict;

/// One append-only audit entry, written once per processed call.
///
/// Carries enough context to reconstruct why the decision was made: the raw
/// request, the candidate call, how it validated, which guardrail decided and
/// what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub record_id: Uuid,
    pub request_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub request_text: String,
    pub mode: ExecutionMode,
    pub confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// Absent for whole-request refusals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call: Option<ResolvedCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
    pub verdict: GuardrailVerdict,
    pub outcome: ExecutionOutcome,
}

impl AuditRecord {
    pub fn new(
        request: &WorkflowRequest,
        call: Option<ResolvedCall>,
        outcome: &ExecutionOutcome,
    ) -> Self {
        Self {
            record_id: Uuid::now_v7(),
            request_id: request.id,
            recorded_at: Utc::now(),
            request_text: request.text.clone(),
            mode: request.mode,
            confirmed: request.confirmed,
            actor: request.actor.clone(),
            call,
            validation: outcome.validation.clone(),
            verdict: outcome.verdict.clone(),
            outcome: outcome.clone(),
        }
    }
}
