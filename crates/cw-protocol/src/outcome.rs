use serde::{Deserialize, Serialize};

use crate::calls::ResolvedCall;
use crate::validation::ValidationResult;
use crate::verdict::{Decision, GuardrailCheck, GuardrailVerdict};

/// Terminal status of one processed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
    Executed,
    DryRun,
    Refused,
    ValidationFailed,
    ConfirmationRequired,
    BackendFailed,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Executed => "EXECUTED",
            Self::DryRun => "DRY_RUN",
            Self::Refused => "REFUSED",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::ConfirmationRequired => "CONFIRMATION_REQUIRED",
            Self::BackendFailed => "BACKEND_FAILED",
        }
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller receives for one processed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub status: OutcomeStatus,
    /// Absent for whole-request refusals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    /// Domain result returned by the backend (live or simulated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Verbatim guardrail reason for non-ALLOW verdicts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Normalized call to resubmit with confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_call: Option<ResolvedCall>,
    /// Backend error message for BACKEND_FAILED.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub verdict: GuardrailVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
}

impl ExecutionOutcome {
    /// A REFUSE verdict. The validation gate maps to VALIDATION_FAILED.
    pub fn refused(
        function_name: Option<String>,
        verdict: GuardrailVerdict,
        validation: Option<ValidationResult>,
    ) -> Self {
        let status = if verdict.check() == Some(GuardrailCheck::ValidationGate) {
            OutcomeStatus::ValidationFailed
        } else {
            OutcomeStatus::Refused
        };
        Self {
            status,
            function_name,
            result: None,
            reason: verdict.reason().map(str::to_string),
            pending_call: None,
            error: None,
            verdict,
            validation,
        }
    }

    pub fn confirmation_required(
        pending_call: ResolvedCall,
        verdict: GuardrailVerdict,
        validation: ValidationResult,
    ) -> Self {
        Self {
            status: OutcomeStatus::ConfirmationRequired,
            function_name: Some(pending_call.function_name.clone()),
            result: None,
            reason: verdict.reason().map(str::to_string),
            pending_call: Some(pending_call),
            error: None,
            verdict,
            validation: Some(validation),
        }
    }

    /// Backend returned a result. Simulated verdicts yield DRY_RUN.
    pub fn completed(
        function_name: impl Into<String>,
        result: serde_json::Value,
        verdict: GuardrailVerdict,
        validation: ValidationResult,
    ) -> Self {
        let status = if verdict.is_simulated() {
            OutcomeStatus::DryRun
        } else {
            OutcomeStatus::Executed
        };
        Self {
            status,
            function_name: Some(function_name.into()),
            result: Some(result),
            reason: None,
            pending_call: None,
            error: None,
            verdict,
            validation: Some(validation),
        }
    }

    pub fn backend_failed(
        function_name: impl Into<String>,
        error: impl Into<String>,
        verdict: GuardrailVerdict,
        validation: ValidationResult,
    ) -> Self {
        Self {
            status: OutcomeStatus::BackendFailed,
            function_name: Some(function_name.into()),
            result: None,
            reason: None,
            pending_call: None,
            error: Some(error.into()),
            verdict,
            validation: Some(validation),
        }
    }

    /// Status agrees with the verdict and validation that produced it.
    pub fn is_consistent(&self) -> bool {
        let validated = self.validation.as_ref().is_some_and(|v| v.ok);
        match self.status {
            OutcomeStatus::Executed => {
                validated && self.verdict.is_allow() && !self.verdict.is_simulated()
            }
            OutcomeStatus::DryRun => {
                validated && self.verdict.is_allow() && self.verdict.is_simulated()
            }
            OutcomeStatus::BackendFailed => {
                validated && self.verdict.is_allow() && self.error.is_some()
            }
            OutcomeStatus::Refused | OutcomeStatus::ValidationFailed => {
                self.verdict.decision() == Decision::Refuse && self.reason.is_some()
            }
            OutcomeStatus::ConfirmationRequired => {
                validated
                    && self.verdict.decision() == Decision::RequireConfirmation
                    && self.pending_call.is_some()
            }
        }
    }
}
