//! Guardrail verdicts.
//!
//! A verdict is a value, not an error: refusals and confirmation requests
//! are ordinary terminal states of the pipeline. Every non-ALLOW verdict
//! carries a non-empty, human-readable reason. The fields are private so
//! that invariant cannot be broken after construction.

use serde::{Deserialize, Serialize};

/// The decision emitted for one candidate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Allow,
    Refuse,
    RequireConfirmation,
}

/// The guardrail rule that produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardrailCheck {
    /// Request-level: nothing actionable was recognized.
    Intent,
    Scope,
    Content,
    ValidationGate,
    MutationConfirmation,
    DryRun,
}

impl GuardrailCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intent => "intent",
            Self::Scope => "scope",
            Self::Content => "content",
            Self::ValidationGate => "validation_gate",
            Self::MutationConfirmation => "mutation_confirmation",
            Self::DryRun => "dry_run",
        }
    }
}

impl std::fmt::Display for GuardrailCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailVerdict {
    decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    check: Option<GuardrailCheck>,
    /// ALLOW only: run the simulation path, never persist.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    simulate: bool,
}

impl GuardrailVerdict {
    pub fn allow() -> Self {
        Self {
            decision: Decision::Allow,
            reason: None,
            check: None,
            simulate: false,
        }
    }

    /// ALLOW, downgraded to simulate-only by the dry-run override.
    pub fn allow_simulated() -> Self {
        Self {
            decision: Decision::Allow,
            reason: None,
            check: Some(GuardrailCheck::DryRun),
            simulate: true,
        }
    }

    pub fn refuse(check: GuardrailCheck, reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::Refuse,
            reason: Some(non_empty_reason(check, reason.into())),
            check: Some(check),
            simulate: false,
        }
    }

    pub fn require_confirmation(check: GuardrailCheck, reason: impl Into<String>) -> Self {
        Self {
            decision: Decision::RequireConfirmation,
            reason: Some(non_empty_reason(check, reason.into())),
            check: Some(check),
            simulate: false,
        }
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn check(&self) -> Option<GuardrailCheck> {
        self.check
    }

    pub fn is_allow(&self) -> bool {
        self.decision == Decision::Allow
    }

    pub fn is_simulated(&self) -> bool {
        self.simulate
    }
}

fn non_empty_reason(check: GuardrailCheck, reason: String) -> String {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        format!("blocked by the {check} guardrail")
    } else {
        trimmed.to_string()
    }
}
