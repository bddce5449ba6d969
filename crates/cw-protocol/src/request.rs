use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How allowed calls are carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionMode {
    /// Allowed calls run against the backend and may persist.
    #[default]
    Live,
    /// The full pipeline runs but nothing is persisted.
    DryRun,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "LIVE",
            Self::DryRun => "DRY_RUN",
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun)
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A natural-language request submitted by a clinician or administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRequest {
    /// Unique request ID (UUIDv7 for time-sortability).
    pub id: Uuid,
    /// Raw free text as typed by the caller.
    pub text: String,
    /// Requested execution mode. Never inferred from `text`.
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Explicit confirmation for state-mutating operations.
    #[serde(default)]
    pub confirmed: bool,
    /// Who issued the request, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    /// When the request entered the pipeline.
    pub received_at: DateTime<Utc>,
}

impl WorkflowRequest {
    /// A live, unconfirmed request with no actor.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            text: text.into(),
            mode: ExecutionMode::Live,
            confirmed: false,
            actor: None,
            received_at: Utc::now(),
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_confirmation(mut self, confirmed: bool) -> Self {
        self.confirmed = confirmed;
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}
