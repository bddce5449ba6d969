//! Shared test harness for E2E integration tests.
//!
//! Wires the real registry, guardrails and orchestrator to an in-memory
//! backend and audit sink, with either the rule resolver (pinned to a fixed
//! day) or a scripted resolver that returns canned calls.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use cw_agent::audit::MemoryAuditSink;
use cw_agent::orchestrator::Orchestrator;
use cw_agent::resolver::{IntentResolver, RuleResolver};
use cw_functions::{FunctionRegistry, FunctionSpec, MockHealthcareApi};
use cw_protocol::audit::AuditRecord;
use cw_protocol::calls::{CallSource, ResolvedCall};
use cw_protocol::outcome::ExecutionOutcome;
use cw_protocol::request::{ExecutionMode, WorkflowRequest};

/// Sunday; "next week" resolves to Monday 2026-10-19 through Friday 2026-10-23.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

/// Monday the mock slot table is anchored to.
pub fn week_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

/// End-to-end harness: real pipeline, mock backend, in-memory audit.
pub struct TestHarness {
    pub registry: Arc<FunctionRegistry>,
    pub backend: Arc<MockHealthcareApi>,
    pub audit: Arc<MemoryAuditSink>,
    pub orchestrator: Orchestrator,
}

impl TestHarness {
    /// Rule resolver pinned to `today()`.
    pub fn new() -> Self {
        Self::with_resolver(Arc::new(RuleResolver::at(today())))
    }

    /// Resolver that always returns `calls`, whatever the text.
    pub fn scripted(calls: Vec<ResolvedCall>) -> Self {
        Self::with_resolver(Arc::new(ScriptedResolver { calls }))
    }

    pub fn with_resolver(resolver: Arc<dyn IntentResolver>) -> Self {
        let registry = Arc::new(FunctionRegistry::with_defaults().unwrap());
        let backend = Arc::new(MockHealthcareApi::with_week_start(week_start()));
        let audit = Arc::new(MemoryAuditSink::new());
        let orchestrator =
            Orchestrator::new(registry.clone(), resolver, backend.clone(), audit.clone());
        Self {
            registry,
            backend,
            audit,
            orchestrator,
        }
    }

    /// Submit a LIVE, unconfirmed request.
    pub async fn submit(&self, text: &str) -> Vec<ExecutionOutcome> {
        self.submit_request(&WorkflowRequest::new(text)).await
    }

    pub async fn submit_with(
        &self,
        text: &str,
        mode: ExecutionMode,
        confirmed: bool,
    ) -> Vec<ExecutionOutcome> {
        let request = WorkflowRequest::new(text)
            .with_mode(mode)
            .with_confirmation(confirmed);
        self.submit_request(&request).await
    }

    pub async fn submit_request(&self, request: &WorkflowRequest) -> Vec<ExecutionOutcome> {
        self.orchestrator
            .process(request)
            .await
            .expect("orchestrator should not fail")
    }

    pub fn audit_records(&self) -> Vec<AuditRecord> {
        self.audit.records()
    }
}

/// Resolver returning a fixed list of calls.
pub struct ScriptedResolver {
    pub calls: Vec<ResolvedCall>,
}

#[async_trait]
impl IntentResolver for ScriptedResolver {
    async fn resolve(&self, _text: &str, _catalog: &[&FunctionSpec]) -> Vec<ResolvedCall> {
        self.calls.clone()
    }

    fn tier_name(&self) -> &str {
        "scripted"
    }
}

/// A model-sourced candidate call.
pub fn call(name: &str, arguments: Value) -> ResolvedCall {
    ResolvedCall::new(name, arguments, CallSource::Model).with_confidence(0.9)
}
