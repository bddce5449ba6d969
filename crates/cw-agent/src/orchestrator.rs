//! Request orchestrator.
//!
//! Per request: resolve → for each candidate call, in resolver order:
//! validate → guard → execute, simulate or stop → audit. Resolver output
//! never reaches the backend without passing the validator and guardrails.
//! Exactly one audit record is written per call (one for an empty
//! resolution) before the outcome is returned.
//!
//! Within one request, a `search_patient` call that finds exactly one
//! patient supplies `patient_id` to later calls that left it out. Slot ids
//! are never carried over.

use std::sync::Arc;

use cw_functions::{
    BackendError, BackendResult, FunctionRegistry, HealthcareBackend, unknown_function, validate,
};
use cw_protocol::audit::AuditRecord;
use cw_protocol::calls::ResolvedCall;
use cw_protocol::outcome::{ExecutionOutcome, OutcomeStatus};
use cw_protocol::request::WorkflowRequest;
use cw_protocol::validation::ValidationResult;
use cw_protocol::verdict::{Decision, GuardrailCheck, GuardrailVerdict};

use crate::audit::{AuditError, AuditSink};
use crate::guardrails::{GuardContext, GuardrailEngine};
use crate::resolver::IntentResolver;

/// Refusal reason when the resolver recognized nothing.
pub const NO_INTENT_REASON: &str = "no actionable intent recognized";

const SEARCH_FUNCTION: &str = "search_patient";
const PATIENT_ID: &str = "patient_id";

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// The audit trail could not record a state-changing call.
    #[error("audit write failed for mutating call {function}: {source}")]
    Audit { function: String, source: AuditError },
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

pub struct Orchestrator {
    registry: Arc<FunctionRegistry>,
    resolver: Arc<dyn IntentResolver>,
    backend: Arc<dyn HealthcareBackend>,
    audit: Arc<dyn AuditSink>,
    guardrails: GuardrailEngine,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<FunctionRegistry>,
        resolver: Arc<dyn IntentResolver>,
        backend: Arc<dyn HealthcareBackend>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let guardrails = GuardrailEngine::new(registry.clone());
        Self {
            registry,
            resolver,
            backend,
            audit,
            guardrails,
        }
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn resolver_name(&self) -> &str {
        self.resolver.tier_name()
    }

    /// Resolve the request text and process every candidate call.
    pub async fn process(
        &self,
        request: &WorkflowRequest,
    ) -> OrchestratorResult<Vec<ExecutionOutcome>> {
        let catalog = self.registry.exposed();
        let calls = self.resolver.resolve(&request.text, &catalog).await;
        tracing::info!(
            request_id = %request.id,
            resolver = self.resolver.tier_name(),
            calls = calls.len(),
            mode = %request.mode,
            "request resolved"
        );

        self.process_resolved(request, calls).await
    }

    /// Process already-resolved calls, e.g. a confirmed resubmission. An
    /// empty list is refused as a whole request, with one audit record.
    ///
    /// A mutating call is audited after the backend has run it. If that
    /// append fails, the change stays in the backend, no outcome is
    /// returned and no record exists: after `OrchestratorError::Audit`,
    /// reconcile the backend against the audit trail by hand.
    pub async fn process_resolved(
        &self,
        request: &WorkflowRequest,
        calls: Vec<ResolvedCall>,
    ) -> OrchestratorResult<Vec<ExecutionOutcome>> {
        if calls.is_empty() {
            return Ok(vec![self.refuse_request(request).await]);
        }

        let context = GuardContext::from_request(request);
        let mut outcomes = Vec::with_capacity(calls.len());
        let mut found_patient: Option<String> = None;

        for call in calls {
            let call = self.fill_patient_id(call, found_patient.as_deref());
            let outcome = self.process_call(&call, &context).await;
            if call.function_name == SEARCH_FUNCTION {
                found_patient = single_patient_id(&outcome);
            }
            tracing::info!(
                request_id = %request.id,
                function = %call.function_name,
                status = %outcome.status,
                check = outcome.verdict.check().map(|c| c.as_str()),
                "call processed"
            );

            let mutates = self
                .registry
                .lookup(&call.function_name)
                .is_ok_and(|spec| spec.mutates);
            let function = call.function_name.clone();
            let record = AuditRecord::new(request, Some(call), &outcome);
            if let Err(e) = self.audit.append(&record).await {
                if mutates {
                    tracing::error!(request_id = %request.id, function = %function, error = %e, "audit write failed for mutating call");
                    return Err(OrchestratorError::Audit {
                        function,
                        source: e,
                    });
                }
                tracing::error!(request_id = %request.id, function = %function, error = %e, "audit write failed");
            }
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    /// Supply `patient_id` when the call's function takes one and the call
    /// left it absent or null.
    fn fill_patient_id(&self, mut call: ResolvedCall, patient_id: Option<&str>) -> ResolvedCall {
        let Some(patient_id) = patient_id else {
            return call;
        };
        let takes_patient = self
            .registry
            .lookup(&call.function_name)
            .is_ok_and(|spec| spec.get_param(PATIENT_ID).is_some());
        if takes_patient
            && let Some(args) = call.arguments.as_object_mut()
            && args.get(PATIENT_ID).is_none_or(|v| v.is_null())
        {
            tracing::info!(
                function = %call.function_name,
                patient_id,
                "patient_id taken from earlier search"
            );
            args.insert(PATIENT_ID.into(), patient_id.into());
        }
        call
    }

    /// Whole-request refusal for an empty resolution.
    async fn refuse_request(&self, request: &WorkflowRequest) -> ExecutionOutcome {
        let verdict = self.guardrails.screen_request(&request.text).unwrap_or_else(|| {
            GuardrailVerdict::refuse(GuardrailCheck::Intent, NO_INTENT_REASON)
        });
        let outcome = ExecutionOutcome::refused(None, verdict, None);
        tracing::info!(
            request_id = %request.id,
            status = %outcome.status,
            check = outcome.verdict.check().map(|c| c.as_str()),
            "request refused"
        );

        let record = AuditRecord::new(request, None, &outcome);
        if let Err(e) = self.audit.append(&record).await {
            tracing::error!(request_id = %request.id, error = %e, "audit write failed");
        }
        outcome
    }

    async fn process_call(&self, call: &ResolvedCall, context: &GuardContext) -> ExecutionOutcome {
        let validation = match self.registry.lookup(&call.function_name) {
            Ok(spec) => validate(spec, &call.arguments),
            Err(_) => unknown_function(&call.function_name),
        };
        let verdict = self.guardrails.evaluate(call, &validation, context);

        match verdict.decision() {
            Decision::Refuse => {
                ExecutionOutcome::refused(Some(call.function_name.clone()), verdict, Some(validation))
            }
            Decision::RequireConfirmation => {
                let arguments = validation
                    .normalized
                    .as_ref()
                    .map(|args| args.to_json())
                    .unwrap_or_else(|| call.arguments.clone());
                let pending = ResolvedCall::new(call.function_name.clone(), arguments, call.source)
                    .with_confidence(call.confidence);
                ExecutionOutcome::confirmation_required(pending, verdict, validation)
            }
            Decision::Allow => {
                match self
                    .dispatch(&call.function_name, &validation, verdict.is_simulated())
                    .await
                {
                    Ok(result) => {
                        ExecutionOutcome::completed(&call.function_name, result, verdict, validation)
                    }
                    Err(e) => {
                        tracing::warn!(function = %call.function_name, error = %e, "backend call failed");
                        ExecutionOutcome::backend_failed(
                            &call.function_name,
                            e.to_string(),
                            verdict,
                            validation,
                        )
                    }
                }
            }
        }
    }

    /// Run the function's live or simulation path with normalized arguments.
    async fn dispatch(
        &self,
        name: &str,
        validation: &ValidationResult,
        simulate: bool,
    ) -> BackendResult<serde_json::Value> {
        let handler = self
            .registry
            .handler(name)
            .map_err(|e| BackendError::Other(e.to_string()))?;
        let args = validation.normalized.as_ref().ok_or_else(|| {
            BackendError::InvalidArgument("arguments were not normalized".into())
        })?;
        if simulate {
            handler.simulate(args, self.backend.as_ref()).await
        } else {
            handler.execute(args, self.backend.as_ref()).await
        }
    }
}

/// Id of the only patient a completed search returned.
fn single_patient_id(outcome: &ExecutionOutcome) -> Option<String> {
    if !matches!(outcome.status, OutcomeStatus::Executed | OutcomeStatus::DryRun) {
        return None;
    }
    let patients = outcome.result.as_ref()?.get("patients")?.as_array()?;
    match patients.as_slice() {
        [only] => only.get("id")?.as_str().map(str::to_string),
        _ => None,
    }
}
