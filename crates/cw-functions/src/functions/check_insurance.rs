//! Function: check_insurance_eligibility (read-only).

use std::sync::LazyLock;

use async_trait::async_trait;

use cw_protocol::validation::NormalizedArgs;

use super::{PATIENT_ID_RE, SERVICE_TYPES};
use crate::backend::HealthcareBackend;
use crate::error::BackendResult;
use crate::spec::{FunctionSpec, ParamSpec};
use crate::types::{WorkflowFunction, required_text, to_json};

static SPEC: LazyLock<FunctionSpec> = LazyLock::new(|| {
    FunctionSpec::new(
        "check_insurance_eligibility",
        "Check insurance eligibility and coverage for a patient for a specific service type.",
    )
    .param(
        ParamSpec::string("patient_id", "Patient identifier, e.g. P001")
            .required()
            .identifier(&PATIENT_ID_RE),
    )
    .param(
        ParamSpec::string("service_type", "Type of service, e.g. cardiology or primary-care")
            .required()
            .one_of(SERVICE_TYPES),
    )
});

pub struct CheckInsurance;

#[async_trait]
impl WorkflowFunction for CheckInsurance {
    fn spec(&self) -> &FunctionSpec {
        &SPEC
    }

    async fn execute(
        &self,
        args: &NormalizedArgs,
        backend: &dyn HealthcareBackend,
    ) -> BackendResult<serde_json::Value> {
        let patient_id = required_text(args, "patient_id")?;
        let service_type = required_text(args, "service_type")?;
        let eligibility = backend.check_eligibility(patient_id, service_type).await?;
        to_json(&eligibility)
    }
}
