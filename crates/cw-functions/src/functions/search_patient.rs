//! Function: search_patient (read-only).

use std::sync::LazyLock;

use async_trait::async_trait;
use serde_json::json;

use cw_protocol::validation::NormalizedArgs;

use super::MRN_RE;
use crate::backend::{HealthcareBackend, PatientQuery};
use crate::error::BackendResult;
use crate::spec::{FunctionSpec, ParamSpec};
use crate::types::{WorkflowFunction, required_text, to_json};

static SPEC: LazyLock<FunctionSpec> = LazyLock::new(|| {
    FunctionSpec::new(
        "search_patient",
        "Search for a patient by name, date of birth, or medical record number. Returns matching patient records.",
    )
    .param(
        ParamSpec::string("name", "Patient name (first, last, or full name)")
            .required()
            .max_len(100),
    )
    .param(ParamSpec::date("dob", "Date of birth (YYYY-MM-DD)").not_in_future())
    .param(ParamSpec::string("identifier", "Medical record number, e.g. MRN-2024-001").identifier(&MRN_RE))
});

/// Looks up patient records.
pub struct SearchPatient;

#[async_trait]
impl WorkflowFunction for SearchPatient {
    fn spec(&self) -> &FunctionSpec {
        &SPEC
    }

    async fn execute(
        &self,
        args: &NormalizedArgs,
        backend: &dyn HealthcareBackend,
    ) -> BackendResult<serde_json::Value> {
        let query = PatientQuery {
            name: required_text(args, "name")?.to_string(),
            dob: args.date("dob"),
            identifier: args.text("identifier").map(str::to_string),
        };
        let patients = backend.search_patients(&query).await?;
        Ok(json!({
            "total": patients.len(),
            "patients": to_json(&patients)?,
        }))
    }
}
