//! Function: book_appointment (mutating).
//!
//! `execute` persists through the backend's booking entry point.
//! `simulate` goes through the non-persisting preview instead.

use std::sync::LazyLock;

use async_trait::async_trait;

use cw_protocol::validation::NormalizedArgs;

use super::{PATIENT_ID_RE, SLOT_ID_RE};
use crate::backend::{BookingRequest, HealthcareBackend};
use crate::error::BackendResult;
use crate::spec::{FunctionSpec, ParamSpec};
use crate::types::{WorkflowFunction, required_text, to_json};

static SPEC: LazyLock<FunctionSpec> = LazyLock::new(|| {
    FunctionSpec::new(
        "book_appointment",
        "Book an appointment for a patient at a specific slot. Changes records and needs confirmation.",
    )
    .param(
        ParamSpec::string("patient_id", "Patient identifier, e.g. P001")
            .required()
            .identifier(&PATIENT_ID_RE),
    )
    .param(
        ParamSpec::string("slot_id", "Slot identifier from find_available_slots, e.g. S5")
            .required()
            .identifier(&SLOT_ID_RE),
    )
    .param(
        ParamSpec::string("reason", "Reason for the appointment")
            .required()
            .min_len(1)
            .max_len(500),
    )
    .mutating()
});

pub struct BookAppointment;

impl BookAppointment {
    fn request(args: &NormalizedArgs) -> BackendResult<BookingRequest> {
        Ok(BookingRequest {
            patient_id: required_text(args, "patient_id")?.to_string(),
            slot_id: required_text(args, "slot_id")?.to_string(),
            reason: required_text(args, "reason")?.to_string(),
        })
    }
}

#[async_trait]
impl WorkflowFunction for BookAppointment {
    fn spec(&self) -> &FunctionSpec {
        &SPEC
    }

    async fn execute(
        &self,
        args: &NormalizedArgs,
        backend: &dyn HealthcareBackend,
    ) -> BackendResult<serde_json::Value> {
        let appointment = backend.book_appointment(&Self::request(args)?).await?;
        to_json(&appointment)
    }

    async fn simulate(
        &self,
        args: &NormalizedArgs,
        backend: &dyn HealthcareBackend,
    ) -> BackendResult<serde_json::Value> {
        let appointment = backend.preview_appointment(&Self::request(args)?).await?;
        to_json(&appointment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{BackendCall, MockHealthcareApi};
    use cw_protocol::validation::ArgValue;

    fn args() -> NormalizedArgs {
        let mut args = NormalizedArgs::new();
        args.insert("patient_id", ArgValue::Text("P003".into()));
        args.insert("slot_id", ArgValue::Text("S5".into()));
        args.insert("reason", ArgValue::Text("Follow-up appointment".into()));
        args
    }

    #[test]
    fn is_mutating() {
        assert!(BookAppointment.spec().mutates);
    }

    #[tokio::test]
    async fn execute_books() {
        let api = MockHealthcareApi::new();
        let result = BookAppointment.execute(&args(), &api).await.unwrap();
        assert_eq!(result["status"], "booked");
        assert_eq!(result["resourceType"], "Appointment");
        assert!(api.is_booked("S5"));
    }

    #[tokio::test]
    async fn simulate_uses_preview_only() {
        let api = MockHealthcareApi::new();
        let result = BookAppointment.simulate(&args(), &api).await.unwrap();
        assert_eq!(result["status"], "proposed");
        assert!(!api.is_booked("S5"));
        assert_eq!(api.calls(), vec![BackendCall::PreviewAppointment]);
    }
}
