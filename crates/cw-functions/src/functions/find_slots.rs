//! Function: find_available_slots (read-only).

use std::sync::LazyLock;

use async_trait::async_trait;
use serde_json::json;

use cw_protocol::validation::NormalizedArgs;

use super::SPECIALTIES;
use crate::backend::{HealthcareBackend, SlotQuery};
use crate::error::{BackendError, BackendResult};
use crate::spec::{FunctionSpec, ParamSpec};
use crate::types::{WorkflowFunction, required_text, to_json};

/// Widest date range a single slot search may cover.
pub const MAX_RANGE_DAYS: i64 = 90;

static SPEC: LazyLock<FunctionSpec> = LazyLock::new(|| {
    FunctionSpec::new(
        "find_available_slots",
        "Find available appointment slots for a given medical specialty within a date range.",
    )
    .param(
        ParamSpec::string("specialty", "Medical specialty, e.g. cardiology or neurology")
            .required()
            .one_of(SPECIALTIES),
    )
    .param(ParamSpec::date("start_date", "Start of the search range (YYYY-MM-DD)").required())
    .param(
        ParamSpec::date("end_date", "End of the search range (YYYY-MM-DD)")
            .required()
            .not_before("start_date")
            .max_span_days("start_date", MAX_RANGE_DAYS),
    )
    .param(ParamSpec::string("location", "Preferred facility (optional)").max_len(100))
});

pub struct FindSlots;

#[async_trait]
impl WorkflowFunction for FindSlots {
    fn spec(&self) -> &FunctionSpec {
        &SPEC
    }

    async fn execute(
        &self,
        args: &NormalizedArgs,
        backend: &dyn HealthcareBackend,
    ) -> BackendResult<serde_json::Value> {
        let date = |name: &str| {
            args.date(name)
                .ok_or_else(|| BackendError::InvalidArgument(format!("missing '{name}'")))
        };
        let query = SlotQuery {
            specialty: required_text(args, "specialty")?.to_string(),
            start_date: date("start_date")?,
            end_date: date("end_date")?,
            location: args.text("location").map(str::to_string),
        };
        let slots = backend.find_slots(&query).await?;
        Ok(json!({
            "total": slots.len(),
            "slots": to_json(&slots)?,
        }))
    }
}
