//! E2E tests for the reference request scenarios, from free text to audit.

mod helpers;

use serde_json::json;

use cw_agent::orchestrator::NO_INTENT_REASON;
use cw_functions::BackendCall;
use cw_protocol::outcome::OutcomeStatus;
use cw_protocol::request::ExecutionMode;
use cw_protocol::verdict::{Decision, GuardrailCheck};

use helpers::TestHarness;

/// A: a patient lookup runs straight through.
#[tokio::test]
async fn e2e_search_patient_executes() {
    let h = TestHarness::new();

    let outcomes = h.submit("Search for patient Ravi Kumar").await;

    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert_eq!(outcome.status, OutcomeStatus::Executed);
    assert_eq!(outcome.function_name.as_deref(), Some("search_patient"));
    assert!(outcome.verdict.is_allow());

    let result = outcome.result.as_ref().unwrap();
    assert_eq!(result["total"], 1);
    assert_eq!(result["patients"][0]["id"], "P001");
    assert_eq!(result["patients"][0]["birthDate"], "1985-03-15");

    let records = h.audit_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].call.as_ref().unwrap().function_name, "search_patient");
    assert_eq!(records[0].outcome.status, OutcomeStatus::Executed);
    assert_eq!(h.backend.calls(), vec![BackendCall::SearchPatients]);
}

/// B: a live booking without confirmation stops and hands back the call.
#[tokio::test]
async fn e2e_booking_requires_confirmation() {
    let h = TestHarness::new();

    let outcomes = h.submit("Book appointment for P003, slot S5").await;

    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert_eq!(outcome.status, OutcomeStatus::ConfirmationRequired);
    assert_eq!(outcome.verdict.decision(), Decision::RequireConfirmation);
    assert!(outcome.reason.as_deref().unwrap().contains("confirmation"));

    let pending = outcome.pending_call.as_ref().unwrap();
    assert_eq!(pending.function_name, "book_appointment");
    assert_eq!(
        pending.arguments,
        json!({"patient_id": "P003", "slot_id": "S5", "reason": "Follow-up appointment"})
    );

    assert!(h.backend.calls().is_empty(), "no backend call before confirmation");
    assert!(!h.backend.is_booked("S5"));
    assert_eq!(h.audit.len(), 1);
}

/// C: diagnosis requests are refused for that reason, not as "no intent".
#[tokio::test]
async fn e2e_diagnosis_request_refused() {
    let h = TestHarness::new();

    let outcomes = h.submit("Diagnose my chest pain").await;

    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert_eq!(outcome.status, OutcomeStatus::Refused);
    assert_eq!(outcome.verdict.check(), Some(GuardrailCheck::Content));
    let reason = outcome.reason.as_deref().unwrap();
    assert!(reason.contains("Diagnosis is out of scope"));
    assert!(reason.contains("workflow actions, not medical judgment"));

    assert!(h.backend.calls().is_empty());
    assert_eq!(h.audit.len(), 1);
}

/// D: B resubmitted with confirmation in DRY_RUN previews and persists nothing.
#[tokio::test]
async fn e2e_confirmed_dry_run_booking_simulates() {
    let h = TestHarness::new();

    let outcomes = h
        .submit_with("Book appointment for P003, slot S5", ExecutionMode::DryRun, true)
        .await;

    assert_eq!(outcomes.len(), 1);
    let outcome = &outcomes[0];
    assert_eq!(outcome.status, OutcomeStatus::DryRun);
    assert!(outcome.verdict.is_simulated());
    let result = outcome.result.as_ref().unwrap();
    assert_eq!(result["status"], "proposed");
    assert_eq!(result["slotId"], "S5");

    assert_eq!(h.backend.call_count(BackendCall::BookAppointment), 0);
    assert_eq!(h.backend.call_count(BackendCall::PreviewAppointment), 1);
    assert!(!h.backend.is_booked("S5"));
    assert!(h.backend.appointments().is_empty());

    let records = h.audit_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].mode, ExecutionMode::DryRun);
    assert!(records[0].confirmed);
}

/// E: gibberish gets a single whole-request refusal.
#[tokio::test]
async fn e2e_gibberish_refused_once() {
    let h = TestHarness::new();

    let outcomes = h.submit("asdkjh qweoiu").await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, OutcomeStatus::Refused);
    assert_eq!(outcomes[0].reason.as_deref(), Some(NO_INTENT_REASON));
    assert!(outcomes[0].function_name.is_none());

    let records = h.audit_records();
    assert_eq!(records.len(), 1);
    assert!(records[0].call.is_none());
    assert_eq!(records[0].verdict.check(), Some(GuardrailCheck::Intent));
}

/// B then confirmed LIVE resubmission books the slot.
#[tokio::test]
async fn e2e_confirm_then_book() {
    let h = TestHarness::new();

    let first = h.submit("Book appointment for P003, slot S5").await;
    assert_eq!(first[0].status, OutcomeStatus::ConfirmationRequired);

    let second = h
        .submit_with("Book appointment for P003, slot S5", ExecutionMode::Live, true)
        .await;
    assert_eq!(second[0].status, OutcomeStatus::Executed);
    let result = second[0].result.as_ref().unwrap();
    assert_eq!(result["status"], "booked");
    assert!(result["id"].as_str().unwrap().starts_with("APT-"));
    assert!(h.backend.is_booked("S5"));

    // Booked slot is gone from the next search.
    let slots = h.submit("Find available neurology slots next week").await;
    let ids: Vec<&str> = slots[0].result.as_ref().unwrap()["slots"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["id"].as_str())
        .collect();
    assert!(!ids.contains(&"S5"));
    assert_eq!(h.audit.len(), 3);
}

/// A multi-intent request yields outcomes in resolver order.
#[tokio::test]
async fn e2e_multi_intent_in_order() {
    let h = TestHarness::new();

    let outcomes = h
        .submit("Schedule a cardiology follow-up for Ravi Kumar next week and check insurance")
        .await;

    let summary: Vec<(&str, OutcomeStatus)> = outcomes
        .iter()
        .map(|o| (o.function_name.as_deref().unwrap(), o.status))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("search_patient", OutcomeStatus::Executed),
            ("check_insurance_eligibility", OutcomeStatus::Executed),
            ("find_available_slots", OutcomeStatus::Executed),
            ("book_appointment", OutcomeStatus::ValidationFailed),
        ]
    );

    // The single search match supplies patient_id; a slot is never picked.
    let eligibility = outcomes[1].result.as_ref().unwrap();
    assert_eq!(eligibility["patientId"], "P001");
    assert_eq!(eligibility["isEligible"], true);
    let booking = outcomes[3].reason.as_deref().unwrap();
    assert!(booking.contains("slot_id"));
    assert!(!booking.contains("patient_id"));

    let slots = outcomes[2].result.as_ref().unwrap();
    assert_eq!(slots["total"], 4);

    assert_eq!(h.audit.len(), 4);
    assert_eq!(h.backend.mutating_calls(), 0);
}

#[tokio::test]
async fn e2e_insurance_check_by_patient_name() {
    let h = TestHarness::new();

    let outcomes = h
        .submit("Check cardiology insurance eligibility for patient Ravi Kumar")
        .await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].function_name.as_deref(), Some("search_patient"));
    assert_eq!(outcomes[0].status, OutcomeStatus::Executed);
    assert_eq!(outcomes[1].function_name.as_deref(), Some("check_insurance_eligibility"));
    assert_eq!(outcomes[1].status, OutcomeStatus::Executed);
    assert_eq!(outcomes[1].result.as_ref().unwrap()["patientId"], "P001");

    let records = h.audit_records();
    assert_eq!(records.len(), 2);
    let audited = &records[1].call.as_ref().unwrap().arguments;
    assert_eq!(audited["patient_id"], "P001");
    assert_eq!(audited["service_type"], "cardiology");
    assert_eq!(h.backend.call_count(BackendCall::CheckEligibility), 1);
}
