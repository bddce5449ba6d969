//! Human-readable rendering for the CLI.

use colored::{ColoredString, Colorize};
use serde_json::Value;
use tabled::{Table, Tabled};

use cw_functions::FunctionSpec;
use cw_protocol::domain::{Appointment, AppointmentStatus, Eligibility, Patient, Slot};
use cw_protocol::outcome::{ExecutionOutcome, OutcomeStatus};

use crate::audit::AuditSummary;

/// Catalog display row for table output
#[derive(Tabled)]
struct FunctionRow {
    #[tabled(rename = "Function")]
    name: String,
    #[tabled(rename = "Changes records")]
    mutates: String,
    #[tabled(rename = "Required")]
    required: String,
    #[tabled(rename = "Description")]
    description: String,
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Count")]
    count: usize,
}

/// Colorize status for display
pub fn status_label(status: OutcomeStatus) -> ColoredString {
    let label = format!("[{status}]");
    match status {
        OutcomeStatus::Executed => label.green().bold(),
        OutcomeStatus::DryRun => label.cyan().bold(),
        OutcomeStatus::ConfirmationRequired => label.yellow().bold(),
        OutcomeStatus::Refused | OutcomeStatus::ValidationFailed | OutcomeStatus::BackendFailed => {
            label.red().bold()
        }
    }
}

/// One block per outcome, separated by blank lines.
pub fn render_outcomes(outcomes: &[ExecutionOutcome]) -> String {
    outcomes
        .iter()
        .map(render_outcome)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_outcome(outcome: &ExecutionOutcome) -> String {
    let function = outcome.function_name.as_deref().unwrap_or("request");
    let mut lines = vec![format!("{} {function}", status_label(outcome.status))];

    if let Some(reason) = &outcome.reason {
        lines.push(format!("  reason: {reason}"));
    }
    if let Some(error) = &outcome.error {
        lines.push(format!("  error: {error}"));
    }
    if let Some(result) = &outcome.result {
        lines.extend(summarize_result(function, result).into_iter().map(|l| format!("  {l}")));
    }
    if let Some(pending) = &outcome.pending_call {
        lines.push(format!("  pending: {} {}", pending.function_name, pending.arguments));
        lines.push("  re-run with --confirm to proceed, or --dry-run to preview".into());
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Short text summary of a domain result. Falls back to compact JSON.
pub fn summarize_result(function: &str, result: &Value) -> Vec<String> {
    let summary = match function {
        "search_patient" => patient_lines(result),
        "check_insurance_eligibility" => eligibility_lines(result),
        "find_available_slots" => slot_lines(result),
        "book_appointment" => appointment_lines(result),
        _ => None,
    };
    summary.unwrap_or_else(|| vec![result.to_string()])
}

fn patient_lines(result: &Value) -> Option<Vec<String>> {
    let patients: Vec<Patient> = serde_json::from_value(result.get("patients")?.clone()).ok()?;
    if patients.is_empty() {
        return Some(vec!["no matching patients".into()]);
    }
    let mut lines = vec![format!("found {} patient(s)", patients.len())];
    for p in &patients {
        let mrn = p.identifier.first().map_or("-", |i| i.value.as_str());
        lines.push(format!(
            "{}  {}  born {}  {mrn}",
            p.id,
            p.display_name(),
            p.birth_date
        ));
    }
    Some(lines)
}

fn eligibility_lines(result: &Value) -> Option<Vec<String>> {
    let e: Eligibility = serde_json::from_value(result.clone()).ok()?;
    let verdict = if e.is_eligible { "eligible" } else { "NOT eligible" };
    Some(vec![
        format!(
            "{} is {verdict} for {}: {}",
            e.patient_id, e.service_requested, e.eligibility_reason
        ),
        format!(
            "plan: {} ({}), copay {:.2}",
            e.coverage.plan_name,
            e.coverage.payor.join(", "),
            e.coverage.copay_amount
        ),
    ])
}

fn slot_lines(result: &Value) -> Option<Vec<String>> {
    let slots: Vec<Slot> = serde_json::from_value(result.get("slots")?.clone()).ok()?;
    if slots.is_empty() {
        return Some(vec!["no open slots in that range".into()]);
    }
    let mut lines = vec![format!("{} open slot(s)", slots.len())];
    for s in &slots {
        lines.push(format!(
            "{}  {}  {}  {}, {}",
            s.id,
            s.start.format("%a %Y-%m-%d %H:%M"),
            s.specialty,
            s.practitioner_name,
            s.location
        ));
    }
    Some(lines)
}

fn appointment_lines(result: &Value) -> Option<Vec<String>> {
    let a: Appointment = serde_json::from_value(result.clone()).ok()?;
    let status = match a.status {
        AppointmentStatus::Booked => "booked",
        AppointmentStatus::Proposed => "proposed (nothing saved)",
    };
    Some(vec![
        format!("{} {status}", a.id),
        format!(
            "{} {} with {}, {}",
            a.specialty,
            a.start.format("%a %Y-%m-%d %H:%M"),
            a.practitioner_name,
            a.location
        ),
        format!("reason: {}", a.reason),
    ])
}

/// Function catalog as a table.
pub fn render_catalog(specs: &[&FunctionSpec]) -> String {
    let rows: Vec<FunctionRow> = specs
        .iter()
        .map(|s| FunctionRow {
            name: s.name.to_string(),
            mutates: if s.mutates { "yes" } else { "no" }.to_string(),
            required: s
                .required_params()
                .map(|p| p.name)
                .collect::<Vec<_>>()
                .join(", "),
            description: s.description.to_string(),
        })
        .collect();
    Table::new(rows).to_string()
}

pub fn render_summary(summary: &AuditSummary) -> String {
    if summary.total == 0 {
        return "no audit records".into();
    }
    let by_status: Vec<CountRow> = summary
        .by_status
        .iter()
        .map(|(status, count)| CountRow {
            key: status.to_string(),
            count: *count,
        })
        .collect();
    let by_function: Vec<CountRow> = summary
        .by_function
        .iter()
        .map(|(function, count)| CountRow {
            key: function.clone(),
            count: *count,
        })
        .collect();
    format!(
        "{} audit record(s)\n\nby status\n{}\n\nby function\n{}",
        summary.total,
        Table::new(by_status),
        Table::new(by_function)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_functions::FunctionRegistry;
    use cw_protocol::calls::{CallSource, ResolvedCall};
    use cw_protocol::validation::{NormalizedArgs, ValidationResult};
    use cw_protocol::verdict::{GuardrailCheck, GuardrailVerdict};
    use serde_json::json;

    fn completed(function: &str, result: Value) -> ExecutionOutcome {
        ExecutionOutcome::completed(
            function,
            result,
            GuardrailVerdict::allow(),
            ValidationResult::passed(NormalizedArgs::new()),
        )
    }

    #[test]
    fn patient_search_summary() {
        let result = json!({
            "total": 1,
            "patients": [{
                "resourceType": "Patient",
                "id": "P001",
                "identifier": [{"system": "urn:mrn", "value": "MRN-2024-001"}],
                "name": [{"family": "Kumar", "given": ["Ravi"]}],
                "birthDate": "1985-03-15",
                "gender": "male",
                "active": true
            }]
        });
        let text = render_outcome(&completed("search_patient", result));
        assert!(text.contains("[EXECUTED]"));
        assert!(text.contains("search_patient"));
        assert!(text.contains("P001  Ravi Kumar  born 1985-03-15  MRN-2024-001"));
    }

    #[test]
    fn empty_slot_search() {
        let text = render_outcome(&completed("find_available_slots", json!({"total": 0, "slots": []})));
        assert!(text.contains("no open slots"));
    }

    #[test]
    fn unknown_shape_falls_back_to_json() {
        let lines = summarize_result("search_patient", &json!({"unexpected": true}));
        assert_eq!(lines, vec![r#"{"unexpected":true}"#.to_string()]);
    }

    #[test]
    fn refusal_shows_reason() {
        let outcome = ExecutionOutcome::refused(
            None,
            GuardrailVerdict::refuse(GuardrailCheck::Intent, "no actionable intent recognized"),
            None,
        );
        let text = render_outcome(&outcome);
        assert!(text.contains("[REFUSED]"));
        assert!(text.contains("request"));
        assert!(text.contains("reason: no actionable intent recognized"));
    }

    #[test]
    fn pending_confirmation_shows_hint() {
        let pending = ResolvedCall::new(
            "book_appointment",
            json!({"patient_id": "P003", "slot_id": "S5"}),
            CallSource::Rules,
        );
        let mut normalized = NormalizedArgs::new();
        normalized.insert(
            "patient_id",
            cw_protocol::validation::ArgValue::Text("P003".into()),
        );
        let outcome = ExecutionOutcome::confirmation_required(
            pending,
            GuardrailVerdict::require_confirmation(
                GuardrailCheck::MutationConfirmation,
                "book_appointment changes records and needs explicit confirmation",
            ),
            ValidationResult::passed(normalized),
        );
        let text = render_outcome(&outcome);
        assert!(text.contains("[CONFIRMATION_REQUIRED]"));
        assert!(text.contains("pending: book_appointment"));
        assert!(text.contains("--confirm"));
    }

    #[test]
    fn catalog_table_lists_functions() {
        let registry = FunctionRegistry::with_defaults().unwrap();
        let table = render_catalog(&registry.exposed());
        for name in [
            "search_patient",
            "check_insurance_eligibility",
            "find_available_slots",
            "book_appointment",
        ] {
            assert!(table.contains(name), "missing {name}");
        }
        assert!(table.contains("patient_id, slot_id, reason"));
    }

    #[test]
    fn empty_summary() {
        assert_eq!(render_summary(&AuditSummary::default()), "no audit records");
    }
}
