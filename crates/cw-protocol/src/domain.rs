//! FHIR-style domain resources returned by the healthcare backend.
//!
//! Only the subset of each resource the workflow functions need is modelled.
//! Resources serialize with a `resourceType` tag and camelCase field names.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Patient ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanName {
    pub family: String,
    #[serde(default)]
    pub given: Vec<String>,
}

impl HumanName {
    pub fn new(given: &[&str], family: &str) -> Self {
        Self {
            family: family.to_string(),
            given: given.iter().map(|g| g.to_string()).collect(),
        }
    }

    /// Given names followed by the family name.
    pub fn full_name(&self) -> String {
        let mut parts = self.given.clone();
        parts.push(self.family.clone());
        parts.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub system: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resourceType", rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    #[serde(default)]
    pub identifier: Vec<Identifier>,
    pub name: Vec<HumanName>,
    pub birth_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    pub active: bool,
}

impl Patient {
    /// First recorded name, rendered in full.
    pub fn display_name(&self) -> String {
        self.name
            .first()
            .map(HumanName::full_name)
            .unwrap_or_default()
    }
}

// ── Coverage / eligibility ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoverageStatus {
    Active,
    Cancelled,
    Draft,
    EnteredInError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoveragePeriod {
    pub start: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType", rename_all = "camelCase")]
pub struct Coverage {
    pub id: String,
    pub status: CoverageStatus,
    /// Reference to the covered patient, e.g. `Patient/P001`.
    pub beneficiary: String,
    pub payor: Vec<String>,
    pub period: CoveragePeriod,
    pub plan_name: String,
    pub copay_amount: f64,
    #[serde(default)]
    pub eligible_services: Vec<String>,
}

/// Answer to an eligibility check for one patient and service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    pub patient_id: String,
    pub service_requested: String,
    pub is_eligible: bool,
    pub eligibility_reason: String,
    pub coverage: Coverage,
}

// ── Scheduling ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotStatus {
    Free,
    Busy,
    BusyUnavailable,
    BusyTentative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resourceType", rename_all = "camelCase")]
pub struct Slot {
    pub id: String,
    pub status: SlotStatus,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub specialty: String,
    pub practitioner_id: String,
    pub practitioner_name: String,
    pub location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    /// Preview only, nothing persisted.
    Proposed,
    Booked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Reference such as `Patient/P003` or `Practitioner/DR001`.
    pub actor: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resourceType", rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub status: AppointmentStatus,
    pub slot_id: String,
    pub specialty: String,
    pub reason: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub participant: Vec<Participant>,
    pub location: String,
    pub practitioner_name: String,
    pub created: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ravi() -> Patient {
        Patient {
            id: "P001".into(),
            identifier: vec![Identifier {
                system: "urn:oid:hospital-mrn".into(),
                value: "MRN-2024-001".into(),
            }],
            name: vec![HumanName::new(&["Ravi"], "Kumar")],
            birth_date: NaiveDate::from_ymd_opt(1985, 3, 15).unwrap(),
            gender: Some("male".into()),
            active: true,
        }
    }

    #[test]
    fn full_name_joins_given_then_family() {
        let name = HumanName::new(&["Sarah", "Marie"], "Johnson");
        assert_eq!(name.full_name(), "Sarah Marie Johnson");
        assert_eq!(ravi().display_name(), "Ravi Kumar");
    }

    #[test]
    fn patient_serializes_fhir_style() {
        let json = serde_json::to_value(ravi()).unwrap();
        assert_eq!(json["resourceType"], "Patient");
        assert_eq!(json["birthDate"], "1985-03-15");
        assert_eq!(json["identifier"][0]["value"], "MRN-2024-001");
    }

    #[test]
    fn status_enums_use_fhir_codes() {
        assert_eq!(
            serde_json::to_string(&CoverageStatus::EnteredInError).unwrap(),
            r#""entered-in-error""#
        );
        assert_eq!(
            serde_json::to_string(&SlotStatus::BusyTentative).unwrap(),
            r#""busy-tentative""#
        );
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::Proposed).unwrap(),
            r#""proposed""#
        );
    }
}
