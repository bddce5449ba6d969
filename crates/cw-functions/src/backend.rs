//! Healthcare backend abstraction.
//!
//! One typed entry point per workflow function plus a non-persisting booking
//! preview. Implementations: `MockHealthcareApi` (in `mock.rs`). A FHIR
//! server client would implement the same trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use cw_protocol::domain::{Appointment, Eligibility, Patient, Slot};

use crate::error::BackendResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientQuery {
    pub name: String,
    pub dob: Option<NaiveDate>,
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotQuery {
    pub specialty: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub patient_id: String,
    pub slot_id: String,
    pub reason: String,
}

#[async_trait]
pub trait HealthcareBackend: Send + Sync {
    async fn search_patients(&self, query: &PatientQuery) -> BackendResult<Vec<Patient>>;

    async fn check_eligibility(
        &self,
        patient_id: &str,
        service_type: &str,
    ) -> BackendResult<Eligibility>;

    async fn find_slots(&self, query: &SlotQuery) -> BackendResult<Vec<Slot>>;

    /// Book the slot. Persists.
    async fn book_appointment(&self, request: &BookingRequest) -> BackendResult<Appointment>;

    /// Same checks as `book_appointment`, returns a `proposed` appointment
    /// and persists nothing.
    async fn preview_appointment(&self, request: &BookingRequest) -> BackendResult<Appointment>;
}
