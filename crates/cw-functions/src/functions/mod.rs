//! Built-in workflow functions.

mod book_appointment;
mod check_insurance;
mod find_slots;
mod search_patient;

use std::sync::LazyLock;

use regex::Regex;

pub use book_appointment::BookAppointment;
pub use check_insurance::CheckInsurance;
pub use find_slots::FindSlots;
pub use search_patient::SearchPatient;

use crate::types::WorkflowFunction;

/// Service types an eligibility check may ask about.
pub const SERVICE_TYPES: &[&str] = &[
    "cardiology",
    "primary-care",
    "orthopedics",
    "neurology",
    "dermatology",
    "mental-health",
];

/// Specialties that can be scheduled.
pub const SPECIALTIES: &[&str] = crate::mock::SPECIALTIES;

pub(crate) static PATIENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^P\d{3,}$").unwrap());

pub(crate) static SLOT_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^S\d+$").unwrap());

pub(crate) static MRN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^MRN-\d{4}-\d{3}$").unwrap());

/// All built-in functions, in catalog order.
pub fn all_functions() -> Vec<Box<dyn WorkflowFunction>> {
    vec![
        Box::new(SearchPatient),
        Box::new(CheckInsurance),
        Box::new(FindSlots),
        Box::new(BookAppointment),
    ]
}
