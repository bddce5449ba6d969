//! In-memory healthcare backend.
//!
//! Seeded with three patients, their coverages, eight practitioners across
//! four specialties and a weekday slot table (S1–S16) anchored to a week
//! start. Records every entry point invoked so tests can assert that a
//! mutating call never happened, and can be switched offline to exercise
//! backend failures.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Datelike, Local, NaiveDate, NaiveTime, TimeDelta, Utc};
use uuid::Uuid;

use cw_protocol::domain::{
    Appointment, AppointmentStatus, Coverage, CoveragePeriod, CoverageStatus, Eligibility,
    HumanName, Identifier, Participant, Patient, Slot, SlotStatus,
};

use crate::backend::{BookingRequest, HealthcareBackend, PatientQuery, SlotQuery};
use crate::error::{BackendError, BackendResult};

/// Specialties with practitioners on the mock schedule.
pub const SPECIALTIES: &[&str] = &["cardiology", "neurology", "orthopedics", "primary-care"];

/// (specialty, practitioner id, name, location)
const PRACTITIONERS: &[(&str, &str, &str, &str)] = &[
    ("cardiology", "DR001", "Dr. Suresh Reddy", "City Heart Center"),
    ("cardiology", "DR002", "Dr. Emily Chen", "Metro Cardiology Clinic"),
    ("neurology", "DR003", "Dr. Amit Sharma", "Brain & Spine Institute"),
    ("neurology", "DR004", "Dr. Lisa Park", "Neurology Associates"),
    ("orthopedics", "DR005", "Dr. Rajesh Gupta", "Joint Care Hospital"),
    ("orthopedics", "DR006", "Dr. Michael Brown", "Sports Medicine Center"),
    ("primary-care", "DR007", "Dr. Priya Menon", "Family Health Clinic"),
    ("primary-care", "DR008", "Dr. James Wilson", "Community Medical Center"),
];

const SLOT_HOURS: [i64; 4] = [9, 11, 14, 16];
const SLOTS_PER_SPECIALTY: usize = 4;
const MAX_SLOT_RESULTS: usize = 10;
const SLOT_MINUTES: i64 = 30;

/// Backend entry points, as recorded by the mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendCall {
    SearchPatients,
    CheckEligibility,
    FindSlots,
    BookAppointment,
    PreviewAppointment,
}

impl BackendCall {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchPatients => "search_patients",
            Self::CheckEligibility => "check_eligibility",
            Self::FindSlots => "find_slots",
            Self::BookAppointment => "book_appointment",
            Self::PreviewAppointment => "preview_appointment",
        }
    }

    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::BookAppointment)
    }
}

struct MockState {
    booked: HashSet<String>,
    appointments: Vec<Appointment>,
    calls: Vec<BackendCall>,
    available: bool,
}

pub struct MockHealthcareApi {
    patients: Vec<Patient>,
    coverages: HashMap<String, Coverage>,
    slots: Vec<Slot>,
    week_start: NaiveDate,
    state: Mutex<MockState>,
}

impl MockHealthcareApi {
    /// Slots anchored to the Monday after today.
    pub fn new() -> Self {
        let today = Local::now().date_naive();
        let offset = 7 - i64::from(today.weekday().num_days_from_monday());
        Self::with_week_start(today + TimeDelta::days(offset))
    }

    /// Slots anchored to the week containing `date` (snapped back to Monday).
    pub fn with_week_start(date: NaiveDate) -> Self {
        let week_start =
            date - TimeDelta::days(i64::from(date.weekday().num_days_from_monday()));
        Self {
            patients: seed_patients(),
            coverages: seed_coverages(),
            slots: seed_slots(week_start),
            week_start,
            state: Mutex::new(MockState {
                booked: HashSet::new(),
                appointments: Vec::new(),
                calls: Vec::new(),
                available: true,
            }),
        }
    }

    pub fn week_start(&self) -> NaiveDate {
        self.week_start
    }

    /// Simulate an outage: every entry point fails with `Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Every entry point invoked, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, call: BackendCall) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    /// Number of invocations of persisting entry points.
    pub fn mutating_calls(&self) -> usize {
        self.lock().calls.iter().filter(|c| c.is_mutating()).count()
    }

    /// Appointments actually booked (previews excluded).
    pub fn appointments(&self) -> Vec<Appointment> {
        self.lock().appointments.clone()
    }

    pub fn is_booked(&self, slot_id: &str) -> bool {
        self.lock().booked.contains(slot_id)
    }

    pub fn slot(&self, slot_id: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.id == slot_id)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the call, then fail if offline.
    fn enter(&self, call: BackendCall) -> BackendResult<MutexGuard<'_, MockState>> {
        let mut state = self.lock();
        state.calls.push(call);
        if !state.available {
            return Err(BackendError::Unavailable(format!(
                "{} failed: mock backend is offline",
                call.as_str()
            )));
        }
        Ok(state)
    }

    fn patient(&self, patient_id: &str) -> BackendResult<&Patient> {
        self.patients
            .iter()
            .find(|p| p.id == patient_id)
            .ok_or_else(|| BackendError::NotFound(format!("patient '{patient_id}' not found")))
    }

    fn draft_appointment(
        &self,
        state: &MockState,
        request: &BookingRequest,
        status: AppointmentStatus,
    ) -> BackendResult<Appointment> {
        self.patient(&request.patient_id)?;
        let slot = self.slot(&request.slot_id).ok_or_else(|| {
            BackendError::NotFound(format!("slot '{}' not found", request.slot_id))
        })?;
        if state.booked.contains(&slot.id) {
            return Err(BackendError::Conflict(format!(
                "slot '{}' is no longer available",
                slot.id
            )));
        }

        let uid = Uuid::now_v7().simple().to_string();
        Ok(Appointment {
            id: format!("APT-{}", uid[24..].to_uppercase()),
            status,
            slot_id: slot.id.clone(),
            specialty: slot.specialty.clone(),
            reason: request.reason.clone(),
            start: slot.start,
            end: slot.end,
            participant: vec![
                Participant {
                    actor: format!("Patient/{}", request.patient_id),
                    status: "accepted".into(),
                },
                Participant {
                    actor: format!("Practitioner/{}", slot.practitioner_id),
                    status: "accepted".into(),
                },
            ],
            location: slot.location.clone(),
            practitioner_name: slot.practitioner_name.clone(),
            created: Utc::now(),
        })
    }
}

impl Default for MockHealthcareApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HealthcareBackend for MockHealthcareApi {
    async fn search_patients(&self, query: &PatientQuery) -> BackendResult<Vec<Patient>> {
        let _state = self.enter(BackendCall::SearchPatients)?;
        let needle = query.name.to_lowercase();
        let matches = self
            .patients
            .iter()
            .filter(|p| {
                p.name.iter().any(|n| {
                    let parts: Vec<String> = n
                        .given
                        .iter()
                        .chain(std::iter::once(&n.family))
                        .map(|s| s.to_lowercase())
                        .collect();
                    n.full_name().to_lowercase().contains(&needle)
                        || needle.split_whitespace().all(|t| parts.iter().any(|p| p == t))
                })
            })
            .filter(|p| query.dob.is_none_or(|dob| p.birth_date == dob))
            .filter(|p| {
                query.identifier.as_deref().is_none_or(|id| {
                    let id = id.to_lowercase();
                    p.identifier
                        .iter()
                        .any(|i| i.value.to_lowercase().contains(&id))
                })
            })
            .cloned()
            .collect();
        Ok(matches)
    }

    async fn check_eligibility(
        &self,
        patient_id: &str,
        service_type: &str,
    ) -> BackendResult<Eligibility> {
        let _state = self.enter(BackendCall::CheckEligibility)?;
        self.patient(patient_id)?;
        let coverage = self.coverages.get(patient_id).ok_or_else(|| {
            BackendError::NotFound(format!("no coverage on file for patient '{patient_id}'"))
        })?;

        let covered = coverage
            .eligible_services
            .iter()
            .any(|s| s.eq_ignore_ascii_case(service_type));
        let (is_eligible, reason) = if coverage.status != CoverageStatus::Active {
            (false, "Coverage is not active".to_string())
        } else if !covered {
            (
                false,
                format!("Service type '{service_type}' is not covered under this plan"),
            )
        } else {
            (true, "Patient is eligible for this service".to_string())
        };

        Ok(Eligibility {
            patient_id: patient_id.to_string(),
            service_requested: service_type.to_string(),
            is_eligible,
            eligibility_reason: reason,
            coverage: coverage.clone(),
        })
    }

    async fn find_slots(&self, query: &SlotQuery) -> BackendResult<Vec<Slot>> {
        let state = self.enter(BackendCall::FindSlots)?;
        let location = query.location.as_deref().map(str::to_lowercase);
        let slots = self
            .slots
            .iter()
            .filter(|s| s.specialty == query.specialty)
            .filter(|s| {
                let day = s.start.date();
                day >= query.start_date && day <= query.end_date
            })
            .filter(|s| {
                location
                    .as_deref()
                    .is_none_or(|loc| s.location.to_lowercase().contains(loc))
            })
            .filter(|s| !state.booked.contains(&s.id))
            .take(MAX_SLOT_RESULTS)
            .cloned()
            .collect();
        Ok(slots)
    }

    async fn book_appointment(&self, request: &BookingRequest) -> BackendResult<Appointment> {
        let mut state = self.enter(BackendCall::BookAppointment)?;
        let appointment = self.draft_appointment(&state, request, AppointmentStatus::Booked)?;
        state.booked.insert(appointment.slot_id.clone());
        state.appointments.push(appointment.clone());
        tracing::info!(
            appointment_id = %appointment.id,
            slot_id = %appointment.slot_id,
            "mock appointment booked"
        );
        Ok(appointment)
    }

    async fn preview_appointment(&self, request: &BookingRequest) -> BackendResult<Appointment> {
        let state = self.enter(BackendCall::PreviewAppointment)?;
        self.draft_appointment(&state, request, AppointmentStatus::Proposed)
    }
}

// ── Seed data ───────────────────────────────────────────────────

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn seed_patients() -> Vec<Patient> {
    let patient = |id: &str, given: &[&str], family: &str, dob: NaiveDate, gender: &str, mrn: &str| {
        Patient {
            id: id.to_string(),
            identifier: vec![Identifier {
                system: "urn:oid:hospital-mrn".into(),
                value: mrn.to_string(),
            }],
            name: vec![HumanName::new(given, family)],
            birth_date: dob,
            gender: Some(gender.to_string()),
            active: true,
        }
    };
    vec![
        patient("P001", &["Ravi"], "Kumar", date(1985, 3, 15), "male", "MRN-2024-001"),
        patient("P002", &["Sarah", "Marie"], "Johnson", date(1990, 7, 22), "female", "MRN-2024-002"),
        patient("P003", &["Anita"], "Patel", date(1978, 11, 30), "female", "MRN-2024-003"),
    ]
}

fn seed_coverages() -> HashMap<String, Coverage> {
    let services = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    [
        Coverage {
            id: "COV-001".into(),
            status: CoverageStatus::Active,
            beneficiary: "Patient/P001".into(),
            payor: vec!["Star Health Insurance".into()],
            period: CoveragePeriod { start: date(2024, 1, 1), end: None },
            plan_name: "Family Floater Premium".into(),
            copay_amount: 500.0,
            eligible_services: services(&[
                "cardiology",
                "primary-care",
                "orthopedics",
                "neurology",
                "dermatology",
            ]),
        },
        Coverage {
            id: "COV-002".into(),
            status: CoverageStatus::Active,
            beneficiary: "Patient/P002".into(),
            payor: vec!["Blue Cross Blue Shield".into()],
            period: CoveragePeriod { start: date(2024, 1, 1), end: None },
            plan_name: "PPO Gold Plan".into(),
            copay_amount: 30.0,
            eligible_services: services(&["primary-care", "cardiology", "mental-health"]),
        },
        Coverage {
            id: "COV-003".into(),
            status: CoverageStatus::Cancelled,
            beneficiary: "Patient/P003".into(),
            payor: vec!["ICICI Lombard".into()],
            period: CoveragePeriod {
                start: date(2023, 1, 1),
                end: Some(date(2023, 12, 31)),
            },
            plan_name: "Individual Health Plan".into(),
            copay_amount: 1000.0,
            eligible_services: Vec::new(),
        },
    ]
    .into_iter()
    .map(|c| (c.beneficiary.trim_start_matches("Patient/").to_string(), c))
    .collect()
}

/// Four slots per specialty, alternating practitioners, spread Monday–Friday.
fn seed_slots(week_start: NaiveDate) -> Vec<Slot> {
    (0..SPECIALTIES.len() * SLOTS_PER_SPECIALTY)
        .map(|i| {
            let (specialty, practitioner_id, practitioner_name, location) =
                PRACTITIONERS[(i / SLOTS_PER_SPECIALTY) * 2 + i % 2];
            let day = week_start + TimeDelta::days((i % 5) as i64);
            let start = day.and_time(NaiveTime::MIN) + TimeDelta::hours(SLOT_HOURS[i % 4]);
            Slot {
                id: format!("S{}", i + 1),
                status: SlotStatus::Free,
                start,
                end: start + TimeDelta::minutes(SLOT_MINUTES),
                specialty: specialty.into(),
                practitioner_id: practitioner_id.into(),
                practitioner_name: practitioner_name.into(),
                location: location.into(),
            }
        })
        .collect()
}
