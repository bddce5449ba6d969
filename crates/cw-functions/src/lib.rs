//! Workflow functions for the clinical workflow agent.
//!
//! Provides the function catalog (`FunctionSpec`/`ParamSpec`), a pure input
//! validator, the `FunctionRegistry`, a `HealthcareBackend` abstraction with
//! an in-memory `MockHealthcareApi`, and 4 built-in functions:
//! search_patient, check_insurance_eligibility, find_available_slots,
//! book_appointment.

pub mod backend;
pub mod error;
pub mod functions;
pub mod mock;
pub mod registry;
pub mod spec;
pub mod types;
pub mod validator;

// Re-export key types for convenience
pub use backend::{BookingRequest, HealthcareBackend, PatientQuery, SlotQuery};
pub use error::{BackendError, BackendResult, RegistryError, RegistryResult};
pub use mock::{BackendCall, MockHealthcareApi};
pub use registry::FunctionRegistry;
pub use spec::{Constraint, FunctionSpec, ParamSpec, ParamType, TextForm};
pub use types::WorkflowFunction;
pub use validator::{unknown_function, validate, validate_at};
