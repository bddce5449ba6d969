//! Registry and backend error types.

use thiserror::Error;

/// Catalog errors. Programmer errors, fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("unknown function: {name}")]
    UnknownFunction { name: String },

    #[error("function already registered: {name}")]
    DuplicateFunction { name: String },
}

/// Convenience alias for registry results.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised by the healthcare backend after a call was allowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Other(String),
}

/// Convenience alias for backend results.
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = RegistryError::DuplicateFunction {
            name: "search_patient".into(),
        };
        assert_eq!(err.to_string(), "function already registered: search_patient");

        let err = BackendError::Conflict("slot 'S5' is no longer available".into());
        assert_eq!(err.to_string(), "conflict: slot 'S5' is no longer available");
    }
}
