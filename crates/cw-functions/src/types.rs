//! The `WorkflowFunction` trait and shared argument helpers.

use async_trait::async_trait;

use cw_protocol::validation::NormalizedArgs;

use crate::backend::HealthcareBackend;
use crate::error::{BackendError, BackendResult};
use crate::spec::FunctionSpec;

/// A callable workflow operation: its contract plus the adapter that maps
/// normalized arguments onto a backend entry point.
#[async_trait]
pub trait WorkflowFunction: Send + Sync {
    /// Static contract (name, parameters, mutates flag).
    fn spec(&self) -> &FunctionSpec;

    /// Run against the backend. May persist for mutating functions.
    async fn execute(
        &self,
        args: &NormalizedArgs,
        backend: &dyn HealthcareBackend,
    ) -> BackendResult<serde_json::Value>;

    /// Run without persisting anything.
    ///
    /// Read-only functions simply execute. Mutating functions must override
    /// this with a preview path; the default refuses rather than persist.
    async fn simulate(
        &self,
        args: &NormalizedArgs,
        backend: &dyn HealthcareBackend,
    ) -> BackendResult<serde_json::Value> {
        if self.spec().mutates {
            return Err(BackendError::Other(format!(
                "{} has no simulation path",
                self.spec().name
            )));
        }
        self.execute(args, backend).await
    }
}

/// Fetch a required text argument.
pub(crate) fn required_text<'a>(args: &'a NormalizedArgs, name: &str) -> BackendResult<&'a str> {
    args.text(name)
        .ok_or_else(|| BackendError::InvalidArgument(format!("missing '{name}'")))
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> BackendResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| BackendError::Other(format!("serialize result: {e}")))
}
