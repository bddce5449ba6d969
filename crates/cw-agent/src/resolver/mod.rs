//! Intent resolution: free text → ordered candidate function calls.
//!
//! Three resolvers:
//! - **Rules** (`RuleResolver`): deterministic keyword and pattern matching, no network.
//! - **Model** (`OllamaResolver`): Ollama `/api/chat` with the catalog in the prompt.
//! - **Tiered** (`TieredResolver`): model first, rules when the model returns nothing.
//!
//! Resolver output is untrusted. Nothing here validates arguments; that is
//! the validator's and guardrail engine's job.

pub mod model;
pub mod rules;
pub mod tiered;

use async_trait::async_trait;

use cw_functions::FunctionSpec;
use cw_protocol::calls::ResolvedCall;

/// Trait for resolvers that turn natural language into candidate calls.
#[async_trait]
pub trait IntentResolver: Send + Sync {
    /// Resolve `text` against the exposed catalog. Empty = nothing recognized.
    async fn resolve(&self, text: &str, catalog: &[&FunctionSpec]) -> Vec<ResolvedCall>;

    /// Name of this resolver tier (for logging/audit).
    fn tier_name(&self) -> &str;
}

pub use model::{OllamaConfig, OllamaResolver};
pub use rules::RuleResolver;
pub use tiered::TieredResolver;
