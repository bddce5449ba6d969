use serde::{Deserialize, Serialize};

/// Where a candidate call came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallSource {
    /// Language-model output.
    Model,
    /// Deterministic rule-based parser.
    Rules,
    /// Submitted directly by the caller (e.g. a confirmed pending call).
    Caller,
}

impl CallSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Rules => "rules",
            Self::Caller => "caller",
        }
    }
}

/// A candidate function call produced by an intent resolver.
///
/// Untrusted: the arguments have not been validated and the function name
/// may not exist in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCall {
    /// Function to invoke (e.g. "search_patient").
    pub function_name: String,
    /// Candidate arguments, expected to be a JSON object.
    #[serde(default = "empty_object")]
    pub arguments: serde_json::Value,
    /// Resolver confidence (0.0 - 1.0).
    pub confidence: f64,
    pub source: CallSource,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl ResolvedCall {
    pub fn new(
        function_name: impl Into<String>,
        arguments: serde_json::Value,
        source: CallSource,
    ) -> Self {
        Self {
            function_name: function_name.into(),
            arguments,
            confidence: 1.0,
            source,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}
