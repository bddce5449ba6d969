//! Ollama resolver for free-text workflow requests.
//!
//! Calls the Ollama HTTP API (`/api/chat`) with the exposed function catalog
//! in the system prompt and asks for a JSON list of function calls. Any
//! failure (unreachable host, non-200, unparseable content) yields an empty
//! list so the tiered resolver can fall back to rules.

use chrono::{Local, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use async_trait::async_trait;
use cw_functions::FunctionSpec;
use cw_protocol::calls::{CallSource, ResolvedCall};

use super::IntentResolver;
use super::rules::next_monday;

/// Calls below this confidence are dropped.
const MIN_CONFIDENCE: f64 = 0.3;

/// Confidence assumed when the model omits one.
const DEFAULT_CONFIDENCE: f64 = 0.8;

const PROMPT_HEADER: &str = r#"You convert clinical front-desk requests into workflow function calls.
You never give medical advice, diagnoses, prescriptions or dosing. If the
request asks for any of those, or matches none of the functions, return an
empty list.

Available functions (JSON schema for each function's arguments):
"#;

const PROMPT_FOOTER: &str = r#"
Rules:
- Use only the function names listed above.
- Only include arguments the user actually gave. Never invent ids.
- Dates are YYYY-MM-DD.
- Order calls the way the work has to happen (find the patient before booking).

Respond with ONLY a JSON object (no markdown, no explanation):
{"function_calls": [{"name": "<function>", "arguments": {<args>}, "confidence": <0.0-1.0>}]}"#;

/// Configuration for the Ollama endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Ollama HTTP API base URL.
    #[serde(default = "default_host")]
    pub host: String,
    /// Model to use for resolution.
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Off unless configured; the rule resolver works without it.
    #[serde(default)]
    pub enabled: bool,
}

fn default_host() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "phi3:mini".into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            enabled: false,
        }
    }
}

/// Ollama chat API request body.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    format: &'a str,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Ollama chat API response (only fields we need).
#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Model output: a list, or a single bare call.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawResolution {
    Many { function_calls: Vec<RawCall> },
    One(RawCall),
}

#[derive(Deserialize)]
struct RawCall {
    #[serde(alias = "function_name")]
    name: Option<String>,
    #[serde(default = "empty_object")]
    arguments: Value,
    confidence: Option<f64>,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

/// Resolver backed by a local Ollama model.
pub struct OllamaResolver {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaResolver {
    pub fn new(config: OllamaConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Send one chat request. Returns the assistant content, or `None` on
    /// any transport or protocol failure.
    async fn chat(&self, system: &str, text: &str) -> Option<String> {
        let url = format!("{}/api/chat", self.config.host);
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            format: "json",
            stream: false,
        };

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = %e, "ollama request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "ollama returned non-200");
            return None;
        }

        match response.json::<ChatResponse>().await {
            Ok(r) => r.message.map(|m| m.content),
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse ollama response body");
                None
            }
        }
    }
}

#[async_trait]
impl IntentResolver for OllamaResolver {
    async fn resolve(&self, text: &str, catalog: &[&FunctionSpec]) -> Vec<ResolvedCall> {
        let prompt = build_prompt(catalog, Local::now().date_naive());
        match self.chat(&prompt, text).await {
            Some(content) => parse_calls(&content, catalog),
            None => Vec::new(),
        }
    }

    fn tier_name(&self) -> &str {
        "model"
    }
}

/// System prompt: catalog schemas plus the dates the model needs to turn
/// "next week" into concrete days.
fn build_prompt(catalog: &[&FunctionSpec], today: NaiveDate) -> String {
    let entries: Vec<Value> = catalog.iter().map(|s| s.catalog_entry()).collect();
    let listing = serde_json::to_string_pretty(&entries).unwrap_or_default();
    let monday = next_monday(today);
    format!(
        "{PROMPT_HEADER}{listing}\n\nToday is {today}. \"Next week\" means {monday} to {}.\n{PROMPT_FOOTER}",
        monday + TimeDelta::days(4)
    )
}

/// The JSON object between the first `{` and the last `}`. Tolerates
/// models that wrap their answer in prose or code fences.
fn extract_json(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (start <= end).then(|| &content[start..=end])
}

fn parse_calls(content: &str, catalog: &[&FunctionSpec]) -> Vec<ResolvedCall> {
    let Some(json) = extract_json(content) else {
        tracing::warn!(content = %content, "ollama returned no JSON object");
        return Vec::new();
    };

    let raw: RawResolution = match serde_json::from_str(json) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, content = %content, "ollama returned invalid JSON");
            return Vec::new();
        }
    };

    let raw_calls = match raw {
        RawResolution::Many { function_calls } => function_calls,
        RawResolution::One(call) => vec![call],
    };

    raw_calls
        .into_iter()
        .filter_map(|raw| {
            let name = raw.name?;
            if !catalog.iter().any(|s| s.name == name) {
                tracing::warn!(function = %name, "ollama returned unknown function");
                return None;
            }
            let confidence = raw.confidence.unwrap_or(DEFAULT_CONFIDENCE);
            if confidence < MIN_CONFIDENCE {
                tracing::debug!(confidence, function = %name, "ollama confidence below threshold");
                return None;
            }
            Some(
                ResolvedCall::new(name, raw.arguments, CallSource::Model)
                    .with_confidence(confidence),
            )
        })
        .collect()
}
