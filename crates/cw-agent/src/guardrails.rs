//! Safety guardrail engine.
//!
//! An ordered list of pure predicates over (call, validation, context):
//! - Scope: only registered, exposed operations
//! - Content: no diagnosis, prescribing, medical advice or emergencies
//! - Validation gate: invalid arguments are refused in every mode
//! - Mutation confirmation: LIVE mutations need an explicit confirmation
//! - Dry-run override: DRY_RUN turns an allow into a simulate-only allow
//!
//! The first refusal wins. A confirmation request is held while the later
//! checks run, so a refusal further down still outranks it.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;

use cw_functions::{FunctionRegistry, FunctionSpec};
use cw_protocol::calls::ResolvedCall;
use cw_protocol::request::{ExecutionMode, WorkflowRequest};
use cw_protocol::validation::ValidationResult;
use cw_protocol::verdict::{Decision, GuardrailCheck, GuardrailVerdict};

const DIAGNOSIS_PATTERNS: &[&str] = &[
    r"\bwhat('s| is) wrong with\b",
    r"\bdiagnos(e|is|ing)\b",
    r"\bwhat (do i|does .+) have\b",
    r"\bwhat (disease|condition|illness)\b",
    r"\bam i (sick|ill)\b",
    r"\bdo i have\b.*(disease|cancer|diabetes|infection)",
    r"\bcould (this|it|i) be\b",
    r"\bwhat are my symptoms of\b",
    r"\bidentify (the|my) (disease|condition|illness)\b",
];

const PRESCRIPTION_PATTERNS: &[&str] = &[
    r"\bprescri(be|bing|ption)\b",
    r"\bwhat dose\b",
    r"\bdosage\b",
    r"\bhow much.*(medicine|medication|drug)\b",
    r"\brefill (my|a) (prescription|medication)\b",
    r"\border.*(medicine|medication|drug)\b",
];

const MEDICAL_ADVICE_PATTERNS: &[&str] = &[
    r"\bshould i (take|use|stop|continue)\b",
    r"\bwhat (medication|medicine|drug|treatment) should\b",
    r"\bhow (to|do i) treat\b",
    r"\brecommend.*(treatment|medication|therapy)\b",
    r"\bwhat('s| is) the best (treatment|cure|remedy)\b",
    r"\badvice (for|on|about).*(health|medical|symptom)",
    r"\bis it (safe|okay|ok) to\b.*(take|use|stop)\b",
    r"\bcan i (take|use|combine)\b.*(medicine|medication|drug)",
    r"\bi have\b.*(what (to do|should i do)|help)\b",
    r"\bi('m| am) (having|feeling|experiencing)\b.*(what|help)\b",
    r"\bwhat (to do|should i do)\b.*(pain|ache|fever|cold|cough|headache|symptom)",
    r"\bwhat is the (remedy|cure|solution|fix)\b",
    r"\bhow (to|do i|can i) (cure|fix|heal|stop|relieve|get rid of)\b",
    r"\b(remedy|cure|treatment) for\b",
    r"\bhome (remedy|remedies|treatment)\b",
    r"\bwhat helps (with|for)\b.*(pain|ache|fever|cold|cough)",
    r"\bhow to (stop|relieve|reduce|ease)\b.*(pain|ache|fever|symptom)",
    r"\b(headache|pain|fever|nausea|cough|cold|flu|sick|unwell)\b.*\b(what|how|help|remedy|cure)\b",
    r"\bfeeling\b.*(sick|unwell|bad|ill)\b.*\b(what|how|help)\b",
];

const EMERGENCY_PATTERNS: &[&str] = &[
    r"\bheart attack\b",
    r"\bstroke\b",
    r"\bcan'?t breathe\b",
    r"\bchest pain\b",
    r"\bsuicid(e|al)\b",
    r"\bsevere bleeding\b",
    r"\bunconscious\b",
    r"\bseizure\b",
    r"\boverdos(e|ing)\b",
];

/// Workflow wording that waives medical-advice markers (and only those).
const WORKFLOW_PATTERNS: &[&str] = &[
    r"\b(schedule|book|cancel|reschedule).*(appointment|visit|slot)",
    r"\b(check|verify).*(insurance|eligibility|coverage)",
    r"\b(find|search|look up).*(patient|slot|availability)",
    r"\b(available|open).*(slot|time|appointment)",
    r"\bfollow[- ]?up\b",
    r"\b(cardiology|neurology|orthopedics|primary[- ]care)\b",
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
        .collect()
}

static DIAGNOSIS_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(DIAGNOSIS_PATTERNS));
static PRESCRIPTION_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(PRESCRIPTION_PATTERNS));
static MEDICAL_ADVICE_RE: LazyLock<Vec<Regex>> =
    LazyLock::new(|| compile(MEDICAL_ADVICE_PATTERNS));
static EMERGENCY_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(EMERGENCY_PATTERNS));
static WORKFLOW_RE: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(WORKFLOW_PATTERNS));

fn matches_any(text: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|re| re.is_match(text))
}

// ── Content categories ──────────────────────────────────────────

/// Kinds of medical judgment this system refuses to exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCategory {
    Diagnosis,
    Prescription,
    MedicalAdvice,
    Emergency,
}

impl ContentCategory {
    /// Priority order. Emergencies outrank everything but an explicit
    /// diagnosis request.
    pub const ALL: [ContentCategory; 4] = [
        Self::Diagnosis,
        Self::Emergency,
        Self::Prescription,
        Self::MedicalAdvice,
    ];

    fn patterns(self) -> &'static [Regex] {
        match self {
            Self::Diagnosis => DIAGNOSIS_RE.as_slice(),
            Self::Prescription => PRESCRIPTION_RE.as_slice(),
            Self::MedicalAdvice => MEDICAL_ADVICE_RE.as_slice(),
            Self::Emergency => EMERGENCY_RE.as_slice(),
        }
    }

    /// Only advice markers yield to clear workflow wording.
    fn waivable(self) -> bool {
        matches!(self, Self::MedicalAdvice)
    }

    fn headline(self) -> &'static str {
        match self {
            Self::Diagnosis => "Diagnosis is out of scope",
            Self::Prescription => "Prescribing or dosing is out of scope",
            Self::MedicalAdvice => "Medical advice is out of scope",
            Self::Emergency => "This looks like a medical emergency",
        }
    }

    fn suggestion(self) -> &'static str {
        match self {
            Self::Diagnosis => {
                "Please consult a healthcare provider. I can help schedule an appointment."
            }
            Self::Prescription => {
                "Please contact your healthcare provider or pharmacist about medications."
            }
            Self::MedicalAdvice => {
                "Please consult a healthcare provider for medical advice. I can help schedule an appointment."
            }
            Self::Emergency => {
                "Call emergency services or go to the nearest emergency room immediately."
            }
        }
    }

    /// Full refusal text.
    pub fn reason(self) -> String {
        format!(
            "{}: this system performs workflow actions, not medical judgment. {}",
            self.headline(),
            self.suggestion()
        )
    }
}

/// First medical-judgment category found in `text`, if any.
pub fn classify(text: &str) -> Option<ContentCategory> {
    let workflow = matches_any(text, &WORKFLOW_RE);
    ContentCategory::ALL
        .into_iter()
        .find(|c| matches_any(text, c.patterns()) && !(c.waivable() && workflow))
}

/// Every string inside `value`, paired with the top-level key it sits under.
fn string_args<'a>(key: &'a str, value: &'a Value, out: &mut Vec<(&'a str, &'a str)>) {
    match value {
        Value::String(s) => out.push((key, s)),
        Value::Array(items) => items.iter().for_each(|v| string_args(key, v, out)),
        Value::Object(map) => map.values().for_each(|v| string_args(key, v, out)),
        _ => {}
    }
}

// ── Context and input ───────────────────────────────────────────

/// Request-level facts the checks need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardContext {
    pub mode: ExecutionMode,
    pub confirmed: bool,
    pub request_text: String,
}

impl GuardContext {
    pub fn from_request(request: &WorkflowRequest) -> Self {
        Self {
            mode: request.mode,
            confirmed: request.confirmed,
            request_text: request.text.clone(),
        }
    }
}

/// Everything a predicate sees for one call.
pub struct GuardInput<'a> {
    pub call: &'a ResolvedCall,
    /// `None` when the function is not registered.
    pub spec: Option<&'a FunctionSpec>,
    pub validation: &'a ValidationResult,
    pub context: &'a GuardContext,
}

/// A single check: `Some(verdict)` decides, `None` passes.
pub type GuardrailPredicate = fn(&GuardInput<'_>) -> Option<GuardrailVerdict>;

/// The checks, in priority order.
pub const CHECKS: &[(GuardrailCheck, GuardrailPredicate)] = &[
    (GuardrailCheck::Scope, scope_check),
    (GuardrailCheck::Content, content_check),
    (GuardrailCheck::ValidationGate, validation_gate),
    (GuardrailCheck::MutationConfirmation, mutation_confirmation),
    (GuardrailCheck::DryRun, dry_run_override),
];

// ── Checks ──────────────────────────────────────────────────────

pub fn scope_check(input: &GuardInput<'_>) -> Option<GuardrailVerdict> {
    match input.spec {
        Some(spec) if spec.exposed => None,
        _ => Some(GuardrailVerdict::refuse(
            GuardrailCheck::Scope,
            format!(
                "'{}' is not a registered workflow operation",
                input.call.function_name
            ),
        )),
    }
}

/// Raw request first, then every string argument.
pub fn content_check(input: &GuardInput<'_>) -> Option<GuardrailVerdict> {
    if let Some(category) = classify(&input.context.request_text) {
        return Some(GuardrailVerdict::refuse(
            GuardrailCheck::Content,
            category.reason(),
        ));
    }

    let mut strings = Vec::new();
    if let Value::Object(args) = &input.call.arguments {
        for (key, value) in args {
            string_args(key, value, &mut strings);
        }
    }
    strings.into_iter().find_map(|(key, text)| {
        classify(text).map(|category| {
            GuardrailVerdict::refuse(
                GuardrailCheck::Content,
                format!(
                    "argument '{key}' contains out-of-scope content. {}",
                    category.reason()
                ),
            )
        })
    })
}

pub fn validation_gate(input: &GuardInput<'_>) -> Option<GuardrailVerdict> {
    (!input.validation.ok).then(|| {
        GuardrailVerdict::refuse(
            GuardrailCheck::ValidationGate,
            format!("invalid arguments: {}", input.validation.error_summary()),
        )
    })
}

pub fn mutation_confirmation(input: &GuardInput<'_>) -> Option<GuardrailVerdict> {
    let spec = input.spec?;
    let needs_confirmation =
        spec.mutates && input.context.mode == ExecutionMode::Live && !input.context.confirmed;
    needs_confirmation.then(|| {
        GuardrailVerdict::require_confirmation(
            GuardrailCheck::MutationConfirmation,
            format!(
                "{} changes records and needs explicit confirmation; resubmit with confirmation",
                spec.name
            ),
        )
    })
}

pub fn dry_run_override(input: &GuardInput<'_>) -> Option<GuardrailVerdict> {
    input
        .context
        .mode
        .is_dry_run()
        .then(GuardrailVerdict::allow_simulated)
}

/// Run `checks` in order over one input.
pub fn evaluate_checks(
    checks: &[(GuardrailCheck, GuardrailPredicate)],
    input: &GuardInput<'_>,
) -> GuardrailVerdict {
    let mut pending: Option<GuardrailVerdict> = None;
    let mut simulated: Option<GuardrailVerdict> = None;

    for (check, predicate) in checks {
        let Some(verdict) = predicate(input) else {
            continue;
        };
        match verdict.decision() {
            Decision::Refuse => {
                tracing::debug!(function = %input.call.function_name, check = %check, "guardrail refused");
                return verdict;
            }
            Decision::RequireConfirmation => {
                pending.get_or_insert(verdict);
            }
            Decision::Allow => {
                if verdict.is_simulated() {
                    simulated.get_or_insert(verdict);
                }
            }
        }
    }

    pending.or(simulated).unwrap_or_else(GuardrailVerdict::allow)
}

// ── Engine ──────────────────────────────────────────────────────

/// Guardrail engine bound to the function catalog.
pub struct GuardrailEngine {
    registry: Arc<FunctionRegistry>,
}

impl GuardrailEngine {
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self { registry }
    }

    pub fn evaluate(
        &self,
        call: &ResolvedCall,
        validation: &ValidationResult,
        context: &GuardContext,
    ) -> GuardrailVerdict {
        let input = GuardInput {
            call,
            spec: self.registry.lookup(&call.function_name).ok(),
            validation,
            context,
        };
        evaluate_checks(CHECKS, &input)
    }

    /// Content check on raw text alone. Used when nothing was resolved.
    pub fn screen_request(&self, text: &str) -> Option<GuardrailVerdict> {
        classify(text)
            .map(|category| GuardrailVerdict::refuse(GuardrailCheck::Content, category.reason()))
    }
}
