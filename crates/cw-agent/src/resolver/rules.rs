//! Rule-based resolver: keyword and pattern matching, no network.
//!
//! Detects patient and slot ids, patient names, specialties, date ranges and
//! a visit reason, then emits calls in workflow order: search_patient,
//! check_insurance_eligibility, find_available_slots, book_appointment.
//! Anything it cannot find is left out of the arguments so the validator
//! can say what is missing. It never fills in placeholders.

use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{Datelike, Local, NaiveDate, TimeDelta};
use regex::Regex;
use serde_json::{Map, Value, json};

use cw_functions::FunctionSpec;
use cw_functions::functions::{SERVICE_TYPES, SPECIALTIES};
use cw_protocol::calls::{CallSource, ResolvedCall};

use super::IntentResolver;

/// Confidence when every required argument was found.
const COMPLETE_CONFIDENCE: f64 = 0.9;
/// Confidence when some required argument is missing.
const PARTIAL_CONFIDENCE: f64 = 0.6;

/// Days covered by the default slot search window.
const DEFAULT_WINDOW_DAYS: i64 = 7;

static PATIENT_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bp(\d+)\b").unwrap());

static SLOT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:slot\s*#?\s*|s)(\d+)\b").unwrap());

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").unwrap());

/// Name patterns, most specific first. The last one is case-sensitive.
static NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\bpatient\s+([a-z]+(?:\s+[a-z]+)?)",
        r"(?i)\bi\s+am\s+([a-z]+(?:\s+[a-z]+)?)",
        r"(?i)\bfor\s+([a-z]+(?:\s+[a-z]+)?)",
        r"\b([A-Z][a-z]+\s+[A-Z][a-z]+)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Words that end a captured name.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "any", "appointment", "appointments", "at", "availability", "available",
    "book", "cardiology", "care", "check", "consultation", "coverage", "doctor", "dr",
    "eligibility", "find", "follow", "for", "her", "him", "in", "insurance", "me", "my", "neurology",
    "new", "next", "of", "on", "orthopedics", "patient", "primary", "schedule", "search", "slot",
    "slots", "some", "the", "them", "this", "to", "today", "tomorrow", "up", "visit", "week",
    "with",
];

/// Compact spellings → canonical patient names.
const KNOWN_NAMES: &[(&str, &str)] = &[
    ("ravikumar", "Ravi Kumar"),
    ("raviakumar", "Ravi Kumar"),
    ("sarahjohnson", "Sarah Johnson"),
    ("anitapatel", "Anita Patel"),
];

/// Deterministic resolver for the four built-in workflow functions.
pub struct RuleResolver {
    /// Fixed "today" for relative dates; `None` reads the local clock.
    today: Option<NaiveDate>,
}

impl RuleResolver {
    pub fn new() -> Self {
        Self { today: None }
    }

    /// Resolve relative dates ("next week", "tomorrow") against a fixed day.
    pub fn at(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

impl Default for RuleResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntentResolver for RuleResolver {
    async fn resolve(&self, text: &str, catalog: &[&FunctionSpec]) -> Vec<ResolvedCall> {
        resolve_text(text, self.today(), catalog)
    }

    fn tier_name(&self) -> &str {
        "rules"
    }
}

/// What the rules could pull out of one request.
#[derive(Debug, Default)]
struct Extracted {
    patient_id: Option<String>,
    slot_id: Option<String>,
    name: Option<String>,
    specialty: Option<&'static str>,
    service_type: Option<&'static str>,
}

fn resolve_text(text: &str, today: NaiveDate, catalog: &[&FunctionSpec]) -> Vec<ResolvedCall> {
    let lower = text.to_lowercase();
    let lower = lower.trim();

    let found = Extracted {
        patient_id: PATIENT_ID_RE
            .captures(text)
            .map(|c| format!("P{}", &c[1])),
        slot_id: SLOT_ID_RE.captures(text).map(|c| format!("S{}", &c[1])),
        name: extract_name(text),
        specialty: find_term(lower, SPECIALTIES),
        service_type: find_term(lower, SERVICE_TYPES),
    };

    let wants_insurance = matches_any(lower, &["insurance", "eligib", "coverage", "covered"]);
    let wants_book = matches_any(lower, &["book", "schedule"]);
    let wants_slots = found.slot_id.is_none()
        && (wants_book
            || matches_any(
                lower,
                &["slot", "available", "availability", "opening", "appointment"],
            ));

    let mut calls = Vec::new();

    // ── search_patient ──────────────────────────────────────────
    if found.patient_id.is_none()
        && let Some(name) = &found.name
    {
        let mut args = Map::new();
        args.insert("name".into(), json!(name));
        calls.extend(emit(catalog, "search_patient", args));
    }

    // ── check_insurance_eligibility ─────────────────────────────
    if wants_insurance {
        let mut args = Map::new();
        if let Some(id) = &found.patient_id {
            args.insert("patient_id".into(), json!(id));
        }
        if let Some(service) = found.service_type {
            args.insert("service_type".into(), json!(service));
        }
        calls.extend(emit(catalog, "check_insurance_eligibility", args));
    }

    // ── find_available_slots ────────────────────────────────────
    if wants_slots {
        let (start, end) = date_range(lower, today);
        let mut args = Map::new();
        if let Some(specialty) = found.specialty {
            args.insert("specialty".into(), json!(specialty));
        }
        args.insert("start_date".into(), json!(start.to_string()));
        args.insert("end_date".into(), json!(end.to_string()));
        calls.extend(emit(catalog, "find_available_slots", args));
    }

    // ── book_appointment ────────────────────────────────────────
    if wants_book {
        let mut args = Map::new();
        if let Some(id) = &found.patient_id {
            args.insert("patient_id".into(), json!(id));
        }
        if let Some(slot) = &found.slot_id {
            args.insert("slot_id".into(), json!(slot));
        }
        args.insert("reason".into(), json!(visit_reason(lower, found.specialty)));
        calls.extend(emit(catalog, "book_appointment", args));
    }

    tracing::debug!(?found, calls = calls.len(), "rule resolver finished");
    calls
}

/// Build a call if the function is in the catalog. Confidence reflects
/// whether all required arguments were found.
fn emit(catalog: &[&FunctionSpec], name: &str, args: Map<String, Value>) -> Option<ResolvedCall> {
    let spec = catalog.iter().find(|s| s.name == name)?;
    let complete = spec.required_params().all(|p| args.contains_key(p.name));
    let confidence = if complete {
        COMPLETE_CONFIDENCE
    } else {
        PARTIAL_CONFIDENCE
    };
    Some(ResolvedCall::new(name, Value::Object(args), CallSource::Rules).with_confidence(confidence))
}

/// Check if the text contains any of the given patterns.
fn matches_any(text: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| text.contains(p))
}

/// First vocabulary term mentioned, matching `primary-care` as written,
/// spaced or joined.
fn find_term(lower: &str, terms: &'static [&'static str]) -> Option<&'static str> {
    terms.iter().copied().find(|term| {
        lower.contains(term)
            || lower.contains(&term.replace('-', " "))
            || lower.contains(&term.replace('-', ""))
    })
}

fn extract_name(text: &str) -> Option<String> {
    for re in NAME_PATTERNS.iter() {
        for caps in re.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            let words: Vec<&str> = m
                .as_str()
                .split_whitespace()
                .take_while(|w| !STOP_WORDS.contains(&w.to_lowercase().as_str()))
                .collect();
            if words.concat().len() > 2 {
                return Some(canonical_name(&words));
            }
        }
    }
    None
}

fn canonical_name(words: &[&str]) -> String {
    let compact = words.concat().to_lowercase();
    if let Some((_, proper)) = KNOWN_NAMES.iter().find(|(k, _)| *k == compact) {
        return proper.to_string();
    }
    words
        .iter()
        .map(|w| capitalize(&w.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Explicit ISO dates win, then "next week", "tomorrow", "today". Default is
/// today through a week from today.
fn date_range(lower: &str, today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let mut dates: Vec<NaiveDate> = ISO_DATE_RE
        .captures_iter(lower)
        .filter_map(|c| NaiveDate::parse_from_str(&c[1], "%Y-%m-%d").ok())
        .collect();
    dates.sort();
    match dates.as_slice() {
        [first, .., last] => return (*first, *last),
        [only] => return (*only, *only),
        [] => {}
    }

    if lower.contains("next week") {
        let monday = next_monday(today);
        (monday, monday + TimeDelta::days(4))
    } else if lower.contains("tomorrow") {
        let day = today + TimeDelta::days(1);
        (day, day)
    } else if lower.contains("today") {
        (today, today)
    } else {
        (today, today + TimeDelta::days(DEFAULT_WINDOW_DAYS))
    }
}

/// The Monday strictly after `today`.
pub fn next_monday(today: NaiveDate) -> NaiveDate {
    today + TimeDelta::days(7 - i64::from(today.weekday().num_days_from_monday()))
}

fn visit_reason(lower: &str, specialty: Option<&str>) -> String {
    let label = specialty.map(|s| capitalize(&s.replace('-', " ")));
    let follow_up = lower.contains("follow-up")
        || lower.contains("follow up")
        || lower.contains("followup");
    match (follow_up, label) {
        (true, Some(label)) => format!("{label} follow-up"),
        (false, Some(label)) => format!("{label} consultation"),
        (_, None) => "Follow-up appointment".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_functions::FunctionRegistry;

    /// Sunday 2026-10-18; next Monday is 2026-10-19.
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn resolve(text: &str) -> Vec<ResolvedCall> {
        let registry = FunctionRegistry::with_defaults().unwrap();
        resolve_text(text, today(), &registry.exposed())
    }

    fn names(calls: &[ResolvedCall]) -> Vec<&str> {
        calls.iter().map(|c| c.function_name.as_str()).collect()
    }

    // ── Single intents ──────────────────────────────────────────

    #[test]
    fn search_for_named_patient() {
        let calls = resolve("Search for patient Ravi Kumar");
        assert_eq!(names(&calls), vec!["search_patient"]);
        assert_eq!(calls[0].arguments, json!({"name": "Ravi Kumar"}));
        assert_eq!(calls[0].source, CallSource::Rules);
        assert!((calls[0].confidence - COMPLETE_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn book_with_explicit_ids() {
        let calls = resolve("Book appointment for P003, slot S5");
        assert_eq!(names(&calls), vec!["book_appointment"]);
        assert_eq!(
            calls[0].arguments,
            json!({"patient_id": "P003", "slot_id": "S5", "reason": "Follow-up appointment"})
        );
        assert!((calls[0].confidence - COMPLETE_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn slot_number_without_prefix() {
        let calls = resolve("book slot 7 for p001");
        assert_eq!(calls[0].arguments["slot_id"], "S7");
        assert_eq!(calls[0].arguments["patient_id"], "P001");
    }

    #[test]
    fn gibberish_resolves_to_nothing() {
        assert!(resolve("asdkjh qweoiu").is_empty());
    }

    #[test]
    fn medical_question_resolves_to_nothing() {
        assert!(resolve("Diagnose my chest pain").is_empty());
    }

    #[test]
    fn insurance_check() {
        let calls = resolve("Check insurance eligibility for P001 for primary care");
        assert_eq!(names(&calls), vec!["check_insurance_eligibility"]);
        assert_eq!(
            calls[0].arguments,
            json!({"patient_id": "P001", "service_type": "primary-care"})
        );
    }

    #[test]
    fn slots_next_week() {
        let calls = resolve("Find available neurology slots next week");
        assert_eq!(names(&calls), vec!["find_available_slots"]);
        assert_eq!(
            calls[0].arguments,
            json!({"specialty": "neurology", "start_date": "2026-10-19", "end_date": "2026-10-23"})
        );
    }

    #[test]
    fn explicit_iso_range() {
        let calls = resolve("cardiology availability 2026-11-06 to 2026-11-02");
        assert_eq!(calls[0].arguments["start_date"], "2026-11-02");
        assert_eq!(calls[0].arguments["end_date"], "2026-11-06");
    }

    #[test]
    fn default_window_is_a_week() {
        let calls = resolve("any open orthopedics slots?");
        assert_eq!(calls[0].arguments["start_date"], "2026-10-18");
        assert_eq!(calls[0].arguments["end_date"], "2026-10-25");
    }

    // ── Missing pieces stay missing ─────────────────────────────

    #[test]
    fn missing_ids_are_left_absent() {
        let calls = resolve("Check insurance coverage");
        assert_eq!(names(&calls), vec!["check_insurance_eligibility"]);
        assert_eq!(calls[0].arguments, json!({}));
        assert!((calls[0].confidence - PARTIAL_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn time_words_are_not_names() {
        let calls = resolve("find cardiology slots for next week");
        assert_eq!(names(&calls), vec!["find_available_slots"]);
    }

    // ── Multi-intent ────────────────────────────────────────────

    #[test]
    fn full_workflow_in_order() {
        let calls =
            resolve("Schedule a cardiology follow-up for Ravi Kumar next week and check insurance");
        assert_eq!(
            names(&calls),
            vec![
                "search_patient",
                "check_insurance_eligibility",
                "find_available_slots",
                "book_appointment"
            ]
        );
        assert_eq!(calls[1].arguments, json!({"service_type": "cardiology"}));
        assert_eq!(calls[2].arguments["start_date"], "2026-10-19");
        assert_eq!(
            calls[3].arguments,
            json!({"reason": "Cardiology follow-up"})
        );
        assert!((calls[3].confidence - PARTIAL_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn compact_names_are_canonicalized() {
        let calls = resolve("search patient ravikumar");
        assert_eq!(calls[0].arguments["name"], "Ravi Kumar");
    }

    #[test]
    fn patient_id_suppresses_name_search() {
        let calls = resolve("Book a cardiology consultation for Anita Patel P003 slot 2");
        assert_eq!(names(&calls), vec!["book_appointment"]);
        assert_eq!(calls[0].arguments["reason"], "Cardiology consultation");
    }

    #[test]
    fn catalog_limits_output() {
        let registry = FunctionRegistry::with_defaults().unwrap();
        let only_search: Vec<&FunctionSpec> = registry
            .exposed()
            .into_iter()
            .filter(|s| s.name == "search_patient")
            .collect();
        let calls = resolve_text(
            "Book appointment for Ravi Kumar next week",
            today(),
            &only_search,
        );
        assert_eq!(names(&calls), vec!["search_patient"]);
        assert!(resolve_text("Search for patient Ravi Kumar", today(), &[]).is_empty());
    }

    #[test]
    fn next_monday_from_monday_is_a_week_later() {
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(next_monday(monday), NaiveDate::from_ymd_opt(2026, 10, 26).unwrap());
        assert_eq!(next_monday(today()), monday);
    }

    #[tokio::test]
    async fn resolver_trait_uses_fixed_day() {
        let registry = FunctionRegistry::with_defaults().unwrap();
        let resolver = RuleResolver::at(today());
        let calls = resolver
            .resolve("neurology slots tomorrow", &registry.exposed())
            .await;
        assert_eq!(calls[0].arguments["start_date"], "2026-10-19");
        assert_eq!(resolver.tier_name(), "rules");
    }
}
