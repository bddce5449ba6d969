//! Clinical workflow agent library.
//!
//! Re-exports all modules so external crates (e.g. `cw-e2e-tests`) can
//! drive the `Orchestrator` with their own resolver, backend and audit sink.

pub mod audit;
pub mod config;
pub mod guardrails;
pub mod orchestrator;
pub mod report;
pub mod resolver;
