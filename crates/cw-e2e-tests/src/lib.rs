//! End-to-end tests for the clinical workflow agent live in `tests/`.
