//! Shared test support utilities for behaviour-driven suites.
//!
//! `step_value` unquotes placeholder values captured from Gherkin steps.
//! `sources` provides a `ResourceSource` that can be switched on and off and
//! counts how often it was opened, which the trust-store suites use to
//! observe loads without mocking the provider itself.
pub mod sources;
pub mod step_value;
