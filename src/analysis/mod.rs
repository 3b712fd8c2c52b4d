//! Analysis modules.
//!
//! Metrics here are computed locally from cached file contents; the
//! qualitative judgement is left to the model.

pub mod metrics;

pub use metrics::{analyze, MetricsOutcome};
