//! Support-request triage pipeline.
//!
//! Every loaded record flows through:
//! 1. `ClassifierRules`: keyword rules for priority and category (no I/O)
//! 2. `ResponseGenerator`: one provider call, fixed fallback on failure
//! 3. `TriageProcessor`: per-record map, input order preserved
//!
//! Sorting and rendering live in `crate::report`.

pub mod classifier;
pub mod processor;
pub mod responder;
pub mod types;

pub use classifier::{ClassifierRules, classify_category, classify_priority};
pub use processor::{ProcessOutcome, ProcessStats, TriageProcessor};
pub use responder::{FALLBACK_RESPONSE, ResponseGenerator};
pub use types::{Category, DraftSource, DraftedResponse, EnrichedRecord, InputRecord, PriorityTier};
