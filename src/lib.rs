//! Support triage: prioritize, categorize and draft replies for support requests.

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod report;
pub mod source;
