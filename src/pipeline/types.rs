//! Shared types for the triage pipeline.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ── Input record ────────────────────────────────────────────────────

/// One support request, as loaded from a row of the source table.
///
/// The loader builds these; the pipeline only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    /// Sender identifier (usually an email address).
    pub sender: String,
    /// Subject line.
    pub subject: String,
    /// Request body.
    pub body: String,
    /// Any other columns of the source row, carried through untouched.
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, String>,
}

impl InputRecord {
    pub fn new(
        sender: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            subject: subject.into(),
            body: body.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Attach a passthrough column.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

// ── Priority tier ───────────────────────────────────────────────────

/// Review urgency, derived from keyword presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriorityTier {
    High,
    Medium,
    Low,
}

impl PriorityTier {
    /// All tiers, in review order.
    pub const ALL: [PriorityTier; 3] = [Self::High, Self::Medium, Self::Low];

    /// Sort rank: lower ranks are reviewed first.
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Category ────────────────────────────────────────────────────────

/// Topic label used to route a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    LoginAccount,
    BillingPricing,
    Integration,
    SystemDowntime,
    GeneralInquiry,
}

impl Category {
    /// All categories, in classification order (default last).
    pub const ALL: [Category; 5] = [
        Self::LoginAccount,
        Self::BillingPricing,
        Self::Integration,
        Self::SystemDowntime,
        Self::GeneralInquiry,
    ];

    /// Human-readable label, as shown on the dashboard.
    pub fn label(self) -> &'static str {
        match self {
            Self::LoginAccount => "Login/Account",
            Self::BillingPricing => "Billing/Pricing",
            Self::Integration => "Integration",
            Self::SystemDowntime => "System Downtime",
            Self::GeneralInquiry => "General Inquiry",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Drafted response ────────────────────────────────────────────────

/// Where a drafted reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftSource {
    /// First candidate returned by the generation provider.
    Generated,
    /// Provider failed; the fixed fallback text was substituted.
    Fallback,
}

/// A reply draft plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftedResponse {
    pub text: String,
    pub source: DraftSource,
}

impl DraftedResponse {
    pub fn is_fallback(&self) -> bool {
        self.source == DraftSource::Fallback
    }
}

// ── Enriched record ─────────────────────────────────────────────────

/// An input record plus the derived triage fields.
///
/// Built exactly once per input record by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub record: InputRecord,
    pub priority: PriorityTier,
    pub category: Category,
    pub response: String,
    /// Whether `response` is the fallback text.
    #[serde(skip)]
    pub response_source: DraftSource,
}

impl EnrichedRecord {
    pub fn sender(&self) -> &str {
        &self.record.sender
    }
}
