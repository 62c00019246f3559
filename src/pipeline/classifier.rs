//! Rule-based priority and category classification.
//!
//! Both classifiers run over the same normalized text,
//! `lowercase(subject + " " + body)`, and test fixed keyword sets in order:
//! - priority: High set, then Medium set, else `Low`
//! - category: Login/Account, Billing/Pricing, Integration, System Downtime,
//!   else `General Inquiry`
//!
//! Keywords match as plain substrings ("supporter" matches "support").

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::pipeline::types::{Category, PriorityTier};

const HIGH_PRIORITY_KEYWORDS: &[&str] = &[
    "urgent",
    "critical",
    "immediate",
    "blocked",
    "downtime",
    "error",
];

const MEDIUM_PRIORITY_KEYWORDS: &[&str] = &["help", "support", "issue", "problem", "question", "query"];

const LOGIN_ACCOUNT_KEYWORDS: &[&str] = &["login", "access", "password", "account"];
const BILLING_PRICING_KEYWORDS: &[&str] = &["billing", "pricing", "subscription", "refund"];
const INTEGRATION_KEYWORDS: &[&str] = &["api", "integration"];
const SYSTEM_DOWNTIME_KEYWORDS: &[&str] = &["downtime", "servers"];

static DEFAULT_RULES: LazyLock<ClassifierRules> = LazyLock::new(ClassifierRules::default_rules);

/// A keyword set compiled into one substring matcher.
#[derive(Debug, Clone)]
pub struct KeywordRule<T> {
    /// Label produced when any keyword matches.
    pub outcome: T,
    /// Lowercased keywords, in insertion order.
    pub keywords: Vec<String>,
    regex: Regex,
}

impl<T: Copy> KeywordRule<T> {
    /// Build a rule from a keyword list. Keywords are lowercased and
    /// regex-escaped, so matching stays literal substring containment.
    pub fn new<S: AsRef<str>>(outcome: T, keywords: &[S]) -> Self {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|k| k.as_ref().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        let regex = compile_keywords(&keywords);
        Self {
            outcome,
            keywords,
            regex,
        }
    }

    /// Does the normalized text contain any keyword of this rule?
    pub fn matches(&self, normalized: &str) -> bool {
        !self.keywords.is_empty() && self.regex.is_match(normalized)
    }

    fn push(&mut self, keyword: &str) {
        let keyword = keyword.to_lowercase();
        if keyword.is_empty() || self.keywords.contains(&keyword) {
            return;
        }
        self.keywords.push(keyword);
        self.regex = compile_keywords(&self.keywords);
    }
}

/// Alternation of escaped literals. Escaped input always compiles.
fn compile_keywords(keywords: &[String]) -> Regex {
    let pattern = keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&pattern).expect("escaped literals always compile")
}

/// Ordered keyword rules for priority and category.
#[derive(Debug, Clone)]
pub struct ClassifierRules {
    priority_rules: Vec<KeywordRule<PriorityTier>>,
    category_rules: Vec<KeywordRule<Category>>,
}

impl ClassifierRules {
    /// The built-in keyword tables.
    pub fn default_rules() -> Self {
        Self {
            priority_rules: vec![
                KeywordRule::new(PriorityTier::High, HIGH_PRIORITY_KEYWORDS),
                KeywordRule::new(PriorityTier::Medium, MEDIUM_PRIORITY_KEYWORDS),
            ],
            category_rules: vec![
                KeywordRule::new(Category::LoginAccount, LOGIN_ACCOUNT_KEYWORDS),
                KeywordRule::new(Category::BillingPricing, BILLING_PRICING_KEYWORDS),
                KeywordRule::new(Category::Integration, INTEGRATION_KEYWORDS),
                KeywordRule::new(Category::SystemDowntime, SYSTEM_DOWNTIME_KEYWORDS),
            ],
        }
    }

    /// Rules that match nothing: every record is `Low` / `General Inquiry`.
    pub fn empty() -> Self {
        Self {
            priority_rules: Vec::new(),
            category_rules: Vec::new(),
        }
    }

    /// Add a keyword to a priority tier. `Low` is the default tier and
    /// takes no keywords.
    pub fn add_priority_keyword(&mut self, tier: PriorityTier, keyword: &str) {
        if tier == PriorityTier::Low {
            return;
        }
        match self.priority_rules.iter_mut().find(|r| r.outcome == tier) {
            Some(rule) => rule.push(keyword),
            None => {
                self.priority_rules.push(KeywordRule::new(tier, &[keyword]));
                self.priority_rules.sort_by_key(|r| r.outcome.rank());
            }
        }
    }

    /// Add a keyword to a category. `General Inquiry` is the default
    /// category and takes no keywords.
    pub fn add_category_keyword(&mut self, category: Category, keyword: &str) {
        if category == Category::GeneralInquiry {
            return;
        }
        match self.category_rules.iter_mut().find(|r| r.outcome == category) {
            Some(rule) => rule.push(keyword),
            None => {
                self.category_rules.push(KeywordRule::new(category, &[keyword]));
                self.category_rules.sort_by_key(|r| category_order(r.outcome));
            }
        }
    }

    /// Priority tier for a request.
    pub fn classify_priority(&self, subject: &str, body: &str) -> PriorityTier {
        let text = normalize(subject, body);
        first_match(&self.priority_rules, &text).unwrap_or(PriorityTier::Low)
    }

    /// Topic category for a request.
    pub fn classify_category(&self, subject: &str, body: &str) -> Category {
        let text = normalize(subject, body);
        first_match(&self.category_rules, &text).unwrap_or(Category::GeneralInquiry)
    }
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self::default_rules()
    }
}

fn first_match<T: Copy + std::fmt::Debug>(rules: &[KeywordRule<T>], text: &str) -> Option<T> {
    let hit = rules.iter().find(|r| r.matches(text))?;
    debug!(outcome = ?hit.outcome, "Keyword rule matched");
    Some(hit.outcome)
}

fn category_order(category: Category) -> usize {
    Category::ALL
        .iter()
        .position(|c| *c == category)
        .unwrap_or(Category::ALL.len())
}

/// `lowercase(subject + " " + body)`.
pub fn normalize(subject: &str, body: &str) -> String {
    format!("{subject} {body}").to_lowercase()
}

/// Priority tier under the built-in keyword tables.
pub fn classify_priority(subject: &str, body: &str) -> PriorityTier {
    DEFAULT_RULES.classify_priority(subject, body)
}

/// Category under the built-in keyword tables.
pub fn classify_category(subject: &str, body: &str) -> Category {
    DEFAULT_RULES.classify_category(subject, body)
}
