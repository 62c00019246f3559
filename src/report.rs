//! Review report: enriched records sorted by priority tier.
//!
//! The sorted row sequence is the contract; markdown and JSON are two views
//! over it. Columns are always `sender, subject, priority, category, response`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::pipeline::types::{Category, EnrichedRecord, PriorityTier};

/// Column order for every rendering.
pub const COLUMNS: [&str; 5] = ["sender", "subject", "priority", "category", "response"];

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub sender: String,
    pub subject: String,
    pub priority: String,
    pub category: String,
    pub response: String,
}

impl ReportRow {
    fn cells(&self) -> [&str; 5] {
        [
            &self.sender,
            &self.subject,
            &self.priority,
            &self.category,
            &self.response,
        ]
    }
}

impl From<&EnrichedRecord> for ReportRow {
    fn from(record: &EnrichedRecord) -> Self {
        Self {
            sender: record.record.sender.clone(),
            subject: record.record.subject.clone(),
            priority: record.priority.label().to_string(),
            category: record.category.label().to_string(),
            response: record.response.clone(),
        }
    }
}

/// Enriched records in review order.
#[derive(Debug, Clone)]
pub struct Report {
    records: Vec<EnrichedRecord>,
    generated_at: DateTime<Utc>,
}

impl Report {
    /// Sort records High → Medium → Low. Equal tiers keep pipeline order.
    pub fn build(mut records: Vec<EnrichedRecord>) -> Self {
        // `sort_by_key` is stable.
        records.sort_by_key(|r| r.priority.rank());
        Self {
            records,
            generated_at: Utc::now(),
        }
    }

    /// Sorted records.
    pub fn records(&self) -> &[EnrichedRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Rows in review order, projected to the report columns.
    pub fn rows(&self) -> Vec<ReportRow> {
        self.records.iter().map(ReportRow::from).collect()
    }

    /// Left-aligned markdown pipe table.
    pub fn to_markdown(&self) -> String {
        let rows: Vec<[String; 5]> = self
            .rows()
            .iter()
            .map(|row| row.cells().map(escape_cell))
            .collect();

        let mut widths = COLUMNS.map(|c| c.chars().count());
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let mut out = String::new();
        push_line(&mut out, &COLUMNS.map(str::to_string), &widths);
        let rule: Vec<String> = widths
            .iter()
            .map(|w| format!(":{}", "-".repeat(w + 1)))
            .collect();
        out.push('|');
        out.push_str(&rule.join("|"));
        out.push_str("|\n");
        for row in &rows {
            push_line(&mut out, row, &widths);
        }
        out
    }

    /// JSON array of row objects, in review order.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.rows())
    }

    /// Counts per tier and per category.
    pub fn summary(&self) -> ReportSummary {
        let by_priority = PriorityTier::ALL
            .iter()
            .map(|tier| (*tier, self.records.iter().filter(|r| r.priority == *tier).count()))
            .collect();
        let by_category = Category::ALL
            .iter()
            .map(|cat| (*cat, self.records.iter().filter(|r| r.category == *cat).count()))
            .collect();
        ReportSummary {
            total: self.records.len(),
            by_priority,
            by_category,
        }
    }
}

/// Aggregated counts for a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub total: usize,
    /// Every tier, in review order, including zero counts.
    pub by_priority: Vec<(PriorityTier, usize)>,
    /// Every category, in classification order, including zero counts.
    pub by_category: Vec<(Category, usize)>,
}

impl ReportSummary {
    pub fn priority_count(&self, tier: PriorityTier) -> usize {
        self.by_priority
            .iter()
            .find(|(t, _)| *t == tier)
            .map_or(0, |(_, n)| *n)
    }

    pub fn category_count(&self, category: Category) -> usize {
        self.by_category
            .iter()
            .find(|(c, _)| *c == category)
            .map_or(0, |(_, n)| *n)
    }
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total: {}", self.total)?;
        let tiers: Vec<String> = self
            .by_priority
            .iter()
            .map(|(t, n)| format!("{t}: {n}"))
            .collect();
        writeln!(f, "By priority: {}", tiers.join(", "))?;
        let cats: Vec<String> = self
            .by_category
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(c, n)| format!("{c}: {n}"))
            .collect();
        write!(f, "By category: {}", cats.join(", "))
    }
}

fn push_line(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    out.push('|');
    for (cell, width) in cells.iter().zip(widths) {
        let pad = width - cell.chars().count();
        out.push(' ');
        out.push_str(cell);
        out.push_str(&" ".repeat(pad));
        out.push_str(" |");
    }
    out.push('\n');
}

/// Keep a cell on one line and out of the column separators.
fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
        .split(['\r', '\n'])
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{DraftSource, InputRecord};

    fn enriched(sender: &str, priority: PriorityTier, category: Category) -> EnrichedRecord {
        EnrichedRecord {
            record: InputRecord::new(sender, format!("subject from {sender}"), "body"),
            priority,
            category,
            response: "Thanks!".into(),
            response_source: DraftSource::Generated,
        }
    }

    #[test]
    fn sorts_by_tier_not_lexicographically() {
        let report = Report::build(vec![
            enriched("m", PriorityTier::Medium, Category::GeneralInquiry),
            enriched("h", PriorityTier::High, Category::GeneralInquiry),
            enriched("l", PriorityTier::Low, Category::GeneralInquiry),
        ]);
        let tiers: Vec<PriorityTier> = report.records().iter().map(|r| r.priority).collect();
        assert_eq!(
            tiers,
            vec![PriorityTier::High, PriorityTier::Medium, PriorityTier::Low]
        );
    }

    #[test]
    fn sort_is_stable_within_tier() {
        let report = Report::build(vec![
            enriched("low-1", PriorityTier::Low, Category::GeneralInquiry),
            enriched("high-1", PriorityTier::High, Category::GeneralInquiry),
            enriched("low-2", PriorityTier::Low, Category::GeneralInquiry),
            enriched("high-2", PriorityTier::High, Category::GeneralInquiry),
            enriched("low-3", PriorityTier::Low, Category::GeneralInquiry),
        ]);
        let senders: Vec<&str> = report.records().iter().map(|r| r.sender()).collect();
        assert_eq!(senders, vec!["high-1", "high-2", "low-1", "low-2", "low-3"]);
    }

    #[test]
    fn markdown_has_fixed_columns_in_order() {
        let report = Report::build(vec![enriched(
            "a@x.com",
            PriorityTier::High,
            Category::SystemDowntime,
        )]);
        let md = report.to_markdown();
        let mut lines = md.lines();
        let header = lines.next().unwrap();
        let names: Vec<&str> = header
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        assert_eq!(names, COLUMNS.to_vec());
        assert!(lines.next().unwrap().starts_with("|:"));
        let row = lines.next().unwrap();
        assert!(row.contains("a@x.com"));
        assert!(row.contains("High"));
        assert!(row.contains("System Downtime"));
    }

    #[test]
    fn markdown_rows_are_aligned() {
        let report = Report::build(vec![
            enriched("short", PriorityTier::Low, Category::GeneralInquiry),
            enriched("a-much-longer-sender@example.com", PriorityTier::Low, Category::Integration),
        ]);
        let md = report.to_markdown();
        let widths: Vec<usize> = md.lines().map(|l| l.chars().count()).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]), "{md}");
    }

    #[test]
    fn markdown_escapes_pipes_and_newlines() {
        let mut record = enriched("a@x.com", PriorityTier::Low, Category::GeneralInquiry);
        record.response = "line one\nline two | more".into();
        let md = Report::build(vec![record]).to_markdown();
        assert!(md.contains("line one line two \\| more"));
        assert_eq!(md.lines().count(), 3);
    }

    #[test]
    fn json_rows_use_labels() {
        let report = Report::build(vec![enriched(
            "a@x.com",
            PriorityTier::Medium,
            Category::BillingPricing,
        )]);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json[0]["sender"], "a@x.com");
        assert_eq!(json[0]["priority"], "Medium");
        assert_eq!(json[0]["category"], "Billing/Pricing");
        assert_eq!(json[0]["response"], "Thanks!");
    }

    #[test]
    fn empty_report_renders_header_only() {
        let report = Report::build(vec![]);
        assert!(report.is_empty());
        assert_eq!(report.to_markdown().lines().count(), 2);
        assert_eq!(report.to_json().unwrap(), "[]");
    }

    #[test]
    fn summary_counts() {
        let report = Report::build(vec![
            enriched("a", PriorityTier::High, Category::SystemDowntime),
            enriched("b", PriorityTier::High, Category::LoginAccount),
            enriched("c", PriorityTier::Low, Category::LoginAccount),
        ]);
        let summary = report.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.priority_count(PriorityTier::High), 2);
        assert_eq!(summary.priority_count(PriorityTier::Medium), 0);
        assert_eq!(summary.category_count(Category::LoginAccount), 2);
        assert_eq!(summary.by_priority.len(), 3);

        let text = summary.to_string();
        assert!(text.contains("High: 2, Medium: 0, Low: 1"));
        assert!(text.contains("Login/Account: 2"));
        assert!(!text.contains("Integration"));
    }
}
