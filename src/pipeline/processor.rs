//! Triage processor: classifies each record and drafts a reply.
//!
//! Flow per record:
//! 1. Classifier (pure, no I/O) → priority, category
//! 2. Response generator (one provider call, fallback on failure) → response
//!
//! Records are independent. With `concurrency > 1` several generation calls
//! are in flight at once, but output order always equals input order.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::config::TriageConfig;
use crate::error;
use crate::llm::{LlmBackend, create_generator};
use crate::pipeline::classifier::ClassifierRules;
use crate::pipeline::responder::ResponseGenerator;
use crate::pipeline::types::{DraftSource, EnrichedRecord, InputRecord};

/// Counters for a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    /// Records enriched.
    pub total: usize,
    /// Records whose response is the fallback text.
    pub fallbacks: usize,
}

/// Result of a pipeline pass.
#[derive(Debug, Clone)]
pub enum ProcessOutcome {
    /// Input was empty. Reported, not an error.
    NothingToProcess,
    /// Every input record, enriched, in input order.
    Processed {
        records: Vec<EnrichedRecord>,
        stats: ProcessStats,
    },
}

impl ProcessOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::NothingToProcess)
    }

    pub fn records(&self) -> &[EnrichedRecord] {
        match self {
            Self::NothingToProcess => &[],
            Self::Processed { records, .. } => records,
        }
    }

    pub fn into_records(self) -> Vec<EnrichedRecord> {
        match self {
            Self::NothingToProcess => Vec::new(),
            Self::Processed { records, .. } => records,
        }
    }

    pub fn stats(&self) -> ProcessStats {
        match self {
            Self::NothingToProcess => ProcessStats::default(),
            Self::Processed { stats, .. } => *stats,
        }
    }
}

/// Enriches support records with priority, category and a drafted reply.
pub struct TriageProcessor {
    rules: ClassifierRules,
    responder: Arc<ResponseGenerator>,
    concurrency: usize,
}

impl TriageProcessor {
    pub fn new(rules: ClassifierRules, responder: Arc<ResponseGenerator>) -> Self {
        Self {
            rules,
            responder,
            concurrency: 1,
        }
    }

    /// Validate `config` and wire the default rules to a Gemini-backed responder.
    pub fn from_config(config: &TriageConfig) -> error::Result<Self> {
        config.validate()?;
        let generator = create_generator(LlmBackend::Gemini, &config.generator)?;
        let responder = Arc::new(
            ResponseGenerator::new(generator, config.generator.timeout)
                .with_grounding(config.grounding),
        );
        Ok(Self::new(ClassifierRules::default_rules(), responder)
            .with_concurrency(config.concurrency))
    }

    /// Maximum generation calls in flight. Values below 1 are treated as 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Enrich a single record.
    pub async fn enrich(&self, record: InputRecord) -> EnrichedRecord {
        let priority = self.rules.classify_priority(&record.subject, &record.body);
        let category = self.rules.classify_category(&record.subject, &record.body);
        let draft = self
            .responder
            .draft(&record.sender, &record.subject, &record.body)
            .await;

        debug!(
            sender = %record.sender,
            priority = %priority,
            category = %category,
            fallback = draft.is_fallback(),
            "Record enriched"
        );

        EnrichedRecord {
            record,
            priority,
            category,
            response: draft.text,
            response_source: draft.source,
        }
    }

    /// Enrich every record. Output has one entry per input, in input order.
    pub async fn process(&self, records: Vec<InputRecord>) -> ProcessOutcome {
        if records.is_empty() {
            info!("No data to process");
            return ProcessOutcome::NothingToProcess;
        }

        let count = records.len();
        info!(count, concurrency = self.concurrency, "Processing record batch");

        // `buffered` keeps input order regardless of completion order.
        let enriched: Vec<EnrichedRecord> = stream::iter(records)
            .map(|record| self.enrich(record))
            .buffered(self.concurrency)
            .collect()
            .await;

        let fallbacks = enriched
            .iter()
            .filter(|r| r.response_source == DraftSource::Fallback)
            .count();
        let stats = ProcessStats {
            total: enriched.len(),
            fallbacks,
        };

        info!(
            processed = stats.total,
            fallbacks = stats.fallbacks,
            "Batch processing complete"
        );

        ProcessOutcome::Processed {
            records: enriched,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::{ConfigError, Error, LlmError};
    use crate::llm::{GenerationRequest, GenerationResult, Generator};
    use crate::pipeline::responder::FALLBACK_RESPONSE;
    use crate::pipeline::types::{Category, PriorityTier};

    /// Echoes the prompt back; fails for senders containing "fail".
    /// Sleeps longer for earlier records so completion order is reversed.
    struct EchoGenerator;

    #[async_trait]
    impl Generator for EchoGenerator {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<GenerationResult, LlmError> {
            let delay = request
                .context
                .strip_prefix("delay:")
                .and_then(|d| d.parse::<u64>().ok())
                .unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if request.prompt.contains("fail") {
                return Err(LlmError::RequestFailed {
                    provider: "echo".into(),
                    reason: "boom".into(),
                });
            }
            Ok(GenerationResult {
                candidates: vec![format!("re: {}", request.prompt)],
            })
        }
    }

    fn processor(concurrency: usize) -> TriageProcessor {
        let responder = Arc::new(ResponseGenerator::new(
            Arc::new(EchoGenerator),
            Duration::from_secs(5),
        ));
        TriageProcessor::new(ClassifierRules::default_rules(), responder)
            .with_concurrency(concurrency)
    }

    #[tokio::test]
    async fn empty_input_is_nothing_to_process() {
        let outcome = processor(1).process(vec![]).await;
        assert!(outcome.is_empty());
        assert!(outcome.records().is_empty());
        assert_eq!(outcome.stats(), ProcessStats::default());
    }

    #[tokio::test]
    async fn enriches_every_record_in_order() {
        let input = vec![
            InputRecord::new("a@x.com", "Urgent: server downtime", "our servers are down"),
            InputRecord::new("b@x.com", "Question about billing", "how much is the subscription"),
            InputRecord::new("c@x.com", "hello", "just checking in"),
        ];
        let outcome = processor(1).process(input.clone()).await;
        let records = outcome.records();

        assert_eq!(records.len(), 3);
        for (enriched, original) in records.iter().zip(&input) {
            assert_eq!(&enriched.record, original);
        }
        assert_eq!(records[0].priority, PriorityTier::High);
        assert_eq!(records[0].category, Category::SystemDowntime);
        assert_eq!(records[1].priority, PriorityTier::Medium);
        assert_eq!(records[1].category, Category::BillingPricing);
        assert_eq!(records[2].priority, PriorityTier::Low);
        assert_eq!(records[2].category, Category::GeneralInquiry);
    }

    #[tokio::test]
    async fn one_failure_does_not_affect_others() {
        let input = vec![
            InputRecord::new("ok@x.com", "hi", "a"),
            InputRecord::new("fail@x.com", "hi", "b"),
            InputRecord::new("ok2@x.com", "hi", "c"),
        ];
        let outcome = processor(1).process(input).await;
        let records = outcome.records();

        assert_eq!(records.len(), 3);
        assert!(records[0].response.starts_with("re: "));
        assert_eq!(records[1].response, FALLBACK_RESPONSE);
        assert!(records[2].response.starts_with("re: "));
        assert_eq!(outcome.stats(), ProcessStats { total: 3, fallbacks: 1 });
    }

    #[tokio::test]
    async fn concurrent_processing_preserves_input_order() {
        let input: Vec<InputRecord> = (0..5)
            .map(|i| {
                InputRecord::new(
                    format!("user{i}@x.com"),
                    format!("subject {i}"),
                    format!("delay:{}", (5 - i) * 20),
                )
            })
            .collect();
        let outcome = processor(5).process(input).await;

        let senders: Vec<&str> = outcome.records().iter().map(|r| r.sender()).collect();
        assert_eq!(
            senders,
            vec!["user0@x.com", "user1@x.com", "user2@x.com", "user3@x.com", "user4@x.com"]
        );
        for record in outcome.records() {
            assert!(record.response.contains(record.sender()));
        }
    }

    #[test]
    fn from_config_rejects_invalid_config() {
        let config = TriageConfig {
            source: String::new(),
            ..TriageConfig::default()
        };
        let err = TriageProcessor::from_config(&config).err().unwrap();
        assert!(matches!(
            err,
            Error::Config(ConfigError::MissingRequired { .. })
        ));
    }

    #[test]
    fn from_config_applies_concurrency() {
        let config = TriageConfig {
            source: "emails.csv".into(),
            concurrency: 4,
            ..TriageConfig::default()
        };
        let processor = TriageProcessor::from_config(&config).unwrap();
        assert_eq!(processor.concurrency, 4);
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        assert_eq!(processor(0).concurrency, 1);
    }
}
