use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{Instrument, info_span, warn};
use uuid::Uuid;

use support_triage::config::{OutputFormat, TriageConfig};
use support_triage::pipeline::{ProcessOutcome, TriageProcessor};
use support_triage::report::Report;
use support_triage::source;

/// Prioritize, categorize and draft replies for a batch of support emails.
#[derive(Parser, Debug)]
#[command(name = "support-triage", version)]
struct Cli {
    /// CSV path or URL with `sender`, `subject` and `body` columns.
    #[arg(env = "TRIAGE_SOURCE")]
    source: Option<String>,

    /// Report format: markdown or json.
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Maximum generation calls in flight.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-request generation timeout, in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Do not request search grounding from the provider.
    #[arg(long)]
    no_grounding: bool,

    /// Print per-priority and per-category counts after the table.
    #[arg(long)]
    summary: bool,
}

impl Cli {
    fn into_config(self) -> TriageConfig {
        let mut config = TriageConfig::from_env();
        if let Some(source) = self.source {
            config.source = source;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if let Some(secs) = self.timeout_secs {
            config.generator.timeout = Duration::from_secs(secs);
        }
        if self.no_grounding {
            config.grounding = false;
        }
        config.summary = self.summary;
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries only the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().into_config();
    let processor = TriageProcessor::from_config(&config)?;

    eprintln!("📬 Support Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Source: {}", config.source);
    eprintln!("   Model: {}", config.generator.model);
    eprintln!(
        "   Timeout: {}s, concurrency: {}, grounding: {}\n",
        config.generator.timeout.as_secs(),
        config.concurrency,
        if config.grounding { "on" } else { "off" }
    );

    let run_id = Uuid::new_v4();
    let run = async {
        let records = source::load_or_empty(&config.source).await;
        processor.process(records).await
    }
    .instrument(info_span!("triage_run", %run_id));

    let outcome = tokio::select! {
        outcome = run => outcome,
        _ = tokio::signal::ctrl_c() => {
            warn!(%run_id, "Run cancelled; discarding partial results");
            std::process::exit(130);
        }
    };

    let records = match outcome {
        ProcessOutcome::NothingToProcess => {
            eprintln!("No data to process.");
            return Ok(());
        }
        ProcessOutcome::Processed { records, stats } => {
            if stats.fallbacks > 0 {
                eprintln!(
                    "   {} of {} responses used the fallback reply",
                    stats.fallbacks, stats.total
                );
            }
            records
        }
    };

    let report = Report::build(records);
    match config.format {
        OutputFormat::Markdown => {
            println!("\n--- Processed Emails Dashboard ---");
            print!("{}", report.to_markdown());
        }
        OutputFormat::Json => {
            println!("{}", report.to_json().context("failed to serialize report")?);
        }
    }

    if config.summary {
        eprintln!(
            "\n{}\nGenerated at {}",
            report.summary(),
            report.generated_at().to_rfc3339()
        );
    }

    Ok(())
}
