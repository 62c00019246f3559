//! Configuration types.

use std::str::FromStr;

use crate::error::ConfigError;
use crate::llm::GeminiConfig;

/// Default number of generation calls in flight.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// How the report is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::InvalidValue {
                key: "format".to_string(),
                message: format!("expected 'markdown' or 'json', got '{other}'"),
            }),
        }
    }
}

/// Settings for one triage run. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Path or URL of the CSV source.
    pub source: String,
    pub format: OutputFormat,
    /// Maximum generation calls in flight.
    pub concurrency: usize,
    /// Request search grounding from the provider.
    pub grounding: bool,
    /// Print per-tier and per-category counts after the table.
    pub summary: bool,
    pub generator: GeminiConfig,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            source: String::new(),
            format: OutputFormat::default(),
            concurrency: DEFAULT_CONCURRENCY,
            grounding: true,
            summary: false,
            generator: GeminiConfig::default(),
        }
    }
}

impl TriageConfig {
    /// Build config from environment variables.
    ///
    /// `TRIAGE_SOURCE` may be empty here; [`validate`](Self::validate)
    /// rejects it.
    pub fn from_env() -> Self {
        let source = std::env::var("TRIAGE_SOURCE").unwrap_or_default();

        let concurrency: usize = std::env::var("TRIAGE_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CONCURRENCY);

        let grounding = std::env::var("TRIAGE_GROUNDING")
            .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(true);

        Self {
            source,
            format: OutputFormat::default(),
            concurrency,
            grounding,
            summary: false,
            generator: GeminiConfig::from_env(),
        }
    }

    /// Check settings that cannot be defaulted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "source".to_string(),
                hint: "Pass a CSV path or URL, or set TRIAGE_SOURCE.".to_string(),
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "concurrency".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.generator.timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "timeout".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serial_test::serial;

    use super::*;

    fn config(source: &str) -> TriageConfig {
        TriageConfig {
            source: source.to_string(),
            ..TriageConfig::default()
        }
    }

    #[test]
    fn output_format_parses() {
        assert_eq!("markdown".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn validate_accepts_defaults_with_source() {
        assert!(config("emails.csv").validate().is_ok());
    }

    #[test]
    fn validate_requires_source() {
        let err = config("  ").validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { .. }));
    }

    #[test]
    fn validate_rejects_zero_concurrency() {
        let mut cfg = config("emails.csv");
        cfg.concurrency = 0;
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ConfigError::InvalidValue { .. }
        ));
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut cfg = config("emails.csv");
        cfg.generator = cfg.generator.with_timeout(Duration::ZERO);
        assert!(cfg.validate().is_err());
    }

    #[test]
    #[serial]
    fn from_env_grounding_switches_off() {
        for value in ["off", "0", "FALSE", "no"] {
            unsafe { std::env::set_var("TRIAGE_GROUNDING", value) };
            let grounding = TriageConfig::from_env().grounding;
            unsafe { std::env::remove_var("TRIAGE_GROUNDING") };
            assert!(!grounding, "TRIAGE_GROUNDING={value} should disable grounding");
        }
    }

    #[test]
    #[serial]
    fn from_env_grounding_defaults_on() {
        unsafe { std::env::remove_var("TRIAGE_GROUNDING") };
        assert!(TriageConfig::from_env().grounding);

        unsafe { std::env::set_var("TRIAGE_GROUNDING", "yes") };
        let grounding = TriageConfig::from_env().grounding;
        unsafe { std::env::remove_var("TRIAGE_GROUNDING") };
        assert!(grounding);
    }

    #[test]
    #[serial]
    fn from_env_unparseable_concurrency_uses_default() {
        unsafe { std::env::set_var("TRIAGE_CONCURRENCY", "many") };
        let concurrency = TriageConfig::from_env().concurrency;
        unsafe { std::env::remove_var("TRIAGE_CONCURRENCY") };
        assert_eq!(concurrency, DEFAULT_CONCURRENCY);
    }
}
