use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::error::{Result, SentimentError};

/// Tokenizer limits applied by the batch collator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CollatorConfig {
    /// Sequences longer than this many sub-tokens are truncated.
    pub max_length: usize,
}

impl Default for CollatorConfig {
    fn default() -> Self {
        Self { max_length: 512 }
    }
}

/// Settings for the chunked, rate-limited translation driver.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub source_lang: String,
    pub target_lang: String,
    /// Lower bound of the random pause taken before every chunk call.
    pub min_delay_ms: u64,
    /// Upper bound (inclusive) of the random pause.
    pub max_delay_ms: u64,
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_lang: "hi".to_string(),
            target_lang: "en".to_string(),
            min_delay_ms: 1000,
            max_delay_ms: 2000,
            timeout_secs: 5,
        }
    }
}

impl TranslationConfig {
    /// A config that never sleeps between chunk calls.
    pub fn without_delay() -> Self {
        Self {
            min_delay_ms: 0,
            max_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_delay_ms > self.max_delay_ms {
            return Err(SentimentError::Config(format!(
                "min_delay_ms ({}) exceeds max_delay_ms ({})",
                self.min_delay_ms, self.max_delay_ms
            )));
        }
        Ok(())
    }
}

/// Thresholds used when mapping detector output onto English/Hindi/Hinglish.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LanguageConfig {
    /// Only the first `truncate_chars` characters are inspected. `None` disables truncation.
    pub truncate_chars: Option<usize>,
    /// English detections below this confidence count as Hinglish.
    pub english_confidence: f64,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            truncate_chars: Some(1000),
            english_confidence: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub collator: CollatorConfig,
    pub translation: TranslationConfig,
    pub language: LanguageConfig,
}

impl PipelineConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.translation.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"collator": {"max_length": 128}, "translation": {"min_delay_ms": 0}}"#)
                .unwrap();

        assert_eq!(config.collator.max_length, 128);
        assert_eq!(config.translation.min_delay_ms, 0);
        assert_eq!(config.translation.max_delay_ms, 2000);
        assert_eq!(config.translation.source_lang, "hi");
        assert_eq!(config.language, LanguageConfig::default());
    }

    #[test]
    fn test_inverted_delay_range_is_rejected() {
        let config = TranslationConfig {
            min_delay_ms: 3000,
            ..TranslationConfig::default()
        };
        assert!(matches!(config.validate(), Err(SentimentError::Config(_))));
    }
}
