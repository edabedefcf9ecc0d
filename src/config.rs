use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine configuration, loadable from JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Length bounds forwarded with every summarize request.
    pub summarization: SummarizationParams,

    /// Classification output shaping.
    pub classification: ClassificationParams,

    /// What to do when text extraction from an image yields nothing.
    pub empty_extraction: EmptyExtractionPolicy,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationParams {
    pub max_length: usize,
    pub min_length: usize,
    pub do_sample: bool,
}

impl Default for SummarizationParams {
    fn default() -> Self {
        Self {
            max_length: 60,
            min_length: 15,
            do_sample: false,
        }
    }
}

impl SummarizationParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_length == 0 {
            return Err(ConfigError::Invalid(
                "summarization.max_length must be positive".to_string(),
            ));
        }
        if self.min_length > self.max_length {
            return Err(ConfigError::Invalid(format!(
                "summarization.min_length ({}) exceeds max_length ({})",
                self.min_length, self.max_length
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationParams {
    /// Keep only the first `top_k` predictions; `None` keeps all.
    pub top_k: Option<usize>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyExtractionPolicy {
    /// Fail the chain with `NoExtractableText`.
    #[default]
    Reject,
    /// Re-run the empty text check used for typed input.
    FallThrough,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.summarization.validate()?;
        if self.classification.top_k == Some(0) {
            return Err(ConfigError::Invalid(
                "classification.top_k must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.summarization.max_length, 60);
        assert_eq!(config.summarization.min_length, 15);
        assert!(!config.summarization.do_sample);
        assert_eq!(config.classification.top_k, None);
        assert_eq!(config.empty_extraction, EmptyExtractionPolicy::Reject);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{ "summarization": { "max_length": 120 }, "empty_extraction": "fall-through" }"#,
        )
        .unwrap();
        assert_eq!(config.summarization.max_length, 120);
        assert_eq!(config.summarization.min_length, 15);
        assert_eq!(config.empty_extraction, EmptyExtractionPolicy::FallThrough);
        assert_eq!(config.classification.top_k, None);
    }

    #[test]
    fn rejects_inverted_lengths() {
        let err = EngineConfig::from_json_str(
            r#"{ "summarization": { "max_length": 10, "min_length": 20 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = EngineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
