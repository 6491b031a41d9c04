use serde::{Deserialize, Serialize};

use crate::analysis::types::ClassThresholds;

/// Analysis settings, loadable from YAML and overridable from the CLI
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Flows sending more than this many bytes are large
    pub large_flow_min_bytes: u64,
    /// Flows sending fewer than this many bytes are small
    pub small_flow_max_bytes: u64,
    /// Parallel document workers (0 = available parallelism)
    pub workers: usize,
    /// Extension of monitor documents in the input directory
    pub document_extension: String,
    /// Directory receiving the results document
    pub output_dir: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let thresholds = ClassThresholds::default();
        Self {
            large_flow_min_bytes: thresholds.large_min_bytes,
            small_flow_max_bytes: thresholds.small_max_bytes,
            workers: 0,
            document_extension: "xml".to_string(),
            output_dir: ".".to_string(),
        }
    }
}

impl AnalysisConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.small_flow_max_bytes >= self.large_flow_min_bytes {
            return Err(ValidationError::InvalidThresholds(format!(
                "small_flow_max_bytes ({}) must be below large_flow_min_bytes ({})",
                self.small_flow_max_bytes, self.large_flow_min_bytes
            )));
        }

        let extension = self.document_extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(ValidationError::InvalidInput(
                "document_extension cannot be empty".to_string(),
            ));
        }

        if self.output_dir.is_empty() {
            return Err(ValidationError::InvalidOutput(
                "output_dir cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn thresholds(&self) -> ClassThresholds {
        ClassThresholds {
            large_min_bytes: self.large_flow_min_bytes,
            small_max_bytes: self.small_flow_max_bytes,
        }
    }

    /// Extension without a leading dot
    pub fn extension(&self) -> &str {
        self.document_extension.trim_start_matches('.')
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid flow size thresholds: {0}")]
    InvalidThresholds(String),
    #[error("Invalid input configuration: {0}")]
    InvalidInput(String),
    #[error("Invalid output configuration: {0}")]
    InvalidOutput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.thresholds(), ClassThresholds::default());
        assert_eq!(config.extension(), "xml");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
workers: 4
document_extension: ".xml"
"#;
        let config: AnalysisConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.extension(), "xml");
        assert_eq!(config.large_flow_min_bytes, 10_000_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_key_is_ignored() {
        let config: AnalysisConfig =
            serde_yaml::from_str("log_level: debug\nworkers: 2\n").unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config, AnalysisConfig { workers: 2, ..Default::default() });
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let config = AnalysisConfig {
            large_flow_min_bytes: 1000,
            small_flow_max_bytes: 5000,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidThresholds(_))
        ));
    }

    #[test]
    fn test_empty_extension_rejected() {
        let config = AnalysisConfig {
            document_extension: ".".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ValidationError::InvalidInput(_))));
    }
}
