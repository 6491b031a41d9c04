use crate::config::AnalysisConfig;
use color_eyre::eyre::Context;
use color_eyre::Result;
use log::info;
use std::fs::File;
use std::path::Path;

/// Load and validate analysis settings from a YAML file
pub fn load_config(config_path: &Path) -> Result<AnalysisConfig> {
    info!("Loading configuration from: {:?}", config_path);

    let file = File::open(config_path)
        .with_context(|| format!("Failed to open configuration '{}'", config_path.display()))?;

    let config: AnalysisConfig = serde_yaml::from_reader(file)
        .with_context(|| format!("Failed to parse configuration '{}'", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

/// CLI values that take precedence over the configuration file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub workers: Option<usize>,
    pub output_dir: Option<String>,
    pub document_extension: Option<String>,
}

/// Apply CLI overrides and re-validate
pub fn apply_overrides(config: &mut AnalysisConfig, overrides: &CliOverrides) -> Result<()> {
    if let Some(workers) = overrides.workers {
        config.workers = workers;
    }
    if let Some(output_dir) = &overrides.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(extension) = &overrides.document_extension {
        config.document_extension = extension.clone();
    }

    config.validate()?;

    Ok(())
}
