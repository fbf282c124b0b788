use std::path::Path;

use anyhow::{Context, Result};
use ingestguard_pipeline::PipelineConfig;

/// Load the pipeline configuration. Without a file every section takes its
/// default values.
pub fn parse_config(path: Option<&str>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let config_path = Path::new(path);
    let config_str = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let config: PipelineConfig = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
    if config.scheduler.max_checks == 0 {
        anyhow::bail!("scheduler.max_checks must be at least 1");
    }
    if config.retry.max_attempts == 0 {
        anyhow::bail!("retry.max_attempts must be at least 1");
    }
    Ok(config)
}
