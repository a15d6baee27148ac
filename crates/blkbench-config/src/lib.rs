//! Settings management for blkbench
//!
//! The five positional arguments fully describe a run; settings only
//! adjust what they leave open. Sources, lowest precedence first:
//! 1. Built-in defaults (1 GiB region, 64 MiB access volume, text output)
//! 2. ~/.config/blkbench/config.toml (user defaults)
//! 3. blkbench.toml (project settings)
//! 4. blkbench.local.toml (gitignored, local overrides)
//! 5. Environment variables (`BLKBENCH_<SECTION>__<KEY>`)
//! 6. CLI flags (applied by the binary)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Main blkbench settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchSettings {
    pub benchmark: BenchmarkSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkSettings {
    /// Bytes at the start of the target that offsets may fall in.
    pub region_size: u64,
    /// Bytes transferred per run.
    pub access_size: u64,
    /// Seed for random access plans; OS entropy when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            region_size: 1024 * 1024 * 1024,
            access_size: 64 * 1024 * 1024,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub format: OutputFormat,
    pub color: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Text,
    Json,
}

impl BenchSettings {
    /// Load settings from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load settings with project files taken from a specific directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Checks the sizes describe a usable benchmark window
    pub fn validate(&self) -> Result<(), ConfigError> {
        let BenchmarkSettings {
            region_size,
            access_size,
            ..
        } = self.benchmark;

        if region_size == 0 {
            return Err(ConfigError::ValidationError(
                "benchmark.region_size must be > 0".to_string(),
            ));
        }
        if access_size == 0 {
            return Err(ConfigError::ValidationError(
                "benchmark.access_size must be > 0".to_string(),
            ));
        }
        if access_size > region_size {
            return Err(ConfigError::ValidationError(format!(
                "benchmark.access_size ({access_size}) exceeds benchmark.region_size ({region_size})"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = BenchSettings::default();
        assert_eq!(settings.benchmark.region_size, 1 << 30);
        assert_eq!(settings.benchmark.access_size, 64 << 20);
        assert_eq!(settings.benchmark.seed, None);
        assert_eq!(settings.output.format, OutputFormat::Text);
        assert!(settings.output.color);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut settings = BenchSettings::default();
        settings.benchmark.access_size = settings.benchmark.region_size * 2;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("exceeds"));

        settings.benchmark.region_size = 0;
        assert!(settings.validate().is_err());

        let mut settings = BenchSettings::default();
        settings.benchmark.access_size = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_toml_shape() {
        let text = toml::to_string(&BenchSettings::default()).unwrap();
        assert!(text.contains("[benchmark]"));
        assert!(text.contains("region_size = 1073741824"));
        assert!(text.contains("format = \"text\""));
        assert!(!text.contains("seed"));

        let parsed: BenchSettings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, BenchSettings::default());
    }
}
