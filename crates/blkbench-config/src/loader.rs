//! Settings loader with multi-source merging

use crate::{BenchSettings, Paths};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Settings loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    user_config: bool,
}

impl ConfigLoader {
    /// Create a new loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "BLKBENCH".to_string(),
            user_config: true,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "BLKBENCH")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip ~/.config/blkbench/config.toml
    pub fn without_user_config(mut self) -> Self {
        self.user_config = false;
        self
    }

    /// Settings files that exist, lowest precedence first.
    fn files(&self) -> Vec<PathBuf> {
        let user = self
            .user_config
            .then(|| Paths::new().user_config_file().ok())
            .flatten();

        user.into_iter()
            .chain([
                Paths::project_config_file(&self.project_dir),
                Paths::local_config_file(&self.project_dir),
            ])
            .filter(|path| path.exists())
            .collect()
    }

    /// Merges defaults, settings files and the environment, then validates.
    pub fn load(self) -> Result<BenchSettings> {
        let mut builder = config::Config::builder()
            .add_source(config::Config::try_from(&BenchSettings::default())?);

        for path in self.files() {
            builder = builder.add_source(
                config::File::from(path.as_path()).format(config::FileFormat::Toml),
            );
        }

        // BLKBENCH_BENCHMARK__REGION_SIZE -> benchmark.region_size
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: BenchSettings = builder
            .build()
            .and_then(config::Config::try_deserialize)
            .context("Failed to merge settings sources")?;
        settings.validate()?;

        Ok(settings)
    }

    /// Load settings or return defaults if any source is unusable
    pub fn load_or_default(self) -> BenchSettings {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
