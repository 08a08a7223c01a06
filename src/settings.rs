//! Engine configuration: built-in defaults, an optional file, then
//! `NATAL_`-prefixed environment variables.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::ephemeris::ResolveMode;
use crate::error::{ProfileError, Result};

/// Japan Standard Time; applied to every region.
pub const DEFAULT_UTC_OFFSET_HOURS: f64 = 9.0;
pub const DEFAULT_RESOLVE_TIMEOUT_MS: u64 = 5_000;

/// Environment variable naming a configuration file.
pub const CONFIG_PATH_ENV: &str = "NATAL_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hours subtracted from civil birth time to reach UTC. Read from NATAL_UTC_OFFSET_HOURS.
    pub utc_offset_hours: f64,

    /// Upper bound on resolving all bodies. Read from NATAL_RESOLVE_TIMEOUT_MS.
    pub resolve_timeout_ms: u64,

    /// Resolve bodies on worker threads. Read from NATAL_PARALLEL.
    pub parallel: bool,

    /// Regions added to (or replacing entries of) the built-in table.
    pub regions: Vec<RegionConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            resolve_timeout_ms: DEFAULT_RESOLVE_TIMEOUT_MS,
            parallel: true,
            regions: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Loads from `path` when given, else from `NATAL_CONFIG` when set, then
    /// applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_PATH_ENV).ok();
        let file = path
            .map(|p| p.to_string_lossy().into_owned())
            .or(env_path);

        let defaults = EngineConfig::default();
        let mut builder = config::Config::builder()
            .set_default("utc_offset_hours", defaults.utc_offset_hours)?
            .set_default("resolve_timeout_ms", defaults.resolve_timeout_ms)?
            .set_default("parallel", defaults.parallel)?;
        if let Some(file) = file {
            builder = builder.add_source(config::File::with_name(&file));
        }
        builder = builder.add_source(config::Environment::with_prefix("NATAL").try_parsing(true));

        let cfg: EngineConfig = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.utc_offset_hours.is_finite() || !(-14.0..=14.0).contains(&self.utc_offset_hours) {
            return Err(ProfileError::Configuration(format!(
                "utc_offset_hours {} is outside [-14, 14]",
                self.utc_offset_hours
            )));
        }
        if self.resolve_timeout_ms == 0 {
            return Err(ProfileError::Configuration(
                "resolve_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }

    pub fn resolve_mode(&self) -> ResolveMode {
        if self.parallel {
            ResolveMode::Parallel
        } else {
            ResolveMode::Sequential
        }
    }
}
