//! Configuration management module
//!
//! Loads `EngineSettings` through a defaults → optional YAML file →
//! `WAYRUNNER_`-prefixed environment variable layering, the same shape
//! `cli/runtime.rs::load_config` uses for its kernel config.
#![allow(dead_code)]

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::errors::EngineResult;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Ceiling on `step.retry_index`.
    pub max_retries_per_step: u32,
    /// Fallback step ceiling when neither the call nor the organization
    /// override it.
    pub max_steps_per_run: u32,
    /// Number of recent steps whose results are inlined into the prompt.
    pub prompt_action_history_window: usize,
    /// Fraction of max steps at which to emit a long-running warning.
    pub long_running_task_warning_ratio: f64,
    pub browser_action_timeout_ms: u64,
    pub browser_type: String,
    pub video_path: String,
    pub env: String,
    /// Whether `TaskDriver::execute_step` keeps looping across steps
    /// internally or returns the next step to the caller after each one.
    pub execute_all_steps: bool,
    pub debug_mode: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_retries_per_step: 3,
            max_steps_per_run: 75,
            prompt_action_history_window: 5,
            long_running_task_warning_ratio: 0.8,
            browser_action_timeout_ms: 30_000,
            browser_type: "chromium-headless".to_string(),
            video_path: "./videos".to_string(),
            env: "local".to_string(),
            execute_all_steps: true,
            debug_mode: false,
        }
    }
}

impl EngineSettings {
    /// Layer built-in defaults, an optional YAML file, then
    /// `WAYRUNNER_`-prefixed environment variables.
    pub fn load(config_path: Option<&Path>) -> EngineResult<Self> {
        let defaults = Self::default();
        let mut builder = Config::builder().add_source(
            Config::try_from(&defaults)?,
        );

        if let Some(path) = config_path {
            if path.exists() {
                builder = builder.add_source(File::from(path));
            }
        }

        builder = builder.add_source(Environment::with_prefix("WAYRUNNER").separator("__"));

        let settings: EngineSettings = builder.build()?.try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_settings_documented_in_spec() {
        let settings = EngineSettings::default();
        assert_eq!(settings.max_retries_per_step, 3);
        assert_eq!(settings.max_steps_per_run, 75);
        assert!(settings.execute_all_steps);
    }

    #[test]
    fn loads_without_a_file_or_env_overrides() {
        let settings = EngineSettings::load(None).unwrap();
        assert_eq!(settings.max_retries_per_step, EngineSettings::default().max_retries_per_step);
    }
}
