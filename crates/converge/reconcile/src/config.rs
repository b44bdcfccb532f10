//! Polling configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergeConfig {
    /// Polling configuration shared by the drain and converge phases
    #[serde(default)]
    pub poll: PollConfig,
}

/// Timing of a reconciliation wait
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between issuing an action and the first converge poll, so the
    /// remote status has time to reflect the accepted action
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,

    /// Interval between polls
    #[serde(default = "default_tick_interval")]
    pub tick_interval_secs: u64,

    /// Overall time budget of one wait
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay(),
            tick_interval_secs: default_tick_interval(),
            timeout_secs: default_timeout(),
        }
    }
}

impl PollConfig {
    pub fn from_secs(initial_delay_secs: u64, tick_interval_secs: u64, timeout_secs: u64) -> Self {
        Self {
            initial_delay_secs,
            tick_interval_secs,
            timeout_secs,
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_secs)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject configurations the poll loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_secs == 0 {
            return Err(ReconcileError::Config(
                "tick_interval_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

// Default value helpers
fn default_initial_delay() -> u64 {
    5
}

fn default_tick_interval() -> u64 {
    10
}

fn default_timeout() -> u64 {
    4 * 3600
}

impl ConvergeConfig {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// Environment variables use the `CONVERGE_` prefix and `__` between
    /// nesting levels, e.g. `CONVERGE_POLL__TIMEOUT_SECS=600`.
    pub fn load(path: Option<&str>) -> std::result::Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&ConvergeConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CONVERGE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
