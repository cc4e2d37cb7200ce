//! Layered configuration (defaults → optional TOML file → `MM_`-prefixed
//! environment overrides), loaded with the `config` crate.

mod types;

pub use types::{CloseMethod, Config, Mode};

use crate::error::{AgentError, AgentResult};
use crate::quoting::QuotingThresholds;
use crate::unwind::{UnwindConfig, UnwindMethod};
use ::config::{Config as RawConfig, Environment, File};
use rust_decimal::Decimal;
use std::convert::TryFrom;

impl Config {
    /// Loads layered config. `path` is an optional TOML file; when absent,
    /// defaults plus environment overrides are used as-is. Fields missing
    /// from every source fall back to [`Config::default`] via `#[serde(default)]`.
    pub fn load(path: Option<&str>) -> AgentResult<Config> {
        let mut builder = RawConfig::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix("MM")
                .separator("__")
                .try_parsing(true),
        );

        let raw = builder
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build config: {e}")))?;
        let config: Config = raw
            .try_deserialize()
            .map_err(|e| AgentError::Config(format!("failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn decimal(value: f64, field: &str) -> AgentResult<Decimal> {
        Decimal::try_from(value).map_err(|e| AgentError::Config(format!("bad {field}: {e}")))
    }

    pub fn quoting_thresholds(&self) -> AgentResult<QuotingThresholds> {
        Ok(QuotingThresholds {
            spread_bps: Self::decimal(self.spread_bps, "spread_bps")?,
            drift_threshold_bps: Self::decimal(self.drift_threshold, "drift_threshold")?,
            use_mid_drift: self.use_mid_drift,
            mark_mid_diff_limit_bps: Self::decimal(self.mark_mid_diff_limit, "mark_mid_diff_limit")?,
            mid_unstable_cooldown_sec: self.mid_unstable_cooldown,
            min_wait_sec: self.min_wait_sec,
            leverage: Self::decimal(self.leverage, "leverage")?,
            size_unit: Self::decimal(self.size_unit, "size_unit")?,
            max_size: Some(Self::decimal(self.max_size, "max_size")?),
        })
    }

    pub fn unwind_config(&self) -> AgentResult<UnwindConfig> {
        let method = match self.close_method {
            CloseMethod::Market => UnwindMethod::Market,
            CloseMethod::Aggressive => UnwindMethod::Aggressive,
            CloseMethod::Chase => UnwindMethod::Chase,
        };
        Ok(UnwindConfig {
            method,
            aggressive_bps: Self::decimal(self.close_aggressive_bps, "close_aggressive_bps")?,
            wait_sec: self.close_wait_sec,
            min_size_market: Self::decimal(self.close_min_size_market, "close_min_size_market")?,
            max_iterations: self.close_max_iterations,
        })
    }
}
