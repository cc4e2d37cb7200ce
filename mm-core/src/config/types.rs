//! The `Config` struct mirroring the configuration surface, plus a
//! `validate()` pass analogous to the teacher's `Config::validate` pattern
//! (reject out-of-range values before the control loop starts rather than
//! discovering them mid-run).

use crate::error::{AgentError, AgentResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    Test,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloseMethod {
    Market,
    Aggressive,
    Chase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,
    pub exchange: String,
    pub coin: String,
    pub auto_confirm: bool,

    pub spread_bps: f64,
    pub drift_threshold: f64,
    pub use_mid_drift: bool,
    pub mark_mid_diff_limit: f64,
    pub mid_unstable_cooldown: u64,
    pub min_wait_sec: u64,
    pub refresh_interval: f64,
    pub cancel_after_delay: f64,

    pub size_unit: f64,
    pub leverage: f64,
    pub max_size: f64,
    pub max_history: usize,
    pub max_consecutive_errors: u32,

    pub auto_close_position: bool,
    pub close_method: CloseMethod,
    pub close_aggressive_bps: f64,
    pub close_wait_sec: u64,
    pub close_min_size_market: f64,
    pub close_max_iterations: u32,

    pub snapshot_interval: u64,
    pub snapshot_file: String,
    pub restart_interval: u64,
    pub restart_delay: u64,

    pub log_level: String,
    pub json_logs: bool,
    pub position_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Test,
            exchange: "generic".to_string(),
            coin: "BTC".to_string(),
            auto_confirm: false,

            spread_bps: 8.0,
            drift_threshold: 3.0,
            use_mid_drift: false,
            mark_mid_diff_limit: 0.0,
            mid_unstable_cooldown: 0,
            min_wait_sec: 3,
            refresh_interval: 0.05,
            cancel_after_delay: 0.2,

            size_unit: 0.0001,
            leverage: 6.0,
            max_size: 0.0002,
            max_history: 1000,
            max_consecutive_errors: 10,

            auto_close_position: false,
            close_method: CloseMethod::Market,
            close_aggressive_bps: 0.0,
            close_wait_sec: 5,
            close_min_size_market: 0.0001,
            close_max_iterations: 10,

            snapshot_interval: 5,
            snapshot_file: "mm_status.txt".to_string(),
            restart_interval: 0,
            restart_delay: 5,

            log_level: "info".to_string(),
            json_logs: false,
            position_log_file: "mm_position.log".to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> AgentResult<()> {
        if self.spread_bps <= 0.0 {
            return Err(AgentError::Config("spread_bps must be positive".into()));
        }
        if self.drift_threshold <= 0.0 {
            return Err(AgentError::Config("drift_threshold must be positive".into()));
        }
        if self.size_unit <= 0.0 {
            return Err(AgentError::Config("size_unit must be positive".into()));
        }
        if self.leverage <= 0.0 {
            return Err(AgentError::Config("leverage must be positive".into()));
        }
        if self.max_size <= 0.0 {
            return Err(AgentError::Config("max_size must be positive".into()));
        }
        if self.refresh_interval <= 0.0 {
            return Err(AgentError::Config("refresh_interval must be positive".into()));
        }
        if self.max_consecutive_errors == 0 {
            return Err(AgentError::Config("max_consecutive_errors must be >= 1".into()));
        }
        if self.close_max_iterations == 0 {
            return Err(AgentError::Config("close_max_iterations must be >= 1".into()));
        }
        if self.mode == Mode::Live && self.exchange == "generic" {
            return Err(AgentError::Config(
                "LIVE mode requires a concrete exchange, not the generic default".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn live_mode_requires_real_exchange() {
        let mut cfg = Config::default();
        cfg.mode = Mode::Live;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_nonpositive_spread() {
        let mut cfg = Config::default();
        cfg.spread_bps = 0.0;
        assert!(cfg.validate().is_err());
    }
}
