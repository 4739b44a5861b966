//! Configuration structs for the volatility strategy.

use serde::{Deserialize, Serialize};

/// The fixed instrument universe: one underlying plus a call and a put
/// at every strike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseConfig {
    #[serde(default = "default_underlying")]
    pub underlying: String,

    #[serde(default = "default_strikes")]
    pub strikes: Vec<u32>,

    /// Shares represented by one option contract.
    #[serde(default = "default_shares_per_contract")]
    pub shares_per_contract: i64,
}

/// Entry/exit thresholds and sizing for the option state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Minimum |market − target| to open a position.
    #[serde(default = "default_entry_threshold")]
    pub entry_threshold: f64,

    /// Near-convergence band that closes a position.
    #[serde(default = "default_exit_threshold")]
    pub exit_threshold: f64,

    #[serde(default = "default_contracts_per_trade")]
    pub contracts_per_trade: i64,

    /// Underlying bump used by the finite-difference delta.
    #[serde(default = "default_delta_bump")]
    pub delta_bump: f64,

    #[serde(default)]
    pub risk_free_rate: f64,
}

/// Portfolio delta-hedging limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HedgeConfig {
    /// |net delta| above this triggers a hedge (shares).
    #[serde(default = "default_net_delta_limit")]
    pub net_delta_limit: f64,

    /// Fraction of net delta neutralized per hedge.
    #[serde(default = "default_hedge_ratio")]
    pub hedge_ratio: f64,

    #[serde(default = "default_max_shares_per_order")]
    pub max_shares_per_order: i64,

    /// Per-share fee an unwind must beat.
    #[serde(default = "default_fee_per_share")]
    pub fee_per_share: f64,
}

/// Session clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTimingConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Last tick of the session (exclusive upper bound of the loop).
    #[serde(default = "default_session_ticks")]
    pub session_ticks: u32,

    /// Ticks in one model year; time to expiry is remaining ticks / this.
    #[serde(default = "default_ticks_per_year")]
    pub ticks_per_year: f64,
}

/// When and how realized volatility is read from the news feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityConfig {
    /// Ticks at which the latest announcement is parsed.
    #[serde(default = "default_checkpoints")]
    pub checkpoints: Vec<u32>,

    /// Token count that identifies the session's opening announcement.
    #[serde(default = "default_first_announcement_tokens")]
    pub first_announcement_tokens: usize,

    /// Token index carrying the percentage in weekly announcements.
    #[serde(default = "default_weekly_token_index")]
    pub weekly_token_index: usize,
}

impl VolatilityConfig {
    pub fn is_checkpoint(&self, tick: u32) -> bool {
        self.checkpoints.contains(&tick)
    }
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_underlying() -> String {
    "RTM".into()
}
fn default_strikes() -> Vec<u32> {
    vec![48, 49, 50, 51, 52]
}
fn default_shares_per_contract() -> i64 {
    100
}
fn default_entry_threshold() -> f64 {
    0.04
}
fn default_exit_threshold() -> f64 {
    0.01
}
fn default_contracts_per_trade() -> i64 {
    90
}
fn default_delta_bump() -> f64 {
    0.01
}
fn default_net_delta_limit() -> f64 {
    5000.0
}
fn default_hedge_ratio() -> f64 {
    0.7
}
fn default_max_shares_per_order() -> i64 {
    10_000
}
fn default_fee_per_share() -> f64 {
    0.02
}
fn default_poll_interval() -> u64 {
    400
}
fn default_session_ticks() -> u32 {
    300
}
fn default_ticks_per_year() -> f64 {
    3600.0
}
fn default_checkpoints() -> Vec<u32> {
    vec![1, 2, 74, 75, 149, 150, 224, 225]
}
fn default_first_announcement_tokens() -> usize {
    16
}
fn default_weekly_token_index() -> usize {
    29
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            underlying: default_underlying(),
            strikes: default_strikes(),
            shares_per_contract: default_shares_per_contract(),
        }
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            entry_threshold: default_entry_threshold(),
            exit_threshold: default_exit_threshold(),
            contracts_per_trade: default_contracts_per_trade(),
            delta_bump: default_delta_bump(),
            risk_free_rate: 0.0,
        }
    }
}

impl Default for HedgeConfig {
    fn default() -> Self {
        Self {
            net_delta_limit: default_net_delta_limit(),
            hedge_ratio: default_hedge_ratio(),
            max_shares_per_order: default_max_shares_per_order(),
            fee_per_share: default_fee_per_share(),
        }
    }
}

impl Default for SessionTimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            session_ticks: default_session_ticks(),
            ticks_per_year: default_ticks_per_year(),
        }
    }
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            checkpoints: default_checkpoints(),
            first_announcement_tokens: default_first_announcement_tokens(),
            weekly_token_index: default_weekly_token_index(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_reference_defaults() {
        let cfg: HedgeConfig = serde_json::from_str(r#"{"net_delta_limit": 2500.0}"#).unwrap();
        assert_eq!(cfg.net_delta_limit, 2500.0);
        assert_eq!(cfg.hedge_ratio, 0.7);
        assert_eq!(cfg.max_shares_per_order, 10_000);
    }

    #[test]
    fn test_checkpoints_surround_weekly_boundaries() {
        let vol = VolatilityConfig::default();
        for tick in [1, 2, 74, 75, 149, 150, 224, 225] {
            assert!(vol.is_checkpoint(tick), "tick {} should be a checkpoint", tick);
        }
        assert!(!vol.is_checkpoint(3));
        assert!(!vol.is_checkpoint(300));
    }
}
