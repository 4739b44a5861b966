//! Configuration loader: merges .env, config.toml and environment variables.

use common::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;

use rit_client::DEFAULT_BASE_URL;
use vol_strategy::config::{
    HedgeConfig, SessionTimingConfig, StrategyConfig, UniverseConfig, VolatilityConfig,
};

/// Top-level volatility bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolBotConfig {
    /// Case API key, sent as `X-API-Key`.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub universe: UniverseConfig,

    #[serde(default)]
    pub strategy: StrategyConfig,

    /// Delta-hedging limits.
    #[serde(default)]
    pub risk: HedgeConfig,

    #[serde(default)]
    pub timing: SessionTimingConfig,

    #[serde(default)]
    pub volatility: VolatilityConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

impl Default for VolBotConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            universe: UniverseConfig::default(),
            strategy: StrategyConfig::default(),
            risk: HedgeConfig::default(),
            timing: SessionTimingConfig::default(),
            volatility: VolatilityConfig::default(),
        }
    }
}

// ── Config loader ─────────────────────────────────────────────────────

/// Load bot configuration from environment and optional config file.
pub fn load_config(path: &Path) -> Result<VolBotConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Config file if present, defaults otherwise.
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        parse_config(&contents)?
    } else {
        tracing::debug!("{} not found, using defaults", path.display());
        VolBotConfig::default()
    };

    // 3. Override with environment variables (highest priority).
    if let Ok(key) = std::env::var("RIT_API_KEY") {
        config.api_key = key;
    }
    if let Ok(url) = std::env::var("RIT_API_BASE_URL") {
        if !url.trim().is_empty() {
            config.base_url = url;
        }
    }

    // 4. Validate.
    validate(&config)?;
    Ok(config)
}

fn parse_config(contents: &str) -> Result<VolBotConfig, Error> {
    toml::from_str(contents).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
}

fn validate(config: &VolBotConfig) -> Result<(), Error> {
    if config.api_key.trim().is_empty() {
        return Err(Error::Config(
            "RIT_API_KEY is required (set in .env or environment)".into(),
        ));
    }
    if config.universe.underlying.is_empty() {
        return Err(Error::Config("universe.underlying must not be empty".into()));
    }
    if config.universe.strikes.is_empty() {
        return Err(Error::Config("universe.strikes needs at least one strike".into()));
    }
    if config.universe.shares_per_contract <= 0 {
        return Err(Error::Config("universe.shares_per_contract must be positive".into()));
    }

    let s = &config.strategy;
    if s.entry_threshold <= 0.0 || s.exit_threshold <= 0.0 {
        return Err(Error::Config(format!(
            "strategy thresholds must be positive (entry={}, exit={})",
            s.entry_threshold, s.exit_threshold
        )));
    }
    if s.contracts_per_trade <= 0 {
        return Err(Error::Config("strategy.contracts_per_trade must be positive".into()));
    }
    if s.delta_bump <= 0.0 {
        return Err(Error::Config("strategy.delta_bump must be positive".into()));
    }

    let r = &config.risk;
    if r.net_delta_limit <= 0.0 {
        return Err(Error::Config("risk.net_delta_limit must be positive".into()));
    }
    if !(r.hedge_ratio > 0.0 && r.hedge_ratio <= 1.0) {
        return Err(Error::Config(format!(
            "risk.hedge_ratio must be in (0, 1], got {}",
            r.hedge_ratio
        )));
    }
    if r.max_shares_per_order <= 0 {
        return Err(Error::Config("risk.max_shares_per_order must be positive".into()));
    }
    if r.fee_per_share < 0.0 {
        return Err(Error::Config("risk.fee_per_share must not be negative".into()));
    }

    let t = &config.timing;
    if t.session_ticks == 0 || t.ticks_per_year <= 0.0 {
        return Err(Error::Config(
            "timing.session_ticks and timing.ticks_per_year must be positive".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config() -> VolBotConfig {
        VolBotConfig {
            api_key: "KEY".into(),
            ..VolBotConfig::default()
        }
    }

    #[test]
    fn test_defaults_are_valid_with_a_key() {
        assert!(validate(&make_config()).is_ok());
        assert!(matches!(validate(&VolBotConfig::default()), Err(Error::Config(_))));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let cfg = parse_config(
            r#"
            api_key = "abc"

            [risk]
            net_delta_limit = 2500.0

            [strategy]
            contracts_per_trade = 50
            "#,
        )
        .unwrap();

        assert_eq!(cfg.api_key, "abc");
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.risk.net_delta_limit, 2500.0);
        assert_eq!(cfg.risk.hedge_ratio, 0.7);
        assert_eq!(cfg.strategy.contracts_per_trade, 50);
        assert_eq!(cfg.strategy.entry_threshold, 0.04);
        assert_eq!(cfg.universe.strikes, vec![48, 49, 50, 51, 52]);
        assert_eq!(cfg.timing.session_ticks, 300);
    }

    #[test]
    fn test_malformed_file_is_a_config_error() {
        assert!(matches!(parse_config("risk = 5"), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_out_of_range_policy() {
        let mut cfg = make_config();
        cfg.risk.hedge_ratio = 1.5;
        assert!(validate(&cfg).is_err());

        let mut cfg = make_config();
        cfg.risk.hedge_ratio = 0.0;
        assert!(validate(&cfg).is_err());

        let mut cfg = make_config();
        cfg.universe.strikes.clear();
        assert!(validate(&cfg).is_err());

        let mut cfg = make_config();
        cfg.strategy.exit_threshold = 0.0;
        assert!(validate(&cfg).is_err());

        let mut cfg = make_config();
        cfg.risk.max_shares_per_order = 0;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_key = \"from-file\"\n\n[risk]\nmax_shares_per_order = 2500\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.risk.max_shares_per_order, 2500);
        assert!(!cfg.api_key.is_empty());
    }
}
