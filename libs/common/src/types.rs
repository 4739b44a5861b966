//! Domain types shared across the bot.

use serde::{Deserialize, Serialize};

// ── Case / Session Types ──────────────────────────────────────────────

/// Status string the venue reports while the case is running.
pub const ACTIVE_STATUS: &str = "ACTIVE";

/// Case state as returned by GET /v1/case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseInfo {
    pub tick: u32,
    #[serde(default)]
    pub status: String,
}

impl CaseInfo {
    pub fn is_active(&self) -> bool {
        self.status == ACTIVE_STATUS
    }
}

/// Trader summary as returned by GET /v1/trader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderInfo {
    #[serde(default)]
    pub trader_id: String,
    /// Net liquidation value.
    pub nlv: f64,
}

// ── Security Types ────────────────────────────────────────────────────

/// Security class reported in the `type` field of a snapshot row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityType {
    Stock,
    Option,
    #[serde(other)]
    Other,
}

/// One row of GET /v1/securities. Only these fields are consumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Security {
    pub ticker: String,
    #[serde(rename = "type")]
    pub security_type: SecurityType,
    #[serde(default)]
    pub last: f64,
    #[serde(default)]
    pub bid: f64,
    #[serde(default)]
    pub ask: f64,
    /// Signed position (shares for stock, contracts for options).
    /// The venue serializes it as a float.
    #[serde(default)]
    pub position: f64,
    #[serde(default)]
    pub vwap: f64,
}

// ── News Types ────────────────────────────────────────────────────────

/// One entry of GET /v1/news (newest first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub news_id: i64,
    #[serde(default)]
    pub tick: u32,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub body: String,
}

// ── Order Types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
        }
    }
}

/// A market order the strategy wants placed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderIntent {
    pub ticker: String,
    pub action: Action,
    /// Shares for the underlying, contracts for options.
    pub quantity: i64,
    /// Reason for the trade (for logging).
    pub reason: String,
}

impl OrderIntent {
    pub fn market(ticker: impl Into<String>, action: Action, quantity: i64, reason: String) -> Self {
        Self {
            ticker: ticker.into(),
            action,
            quantity,
            reason,
        }
    }
}

/// Acknowledgement from POST /v1/orders. The venue returns more fields;
/// only the ones worth logging are kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderAck {
    #[serde(default)]
    pub order_id: Option<i64>,
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub quantity_filled: f64,
    #[serde(default)]
    pub vwap: Option<f64>,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_decodes_venue_row() {
        let raw = r#"{
            "ticker": "RTM50C", "type": "OPTION", "size": 1, "position": -90.0,
            "vwap": 1.31, "nlv": 0.0, "last": 1.29, "bid": 1.28, "ask": 1.30,
            "volume": 1200, "unrealized": 0.0, "realized": 0.0
        }"#;
        let sec: Security = serde_json::from_str(raw).unwrap();
        assert_eq!(sec.ticker, "RTM50C");
        assert_eq!(sec.security_type, SecurityType::Option);
        assert_eq!(sec.position, -90.0);
        assert!((sec.last - 1.29).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_security_type_maps_to_other() {
        let raw = r#"{"ticker": "IDX", "type": "INDEX", "last": 10.0}"#;
        let sec: Security = serde_json::from_str(raw).unwrap();
        assert_eq!(sec.security_type, SecurityType::Other);
        assert_eq!(sec.position, 0.0);
    }

    #[test]
    fn test_case_activity_flag() {
        let active: CaseInfo = serde_json::from_str(r#"{"tick": 12, "status": "ACTIVE"}"#).unwrap();
        let stopped: CaseInfo = serde_json::from_str(r#"{"tick": 0, "status": "STOPPED"}"#).unwrap();
        assert!(active.is_active());
        assert!(!stopped.is_active());
    }

    #[test]
    fn test_action_wire_format() {
        assert_eq!(serde_json::to_string(&Action::Buy).unwrap(), "\"BUY\"");
        assert_eq!(serde_json::to_string(&Action::Sell).unwrap(), "\"SELL\"");
        assert_eq!(Action::Sell.as_str(), "SELL");
    }
}
