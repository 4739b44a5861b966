//! Portfolio delta hedging on the underlying.
//!
//! Net delta is rebuilt from scratch every tick from the ledger, so a hedge
//! order that silently fails is corrected on the next pass.

use common::{Action, OrderIntent};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::HedgeConfig;
use crate::ledger::InstrumentLedger;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HedgeAction {
    None,
    /// Partial neutralization of an over-limit net delta.
    Neutralize { action: Action, quantity: i64 },
    /// Flatten an existing underlying position at a profit.
    Unwind {
        action: Action,
        quantity: i64,
        profit_per_share: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HedgeDecision {
    /// Shares-equivalent exposure, options plus the underlying position.
    pub net_delta: f64,
    pub action: HedgeAction,
    pub intents: Vec<OrderIntent>,
}

impl HedgeDecision {
    pub fn is_noop(&self) -> bool {
        self.intents.is_empty()
    }
}

pub struct RiskHedger {
    config: HedgeConfig,
    contracts_per_trade: i64,
    shares_per_contract: i64,
}

impl RiskHedger {
    pub fn new(config: HedgeConfig, contracts_per_trade: i64, shares_per_contract: i64) -> Self {
        Self {
            config,
            contracts_per_trade,
            shares_per_contract,
        }
    }

    /// Σ sign × delta × contracts × shares over options, plus the
    /// underlying's own signed share position.
    pub fn net_delta(&self, ledger: &InstrumentLedger) -> f64 {
        let per_position = (self.contracts_per_trade * self.shares_per_contract) as f64;

        let options: f64 = ledger
            .options()
            .iter()
            .map(|s| s.state.sign() as f64 * s.delta * per_position)
            .sum();

        options + ledger.underlying().quote.position as f64
    }

    pub fn evaluate(&self, ledger: &InstrumentLedger) -> HedgeDecision {
        let net_delta = self.net_delta(ledger);
        let underlying = ledger.underlying();
        let ticker = &underlying.instrument.ticker;
        let limit = self.config.net_delta_limit;

        if net_delta.abs() > limit {
            let quantity = (self.config.hedge_ratio * net_delta.abs()).floor() as i64;
            let action = if net_delta > 0.0 { Action::Sell } else { Action::Buy };

            info!(
                "Delta hedge: net delta {:.0} over limit {:.0}, {} {} shares",
                net_delta,
                limit,
                action.as_str(),
                quantity
            );
            let reason = format!("neutralize net delta {:.0}", net_delta);
            return HedgeDecision {
                net_delta,
                action: HedgeAction::Neutralize { action, quantity },
                intents: self.chunk(ticker, action, quantity, &reason),
            };
        }

        let position = underlying.quote.position;
        let market = underlying.quote.last;
        let vwap = underlying.quote.vwap;

        // Per-share gain from closing the current underlying position.
        let (action, profit_per_share) = if position > 0 {
            (Action::Sell, market - vwap)
        } else if position < 0 {
            (Action::Buy, vwap - market)
        } else {
            return self.no_action(net_delta);
        };

        // Fee is per share, not scaled by position size.
        if profit_per_share <= self.config.fee_per_share {
            debug!(
                "Hedge unwind not profitable: {:.4}/share vs fee {:.4}",
                profit_per_share, self.config.fee_per_share
            );
            return self.no_action(net_delta);
        }

        // Exposure once the underlying position is gone.
        let residual = net_delta - position as f64;
        if residual.abs() >= limit {
            debug!(
                "Hedge unwind skipped: residual delta {:.0} not inside limit {:.0}",
                residual, limit
            );
            return self.no_action(net_delta);
        }

        let quantity = position.abs();
        info!(
            "Delta hedge: {} {} shares for {:.4} profit per share",
            action.as_str(),
            quantity,
            profit_per_share
        );
        let reason = format!("unwind hedge at {:.4}/share", profit_per_share);
        HedgeDecision {
            net_delta,
            action: HedgeAction::Unwind {
                action,
                quantity,
                profit_per_share,
            },
            intents: self.chunk(ticker, action, quantity, &reason),
        }
    }

    fn no_action(&self, net_delta: f64) -> HedgeDecision {
        HedgeDecision {
            net_delta,
            action: HedgeAction::None,
            intents: Vec::new(),
        }
    }

    /// Full-size orders at the per-order cap, then one remainder order.
    fn chunk(&self, ticker: &str, action: Action, quantity: i64, reason: &str) -> Vec<OrderIntent> {
        let cap = self.config.max_shares_per_order.max(1);
        let mut remaining = quantity;
        let mut intents = Vec::with_capacity((quantity / cap + 1) as usize);

        while remaining > cap {
            intents.push(OrderIntent::market(ticker, action, cap, reason.to_string()));
            remaining -= cap;
        }
        if remaining > 0 {
            intents.push(OrderIntent::market(ticker, action, remaining, reason.to_string()));
        }
        intents
    }
}
