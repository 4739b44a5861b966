//! One tick of strategy work, independent of the network.
//!
//! Order per tick: snapshot → σ (checkpoints only) → fair value, delta and
//! target for every option → signals → hedge. The caller fetches data and
//! routes the resulting intents.

use common::{Error, NewsItem, OrderIntent, Security};
use tracing::debug;

use crate::config::{HedgeConfig, SessionTimingConfig, StrategyConfig, UniverseConfig, VolatilityConfig};
use crate::hedger::{HedgeDecision, RiskHedger};
use crate::ledger::PortfolioState;
use crate::pricing;
use crate::signal::SignalEngine;
use crate::volatility::{parse_latest, VolatilityParse};

/// What happened during one tick.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub tick: u32,
    /// Present when the news feed was consulted this tick.
    pub volatility: Option<VolatilityParse>,
    /// σ took a new value this tick.
    pub sigma_changed: bool,
    pub sigma: Option<f64>,
    pub signal_intents: Vec<OrderIntent>,
    pub hedge: HedgeDecision,
}

impl TickReport {
    /// Signal orders first, then hedge orders.
    pub fn intents(&self) -> impl Iterator<Item = &OrderIntent> {
        self.signal_intents.iter().chain(self.hedge.intents.iter())
    }

    pub fn order_count(&self) -> usize {
        self.signal_intents.len() + self.hedge.intents.len()
    }
}

pub struct TickProcessor {
    strategy: StrategyConfig,
    timing: SessionTimingConfig,
    volatility: VolatilityConfig,
    state: PortfolioState,
    signal: SignalEngine,
    hedger: RiskHedger,
}

impl TickProcessor {
    pub fn new(
        universe: &UniverseConfig,
        strategy: StrategyConfig,
        hedge: HedgeConfig,
        timing: SessionTimingConfig,
        volatility: VolatilityConfig,
    ) -> Self {
        let hedger = RiskHedger::new(
            hedge,
            strategy.contracts_per_trade,
            universe.shares_per_contract,
        );
        Self {
            signal: SignalEngine::new(strategy.clone()),
            strategy,
            timing,
            volatility,
            state: PortfolioState::new(universe),
            hedger,
        }
    }

    pub fn state(&self) -> &PortfolioState {
        &self.state
    }

    /// Whether the news feed should be read on this tick.
    pub fn needs_announcement(&self, tick: u32) -> bool {
        self.volatility.is_checkpoint(tick)
    }

    /// Run one tick.
    ///
    /// `news` is the feed, newest first. It is only read on checkpoint
    /// ticks; on any other tick it is ignored and σ stays as it was. A
    /// snapshot missing a tracked ticker fails the tick without touching
    /// any state.
    pub fn process(
        &mut self,
        tick: u32,
        securities: &[Security],
        news: Option<&[NewsItem]>,
    ) -> Result<TickReport, Error> {
        self.state.ledger.apply_snapshot(securities)?;

        let checkpoint = self.volatility.is_checkpoint(tick);
        if news.is_some() && !checkpoint {
            debug!("Tick {}: not a volatility checkpoint, ignoring news", tick);
        }

        let mut sigma_changed = false;
        let volatility = news.filter(|_| checkpoint).map(|items| {
            let parse = parse_latest(items, &self.volatility);
            sigma_changed = self.state.volatility.apply(&parse);
            parse
        });

        let sigma = self.state.volatility.sigma();
        let signal_intents = match sigma {
            Some(sigma) => {
                self.reprice(tick, sigma);
                self.signal.evaluate(&mut self.state.ledger)
            }
            None => {
                debug!("Tick {}: volatility not yet known, skipping signals", tick);
                Vec::new()
            }
        };

        let hedge = self.hedger.evaluate(&self.state.ledger);

        Ok(TickReport {
            tick,
            volatility,
            sigma_changed,
            sigma,
            signal_intents,
            hedge,
        })
    }

    /// Refresh fair value, delta and target for every option.
    fn reprice(&mut self, tick: u32, sigma: f64) {
        let spot = self.state.ledger.underlying().quote.last;
        let time = pricing::time_to_expiry(tick, self.timing.session_ticks, self.timing.ticks_per_year);
        let rate = self.strategy.risk_free_rate;
        let bump = self.strategy.delta_bump;

        for entry in self.state.ledger.options_mut() {
            let (Some(strike), Some(kind)) = (entry.instrument.strike, entry.instrument.kind.option_kind())
            else {
                continue;
            };
            let fv = pricing::fair_value(spot, strike, rate, sigma, time, kind);
            entry.delta = pricing::delta(spot, strike, rate, sigma, time, kind, bump);
            entry.refresh_target(fv);
        }
    }
}
