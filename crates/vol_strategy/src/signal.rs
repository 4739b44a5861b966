//! Per-option Flat/Long/Short state machine.
//!
//! Entry needs a mispricing of at least `entry_threshold` against the
//! target; exit fires at full convergence or inside the `exit_threshold`
//! band. The underlying is never traded here.

use common::{Action, OrderIntent};
use tracing::info;

use crate::config::StrategyConfig;
use crate::ledger::{InstrumentLedger, PositionState};

/// A state change plus the order that realizes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: PositionState,
    pub action: Action,
}

pub struct SignalEngine {
    config: StrategyConfig,
}

impl SignalEngine {
    pub fn new(config: StrategyConfig) -> Self {
        Self { config }
    }

    /// Decide the transition for one instrument, if any.
    pub fn decide(&self, state: PositionState, market: f64, target: f64) -> Option<Transition> {
        let gap = (market - target).abs();

        match state {
            PositionState::Flat if gap >= self.config.entry_threshold => {
                if market < target {
                    Some(Transition {
                        next: PositionState::Long,
                        action: Action::Buy,
                    })
                } else {
                    Some(Transition {
                        next: PositionState::Short,
                        action: Action::Sell,
                    })
                }
            }
            PositionState::Flat => None,
            PositionState::Long if market >= target || gap <= self.config.exit_threshold => {
                Some(Transition {
                    next: PositionState::Flat,
                    action: Action::Sell,
                })
            }
            PositionState::Short if market <= target || gap <= self.config.exit_threshold => {
                Some(Transition {
                    next: PositionState::Flat,
                    action: Action::Buy,
                })
            }
            PositionState::Long | PositionState::Short => None,
        }
    }

    /// Run the state machine over every option; at most one intent per
    /// instrument. State moves as soon as the intent is emitted.
    pub fn evaluate(&self, ledger: &mut InstrumentLedger) -> Vec<OrderIntent> {
        let mut intents = Vec::new();

        for entry in ledger.options_mut() {
            let market = entry.quote.last;
            let target = entry.target;

            let Some(transition) = self.decide(entry.state, market, target) else {
                continue;
            };

            let verb = match (entry.state, transition.next) {
                (PositionState::Flat, PositionState::Long) => "Opened long",
                (PositionState::Flat, PositionState::Short) => "Opened short",
                (PositionState::Long, _) => "Closed long",
                _ => "Closed short",
            };
            info!(
                "{} {} at {:.4} with target {:.4}",
                verb, entry.instrument.ticker, market, target
            );

            intents.push(OrderIntent::market(
                entry.instrument.ticker.clone(),
                transition.action,
                self.config.contracts_per_trade,
                format!("{} (market={:.4} target={:.4})", verb, market, target),
            ));
            entry.transition(transition.next);
        }

        intents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UniverseConfig;

    fn engine() -> SignalEngine {
        SignalEngine::new(StrategyConfig::default())
    }

    fn ledger_with(ticker: &str, state: PositionState, market: f64, target: f64) -> InstrumentLedger {
        let mut ledger = InstrumentLedger::from_universe(&UniverseConfig::default());
        for entry in ledger.options_mut() {
            // Park everything else in the no-action zone.
            entry.quote.last = 1.0;
            entry.target = 1.0;
            if entry.instrument.ticker == ticker {
                entry.state = state;
                entry.quote.last = market;
                entry.target = target;
            }
        }
        ledger
    }

    #[test]
    fn test_flat_entry_is_total_and_sign_driven() {
        let eng = engine();
        for (market, target) in [(1.00, 1.04), (1.00, 1.50), (0.50, 0.10), (1.30, 1.20)] {
            let t = eng.decide(PositionState::Flat, market, target).unwrap();
            if market < target {
                assert_eq!(t, Transition { next: PositionState::Long, action: Action::Buy });
            } else {
                assert_eq!(t, Transition { next: PositionState::Short, action: Action::Sell });
            }
        }
    }

    #[test]
    fn test_flat_inside_entry_band_does_nothing() {
        let eng = engine();
        for (market, target) in [(1.00, 1.00), (1.00, 1.039), (1.039, 1.00), (0.0, 0.0)] {
            assert!(eng.decide(PositionState::Flat, market, target).is_none());
        }
    }

    #[test]
    fn test_long_exits_on_convergence_or_band() {
        let eng = engine();
        let close = Some(Transition { next: PositionState::Flat, action: Action::Sell });
        assert_eq!(eng.decide(PositionState::Long, 1.20, 1.10), close);
        assert_eq!(eng.decide(PositionState::Long, 1.10, 1.10), close);
        assert_eq!(eng.decide(PositionState::Long, 1.095, 1.10), close);
        assert_eq!(eng.decide(PositionState::Long, 1.00, 1.10), None);
    }

    #[test]
    fn test_short_exits_on_convergence_or_band() {
        let eng = engine();
        let close = Some(Transition { next: PositionState::Flat, action: Action::Buy });
        assert_eq!(eng.decide(PositionState::Short, 1.00, 1.10), close);
        assert_eq!(eng.decide(PositionState::Short, 1.105, 1.10), close);
        assert_eq!(eng.decide(PositionState::Short, 1.20, 1.10), None);
    }

    #[test]
    fn test_never_flips_long_to_short() {
        let eng = engine();
        for (market, target) in [(5.0, 1.0), (0.1, 1.0), (1.0, 1.0)] {
            for state in [PositionState::Long, PositionState::Short] {
                if let Some(t) = eng.decide(state, market, target) {
                    assert_eq!(t.next, PositionState::Flat);
                }
            }
        }
    }

    #[test]
    fn test_overpriced_call_opens_short() {
        // Target ~1.22 from the pricing model; market trades at 1.30.
        let mut ledger = ledger_with("RTM50C", PositionState::Flat, 1.30, 1.2213);
        let intents = engine().evaluate(&mut ledger);

        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].ticker, "RTM50C");
        assert_eq!(intents[0].action, Action::Sell);
        assert_eq!(intents[0].quantity, 90);
        assert_eq!(ledger.by_ticker("RTM50C").unwrap().state, PositionState::Short);
    }

    #[test]
    fn test_long_closes_inside_exit_band() {
        let mut ledger = ledger_with("RTM49P", PositionState::Long, 1.095, 1.10);
        let intents = engine().evaluate(&mut ledger);

        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].action, Action::Sell);
        assert_eq!(intents[0].quantity, 90);
        assert_eq!(ledger.by_ticker("RTM49P").unwrap().state, PositionState::Flat);
    }

    #[test]
    fn test_underlying_is_never_signalled() {
        let mut ledger = ledger_with("RTM50C", PositionState::Flat, 1.0, 1.0);
        let intents = engine().evaluate(&mut ledger);
        assert!(intents.is_empty());
        assert!(intents.iter().all(|i| i.ticker != "RTM"));
    }
}
