//! Instrument ledger: the fixed, typed registry of live instrument state.
//!
//! Built once from the universe config (one underlying plus a call and a put
//! per strike). Each tick the venue snapshot replaces every quote; the
//! strategy owns position state, targets and deltas.

use std::collections::HashMap;

use common::{Error, Security};
use tracing::debug;

use crate::config::UniverseConfig;
use crate::pricing::OptionKind;
use crate::volatility::VolatilityEstimate;

// ── Identity ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentId {
    Underlying,
    Option { strike: u32, kind: OptionKind },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentKind {
    Underlying,
    Call,
    Put,
}

impl InstrumentKind {
    pub fn option_kind(self) -> Option<OptionKind> {
        match self {
            InstrumentKind::Underlying => None,
            InstrumentKind::Call => Some(OptionKind::Call),
            InstrumentKind::Put => Some(OptionKind::Put),
        }
    }
}

/// Immutable identity of a tracked instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub id: InstrumentId,
    pub ticker: String,
    pub kind: InstrumentKind,
    /// Options only.
    pub strike: Option<f64>,
    /// Shares per contract, options only.
    pub multiplier: Option<i64>,
}

impl Instrument {
    pub fn underlying(ticker: &str) -> Self {
        Self {
            id: InstrumentId::Underlying,
            ticker: ticker.to_string(),
            kind: InstrumentKind::Underlying,
            strike: None,
            multiplier: None,
        }
    }

    pub fn option(underlying: &str, strike: u32, kind: OptionKind, multiplier: i64) -> Self {
        Self {
            id: InstrumentId::Option { strike, kind },
            ticker: format!("{}{}{}", underlying, strike, kind.suffix()),
            kind: match kind {
                OptionKind::Call => InstrumentKind::Call,
                OptionKind::Put => InstrumentKind::Put,
            },
            strike: Some(f64::from(strike)),
            multiplier: Some(multiplier),
        }
    }
}

// ── Mutable State ─────────────────────────────────────────────────────

/// Latest venue view of one instrument.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quote {
    pub last: f64,
    pub bid: f64,
    pub ask: f64,
    pub vwap: f64,
    /// Signed: shares for the underlying, contracts for options.
    pub position: i64,
}

impl From<&Security> for Quote {
    fn from(sec: &Security) -> Self {
        Self {
            last: sec.last,
            bid: sec.bid,
            ask: sec.ask,
            vwap: sec.vwap,
            position: sec.position.round() as i64,
        }
    }
}

/// Strategy-side position on an option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PositionState {
    #[default]
    Flat,
    Long,
    Short,
}

impl PositionState {
    /// +1 long, −1 short, 0 flat.
    pub fn sign(self) -> i64 {
        match self {
            PositionState::Flat => 0,
            PositionState::Long => 1,
            PositionState::Short => -1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InstrumentState {
    pub instrument: Instrument,
    pub quote: Quote,
    pub state: PositionState,
    /// Fair-value reference for exits. Ratchets while a position is open.
    pub target: f64,
    pub delta: f64,
}

impl InstrumentState {
    pub fn new(instrument: Instrument) -> Self {
        Self {
            instrument,
            quote: Quote::default(),
            state: PositionState::Flat,
            target: 0.0,
            delta: 0.0,
        }
    }

    /// Fold a fresh fair value into the target: long positions only raise
    /// it, short positions only lower it, flat takes it as-is.
    pub fn refresh_target(&mut self, fair_value: f64) {
        self.target = match self.state {
            PositionState::Flat => fair_value,
            PositionState::Long => self.target.max(fair_value),
            PositionState::Short => self.target.min(fair_value),
        };
    }

    /// Move to a new position state. Long↔Short must pass through Flat.
    pub fn transition(&mut self, next: PositionState) {
        debug_assert!(
            !matches!(
                (self.state, next),
                (PositionState::Long, PositionState::Short)
                    | (PositionState::Short, PositionState::Long)
            ),
            "{}: {:?} -> {:?} skips Flat",
            self.instrument.ticker,
            self.state,
            next
        );
        self.state = next;
    }
}

// ── Ledger ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct InstrumentLedger {
    underlying: InstrumentState,
    /// Strike ascending, call before put.
    options: Vec<InstrumentState>,
    by_ticker: HashMap<String, InstrumentId>,
}

impl InstrumentLedger {
    pub fn from_universe(universe: &UniverseConfig) -> Self {
        let underlying = InstrumentState::new(Instrument::underlying(&universe.underlying));

        let mut strikes = universe.strikes.clone();
        strikes.sort_unstable();
        strikes.dedup();

        let options: Vec<InstrumentState> = strikes
            .iter()
            .flat_map(|&strike| {
                [OptionKind::Call, OptionKind::Put].map(|kind| {
                    InstrumentState::new(Instrument::option(
                        &universe.underlying,
                        strike,
                        kind,
                        universe.shares_per_contract,
                    ))
                })
            })
            .collect();

        let by_ticker = std::iter::once(&underlying)
            .chain(options.iter())
            .map(|s| (s.instrument.ticker.clone(), s.instrument.id))
            .collect();

        Self {
            underlying,
            options,
            by_ticker,
        }
    }

    pub fn instrument_count(&self) -> usize {
        1 + self.options.len()
    }

    pub fn underlying(&self) -> &InstrumentState {
        &self.underlying
    }

    pub fn options(&self) -> &[InstrumentState] {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut [InstrumentState] {
        &mut self.options
    }

    pub fn id_of(&self, ticker: &str) -> Option<InstrumentId> {
        self.by_ticker.get(ticker).copied()
    }

    pub fn get(&self, id: InstrumentId) -> Option<&InstrumentState> {
        match id {
            InstrumentId::Underlying => Some(&self.underlying),
            _ => self.options.iter().find(|s| s.instrument.id == id),
        }
    }

    pub fn get_mut(&mut self, id: InstrumentId) -> Option<&mut InstrumentState> {
        match id {
            InstrumentId::Underlying => Some(&mut self.underlying),
            _ => self.options.iter_mut().find(|s| s.instrument.id == id),
        }
    }

    pub fn by_ticker(&self, ticker: &str) -> Option<&InstrumentState> {
        self.id_of(ticker).and_then(|id| self.get(id))
    }

    /// Replace every tracked quote from a venue snapshot.
    ///
    /// Untracked tickers are ignored. A tracked ticker missing from the
    /// snapshot is an error and leaves the ledger untouched.
    pub fn apply_snapshot(&mut self, securities: &[Security]) -> Result<(), Error> {
        let mut fresh: HashMap<InstrumentId, Quote> = HashMap::with_capacity(self.instrument_count());
        for sec in securities {
            match self.id_of(&sec.ticker) {
                Some(id) => {
                    fresh.insert(id, Quote::from(sec));
                }
                None => debug!("{}: not in universe, ignoring", sec.ticker),
            }
        }

        if let Some(missing) = std::iter::once(&self.underlying)
            .chain(self.options.iter())
            .find(|s| !fresh.contains_key(&s.instrument.id))
        {
            return Err(Error::MissingInstrument(missing.instrument.ticker.clone()));
        }

        for (id, quote) in fresh {
            if let Some(entry) = self.get_mut(id) {
                entry.quote = quote;
            }
        }
        Ok(())
    }
}

/// Everything the strategy mutates across ticks: the ledger plus σ.
#[derive(Debug, Clone)]
pub struct PortfolioState {
    pub ledger: InstrumentLedger,
    pub volatility: VolatilityEstimate,
}

impl PortfolioState {
    pub fn new(universe: &UniverseConfig) -> Self {
        Self {
            ledger: InstrumentLedger::from_universe(universe),
            volatility: VolatilityEstimate::uninitialized(),
        }
    }

    /// Options currently held (long or short).
    pub fn open_positions(&self) -> usize {
        self.ledger
            .options()
            .iter()
            .filter(|s| s.state != PositionState::Flat)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use common::SecurityType;

    use super::*;

    fn make_security(ticker: &str, last: f64, position: f64) -> Security {
        Security {
            ticker: ticker.into(),
            security_type: if ticker == "RTM" {
                SecurityType::Stock
            } else {
                SecurityType::Option
            },
            last,
            bid: last - 0.01,
            ask: last + 0.01,
            position,
            vwap: last,
        }
    }

    fn full_snapshot(ledger: &InstrumentLedger) -> Vec<Security> {
        std::iter::once(ledger.underlying())
            .chain(ledger.options().iter())
            .map(|s| make_security(&s.instrument.ticker, 1.0, 0.0))
            .collect()
    }

    #[test]
    fn test_reference_universe_has_eleven_instruments() {
        let ledger = InstrumentLedger::from_universe(&UniverseConfig::default());
        assert_eq!(ledger.instrument_count(), 11);
        assert_eq!(ledger.underlying().instrument.ticker, "RTM");

        let tickers: Vec<&str> = ledger
            .options()
            .iter()
            .map(|s| s.instrument.ticker.as_str())
            .collect();
        assert_eq!(tickers[0], "RTM48C");
        assert_eq!(tickers[1], "RTM48P");
        assert_eq!(tickers[9], "RTM52P");

        let c50 = ledger.by_ticker("RTM50C").unwrap();
        assert_eq!(c50.instrument.strike, Some(50.0));
        assert_eq!(c50.instrument.multiplier, Some(100));
        assert_eq!(c50.instrument.kind, InstrumentKind::Call);
    }

    #[test]
    fn test_ratchet_long_never_decreases() {
        let mut entry = InstrumentState::new(Instrument::option("RTM", 50, OptionKind::Call, 100));
        entry.refresh_target(1.10);
        entry.transition(PositionState::Long);

        let mut previous = entry.target;
        for fv in [1.05, 1.12, 0.90, 1.11, 1.30, 1.00] {
            entry.refresh_target(fv);
            assert!(entry.target >= previous, "{} < {}", entry.target, previous);
            previous = entry.target;
        }
        assert_eq!(entry.target, 1.30);
    }

    #[test]
    fn test_ratchet_short_never_increases() {
        let mut entry = InstrumentState::new(Instrument::option("RTM", 49, OptionKind::Put, 100));
        entry.refresh_target(0.80);
        entry.transition(PositionState::Short);

        let mut previous = entry.target;
        for fv in [0.85, 0.70, 0.95, 0.60, 0.61] {
            entry.refresh_target(fv);
            assert!(entry.target <= previous, "{} > {}", entry.target, previous);
            previous = entry.target;
        }
        assert_eq!(entry.target, 0.60);
    }

    #[test]
    fn test_flat_target_follows_fair_value() {
        let mut entry = InstrumentState::new(Instrument::option("RTM", 51, OptionKind::Call, 100));
        for fv in [1.0, 0.5, 2.0] {
            entry.refresh_target(fv);
            assert_eq!(entry.target, fv);
        }
    }

    #[test]
    fn test_apply_snapshot_replaces_quotes_and_ignores_strangers() {
        let mut ledger = InstrumentLedger::from_universe(&UniverseConfig::default());
        let mut snapshot = full_snapshot(&ledger);
        snapshot.push(make_security("OTHER", 9.0, 5.0));
        snapshot[0] = make_security("RTM", 50.25, -1200.0);

        ledger.apply_snapshot(&snapshot).unwrap();
        assert_eq!(ledger.underlying().quote.last, 50.25);
        assert_eq!(ledger.underlying().quote.position, -1200);
        assert!(ledger.by_ticker("OTHER").is_none());
    }

    #[test]
    fn test_apply_snapshot_missing_instrument_is_error() {
        let mut ledger = InstrumentLedger::from_universe(&UniverseConfig::default());
        let mut snapshot = full_snapshot(&ledger);
        snapshot.retain(|s| s.ticker != "RTM51P");

        let err = ledger.apply_snapshot(&snapshot).unwrap_err();
        assert!(err.to_string().contains("RTM51P"));
        assert_eq!(ledger.underlying().quote, Quote::default());
    }
}
