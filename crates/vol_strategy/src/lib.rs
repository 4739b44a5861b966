//! Volatility-arbitrage strategy: option pricing, volatility announcements,
//! the per-option signal machine and portfolio delta hedging.

pub mod config;
pub mod exec;
pub mod hedger;
pub mod ledger;
pub mod pricing;
pub mod session;
pub mod signal;
pub mod volatility;

pub use config::{HedgeConfig, SessionTimingConfig, StrategyConfig, UniverseConfig, VolatilityConfig};
pub use exec::{ExecutionOutcome, ExecutionReport, OrderRouter};
pub use hedger::{HedgeAction, HedgeDecision, RiskHedger};
pub use ledger::{InstrumentLedger, PortfolioState, PositionState};
pub use session::{TickProcessor, TickReport};
pub use volatility::VolatilityParse;
