//! Shared types and error definitions for the volatility bot.

pub mod error;
pub mod types;

pub use error::Error;
pub use types::*;
