//! Unified error type for the volatility bot.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Venue API error (status={status}): {message}")]
    VenueApi { status: u16, message: String },

    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Tracked instrument missing from snapshot: {0}")]
    MissingInstrument(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the failure is plausibly transient (network hiccup, throttling,
    /// venue-side 5xx). Callers still decide the policy; market-data reads
    /// abort the session regardless.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimited { .. } => true,
            Error::VenueApi { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
