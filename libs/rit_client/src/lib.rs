//! Trading-simulator API client library.
//!
//! Provides authenticated, rate-limited REST access to the case server.

pub mod rate_limit;
pub mod rest;

pub use rate_limit::RateLimiter;
pub use rest::{RitRestClient, DEFAULT_BASE_URL};
