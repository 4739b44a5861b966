//! REST client for the trading-simulator case API.
//!
//! Covers: case status, securities snapshot, news feed, trader NLV and
//! market order submission. All methods are rate-limited and authenticated
//! with the `X-API-Key` header.

use common::{CaseInfo, Error, NewsItem, OrderAck, OrderIntent, Security, TraderInfo};
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::error::Error as StdError;
use tracing::{debug, info, warn};

use crate::rate_limit::RateLimiter;

pub const DEFAULT_BASE_URL: &str = "http://localhost:9999/v1";
const API_KEY_HEADER: &str = "X-API-Key";

const CASE_PATH: &str = "/case";
const SECURITIES_PATH: &str = "/securities";
const NEWS_PATH: &str = "/news";
const TRADER_PATH: &str = "/trader";
const ORDERS_PATH: &str = "/orders";

/// Only market orders are ever sent.
const ORDER_TYPE_MARKET: &str = "MARKET";

pub(crate) fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Pick the base URL: `RIT_API_BASE_URL` wins over the configured value,
/// which wins over the localhost default.
fn resolve_base_url(configured: &str) -> String {
    if let Ok(override_url) = std::env::var("RIT_API_BASE_URL") {
        let normalized = normalize_base_url(&override_url);
        if !normalized.is_empty() {
            info!("Using RIT_API_BASE_URL override: {}", normalized);
            return normalized;
        }
        warn!("Ignoring empty RIT_API_BASE_URL override");
    }

    let normalized = normalize_base_url(configured);
    if normalized.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        normalized
    }
}

fn format_reqwest_error(err: &reqwest::Error) -> String {
    // Keep chained causes so network failures (DNS/socket) are visible.
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !cause_msg.is_empty() && !message.contains(&cause_msg) {
            message.push_str(": ");
            message.push_str(&cause_msg);
        }
        source = cause.source();
    }

    message
}

pub(crate) fn summarize_response_body(raw: &str) -> String {
    const MAX_CHARS: usize = 800;
    let compact = raw.replace(['\n', '\r'], " ");
    if compact.chars().count() > MAX_CHARS {
        let truncated: String = compact.chars().take(MAX_CHARS).collect();
        format!("{}…", truncated)
    } else {
        compact
    }
}

/// Async REST client for the case API.
#[derive(Debug, Clone)]
pub struct RitRestClient {
    client: reqwest::Client,
    base_url: String,
    limiter: RateLimiter,
}

impl RitRestClient {
    /// Create a new REST client.
    ///
    /// * `base_url`: configured endpoint; `RIT_API_BASE_URL` overrides it.
    /// * `api_key`: sent as `X-API-Key` on every request.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| Error::Config(format!("API key is not a valid header value: {}", e)))?;
        headers.insert(API_KEY_HEADER, key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(2)
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Http(format_reqwest_error(&e)))?;

        Ok(Self {
            client,
            base_url: resolve_base_url(base_url),
            limiter: RateLimiter::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL helper.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and decode the JSON body; any non-200 is a `VenueApi` error.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        self.limiter.wait_read().await;

        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| Error::Http(format_reqwest_error(&e)))?;

        let status_code = resp.status().as_u16();
        if status_code != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::VenueApi {
                status: status_code,
                message: summarize_response_body(&body),
            });
        }

        let raw_body = resp
            .text()
            .await
            .map_err(|e| Error::Http(format_reqwest_error(&e)))?;
        serde_json::from_str(&raw_body).map_err(|e| {
            Error::Http(format!(
                "Error decoding {} response: {}; body={}",
                path,
                e,
                summarize_response_body(&raw_body)
            ))
        })
    }

    // ── Read endpoints ────────────────────────────────────────────────

    /// Current tick and case status.
    pub async fn get_case(&self) -> Result<CaseInfo, Error> {
        self.get_json(CASE_PATH).await
    }

    /// Snapshot of every security in the case.
    pub async fn get_securities(&self) -> Result<Vec<Security>, Error> {
        let securities: Vec<Security> = self.get_json(SECURITIES_PATH).await?;
        debug!("Fetched {} securities", securities.len());
        Ok(securities)
    }

    /// News feed, newest first.
    pub async fn get_news(&self) -> Result<Vec<NewsItem>, Error> {
        self.get_json(NEWS_PATH).await
    }

    /// Trader summary (net liquidation value).
    pub async fn get_trader(&self) -> Result<TraderInfo, Error> {
        self.get_json(TRADER_PATH).await
    }

    // ── Write endpoints ───────────────────────────────────────────────

    /// Submit a market order. The venue takes the order parameters as a
    /// query string, not a JSON body.
    pub async fn submit_order(&self, intent: &OrderIntent) -> Result<OrderAck, Error> {
        if intent.quantity <= 0 {
            return Err(Error::Other(format!(
                "Refusing non-positive order quantity {} for {}",
                intent.quantity, intent.ticker
            )));
        }

        self.limiter.wait_write().await;

        let quantity = intent.quantity.to_string();
        debug!(
            "Submitting order: {} {} x{} ({})",
            intent.action.as_str(),
            intent.ticker,
            intent.quantity,
            intent.reason,
        );

        let resp = self
            .client
            .post(self.url(ORDERS_PATH))
            .query(&[
                ("ticker", intent.ticker.as_str()),
                ("type", ORDER_TYPE_MARKET),
                ("quantity", quantity.as_str()),
                ("action", intent.action.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::Http(format_reqwest_error(&e)))?;

        let status_code = resp.status().as_u16();
        if status_code == 429 {
            warn!("Rate limited on order submission for {}", intent.ticker);
            return Err(Error::RateLimited {
                retry_after_ms: 1000,
            });
        }
        if status_code != 200 && status_code != 201 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::VenueApi {
                status: status_code,
                message: summarize_response_body(&body),
            });
        }

        // The ack is informational; an undecodable body still means the
        // venue accepted the order.
        let raw_body = resp.text().await.unwrap_or_default();
        let ack = serde_json::from_str::<OrderAck>(&raw_body).unwrap_or_else(|e| {
            debug!(
                "Undecodable order ack for {}: {}; body={}",
                intent.ticker,
                e,
                summarize_response_body(&raw_body)
            );
            OrderAck::default()
        });

        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url_strips_trailing_slashes() {
        assert_eq!(
            normalize_base_url("  http://localhost:9999/v1//  "),
            "http://localhost:9999/v1"
        );
        assert_eq!(normalize_base_url("   "), "");
    }

    #[test]
    fn test_summarize_response_body_truncates_long_bodies() {
        let long = "x".repeat(2_000);
        let summary = summarize_response_body(&long);
        assert!(summary.ends_with('…'));
        assert_eq!(summary.chars().count(), 801);

        assert_eq!(summarize_response_body("a\nb\rc"), "a b c");
    }

    #[test]
    fn test_client_rejects_unprintable_api_key() {
        let err = RitRestClient::new(DEFAULT_BASE_URL, "bad\nkey").unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[tokio::test]
    async fn test_submit_order_rejects_zero_quantity_before_network() {
        let client = RitRestClient::new("http://127.0.0.1:9", "KEY").unwrap();
        let intent = OrderIntent::market("RTM", common::Action::Buy, 0, "test".into());
        let err = client.submit_order(&intent).await.unwrap_err();
        assert!(err.to_string().contains("non-positive"));
    }
}
