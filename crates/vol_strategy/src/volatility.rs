//! Realized-volatility estimator.
//!
//! The case announces each week's realized volatility in the news feed as
//! free text. Two layouts exist: the opening announcement (identified by its
//! token count) ends with the percentage, e.g. `... will be 20%`; weekly
//! updates carry it at a fixed token offset with two trailing decoration
//! characters, e.g. `25%,`.

use common::NewsItem;
use tracing::{debug, info, warn};

use crate::config::VolatilityConfig;

/// Outcome of parsing one announcement.
#[derive(Debug, Clone, PartialEq)]
pub enum VolatilityParse {
    /// Annualized volatility as a fraction (0.2 = 20%). Always finite and > 0.
    Parsed(f64),
    Failed(String),
}

/// Parse the realized volatility out of an announcement body.
pub fn parse_realized_volatility(text: &str, format: &VolatilityConfig) -> VolatilityParse {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    let (token, decoration) = if tokens.len() == format.first_announcement_tokens {
        match tokens.last() {
            Some(t) => (*t, 1),
            None => return VolatilityParse::Failed("empty announcement".into()),
        }
    } else {
        match tokens.get(format.weekly_token_index) {
            Some(t) => (*t, 2),
            None => {
                return VolatilityParse::Failed(format!(
                    "announcement has {} tokens, need index {}",
                    tokens.len(),
                    format.weekly_token_index
                ))
            }
        }
    };

    let Some(number) = strip_trailing_chars(token, decoration) else {
        return VolatilityParse::Failed(format!("token {:?} too short", token));
    };

    match number.parse::<f64>() {
        Ok(pct) if pct.is_finite() && pct > 0.0 => VolatilityParse::Parsed(pct / 100.0),
        Ok(pct) => VolatilityParse::Failed(format!("unusable percentage {}", pct)),
        Err(e) => VolatilityParse::Failed(format!("token {:?}: {}", token, e)),
    }
}

/// Parse the newest entry of a newest-first news feed.
pub fn parse_latest(news: &[NewsItem], format: &VolatilityConfig) -> VolatilityParse {
    match news.first() {
        Some(item) => parse_realized_volatility(&item.body, format),
        None => VolatilityParse::Failed("no announcements".into()),
    }
}

/// Drop `n` trailing characters; `None` if nothing would remain.
fn strip_trailing_chars(token: &str, n: usize) -> Option<&str> {
    let (cut, _) = token.char_indices().rev().nth(n.checked_sub(1)?)?;
    (cut > 0).then(|| &token[..cut])
}

/// Process-wide σ. Unusable until the first successful parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct VolatilityEstimate {
    sigma: Option<f64>,
}

impl VolatilityEstimate {
    pub fn uninitialized() -> Self {
        Self::default()
    }

    pub fn sigma(&self) -> Option<f64> {
        self.sigma
    }

    /// Fold a parse result in. Returns true only when σ took a new value;
    /// a failed parse or a repeat of the current value changes nothing.
    pub fn apply(&mut self, parse: &VolatilityParse) -> bool {
        match parse {
            VolatilityParse::Parsed(sigma) if self.sigma == Some(*sigma) => {
                debug!("Realized volatility unchanged at {:.2}%", sigma * 100.0);
                false
            }
            VolatilityParse::Parsed(sigma) => {
                info!("Realized volatility for this week: {:.2}%", sigma * 100.0);
                self.sigma = Some(*sigma);
                true
            }
            VolatilityParse::Failed(reason) => {
                warn!(
                    "Volatility announcement not usable ({}); keeping sigma={:?}",
                    reason, self.sigma
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 16 tokens, percentage last.
    const OPENING: &str = "The realized volatility of RTM for the week \
                           of this heat is expected to be 20%";
    // Percentage at index 29 with two trailing characters.
    const WEEKLY: &str = "News update for week two of the case: the realized \
                          volatility of RTM over the previous week was in line \
                          with forecasts and for next week it will be 25%, \
                          according to the desk";

    fn make_news(bodies: &[&str]) -> Vec<NewsItem> {
        bodies
            .iter()
            .enumerate()
            .map(|(i, body)| NewsItem {
                news_id: (bodies.len() - i) as i64,
                tick: 0,
                headline: "Volatility".into(),
                body: body.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_fixture_shapes() {
        assert_eq!(OPENING.split_whitespace().count(), 16);
        assert_eq!(WEEKLY.split_whitespace().nth(29), Some("25%,"));
    }

    #[test]
    fn test_parse_opening_announcement() {
        let cfg = VolatilityConfig::default();
        assert_eq!(parse_realized_volatility(OPENING, &cfg), VolatilityParse::Parsed(0.20));
    }

    #[test]
    fn test_parse_weekly_announcement() {
        let cfg = VolatilityConfig::default();
        assert_eq!(parse_realized_volatility(WEEKLY, &cfg), VolatilityParse::Parsed(0.25));
    }

    #[test]
    fn test_malformed_announcements_fail() {
        let cfg = VolatilityConfig::default();
        for text in [
            "",
            "short text",
            "The realized volatility of RTM for the week of this heat is expected to be high",
            "The realized volatility of RTM for the week of this heat is expected to be %",
            "The realized volatility of RTM for the week of this heat is expected to be 0%",
        ] {
            assert!(
                matches!(parse_realized_volatility(text, &cfg), VolatilityParse::Failed(_)),
                "{:?} should fail",
                text
            );
        }
    }

    #[test]
    fn test_parse_latest_reads_newest_entry_only() {
        let cfg = VolatilityConfig::default();
        let news = make_news(&[WEEKLY, OPENING]);
        assert_eq!(parse_latest(&news, &cfg), VolatilityParse::Parsed(0.25));
        assert!(matches!(parse_latest(&[], &cfg), VolatilityParse::Failed(_)));
    }

    #[test]
    fn test_failed_parse_keeps_previous_sigma() {
        let mut est = VolatilityEstimate::uninitialized();
        assert!(!est.apply(&VolatilityParse::Failed("boom".into())));
        assert_eq!(est.sigma(), None);

        assert!(est.apply(&VolatilityParse::Parsed(0.2)));
        assert!(!est.apply(&VolatilityParse::Failed("stale".into())));
        assert_eq!(est.sigma(), Some(0.2));

        assert!(est.apply(&VolatilityParse::Parsed(0.3)));
        assert_eq!(est.sigma(), Some(0.3));
    }

    #[test]
    fn test_repeated_announcement_is_not_a_change() {
        // Checkpoints come in pairs, so the same figure is usually read twice.
        let mut est = VolatilityEstimate::uninitialized();
        assert!(est.apply(&VolatilityParse::Parsed(0.25)));
        assert!(!est.apply(&VolatilityParse::Parsed(0.25)));
        assert_eq!(est.sigma(), Some(0.25));
    }

    #[test]
    fn test_strip_trailing_chars_is_char_aware() {
        assert_eq!(strip_trailing_chars("20%", 1), Some("20"));
        assert_eq!(strip_trailing_chars("25%,", 2), Some("25"));
        assert_eq!(strip_trailing_chars("7€", 1), Some("7"));
        assert_eq!(strip_trailing_chars("%", 1), None);
    }
}
