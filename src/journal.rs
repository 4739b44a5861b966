//! Session journal: one JSON object per line, one file per UTC day.
//!
//! Each line is a [`JournalEvent`] tagged by `kind` and stamped with `ts`.
//! Writes never fail the session; errors are logged and dropped.

use std::fs::{create_dir_all, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use common::{Action, OrderAck};
use serde::Serialize;
use tracing::warn;
use vol_strategy::{HedgeAction, HedgeConfig, StrategyConfig, UniverseConfig, VolatilityParse};

pub const JOURNAL_SUBDIR: &str = "volatility-bot";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Live,
    DryRun,
}

impl Mode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            Mode::DryRun
        } else {
            Mode::Live
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalEvent<'a> {
    BotStart {
        mode: Mode,
        base_url: &'a str,
        universe: &'a UniverseConfig,
        strategy: &'a StrategyConfig,
        risk: &'a HedgeConfig,
    },
    ConnectionCheck {
        status: Status,
        #[serde(skip_serializing_if = "Option::is_none")]
        tick: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        nlv: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// A checkpoint read of the news feed.
    VolatilityUpdate {
        tick: u32,
        /// The figure read from the announcement, if any.
        parsed: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        failure: Option<&'a str>,
        changed: bool,
        /// σ in force after the update.
        sigma: Option<f64>,
    },
    OrderSubmitted {
        tick: u32,
        mode: Mode,
        ticker: &'a str,
        action: Action,
        quantity: i64,
        reason: &'a str,
        /// Absent in dry run.
        #[serde(skip_serializing_if = "Option::is_none")]
        order_id: Option<i64>,
        quantity_filled: Option<f64>,
        vwap: Option<f64>,
        status: &'a str,
    },
    OrderFailed {
        tick: u32,
        mode: Mode,
        ticker: &'a str,
        action: Action,
        quantity: i64,
        reason: &'a str,
        error: &'a str,
    },
    Hedge {
        tick: u32,
        net_delta: f64,
        action: &'a HedgeAction,
        orders: usize,
    },
    SessionEnd {
        status: Status,
        #[serde(skip_serializing_if = "Option::is_none")]
        tick: Option<u32>,
        nlv: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl<'a> JournalEvent<'a> {
    pub fn volatility_update(tick: u32, parse: &'a VolatilityParse, changed: bool, sigma: Option<f64>) -> Self {
        let (parsed, failure) = match parse {
            VolatilityParse::Parsed(value) => (Some(*value), None),
            VolatilityParse::Failed(reason) => (None, Some(reason.as_str())),
        };
        JournalEvent::VolatilityUpdate {
            tick,
            parsed,
            failure,
            changed,
            sigma,
        }
    }

    /// `ack` is `None` for a dry-run order.
    pub fn order_submitted(
        tick: u32,
        mode: Mode,
        ticker: &'a str,
        action: Action,
        quantity: i64,
        reason: &'a str,
        ack: Option<&'a OrderAck>,
    ) -> Self {
        JournalEvent::OrderSubmitted {
            tick,
            mode,
            ticker,
            action,
            quantity,
            reason,
            order_id: ack.and_then(|a| a.order_id),
            quantity_filled: ack.map(|a| a.quantity_filled),
            vwap: ack.and_then(|a| a.vwap),
            status: ack.map_or("simulated", |a| a.status.as_str()),
        }
    }
}

#[derive(Serialize)]
struct Stamped<'e, 'a> {
    ts: String,
    #[serde(flatten)]
    event: &'e JournalEvent<'a>,
}

/// `$TRADES_DIR/volatility-bot`, else `<repo>/TRADES/volatility-bot` for the
/// nearest ancestor holding `.git`, else `TRADES/volatility-bot`.
pub fn resolve_journal_dir() -> PathBuf {
    let env = std::env::var("TRADES_DIR").ok();
    let cwd = std::env::current_dir().ok();
    journal_dir_from(env.as_deref(), cwd.as_deref())
}

fn journal_dir_from(trades_dir: Option<&str>, cwd: Option<&Path>) -> PathBuf {
    let from_env = trades_dir
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from);
    let from_repo = || {
        cwd?.ancestors()
            .find(|dir| dir.join(".git").is_dir())
            .map(|root| root.join("TRADES"))
    };

    from_env
        .or_else(from_repo)
        .unwrap_or_else(|| PathBuf::from("TRADES"))
        .join(JOURNAL_SUBDIR)
}

struct DayFile {
    date: NaiveDate,
    file: File,
}

pub struct TradeJournal {
    dir: PathBuf,
    current: Option<DayFile>,
}

impl TradeJournal {
    /// Creates the directory. Day files are opened on first write.
    pub fn open(dir: PathBuf) -> io::Result<Self> {
        create_dir_all(&dir)?;
        Ok(Self { dir, current: None })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("trades-{}.jsonl", date.format("%Y-%m-%d")))
    }

    pub fn append(&mut self, event: &JournalEvent<'_>) {
        self.append_at(Utc::now(), event);
    }

    fn append_at(&mut self, at: DateTime<Utc>, event: &JournalEvent<'_>) {
        if let Err(e) = self.try_append(at, event) {
            warn!("Trade journal write failed: {}", e);
        }
    }

    fn try_append(&mut self, at: DateTime<Utc>, event: &JournalEvent<'_>) -> io::Result<()> {
        let line = serde_json::to_string(&Stamped {
            ts: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            event,
        })?;
        let file = self.file_for(at.date_naive())?;
        writeln!(file, "{}", line)?;
        file.flush()
    }

    fn file_for(&mut self, date: NaiveDate) -> io::Result<&mut File> {
        if self.current.as_ref().map(|day| day.date) != Some(date) {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.path_for(date))?;
            self.current = Some(DayFile { date, file });
        }
        self.current
            .as_mut()
            .map(|day| &mut day.file)
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "journal day file not open"))
    }
}
