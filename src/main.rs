//! Volatility Bot entry point.
//!
//! One sequential loop per session:
//! 1. Poll the case clock
//! 2. On a new tick, fetch the snapshot (and news at checkpoints)
//! 3. Run the strategy tick and route its orders
//!
//! Market-data failures end the session with a non-zero exit code.

mod config;
mod journal;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use common::{CaseInfo, Error};
use rit_client::RitRestClient;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use vol_strategy::{ExecutionOutcome, ExecutionReport, OrderRouter, TickProcessor, TickReport};

use crate::config::{load_config, VolBotConfig};
use crate::journal::{resolve_journal_dir, JournalEvent, Mode, Status, TradeJournal};

#[derive(Parser)]
struct Cli {
    /// Log and journal orders without sending them.
    #[arg(long)]
    dry_run: bool,

    /// Query the case and trader endpoints once, then exit.
    #[arg(long)]
    check_connection: bool,

    #[arg(long, default_value = "config.toml")]
    config: PathBuf,
}

const HEARTBEAT_TICKS: u32 = 30;
const WAITING_LOG_EVERY: u32 = 25;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "volatility_bot=info,vol_strategy=info,rit_client=info".into()
            }),
        )
        .init();

    info!("Volatility Bot starting...");

    let cli = Cli::parse();
    if cli.dry_run {
        info!("Dry-run mode enabled: orders will be logged but not sent.");
    }

    let cfg = match load_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "Strategy config: entry={} exit={} size={} | hedge limit={} ratio={} max_order={} fee={}",
        cfg.strategy.entry_threshold,
        cfg.strategy.exit_threshold,
        cfg.strategy.contracts_per_trade,
        cfg.risk.net_delta_limit,
        cfg.risk.hedge_ratio,
        cfg.risk.max_shares_per_order,
        cfg.risk.fee_per_share
    );

    let client = match RitRestClient::new(&cfg.base_url, &cfg.api_key) {
        Ok(c) => c,
        Err(e) => {
            error!("Client init failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Case API: {}", client.base_url());

    let mut journal = match TradeJournal::open(resolve_journal_dir()) {
        Ok(j) => j,
        Err(e) => {
            error!("Failed to initialize trade journal: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Trade journal path: {}", journal.dir().display());

    if cli.check_connection {
        return check_connection(&client, &mut journal).await;
    }

    journal.append(&JournalEvent::BotStart {
        mode: Mode::from_dry_run(cli.dry_run),
        base_url: client.base_url(),
        universe: &cfg.universe,
        strategy: &cfg.strategy,
        risk: &cfg.risk,
    });

    let router = OrderRouter::new(&client, cli.dry_run);
    let session = run_session(&client, &router, &cfg, &mut journal).await;

    // Final NLV is reported either way; a failure here is only logged.
    let nlv = match client.get_trader().await {
        Ok(trader) => Some(trader.nlv),
        Err(e) => {
            warn!("Could not read final NLV: {}", e);
            None
        }
    };

    match session {
        Ok(last_tick) => {
            info!("TERMINATED with nlv {:?} at tick {}", nlv, last_tick);
            journal.append(&JournalEvent::SessionEnd {
                status: Status::Ok,
                tick: Some(last_tick),
                nlv,
                error: None,
            });
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(
                "Session aborted ({}): {}",
                if e.is_transient() { "transient" } else { "permanent" },
                e
            );
            error!("TERMINATED with nlv {:?}", nlv);
            journal.append(&JournalEvent::SessionEnd {
                status: Status::Error,
                tick: None,
                nlv,
                error: Some(e.to_string()),
            });
            ExitCode::FAILURE
        }
    }
}

async fn check_connection(client: &RitRestClient, journal: &mut TradeJournal) -> ExitCode {
    let result = async {
        let case = client.get_case().await?;
        let trader = client.get_trader().await?;
        Ok::<_, Error>((case, trader))
    }
    .await;

    match result {
        Ok((case, trader)) => {
            info!(
                "Connection OK. Case status={} tick={} | trader={} nlv={:.2}",
                case.status, case.tick, trader.trader_id, trader.nlv
            );
            journal.append(&JournalEvent::ConnectionCheck {
                status: Status::Ok,
                tick: Some(case.tick),
                nlv: Some(trader.nlv),
                error: None,
            });
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Connection check failed: {}", e);
            journal.append(&JournalEvent::ConnectionCheck {
                status: Status::Error,
                tick: None,
                nlv: None,
                error: Some(e.to_string()),
            });
            ExitCode::FAILURE
        }
    }
}

/// Drive the session until the clock runs out or the case stops.
/// Returns the last tick seen.
async fn run_session(
    client: &RitRestClient,
    router: &OrderRouter<'_>,
    cfg: &VolBotConfig,
    journal: &mut TradeJournal,
) -> Result<u32, Error> {
    let poll = Duration::from_millis(cfg.timing.poll_interval_ms);
    let mut processor = TickProcessor::new(
        &cfg.universe,
        cfg.strategy.clone(),
        cfg.risk.clone(),
        cfg.timing.clone(),
        cfg.volatility.clone(),
    );

    let mut case = wait_for_active(client, poll).await?;
    let mut previous_tick = 0;

    while case.tick < cfg.timing.session_ticks && case.is_active() {
        if case.tick != previous_tick {
            let tick = case.tick;
            let securities = client.get_securities().await?;
            let news = if processor.needs_announcement(tick) {
                Some(client.get_news().await?)
            } else {
                None
            };

            let report = processor.process(tick, &securities, news.as_deref())?;
            journal_tick(journal, &report);

            let intents: Vec<_> = report.intents().cloned().collect();
            if !intents.is_empty() {
                let executions = router.execute(&intents).await;
                journal_executions(journal, tick, Mode::from_dry_run(router.is_dry_run()), &executions);
            }

            if tick % HEARTBEAT_TICKS == 0 {
                info!(
                    "[HEARTBEAT] tick={} sigma={:?} open_positions={} net_delta={:.0}",
                    tick,
                    report.sigma,
                    processor.state().open_positions(),
                    report.hedge.net_delta
                );
            }
            previous_tick = tick;
        }

        sleep(poll).await;
        case = client.get_case().await?;
    }

    debug!("Loop ended: tick={} status={}", case.tick, case.status);
    Ok(case.tick)
}

async fn wait_for_active(client: &RitRestClient, poll: Duration) -> Result<CaseInfo, Error> {
    let mut polls = 0u32;
    loop {
        let case = client.get_case().await?;
        if case.is_active() {
            info!("Case active at tick {}", case.tick);
            return Ok(case);
        }
        if polls % WAITING_LOG_EVERY == 0 {
            info!("Waiting for case to start (status={})", case.status);
        }
        polls += 1;
        sleep(poll).await;
    }
}

fn journal_tick(journal: &mut TradeJournal, report: &TickReport) {
    if let Some(parse) = &report.volatility {
        journal.append(&JournalEvent::volatility_update(
            report.tick,
            parse,
            report.sigma_changed,
            report.sigma,
        ));
    }

    if !report.hedge.is_noop() {
        journal.append(&JournalEvent::Hedge {
            tick: report.tick,
            net_delta: report.hedge.net_delta,
            action: &report.hedge.action,
            orders: report.hedge.intents.len(),
        });
    }
}

fn journal_executions(journal: &mut TradeJournal, tick: u32, mode: Mode, executions: &[ExecutionReport]) {
    for exec in executions {
        let intent = &exec.intent;
        let event = match &exec.outcome {
            ExecutionOutcome::Submitted(ack) => JournalEvent::order_submitted(
                tick,
                mode,
                &intent.ticker,
                intent.action,
                intent.quantity,
                &intent.reason,
                Some(ack),
            ),
            ExecutionOutcome::Simulated => JournalEvent::order_submitted(
                tick,
                mode,
                &intent.ticker,
                intent.action,
                intent.quantity,
                &intent.reason,
                None,
            ),
            ExecutionOutcome::Rejected(reason) | ExecutionOutcome::Failed(reason) => JournalEvent::OrderFailed {
                tick,
                mode,
                ticker: &intent.ticker,
                action: intent.action,
                quantity: intent.quantity,
                reason: &intent.reason,
                error: reason,
            },
        };
        journal.append(&event);
    }
}
