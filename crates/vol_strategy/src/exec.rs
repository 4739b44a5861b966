//! Order routing: forwards strategy intents to the venue one at a time.
//!
//! Submission is fire-and-forget from the strategy's point of view. A
//! failed order is logged and reported back; it never aborts the tick.

use common::{OrderAck, OrderIntent};
use rit_client::RitRestClient;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    Submitted(OrderAck),
    /// Dry-run mode: logged, not sent.
    Simulated,
    Rejected(String),
    Failed(String),
}

impl ExecutionOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ExecutionOutcome::Submitted(_) | ExecutionOutcome::Simulated)
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub intent: OrderIntent,
    pub outcome: ExecutionOutcome,
}

pub struct OrderRouter<'a> {
    client: &'a RitRestClient,
    dry_run: bool,
}

impl<'a> OrderRouter<'a> {
    pub fn new(client: &'a RitRestClient, dry_run: bool) -> Self {
        Self { client, dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Submit intents sequentially, in order. One report per intent.
    pub async fn execute(&self, intents: &[OrderIntent]) -> Vec<ExecutionReport> {
        let mut reports = Vec::with_capacity(intents.len());

        for intent in intents {
            let outcome = self.submit(intent).await;
            reports.push(ExecutionReport {
                intent: intent.clone(),
                outcome,
            });
        }
        reports
    }

    async fn submit(&self, intent: &OrderIntent) -> ExecutionOutcome {
        if intent.quantity <= 0 {
            warn!(
                "{}: refusing {} of non-positive quantity {}",
                intent.ticker,
                intent.action.as_str(),
                intent.quantity
            );
            return ExecutionOutcome::Rejected(format!("quantity {}", intent.quantity));
        }

        if self.dry_run {
            info!(
                "[DRY RUN] {} {} {} ({})",
                intent.action.as_str(),
                intent.quantity,
                intent.ticker,
                intent.reason
            );
            return ExecutionOutcome::Simulated;
        }

        match self.client.submit_order(intent).await {
            Ok(ack) => {
                info!(
                    "ORDER {} {} {}: id={:?} filled={} status={}",
                    intent.action.as_str(),
                    intent.quantity,
                    intent.ticker,
                    ack.order_id,
                    ack.quantity_filled,
                    ack.status
                );
                ExecutionOutcome::Submitted(ack)
            }
            Err(e) => {
                warn!(
                    "ORDER {} {} {} failed: {}",
                    intent.action.as_str(),
                    intent.quantity,
                    intent.ticker,
                    e
                );
                ExecutionOutcome::Failed(e.to_string())
            }
        }
    }
}
