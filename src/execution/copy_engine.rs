use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use serde_json::json;

use crate::ledger::TradeLedger;
use crate::models::event::event_type;
use crate::models::{FollowerTrade, LeaderTrade, NewSystemEvent, Settings, TradingStatus};
use crate::services::mode_controller::TradingGate;

use super::order_executor::OrderExecutor;
use super::risk_manager::{RiskManager, RiskViolation};
use super::strategy::{Evaluation, SkipReason, StrategyEngine};

/// How one leader trade left the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Skipped(SkipReason),
    Rejected(RiskViolation),
    /// Trading stopped between evaluation and execution.
    Halted,
    Executed(FollowerTrade),
}

/// StrategyEngine → RiskManager → OrderExecutor for a single leader trade.
pub struct CopyEngine {
    ledger: Arc<dyn TradeLedger>,
    strategy: StrategyEngine,
    risk: RiskManager,
    executor: OrderExecutor,
}

impl CopyEngine {
    pub fn new(
        ledger: Arc<dyn TradeLedger>,
        strategy: StrategyEngine,
        risk: RiskManager,
        executor: OrderExecutor,
    ) -> Self {
        Self {
            ledger,
            strategy,
            risk,
            executor,
        }
    }

    /// Run the pipeline with the settings snapshot of the cycle that
    /// ingested `trade`. Business outcomes are audited and returned as
    /// `Ok`; `Err` means the ledger failed.
    pub async fn process(
        &self,
        trade: &LeaderTrade,
        settings: &Settings,
        gate: &TradingGate,
    ) -> anyhow::Result<PipelineOutcome> {
        let order = match self.strategy.evaluate(trade, settings).await {
            Evaluation::Mirror(order) => order,
            Evaluation::Skip(reason) => {
                self.record_skip(trade, &reason).await?;
                return Ok(PipelineOutcome::Skipped(reason));
            }
        };

        tracing::info!(
            leader_trade_id = %trade.id,
            market = %order.market_id,
            side = %order.side,
            size = %order.size,
            max_price = %order.max_price,
            "Mirror order sized"
        );

        if let Err(violation) = self.risk.review(&order, settings, Utc::now()).await {
            tracing::warn!(
                violation = %violation,
                leader_trade_id = %trade.id,
                market = %order.market_id,
                "Risk check failed, order rejected"
            );
            counter!("risk_rejections", "reason" => violation.code()).increment(1);

            let event = NewSystemEvent::warn(event_type::RISK_BLOCKED, violation.to_string())
                .with_metadata(json!({
                    "leader_trade_id": trade.id,
                    "market_id": order.market_id,
                    "size": order.size,
                    "max_price": order.max_price,
                    "reason": violation.code(),
                }));
            self.ledger.record_event(event).await?;
            return Ok(PipelineOutcome::Rejected(violation));
        }

        let status = gate.status();
        if status != TradingStatus::Running {
            tracing::info!(leader_trade_id = %trade.id, status = %status, "Trading halted before execution");
            counter!("trades_skipped", "reason" => "halted").increment(1);

            let event = NewSystemEvent::info(
                event_type::TRADE_SKIPPED,
                format!("Trading {status} before execution"),
            )
            .with_metadata(json!({
                "leader_trade_id": trade.id,
                "market_id": trade.market_id,
                "reason": "halted",
            }));
            self.ledger.record_event(event).await?;
            return Ok(PipelineOutcome::Halted);
        }

        let follower = self.executor.execute(&order, settings).await?;
        Ok(PipelineOutcome::Executed(follower))
    }

    async fn record_skip(&self, trade: &LeaderTrade, reason: &SkipReason) -> anyhow::Result<()> {
        tracing::info!(
            leader_trade_id = %trade.id,
            market = %trade.market_id,
            reason = %reason,
            "Leader trade skipped"
        );
        counter!("trades_skipped", "reason" => reason.code()).increment(1);

        let mut event = NewSystemEvent::info(event_type::TRADE_SKIPPED, reason.to_string());
        event.level = reason.level();
        self.ledger
            .record_event(event.with_metadata(json!({
                "leader_trade_id": trade.id,
                "market_id": trade.market_id,
                "reason": reason.code(),
            })))
            .await?;
        Ok(())
    }
}
