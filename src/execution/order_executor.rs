use std::sync::Arc;

use chrono::{Duration, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use serde_json::json;

use crate::ledger::TradeLedger;
use crate::models::event::{event_type, EventLevel};
use crate::models::{
    FollowerTrade, FollowerTradeStatus, MirrorOrder, NewFollowerTrade, NewSystemEvent, Settings,
    Side,
};
use crate::ports::{OrderRequest, TradingPort};

pub const NO_CREDENTIALS: &str = "no trading credentials configured";

/// Carries out risk-approved orders and records exactly one follower trade
/// and one audit event per attempt.
pub struct OrderExecutor {
    ledger: Arc<dyn TradeLedger>,
    trading: Option<Arc<dyn TradingPort>>,
}

struct Attempt {
    status: FollowerTradeStatus,
    price: Decimal,
    is_dry_run: bool,
    order_id: Option<String>,
    error_message: Option<String>,
}

impl OrderExecutor {
    pub fn new(ledger: Arc<dyn TradeLedger>, trading: Option<Arc<dyn TradingPort>>) -> Self {
        Self { ledger, trading }
    }

    /// Execute an approved order.
    ///
    /// Venue rejections and errors come back as a FAILED trade; only ledger
    /// failures are returned as `Err`. When the trade cannot be stored the
    /// attempt is still written to the event log, venue outcome included.
    pub async fn execute(
        &self,
        order: &MirrorOrder,
        settings: &Settings,
    ) -> anyhow::Result<FollowerTrade> {
        let attempt = self.attempt(order, settings).await;
        let executed_at = Utc::now();

        let new_trade = NewFollowerTrade {
            leader_trade_id: order.leader_trade_id,
            market_id: order.market_id.clone(),
            outcome_id: order.outcome_id.clone(),
            side: order.side,
            size: order.size,
            price: attempt.price,
            status: attempt.status,
            is_dry_run: attempt.is_dry_run,
            order_id: attempt.order_id,
            error_message: attempt.error_message,
            executed_at,
        };

        let record = match self.ledger.record_execution(new_trade.clone()).await {
            Ok(record) => record,
            Err(e) => {
                self.record_unstored(&new_trade, &e).await;
                return Err(e);
            }
        };
        let trade = record.trade;

        // Concurrent reviews can each pass against the same count, so the
        // hourly limit is re-checked after commit. Overshoots are reported,
        // not undone.
        let overshoot = match self
            .ledger
            .count_follower_trades_since(executed_at - Duration::hours(1))
            .await
        {
            Ok(count) if count > settings.max_trades_per_hour => {
                tracing::warn!(
                    trades_last_hour = count,
                    limit = settings.max_trades_per_hour,
                    follower_trade_id = %trade.id,
                    "Hourly trade limit overshot"
                );
                Some(count)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Post-commit trade count failed");
                None
            }
        };

        let metadata = json!({
            "follower_trade_id": trade.id,
            "leader_trade_id": trade.leader_trade_id,
            "market_id": trade.market_id,
            "outcome_id": trade.outcome_id,
            "side": trade.side,
            "size": trade.size,
            "price": trade.price,
            "pnl": trade.pnl,
            "is_dry_run": trade.is_dry_run,
            "order_id": trade.order_id,
            "error": trade.error_message,
            "position": record.position,
            "rate_limit_overshoot": overshoot,
        });
        let event = execution_event(
            trade.status,
            format_attempt(trade.status, trade.side, trade.size, trade.price, trade.error_message.as_deref()),
        );

        if let Err(e) = self.ledger.record_event(event.with_metadata(metadata)).await {
            tracing::error!(error = %e, follower_trade_id = %trade.id, "Failed to record execution event");
        }

        tracing::info!(
            follower_trade_id = %trade.id,
            market = %trade.market_id,
            side = %trade.side,
            size = %trade.size,
            price = %trade.price,
            status = %trade.status,
            pnl = %trade.pnl,
            "Execution recorded"
        );

        Ok(trade)
    }

    /// Audit an attempt whose follower trade could not be stored.
    async fn record_unstored(&self, trade: &NewFollowerTrade, ledger_error: &anyhow::Error) {
        tracing::error!(
            leader_trade_id = %trade.leader_trade_id,
            market = %trade.market_id,
            status = %trade.status,
            order_id = ?trade.order_id,
            error = %ledger_error,
            "Execution attempt not stored"
        );
        counter!("execution_store_failures").increment(1);

        let metadata = json!({
            "follower_trade_id": null,
            "leader_trade_id": trade.leader_trade_id,
            "market_id": trade.market_id,
            "outcome_id": trade.outcome_id,
            "side": trade.side,
            "size": trade.size,
            "price": trade.price,
            "status": trade.status,
            "is_dry_run": trade.is_dry_run,
            "order_id": trade.order_id,
            "error": trade.error_message,
            "ledger_error": ledger_error.to_string(),
        });
        let mut event = execution_event(
            trade.status,
            format!(
                "{} (not stored: {ledger_error})",
                format_attempt(trade.status, trade.side, trade.size, trade.price, trade.error_message.as_deref())
            ),
        );
        event.level = EventLevel::Error;

        if let Err(e) = self.ledger.record_event(event.with_metadata(metadata)).await {
            tracing::error!(error = %e, leader_trade_id = %trade.leader_trade_id, "Failed to record execution event");
        }
    }

    async fn attempt(&self, order: &MirrorOrder, settings: &Settings) -> Attempt {
        if settings.is_simulated() {
            tracing::info!(
                market = %order.market_id,
                side = %order.side,
                size = %order.size,
                max_price = %order.max_price,
                "[DRY-RUN] Simulating order"
            );
            return Attempt {
                status: FollowerTradeStatus::Simulated,
                price: order.max_price,
                is_dry_run: true,
                order_id: None,
                error_message: None,
            };
        }

        let failed = |message: String| Attempt {
            status: FollowerTradeStatus::Failed,
            price: order.max_price,
            is_dry_run: false,
            order_id: None,
            error_message: Some(message),
        };

        let Some(trading) = &self.trading else {
            tracing::error!(market = %order.market_id, "LIVE order without trading credentials");
            return failed(NO_CREDENTIALS.to_string());
        };

        match trading.place_order(&OrderRequest::from(order)).await {
            Ok(result) if result.success => Attempt {
                status: FollowerTradeStatus::Executed,
                price: result.fill_price.unwrap_or(order.max_price),
                is_dry_run: false,
                order_id: result.order_id,
                error_message: None,
            },
            Ok(result) => {
                let message = result.error.unwrap_or_else(|| "order rejected".into());
                tracing::warn!(market = %order.market_id, error = %message, "Order rejected by venue");
                Attempt {
                    order_id: result.order_id,
                    ..failed(message)
                }
            }
            Err(e) => {
                tracing::error!(market = %order.market_id, error = %e, "Order placement failed");
                failed(e.to_string())
            }
        }
    }
}

fn format_attempt(
    status: FollowerTradeStatus,
    side: Side,
    size: Decimal,
    price: Decimal,
    error: Option<&str>,
) -> String {
    match status {
        FollowerTradeStatus::Simulated => format!("Simulated {side} {size} @ {price}"),
        FollowerTradeStatus::Executed => format!("Executed {side} {size} @ {price}"),
        FollowerTradeStatus::Failed => {
            format!("Order failed: {}", error.unwrap_or("unknown error"))
        }
    }
}

fn execution_event(status: FollowerTradeStatus, message: String) -> NewSystemEvent {
    match status {
        FollowerTradeStatus::Simulated => {
            counter!("orders_simulated").increment(1);
            NewSystemEvent::info(event_type::TRADE_SIMULATED, message)
        }
        FollowerTradeStatus::Executed => {
            counter!("orders_executed").increment(1);
            NewSystemEvent::info(event_type::TRADE_EXECUTED, message)
        }
        FollowerTradeStatus::Failed => {
            counter!("orders_failed").increment(1);
            NewSystemEvent::error(event_type::TRADE_FAILED, message)
        }
    }
}
