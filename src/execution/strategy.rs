use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::{EventLevel, LeaderTrade, MarketInfo, MirrorOrder, Settings, TradingStatus};
use crate::ports::MarketDataPort;

use super::position_sizer::{calculate_size, slippage_ceiling};

/// Why a leader trade is not mirrored.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SkipReason {
    #[error("trading status is {0}")]
    NotRunning(TradingStatus),

    #[error("market info unavailable: {0}")]
    MarketUnavailable(String),

    #[error("market is not active")]
    MarketInactive,

    #[error("market volume {volume} below minimum {min}")]
    LowVolume { volume: Decimal, min: Decimal },

    #[error("market resolves in {days} days, limit is {max}")]
    ResolutionTooFar { days: i64, max: i64 },

    #[error("sized order is empty")]
    ZeroSize,
}

impl SkipReason {
    /// Port failures are errors; everything else is a normal filter hit.
    pub fn level(&self) -> EventLevel {
        match self {
            SkipReason::MarketUnavailable(_) => EventLevel::Error,
            _ => EventLevel::Info,
        }
    }

    /// Short machine-readable label for metrics and event metadata.
    pub fn code(&self) -> &'static str {
        match self {
            SkipReason::NotRunning(_) => "not_running",
            SkipReason::MarketUnavailable(_) => "market_unavailable",
            SkipReason::MarketInactive => "market_inactive",
            SkipReason::LowVolume { .. } => "low_volume",
            SkipReason::ResolutionTooFar { .. } => "resolution_too_far",
            SkipReason::ZeroSize => "zero_size",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Mirror(MirrorOrder),
    Skip(SkipReason),
}

struct CachedMarket {
    info: MarketInfo,
    fetched_at: Instant,
}

/// Turns leader trades into sized mirror orders.
pub struct StrategyEngine {
    market_data: Arc<dyn MarketDataPort>,
    cache: Mutex<HashMap<String, CachedMarket>>,
    cache_ttl: Duration,
}

impl StrategyEngine {
    pub fn new(market_data: Arc<dyn MarketDataPort>, cache_ttl: Duration) -> Self {
        Self {
            market_data,
            cache: Mutex::new(HashMap::new()),
            cache_ttl,
        }
    }

    pub async fn evaluate(&self, trade: &LeaderTrade, settings: &Settings) -> Evaluation {
        self.evaluate_at(trade, settings, Utc::now()).await
    }

    /// Filters run in order and the first failure wins.
    pub async fn evaluate_at(
        &self,
        trade: &LeaderTrade,
        settings: &Settings,
        now: DateTime<Utc>,
    ) -> Evaluation {
        if settings.global_trading_status != TradingStatus::Running {
            return Evaluation::Skip(SkipReason::NotRunning(settings.global_trading_status));
        }

        let market = match self.market_info(&trade.market_id).await {
            Ok(info) => info,
            Err(e) => return Evaluation::Skip(SkipReason::MarketUnavailable(e.to_string())),
        };

        if !market.is_active {
            return Evaluation::Skip(SkipReason::MarketInactive);
        }
        if market.volume < settings.min_market_volume {
            return Evaluation::Skip(SkipReason::LowVolume {
                volume: market.volume,
                min: settings.min_market_volume,
            });
        }

        if let Some(resolution) = market.resolution_time {
            let days = (resolution - now).num_days();
            if days > settings.max_days_to_resolution {
                return Evaluation::Skip(SkipReason::ResolutionTooFar {
                    days,
                    max: settings.max_days_to_resolution,
                });
            }
        }

        let Some(size) = calculate_size(
            trade.size,
            trade.price,
            settings.copy_trade_percentage,
            settings.max_trade_amount,
        ) else {
            return Evaluation::Skip(SkipReason::ZeroSize);
        };

        Evaluation::Mirror(MirrorOrder {
            leader_trade_id: trade.id,
            market_id: trade.market_id.clone(),
            outcome_id: trade.outcome_id.clone(),
            side: trade.side,
            size,
            max_price: slippage_ceiling(trade.price),
        })
    }

    /// Market metadata, served from cache while fresh. Failures are not cached.
    async fn market_info(&self, market_id: &str) -> anyhow::Result<MarketInfo> {
        {
            let cache = self.cache.lock().await;
            if let Some(entry) = cache.get(market_id) {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(entry.info.clone());
                }
            }
        }

        let info = self.market_data.market_info(market_id).await?;
        self.cache.lock().await.insert(
            market_id.to_string(),
            CachedMarket {
                info: info.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(info)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FetchedTrade, Side};
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct StaticMarket {
        info: Option<MarketInfo>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataPort for StaticMarket {
        async fn trades_for_wallet(
            &self,
            _address: &str,
            _since: DateTime<Utc>,
        ) -> anyhow::Result<Vec<FetchedTrade>> {
            Ok(vec![])
        }

        async fn market_info(&self, _market_id: &str) -> anyhow::Result<MarketInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.info.clone().ok_or_else(|| anyhow::anyhow!("gamma down"))
        }
    }

    fn engine(info: Option<MarketInfo>) -> (StrategyEngine, Arc<StaticMarket>) {
        let port = Arc::new(StaticMarket {
            info,
            calls: AtomicUsize::new(0),
        });
        (StrategyEngine::new(port.clone(), Duration::from_secs(300)), port)
    }

    fn healthy_market() -> MarketInfo {
        MarketInfo {
            volume: Decimal::from(50_000),
            resolution_time: Some(Utc::now() + ChronoDuration::days(5)),
            is_active: true,
        }
    }

    fn trade(size: i64, price: Decimal) -> LeaderTrade {
        LeaderTrade {
            id: Uuid::new_v4(),
            external_trade_id: "ext-1".into(),
            wallet_id: Uuid::new_v4(),
            market_id: "m1".into(),
            outcome_id: "o1".into(),
            side: Side::Yes,
            size: Decimal::from(size),
            price,
            executed_at: Utc::now(),
            category: None,
            created_at: Utc::now(),
        }
    }

    fn running() -> Settings {
        Settings {
            global_trading_status: TradingStatus::Running,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_mirror_order_sized_and_capped() {
        let (engine, _) = engine(Some(healthy_market()));

        match engine.evaluate(&trade(100, Decimal::new(5, 1)), &running()).await {
            Evaluation::Mirror(order) => {
                assert_eq!(order.size, Decimal::from(20));
                assert_eq!(order.max_price, Decimal::new(51, 2));
                assert_eq!(order.side, Side::Yes);
            }
            other => panic!("expected mirror, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_skips_when_not_running() {
        let (engine, port) = engine(Some(healthy_market()));
        let out = engine.evaluate(&trade(100, Decimal::new(5, 1)), &Settings::default()).await;

        assert_eq!(out, Evaluation::Skip(SkipReason::NotRunning(TradingStatus::Stopped)));
        assert_eq!(port.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_low_volume_and_far_resolution_skip() {
        let (thin, _) = engine(Some(MarketInfo {
            volume: Decimal::from(10),
            ..healthy_market()
        }));
        assert!(matches!(
            thin.evaluate(&trade(100, Decimal::new(5, 1)), &running()).await,
            Evaluation::Skip(SkipReason::LowVolume { .. })
        ));

        let (distant, _) = engine(Some(MarketInfo {
            resolution_time: Some(Utc::now() + ChronoDuration::days(90)),
            ..healthy_market()
        }));
        assert!(matches!(
            distant.evaluate(&trade(100, Decimal::new(5, 1)), &running()).await,
            Evaluation::Skip(SkipReason::ResolutionTooFar { max: 30, .. })
        ));
    }

    #[tokio::test]
    async fn test_unavailable_market_is_error_level_skip() {
        let (engine, _) = engine(None);
        let out = engine.evaluate(&trade(100, Decimal::new(5, 1)), &running()).await;

        match out {
            Evaluation::Skip(reason) => {
                assert_eq!(reason.level(), EventLevel::Error);
                assert_eq!(reason.code(), "market_unavailable");
            }
            other => panic!("expected skip, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_price_skips() {
        let (engine, _) = engine(Some(healthy_market()));
        let out = engine.evaluate(&trade(100, Decimal::ZERO), &running()).await;
        assert_eq!(out, Evaluation::Skip(SkipReason::ZeroSize));
    }

    #[tokio::test]
    async fn test_market_info_is_cached() {
        let (engine, port) = engine(Some(healthy_market()));
        for _ in 0..3 {
            engine.evaluate(&trade(100, Decimal::new(5, 1)), &running()).await;
        }
        assert_eq!(port.calls.load(Ordering::SeqCst), 1);
    }
}
