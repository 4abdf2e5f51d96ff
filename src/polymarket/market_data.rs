use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{FetchedTrade, MarketInfo};
use crate::ports::MarketDataPort;

use super::data_client::DataClient;
use super::gamma_client::GammaClient;

/// [`MarketDataPort`] over the public Data and Gamma APIs.
pub struct PolymarketMarketData {
    data: DataClient,
    gamma: GammaClient,
    trade_limit: u32,
}

impl PolymarketMarketData {
    pub fn new(data: DataClient, gamma: GammaClient, trade_limit: u32) -> Self {
        Self {
            data,
            gamma,
            trade_limit,
        }
    }
}

#[async_trait]
impl MarketDataPort for PolymarketMarketData {
    async fn trades_for_wallet(
        &self,
        address: &str,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<FetchedTrade>> {
        let raw = self.data.get_trades_by_wallet(address, self.trade_limit).await?;
        let total = raw.len();

        let mut trades: Vec<FetchedTrade> = raw
            .into_iter()
            .filter_map(|t| t.into_fetched())
            .filter(|t| t.executed_at >= since)
            .collect();
        trades.sort_by_key(|t| t.executed_at);

        tracing::debug!(
            wallet = %address,
            fetched = total,
            kept = trades.len(),
            since = %since,
            "Wallet trades fetched"
        );

        Ok(trades)
    }

    async fn market_info(&self, market_id: &str) -> anyhow::Result<MarketInfo> {
        let market = self
            .gamma
            .get_market(market_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("market {market_id} not found on Gamma"))?;

        Ok(MarketInfo {
            volume: market.volume(),
            resolution_time: market.resolution_time(),
            is_active: market.is_open(),
        })
    }
}
