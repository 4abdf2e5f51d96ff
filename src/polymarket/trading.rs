use std::sync::Arc;

use async_trait::async_trait;
use polymarket_client_sdk::clob::types::Side as SdkSide;
use polymarket_client_sdk::types::U256;

use crate::models::Side;
use crate::ports::{OrderRequest, OrderResult, TradingPort};

use super::wallet::PolymarketWallet;

/// [`TradingPort`] that places GTC limit orders on the Polymarket CLOB.
///
/// YES buys the outcome token and NO sells it, both limited at `max_price`.
pub struct ClobTradingPort {
    wallet: Arc<PolymarketWallet>,
}

impl ClobTradingPort {
    pub fn new(wallet: Arc<PolymarketWallet>) -> Self {
        Self { wallet }
    }
}

/// Parse a CTF token id, decimal first, then hex.
fn parse_token_id(token_id: &str) -> anyhow::Result<U256> {
    let parsed = U256::from_str_radix(token_id, 10).or_else(|_| {
        token_id
            .strip_prefix("0x")
            .map(|hex| U256::from_str_radix(hex, 16))
            .unwrap_or_else(|| U256::from_str_radix(token_id, 16))
    })?;
    Ok(parsed)
}

#[async_trait]
impl TradingPort for ClobTradingPort {
    async fn place_order(&self, request: &OrderRequest) -> anyhow::Result<OrderResult> {
        let sdk_side = match request.side {
            Side::Yes => SdkSide::Buy,
            Side::No => SdkSide::Sell,
        };
        let token_id = parse_token_id(&request.outcome_id)?;

        let client = self.wallet.client();
        let signable_order = client
            .limit_order()
            .token_id(token_id)
            .side(sdk_side)
            .price(request.max_price)
            .size(request.size)
            .build()
            .await?;

        let signed_order = client.sign(self.wallet.signer(), signable_order).await?;
        let response = client.post_order(signed_order).await?;

        tracing::info!(
            market = %request.market_id,
            order_id = %response.order_id,
            success = response.success,
            status = ?response.status,
            "Order submitted to CLOB"
        );

        if !response.success {
            return Ok(OrderResult::rejected(
                response
                    .error_msg
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "order rejected by CLOB".into()),
            ));
        }

        Ok(OrderResult {
            success: true,
            order_id: Some(response.order_id).filter(|id| !id.is_empty()),
            error: None,
            // Limit orders fill at or better than the limit; the post
            // response does not report the average fill.
            fill_price: None,
        })
    }
}
