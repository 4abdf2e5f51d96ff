pub mod data_client;
pub mod gamma_client;
pub mod market_data;
pub mod trading;
pub mod types;
pub mod wallet;

pub use data_client::DataClient;
pub use gamma_client::GammaClient;
pub use market_data::PolymarketMarketData;
pub use trading::ClobTradingPort;
pub use types::{ApiTrade, GammaMarket};
pub use wallet::PolymarketWallet;
