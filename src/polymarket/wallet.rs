use std::str::FromStr;

use alloy::signers::local::PrivateKeySigner;
use polymarket_client_sdk::auth::Signer;
use polymarket_client_sdk::clob::client::{Client, Config};
use polymarket_client_sdk::POLYGON;

type AuthenticatedClient =
    Client<polymarket_client_sdk::auth::state::Authenticated<polymarket_client_sdk::auth::Normal>>;

/// Authenticated CLOB client plus the signer that owns the funds.
///
/// The private key is used once during construction and never stored as a string.
pub struct PolymarketWallet {
    signer: PrivateKeySigner,
    client: AuthenticatedClient,
}

impl PolymarketWallet {
    /// Authenticate against the CLOB at `clob_url` with a hex private key
    /// (with or without `0x`), deriving or creating an API key as needed.
    pub async fn connect(clob_url: &str, private_key: &str) -> anyhow::Result<Self> {
        let signer = PrivateKeySigner::from_str(private_key)?.with_chain_id(Some(POLYGON));

        let client = Client::new(clob_url, Config::default())?
            .authentication_builder(&signer)
            .authenticate()
            .await?;

        Ok(Self { signer, client })
    }

    pub fn wallet_address(&self) -> String {
        format!("{}", self.client.address())
    }

    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }
}
