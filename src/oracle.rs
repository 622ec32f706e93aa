//! Fiat spot-price oracle
//!
//! Supplies the fiat-per-coin price used to turn a dollar amount into wei and
//! to display the fee. The production implementation queries Coinbase's
//! public spot endpoint.

use crate::fiat::Fiat;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;

#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Current spot price for a pair such as `"ETH-USD"`. Always positive.
    async fn spot_price(&self, pair: &str) -> Result<Fiat>;
}

const COINBASE_API_BASE: &str = "https://api.coinbase.com/v2/prices";

#[derive(Debug, Deserialize)]
struct SpotResponse {
    data: SpotData,
}

#[derive(Debug, Deserialize)]
struct SpotData {
    amount: String,
}

/// Price oracle backed by Coinbase's spot-price API.
#[derive(Debug, Clone)]
pub struct CoinbaseOracle {
    client: reqwest::Client,
    base_url: String,
}

impl CoinbaseOracle {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: COINBASE_API_BASE.to_string(),
        }
    }

    /// Point the oracle at a different endpoint (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for CoinbaseOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceOracle for CoinbaseOracle {
    async fn spot_price(&self, pair: &str) -> Result<Fiat> {
        let url = format!("{}/{}/spot", self.base_url, pair);
        let response: SpotResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let price: Fiat = response
            .data
            .amount
            .parse()
            .map_err(|_| Error::Network(format!("unparseable spot price {:?}", response.data.amount)))?;
        if price.is_zero() {
            return Err(Error::Network(format!("zero spot price for {pair}")));
        }
        tracing::debug!(pair = %pair, price = %price, "Fetched spot price");
        Ok(price)
    }
}
