//! Cryptocurrency price lookup.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Serialize, Serializer};
use tracing::debug;

use chatrelay_core::{Error, Result};

/// Where USD prices come from.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// `Ok(None)` when the source does not know the currency.
    async fn usd_price(&self, currency: &str) -> Result<Option<f64>>;
}

/// Outcome of a lookup. A failed or empty lookup is `Unavailable`, not an
/// error: the model is told and answers accordingly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceStatus {
    Available(f64),
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub currency: String,
    pub price: PriceStatus,
}

impl Serialize for PriceQuote {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("currency", &self.currency)?;
        match self.price {
            PriceStatus::Available(usd) => {
                map.serialize_entry("price_usd", &usd)?;
            }
            PriceStatus::Unavailable => {
                map.serialize_entry("price_usd", &Option::<f64>::None)?;
                map.serialize_entry("status", "unavailable")?;
            }
        }
        map.end()
    }
}

/// Client for the CoinGecko `simple/price` endpoint.
pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn usd_price(&self, currency: &str) -> Result<Option<f64>> {
        let url = format!("{}/simple/price", self.base_url);
        debug!("Looking up USD price for {}", currency);

        let response = self
            .http
            .get(&url)
            .query(&[("ids", currency), ("vs_currencies", "usd")])
            .send()
            .await
            .map_err(|e| Error::Http(format!("Price request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream { status, body });
        }

        // {"bitcoin": {"usd": 67000.0}}
        let prices: HashMap<String, HashMap<String, f64>> = response
            .json()
            .await
            .map_err(|e| Error::Tool(format!("Malformed price response: {}", e)))?;

        Ok(prices.get(currency).and_then(|p| p.get("usd")).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_price_lookup() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/simple/price")
                    .query_param("ids", "bitcoin")
                    .query_param("vs_currencies", "usd");
                then.status(200)
                    .json_body(serde_json::json!({"bitcoin": {"usd": 67012.5}}));
            })
            .await;

        let client = CoinGeckoClient::new(Client::new(), server.base_url());
        assert_eq!(client.usd_price("bitcoin").await.unwrap(), Some(67012.5));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_currency_is_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/simple/price");
                then.status(200).json_body(serde_json::json!({}));
            })
            .await;

        let client = CoinGeckoClient::new(Client::new(), server.base_url());
        assert_eq!(client.usd_price("notacoin").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_server_error_propagates() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/simple/price");
                then.status(503);
            })
            .await;

        let client = CoinGeckoClient::new(Client::new(), server.base_url());
        let err = client.usd_price("bitcoin").await.unwrap_err();
        assert!(matches!(err, Error::Upstream { status: 503, .. }));
    }

    #[test]
    fn test_quote_serialization() {
        let available = PriceQuote {
            currency: "bitcoin".into(),
            price: PriceStatus::Available(10.5),
        };
        assert_eq!(
            serde_json::to_value(&available).unwrap(),
            serde_json::json!({"currency": "bitcoin", "price_usd": 10.5})
        );

        let unavailable = PriceQuote {
            currency: "bitcoin".into(),
            price: PriceStatus::Unavailable,
        };
        assert_eq!(
            serde_json::to_value(&unavailable).unwrap(),
            serde_json::json!({"currency": "bitcoin", "price_usd": null, "status": "unavailable"})
        );
    }
}
