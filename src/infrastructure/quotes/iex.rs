use crate::domain::ports::PriceLookup;
use crate::domain::trading::types::Quote;
use crate::infrastructure::core::http_client_factory::HttpClientFactory;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Deserialize)]
struct IexQuote {
    symbol: String,
    #[serde(rename = "companyName")]
    company_name: String,
    #[serde(rename = "latestPrice")]
    latest_price: Option<serde_json::Number>,
}

/// Price lookup against an IEX Cloud compatible `/stock/{symbol}/quote` endpoint
pub struct IexPriceLookup {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

impl IexPriceLookup {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: HttpClientFactory::create_client(timeout, 3),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn quote_url(&self, symbol: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid quote base URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Quote base URL cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(["stock", symbol, "quote"]);
        url.query_pairs_mut().append_pair("token", &self.api_key);
        Ok(url)
    }
}

/// Converts a provider payload into a quote with an exact decimal price
fn into_quote(raw: IexQuote) -> Result<Quote> {
    let number = raw
        .latest_price
        .with_context(|| format!("No latest price for {}", raw.symbol))?;
    let text = number.to_string();
    let price = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .with_context(|| format!("Unparseable price '{}' for {}", text, raw.symbol))?;
    if price <= Decimal::ZERO {
        anyhow::bail!("Non-positive price {} for {}", price, raw.symbol);
    }

    Ok(Quote {
        symbol: raw.symbol.to_uppercase(),
        name: raw.company_name,
        price,
    })
}

#[async_trait]
impl PriceLookup for IexPriceLookup {
    async fn lookup(&self, symbol: &str) -> Result<Option<Quote>> {
        let url = self.quote_url(symbol)?;

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .with_context(|| format!("Failed to fetch quote for {}", symbol))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("IexPriceLookup: {} is not listed", symbol);
                Ok(None)
            }
            status if status.is_success() => {
                let raw: IexQuote = response
                    .json()
                    .await
                    .with_context(|| format!("Failed to parse quote for {}", symbol))?;
                let quote = into_quote(raw)?;
                debug!("IexPriceLookup: {} @ {}", quote.symbol, quote.price);
                Ok(Some(quote))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                warn!("IexPriceLookup: HTTP {} for {}: {}", status, symbol, body);
                anyhow::bail!("Quote provider returned HTTP {} for {}", status, symbol)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_url_escapes_symbol_and_adds_token() {
        let lookup = IexPriceLookup::new(
            "https://cloud.iexapis.com/stable/",
            "pk_test",
            Duration::from_secs(5),
        );
        let url = lookup.quote_url("BRK.B").unwrap();
        assert_eq!(
            url.as_str(),
            "https://cloud.iexapis.com/stable/stock/BRK.B/quote?token=pk_test"
        );

        let url = lookup.quote_url("A/B").unwrap();
        assert!(url.path().ends_with("/stock/A%2FB/quote"));
    }

    #[test]
    fn test_into_quote_keeps_exact_price() {
        let raw: IexQuote = serde_json::from_str(
            r#"{"symbol":"nflx","companyName":"Netflix, Inc.","latestPrice":301.57}"#,
        )
        .unwrap();
        let quote = into_quote(raw).unwrap();
        assert_eq!(quote.symbol, "NFLX");
        assert_eq!(quote.price, dec!(301.57));
    }

    #[test]
    fn test_into_quote_rejects_missing_or_zero_price() {
        let missing: IexQuote =
            serde_json::from_str(r#"{"symbol":"X","companyName":"X","latestPrice":null}"#).unwrap();
        assert!(into_quote(missing).is_err());

        let zero: IexQuote =
            serde_json::from_str(r#"{"symbol":"X","companyName":"X","latestPrice":0}"#).unwrap();
        assert!(into_quote(zero).is_err());
    }
}
