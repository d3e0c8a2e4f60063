use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use valuation_core::{Bar, FinancialStatementSnapshot, MarketSnapshot};

use crate::error::MarketDataError;
use crate::normalize;
use crate::provider::{MarketDataProvider, PriceRange};

const BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

/// Financial Modeling Prep client. One request per call, no retries.
#[derive(Clone)]
pub struct FmpClient {
    api_key: String,
    client: Client,
    base_url: String,
}

impl FmpClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, MarketDataError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(MarketDataError::MissingApiKey("FMP_API_KEY"));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the client at another host, e.g. a local mock.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, MarketDataError> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(%url, "FMP request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("apikey", &self.api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), path, "FMP request failed");
            return Err(MarketDataError::Status {
                provider: "fmp",
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        // FMP reports bad keys and plan limits with 200 + { "Error Message": .. }
        if let Some(message) = body.get("Error Message").and_then(Value::as_str) {
            tracing::warn!(path, error = message, "FMP returned an error payload");
            return Err(MarketDataError::Decode(message.to_string()));
        }
        Ok(body)
    }

    async fn statement(&self, kind: &str, symbol: &str, limit: usize) -> Result<Value, MarketDataError> {
        self.get_json(
            &format!("{}/{}", kind, symbol),
            &[("period", "annual".to_string()), ("limit", limit.to_string())],
        )
        .await
    }
}

#[async_trait]
impl MarketDataProvider for FmpClient {
    fn name(&self) -> &'static str {
        "fmp"
    }

    async fn market_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError> {
        let profile = self.get_json(&format!("profile/{}", symbol), &[]).await?;
        normalize::fmp_market_snapshot(symbol, &profile)
    }

    async fn statements(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<FinancialStatementSnapshot>, MarketDataError> {
        let (income, balance, cash_flow) = tokio::try_join!(
            self.statement("income-statement", symbol, limit),
            self.statement("balance-sheet-statement", symbol, limit),
            self.statement("cash-flow-statement", symbol, limit),
        )?;
        Ok(normalize::fmp_statements(&income, &balance, &cash_flow, limit))
    }

    async fn price_history(&self, symbol: &str, range: PriceRange) -> Result<Vec<Bar>, MarketDataError> {
        let from = (Utc::now() - ChronoDuration::days(range.days())).format("%Y-%m-%d").to_string();
        let body = self
            .get_json(&format!("historical-price-full/{}", symbol), &[("from", from)])
            .await?;
        Ok(normalize::fmp_bars(&body))
    }
}
