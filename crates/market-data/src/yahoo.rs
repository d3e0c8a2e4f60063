use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use valuation_core::{Bar, FinancialStatementSnapshot, MarketSnapshot};

use crate::error::MarketDataError;
use crate::normalize;
use crate::provider::{MarketDataProvider, PriceRange};

const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

const QUOTE_MODULES: &str = "price,summaryDetail,assetProfile,defaultKeyStatistics";
const STATEMENT_MODULES: &str =
    "incomeStatementHistory,balanceSheetHistory,cashflowStatementHistory,defaultKeyStatistics";

/// Keyless Yahoo Finance client over the public quoteSummary and chart endpoints.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    summary_url: String,
    chart_url: String,
}

impl YahooClient {
    pub fn new(timeout: Duration) -> Result<Self, MarketDataError> {
        let client = Client::builder().user_agent(USER_AGENT).timeout(timeout).build()?;
        Ok(Self {
            client,
            summary_url: SUMMARY_URL.to_string(),
            chart_url: CHART_URL.to_string(),
        })
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, MarketDataError> {
        tracing::debug!(%url, "Yahoo request");
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %url, "Yahoo request failed");
            return Err(MarketDataError::Status {
                provider: "yahoo",
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    async fn quote_summary(&self, symbol: &str, modules: &str) -> Result<Value, MarketDataError> {
        let url = format!("{}/{}", self.summary_url, symbol);
        self.get_json(&url, &[("modules", modules)]).await
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn market_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError> {
        let summary = self.quote_summary(symbol, QUOTE_MODULES).await?;
        normalize::yahoo_market_snapshot(symbol, &summary)
    }

    async fn statements(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<FinancialStatementSnapshot>, MarketDataError> {
        let summary = self.quote_summary(symbol, STATEMENT_MODULES).await?;
        normalize::yahoo_statements(symbol, &summary, limit)
    }

    async fn price_history(&self, symbol: &str, range: PriceRange) -> Result<Vec<Bar>, MarketDataError> {
        let url = format!("{}/{}", self.chart_url, symbol);
        let chart = self
            .get_json(&url, &[("range", range.as_str()), ("interval", "1d")])
            .await?;
        normalize::yahoo_bars(symbol, &chart)
    }
}
