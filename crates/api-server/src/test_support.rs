//! In-process provider and request helpers for route tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, TimeZone, Utc};
use market_data::{MarketDataError, MarketDataProvider, PriceRange};
use serde_json::Value;
use tower::ServiceExt;
use valuation_core::{Bar, FinancialStatementSnapshot, MarketSnapshot};

use crate::{config::ServerConfig, create_router, AppState};

/// Serves one known symbol, `ACME`; everything else is not found.
pub struct StubProvider;

fn check(symbol: &str) -> Result<(), MarketDataError> {
    if symbol == "ACME" {
        Ok(())
    } else {
        Err(MarketDataError::SymbolNotFound(symbol.to_string()))
    }
}

#[async_trait]
impl MarketDataProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn market_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError> {
        check(symbol)?;
        Ok(MarketSnapshot {
            symbol: "ACME".to_string(),
            name: Some("Acme Industries".to_string()),
            price: 40.0,
            market_cap: 4_000.0,
            beta: 1.0,
            sector: "Industrials".to_string(),
            industry: "Machinery".to_string(),
            dividend_per_share: 1.0,
            shares_outstanding: 100.0,
            ..MarketSnapshot::default()
        })
    }

    async fn statements(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<FinancialStatementSnapshot>, MarketDataError> {
        check(symbol)?;
        let history = (0..5)
            .map(|i| {
                let year = 2024 - i;
                let scale = 1.0 / 1.08f64.powi(i);
                FinancialStatementSnapshot {
                    fiscal_date: format!("{}-12-31", year),
                    fiscal_year: year,
                    revenue: 2_000.0 * scale,
                    gross_profit: 800.0 * scale,
                    operating_income: 400.0 * scale,
                    net_income: 300.0 * scale,
                    ebitda: 500.0 * scale,
                    cash: 200.0,
                    receivables: 150.0,
                    inventory: 100.0,
                    total_debt: 300.0,
                    total_assets: 3_000.0,
                    total_liabilities: 1_200.0,
                    equity: 1_800.0,
                    shares_outstanding: 100.0,
                    operating_cash_flow: 380.0 * scale,
                    capex: -100.0 * scale,
                    ..FinancialStatementSnapshot::default()
                }
            })
            .take(limit)
            .collect();
        Ok(history)
    }

    async fn price_history(&self, symbol: &str, _range: PriceRange) -> Result<Vec<Bar>, MarketDataError> {
        check(symbol)?;
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).single().unwrap_or_else(Utc::now);
        Ok((0..260)
            .map(|i| {
                let close = 30.0 + i as f64 * 0.05 + (i % 7) as f64 * 0.2;
                Bar {
                    timestamp: start + Duration::days(i),
                    open: close - 0.1,
                    high: close + 0.5,
                    low: close - 0.5,
                    close,
                    volume: 1_000_000.0,
                }
            })
            .collect())
    }
}

pub fn app() -> Router {
    let state = AppState::new(ServerConfig::default(), Arc::new(StubProvider));
    create_router(state).unwrap()
}

pub async fn get_json(uri: &str) -> (StatusCode, Value) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
