use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use valuation_core::{Bar, FinancialStatementSnapshot, MarketSnapshot};

use crate::error::MarketDataError;

/// Lookback window for daily price history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceRange {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
}

impl PriceRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceRange::OneMonth => "1mo",
            PriceRange::ThreeMonths => "3mo",
            PriceRange::SixMonths => "6mo",
            PriceRange::OneYear => "1y",
            PriceRange::TwoYears => "2y",
            PriceRange::FiveYears => "5y",
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            PriceRange::OneMonth => 31,
            PriceRange::ThreeMonths => 92,
            PriceRange::SixMonths => 183,
            PriceRange::OneYear => 365,
            PriceRange::TwoYears => 730,
            PriceRange::FiveYears => 1826,
        }
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        PriceRange::OneYear
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceRange {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1mo" => Ok(PriceRange::OneMonth),
            "3mo" => Ok(PriceRange::ThreeMonths),
            "6mo" => Ok(PriceRange::SixMonths),
            "1y" => Ok(PriceRange::OneYear),
            "2y" => Ok(PriceRange::TwoYears),
            "5y" => Ok(PriceRange::FiveYears),
            other => Err(MarketDataError::InvalidRange(other.to_string())),
        }
    }
}

/// Source of normalized market data. Every method returns fully normalized
/// values; provider JSON never crosses this boundary.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn market_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError>;

    /// Annual statements, newest first.
    async fn statements(
        &self,
        symbol: &str,
        limit: usize,
    ) -> Result<Vec<FinancialStatementSnapshot>, MarketDataError>;

    /// Daily bars, oldest first.
    async fn price_history(&self, symbol: &str, range: PriceRange) -> Result<Vec<Bar>, MarketDataError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Fixed;

    #[async_trait]
    impl MarketDataProvider for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn market_snapshot(&self, symbol: &str) -> Result<MarketSnapshot, MarketDataError> {
            Ok(MarketSnapshot { symbol: symbol.to_string(), price: 10.0, ..MarketSnapshot::default() })
        }

        async fn statements(&self, _: &str, limit: usize) -> Result<Vec<FinancialStatementSnapshot>, MarketDataError> {
            Ok(vec![FinancialStatementSnapshot::default(); limit])
        }

        async fn price_history(&self, symbol: &str, _: PriceRange) -> Result<Vec<Bar>, MarketDataError> {
            Err(MarketDataError::SymbolNotFound(symbol.to_string()))
        }
    }

    #[test]
    fn test_provider_as_trait_object() {
        let provider: Arc<dyn MarketDataProvider> = Arc::new(Fixed);
        let snapshot = tokio_test::block_on(provider.market_snapshot("ACME")).unwrap();
        assert_eq!(snapshot.symbol, "ACME");
        assert_eq!(tokio_test::block_on(provider.statements("ACME", 3)).unwrap().len(), 3);

        let err = tokio_test::block_on(provider.price_history("ACME", PriceRange::OneMonth)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_range_parse() {
        assert_eq!("1y".parse::<PriceRange>().unwrap(), PriceRange::OneYear);
        assert_eq!(" 6MO ".parse::<PriceRange>().unwrap(), PriceRange::SixMonths);
        assert!("10y".parse::<PriceRange>().is_err());
        assert_eq!(PriceRange::default().to_string(), "1y");
    }
}
