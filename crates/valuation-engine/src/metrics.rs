//! Per-company metrics derived from the statement history and quote.

use serde::{Deserialize, Serialize};
use valuation_core::{stats, AnalysisError, FinancialStatementSnapshot, MarketSnapshot};

use crate::dcf::EquityBridge;
use crate::relative::RelativeInputs;

/// Years of operating income averaged for EPV.
pub const NORMALIZATION_YEARS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyMetrics {
    pub price: f64,
    pub shares_outstanding: f64,
    pub eps: f64,
    pub book_value_per_share: f64,
    pub free_cash_flow: f64,
    pub fcf_per_share: f64,
    pub revenue: f64,
    pub ebitda: f64,
    pub normalized_operating_income: f64,
    /// Return on equity (%); 0 when equity is not positive.
    pub roe: f64,
    pub dividend_per_share: f64,
    /// Trailing dividend yield (%).
    pub dividend_yield: f64,
    /// Revenue CAGR (%) across the statement history.
    pub revenue_growth: Option<f64>,
    /// EPS CAGR (%) across the statement history.
    pub eps_growth: Option<f64>,
    pub bridge: EquityBridge,
}

impl CompanyMetrics {
    /// Derive metrics from newest-first statements. The newest statement is
    /// the balance-sheet point in time; growth spans the full history.
    pub fn derive(
        market: &MarketSnapshot,
        statements: &[FinancialStatementSnapshot],
    ) -> Result<Self, AnalysisError> {
        let latest = statements
            .first()
            .ok_or_else(|| AnalysisError::InsufficientData("No financial statements available".to_string()))?;

        let shares_outstanding = if latest.shares_outstanding > 0.0 {
            latest.shares_outstanding
        } else if market.shares_outstanding > 0.0 {
            market.shares_outstanding
        } else if market.price > 0.0 && market.market_cap > 0.0 {
            market.market_cap / market.price
        } else {
            0.0
        };

        let per_share = |v: f64| if shares_outstanding > 0.0 { v / shares_outstanding } else { 0.0 };

        let eps = if latest.eps != 0.0 { latest.eps } else { per_share(latest.net_income) };
        let book_value_per_share = per_share(latest.equity);
        let free_cash_flow = latest.fcf_or_derived();

        let recent = &statements[..statements.len().min(NORMALIZATION_YEARS)];
        let operating: Vec<f64> = recent.iter().map(|s| s.operating_income).collect();
        let normalized_operating_income = stats::mean(&operating).unwrap_or(0.0);

        let roe = if latest.equity > 0.0 { latest.net_income / latest.equity * 100.0 } else { 0.0 };
        let dividend_yield = if market.price > 0.0 {
            market.dividend_per_share / market.price * 100.0
        } else {
            0.0
        };

        let oldest = statements.last().unwrap_or(latest);
        let periods = statements.len() - 1;
        let revenue_growth = stats::cagr(oldest.revenue, latest.revenue, periods);
        let eps_growth = stats::cagr(oldest.eps_or_derived(), latest.eps_or_derived(), periods);

        Ok(Self {
            price: market.price,
            shares_outstanding,
            eps,
            book_value_per_share,
            free_cash_flow,
            fcf_per_share: per_share(free_cash_flow),
            revenue: latest.revenue,
            ebitda: latest.ebitda_or_operating(),
            normalized_operating_income,
            roe,
            dividend_per_share: market.dividend_per_share,
            dividend_yield,
            revenue_growth,
            eps_growth,
            bridge: EquityBridge {
                cash: latest.cash,
                investments: latest.short_term_investments,
                total_debt: latest.total_debt,
                shares_outstanding,
            },
        })
    }

    pub fn relative_inputs(&self, market: &MarketSnapshot) -> RelativeInputs {
        RelativeInputs {
            price: self.price,
            eps: self.eps,
            book_value_per_share: self.book_value_per_share,
            ebitda: self.ebitda,
            revenue: self.revenue,
            total_debt: self.bridge.total_debt,
            cash: self.bridge.cash + self.bridge.investments,
            shares_outstanding: self.shares_outstanding,
            market_cap: market.market_cap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn statement(year: i32, revenue: f64, net_income: f64) -> FinancialStatementSnapshot {
        FinancialStatementSnapshot {
            fiscal_year: year,
            revenue,
            net_income,
            operating_income: net_income * 1.3,
            equity: 1_000.0,
            shares_outstanding: 100.0,
            operating_cash_flow: net_income * 1.2,
            capex: -net_income * 0.2,
            cash: 150.0,
            total_debt: 250.0,
            ..Default::default()
        }
    }

    fn market() -> MarketSnapshot {
        MarketSnapshot {
            symbol: "TEST".to_string(),
            price: 50.0,
            dividend_per_share: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_derive_from_history() {
        let history = vec![statement(2024, 1_210.0, 121.0), statement(2023, 1_100.0, 110.0), statement(2022, 1_000.0, 100.0)];
        let m = CompanyMetrics::derive(&market(), &history).unwrap();

        assert_relative_eq!(m.eps, 1.21);
        assert_relative_eq!(m.book_value_per_share, 10.0);
        assert_relative_eq!(m.free_cash_flow, 121.0, epsilon = 1e-9);
        assert_relative_eq!(m.fcf_per_share, 1.21, epsilon = 1e-9);
        assert_relative_eq!(m.revenue_growth.unwrap(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(m.eps_growth.unwrap(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(m.roe, 12.1, epsilon = 1e-9);
        assert_relative_eq!(m.dividend_yield, 2.0);
        assert_relative_eq!(m.normalized_operating_income, 143.43333, epsilon = 1e-4);
        assert_relative_eq!(m.bridge.net_cash(), -100.0);
    }

    #[test]
    fn test_single_statement_has_no_growth() {
        let m = CompanyMetrics::derive(&market(), &[statement(2024, 1_000.0, 100.0)]).unwrap();
        assert!(m.revenue_growth.is_none());
    }

    #[test]
    fn test_share_count_falls_back_to_market_cap() {
        let mut s = statement(2024, 1_000.0, 100.0);
        s.shares_outstanding = 0.0;
        let mut mkt = market();
        mkt.market_cap = 5_000.0;
        let m = CompanyMetrics::derive(&mkt, &[s]).unwrap();
        assert_relative_eq!(m.shares_outstanding, 100.0);
        assert_relative_eq!(m.eps, 1.0);
    }

    #[test]
    fn test_empty_history_errors() {
        assert!(CompanyMetrics::derive(&market(), &[]).is_err());
    }
}
