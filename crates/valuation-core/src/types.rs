use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// One fiscal period of income statement, balance sheet and cash flow data.
///
/// Produced by the market-data normalization boundary with every absent field
/// defaulted to `0.0`. A company's history is a `Vec` ordered newest-first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatementSnapshot {
    pub fiscal_date: String,
    pub fiscal_year: i32,

    // Income statement
    pub revenue: f64,
    pub cost_of_revenue: f64,
    pub gross_profit: f64,
    pub operating_income: f64,
    pub net_income: f64,
    pub eps: f64,
    pub ebitda: f64,

    // Balance sheet
    pub cash: f64,
    pub short_term_investments: f64,
    pub receivables: f64,
    pub inventory: f64,
    pub total_debt: f64,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub equity: f64,
    pub shares_outstanding: f64,

    // Cash flow statement
    pub operating_cash_flow: f64,
    pub capex: f64,
    pub free_cash_flow: f64,
}

impl FinancialStatementSnapshot {
    /// Reported EPS, or net income over shares when the provider omitted it.
    pub fn eps_or_derived(&self) -> f64 {
        if self.eps != 0.0 {
            self.eps
        } else if self.shares_outstanding > 0.0 {
            self.net_income / self.shares_outstanding
        } else {
            0.0
        }
    }

    /// Reported FCF, or operating cash flow less capital expenditure.
    /// Providers disagree on the sign of capex, so its magnitude is used.
    pub fn fcf_or_derived(&self) -> f64 {
        if self.free_cash_flow != 0.0 {
            self.free_cash_flow
        } else {
            self.operating_cash_flow - self.capex.abs()
        }
    }

    pub fn book_value_per_share(&self) -> f64 {
        if self.shares_outstanding > 0.0 {
            self.equity / self.shares_outstanding
        } else {
            0.0
        }
    }

    /// Reported EBITDA, falling back to operating income.
    pub fn ebitda_or_operating(&self) -> f64 {
        if self.ebitda != 0.0 {
            self.ebitda
        } else {
            self.operating_income
        }
    }
}

/// Current quote and classification for a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub name: Option<String>,
    pub price: f64,
    pub currency: String,
    pub market_cap: f64,
    pub beta: f64,
    pub sector: String,
    pub industry: String,
    /// Trailing annual dividend per share.
    pub dividend_per_share: f64,
    /// Shares outstanding as reported with the quote; 0 when absent.
    pub shares_outstanding: f64,
}

impl Default for MarketSnapshot {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            name: None,
            price: 0.0,
            currency: "USD".to_string(),
            market_cap: 0.0,
            beta: DEFAULT_BETA,
            sector: String::new(),
            industry: String::new(),
            dividend_per_share: 0.0,
            shares_outstanding: 0.0,
        }
    }
}

/// Beta substituted when the provider has none.
pub const DEFAULT_BETA: f64 = 1.0;

/// GDP-level perpetual growth (%) substituted when no terminal rate is given.
pub const DEFAULT_TERMINAL_GROWTH: f64 = 2.5;

/// User-adjustable DCF inputs, all in percent.
///
/// The model is undefined unless `wacc > terminal_growth`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcfAssumptions {
    pub revenue_growth: f64,
    pub terminal_growth: f64,
    pub wacc: f64,
}

impl DcfAssumptions {
    pub fn is_well_defined(&self) -> bool {
        self.wacc > 0.0 && self.wacc > self.terminal_growth
    }
}

/// Confidence tier attached to a method result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn weight(&self) -> f64 {
        match self {
            Confidence::High => 3.0,
            Confidence::Medium => 2.0,
            Confidence::Low => 1.0,
        }
    }
}

/// Categorical buy/sell call derived from upside thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl Verdict {
    /// Map an upside percentage to a verdict.
    pub fn from_upside(upside_pct: f64) -> Self {
        match upside_pct {
            u if u >= 25.0 => Verdict::StrongBuy,
            u if u >= 10.0 => Verdict::Buy,
            u if u > -10.0 => Verdict::Hold,
            u if u > -25.0 => Verdict::Sell,
            _ => Verdict::StrongSell,
        }
    }

    /// Map a normalized signal score (-100 to 100) to a verdict.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 60.0 => Verdict::StrongBuy,
            s if s >= 20.0 => Verdict::Buy,
            s if s > -20.0 => Verdict::Hold,
            s if s > -60.0 => Verdict::Sell,
            _ => Verdict::StrongSell,
        }
    }

    /// Human-readable label for the verdict
    pub fn to_label(&self) -> &'static str {
        match self {
            Verdict::StrongBuy => "Strong Buy",
            Verdict::Buy => "Buy",
            Verdict::Hold => "Hold",
            Verdict::Sell => "Sell",
            Verdict::StrongSell => "Strong Sell",
        }
    }
}

/// Upside (%) of a fair value over the current price; 0 when price is unknown.
pub fn upside_pct(fair_value: f64, price: f64) -> f64 {
    if price > 0.0 {
        (fair_value - price) / price * 100.0
    } else {
        0.0
    }
}

/// Output of one valuation method for one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationMethodResult {
    pub method: String,
    pub fair_value: f64,
    pub upside: f64,
    pub confidence: Confidence,
    pub applicable: bool,
    /// Present when `applicable` is false.
    pub not_applicable_reason: Option<String>,
    pub details: serde_json::Value,
}

impl ValuationMethodResult {
    pub fn from_estimate(
        method: impl Into<String>,
        estimate: crate::Estimate,
        price: f64,
        confidence: Confidence,
        details: serde_json::Value,
    ) -> Self {
        match estimate {
            crate::Estimate::Applicable(fair_value) => Self {
                method: method.into(),
                fair_value: crate::stats::round_to(fair_value, 2),
                upside: crate::stats::round_to(upside_pct(fair_value, price), 1),
                confidence,
                applicable: true,
                not_applicable_reason: None,
                details,
            },
            crate::Estimate::NotApplicable(reason) => Self {
                method: method.into(),
                fair_value: 0.0,
                upside: 0.0,
                confidence: Confidence::Low,
                applicable: false,
                not_applicable_reason: Some(reason.to_string()),
                details,
            },
        }
    }

    /// Whether this result participates in averages.
    pub fn counts_toward_synthesis(&self) -> bool {
        self.applicable && self.fair_value > 0.0
    }
}

/// Aggregate of every method result for one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComprehensiveValuation {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub current_price: f64,
    pub currency: String,
    pub methods: Vec<ValuationMethodResult>,
    pub average_fair_value: Option<f64>,
    pub median_fair_value: Option<f64>,
    pub weighted_fair_value: Option<f64>,
    pub conservative_fair_value: Option<f64>,
    pub upside: Option<f64>,
    pub verdict: Option<Verdict>,
    pub applicable_methods: usize,
    pub summary: String,
}

/// Baseline multiples for a sector, used as the relative-valuation denominator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorAverages {
    pub pe: f64,
    pub ev_ebitda: f64,
    pub ev_sales: f64,
    pub pb: f64,
}
