//! Discount rate from CAPM.
//!
//! The cost of equity stands in for WACC: `risk_free + beta * equity_risk_premium`,
//! clamped to a sane band and rounded to one decimal place.

use serde::{Deserialize, Serialize};
use valuation_core::{stats::round_to, DEFAULT_BETA};

pub const RISK_FREE_RATE: f64 = 4.5;
pub const EQUITY_RISK_PREMIUM: f64 = 5.5;
pub const MIN_WACC: f64 = 6.0;
pub const MAX_WACC: f64 = 15.0;

/// Macro inputs to CAPM, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapmParams {
    pub risk_free_rate: f64,
    pub equity_risk_premium: f64,
}

impl Default for CapmParams {
    fn default() -> Self {
        Self {
            risk_free_rate: RISK_FREE_RATE,
            equity_risk_premium: EQUITY_RISK_PREMIUM,
        }
    }
}

impl CapmParams {
    /// Unclamped CAPM required return.
    pub fn cost_of_equity(&self, beta: Option<f64>) -> f64 {
        self.risk_free_rate + effective_beta(beta) * self.equity_risk_premium
    }

    /// CAPM discount rate clamped to [6, 15] and rounded to one decimal.
    pub fn wacc(&self, beta: Option<f64>) -> f64 {
        round_to(self.cost_of_equity(beta).clamp(MIN_WACC, MAX_WACC), 1)
    }
}

/// WACC with the default macro constants.
pub fn calculate_wacc(beta: Option<f64>) -> f64 {
    CapmParams::default().wacc(beta)
}

fn effective_beta(beta: Option<f64>) -> f64 {
    match beta {
        Some(b) if b.is_finite() => b,
        _ => DEFAULT_BETA,
    }
}
