//! Two-stage discounted cash flow.
//!
//! Stage one projects five years of free cash flow whose growth decays
//! linearly from the initial rate toward the terminal rate. Stage two is a
//! Gordon Growth perpetuity on the final projected year.

use serde::{Deserialize, Serialize};
use valuation_core::{DcfAssumptions, Estimate, NotApplicableReason};

pub const PROJECTION_YEARS: u32 = 5;

/// One explicitly projected year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedYear {
    pub year: u32,
    pub growth_rate: f64,
    pub cash_flow: f64,
    pub present_value: f64,
}

/// Full working of a DCF run, for display next to the headline number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfBreakdown {
    pub years: Vec<ProjectedYear>,
    pub sum_of_present_values: f64,
    pub terminal_value: f64,
    pub present_terminal_value: f64,
    pub value: f64,
}

impl DcfBreakdown {
    /// Share of the total value contributed by the terminal perpetuity.
    pub fn terminal_weight(&self) -> f64 {
        if self.value > 0.0 {
            self.present_terminal_value / self.value
        } else {
            0.0
        }
    }
}

/// Growth rate (%) applied in `year` (1-based).
///
/// Year 1 grows at the initial rate; each later year steps a fifth of the way
/// toward the terminal rate. Years outside the projection window are clamped
/// to it.
pub fn year_growth_rate(initial: f64, terminal: f64, year: u32) -> f64 {
    let year = year.clamp(1, PROJECTION_YEARS);
    let years_remaining = (PROJECTION_YEARS - year + 1) as f64;
    terminal + (initial - terminal) * (years_remaining / PROJECTION_YEARS as f64)
}

/// Project and discount `base_cash_flow`. Works for per-share or aggregate flows.
pub fn dcf_breakdown(
    assumptions: &DcfAssumptions,
    base_cash_flow: f64,
) -> Result<DcfBreakdown, NotApplicableReason> {
    if base_cash_flow <= 0.0 {
        return Err(NotApplicableReason::NonPositiveCashFlow);
    }
    if assumptions.wacc <= 0.0 {
        return Err(NotApplicableReason::NonPositiveDiscountRate);
    }
    if assumptions.wacc <= assumptions.terminal_growth {
        return Err(NotApplicableReason::DiscountRateNotAboveGrowth);
    }

    let wacc = assumptions.wacc / 100.0;
    let terminal = assumptions.terminal_growth / 100.0;

    let mut cash_flow = base_cash_flow;
    let mut years = Vec::with_capacity(PROJECTION_YEARS as usize);
    for year in 1..=PROJECTION_YEARS {
        let growth_rate = year_growth_rate(assumptions.revenue_growth, assumptions.terminal_growth, year);
        cash_flow *= 1.0 + growth_rate / 100.0;
        let present_value = cash_flow / (1.0 + wacc).powi(year as i32);
        years.push(ProjectedYear { year, growth_rate, cash_flow, present_value });
    }

    let sum_of_present_values: f64 = years.iter().map(|y| y.present_value).sum();
    let terminal_value = cash_flow * (1.0 + terminal) / (wacc - terminal);
    let present_terminal_value = terminal_value / (1.0 + wacc).powi(PROJECTION_YEARS as i32);
    let value = (sum_of_present_values + present_terminal_value).max(0.0);

    Ok(DcfBreakdown {
        years,
        sum_of_present_values,
        terminal_value,
        present_terminal_value,
        value,
    })
}

/// Per-share DCF fair value.
pub fn calculate_dcf(assumptions: &DcfAssumptions, fcf_per_share: f64) -> Estimate {
    match dcf_breakdown(assumptions, fcf_per_share) {
        Ok(b) => Estimate::Applicable(b.value),
        Err(reason) => Estimate::NotApplicable(reason),
    }
}

/// Balance-sheet items that bridge enterprise value to equity value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EquityBridge {
    pub cash: f64,
    pub investments: f64,
    pub total_debt: f64,
    pub shares_outstanding: f64,
}

impl EquityBridge {
    pub fn net_cash(&self) -> f64 {
        self.cash + self.investments - self.total_debt
    }

    /// Net cash per share, zero without a share count.
    pub fn net_cash_per_share(&self) -> f64 {
        if self.shares_outstanding > 0.0 {
            self.net_cash() / self.shares_outstanding
        } else {
            0.0
        }
    }
}

/// Enterprise-level DCF on aggregate free cash flow, bridged to a per-share
/// equity value. Floored at zero when debt exceeds enterprise value plus cash.
pub fn calculate_full_dcf(
    assumptions: &DcfAssumptions,
    aggregate_fcf: f64,
    bridge: &EquityBridge,
) -> Estimate {
    if bridge.shares_outstanding <= 0.0 {
        return Estimate::NotApplicable(NotApplicableReason::MissingSharesOutstanding);
    }
    match dcf_breakdown(assumptions, aggregate_fcf) {
        Ok(b) => {
            let equity_value = b.value + bridge.net_cash();
            Estimate::Applicable((equity_value / bridge.shares_outstanding).max(0.0))
        }
        Err(reason) => Estimate::NotApplicable(reason),
    }
}
