//! Market-implied growth: the growth rate at which the DCF reproduces a price.

use serde::{Deserialize, Serialize};
use valuation_core::{stats::round_to, DcfAssumptions, NotApplicableReason};

use crate::dcf::calculate_dcf;

pub const MIN_GROWTH: f64 = -20.0;
pub const MAX_GROWTH: f64 = 100.0;
pub const MAX_ITERATIONS: u32 = 50;
pub const PRICE_TOLERANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedGrowth {
    /// Display rate (%), rounded to one decimal.
    pub growth_rate: f64,
    /// Unrounded midpoint of the final bracket.
    pub exact_growth_rate: f64,
    /// DCF value at `exact_growth_rate`.
    pub fitted_price: f64,
    pub iterations: u32,
    /// False when the price lies outside the search domain or the
    /// tolerance was not reached; the rate is still the best estimate.
    pub converged: bool,
}

/// Bisection over [-20%, 100%] growth for the rate whose per-share DCF
/// matches `target_price` within 0.1.
///
/// The DCF is non-decreasing in growth when `wacc > terminal_growth`, which
/// the search relies on. Non-convergence is not an error.
pub fn calculate_reverse_dcf(
    target_price: f64,
    fcf_per_share: f64,
    wacc: f64,
    terminal_growth: f64,
) -> Result<ImpliedGrowth, NotApplicableReason> {
    if target_price <= 0.0 {
        return Err(NotApplicableReason::MissingPrice);
    }
    if fcf_per_share <= 0.0 {
        return Err(NotApplicableReason::NonPositiveCashFlow);
    }
    if wacc <= 0.0 {
        return Err(NotApplicableReason::NonPositiveDiscountRate);
    }
    if wacc <= terminal_growth {
        return Err(NotApplicableReason::DiscountRateNotAboveGrowth);
    }

    let value_at = |growth: f64| {
        let assumptions = DcfAssumptions { revenue_growth: growth, terminal_growth, wacc };
        calculate_dcf(&assumptions, fcf_per_share).value()
    };

    let mut low = MIN_GROWTH;
    let mut high = MAX_GROWTH;
    let mut mid = (low + high) / 2.0;
    let mut fitted = value_at(mid);
    let mut iterations = 0;
    let mut converged = false;

    while iterations < MAX_ITERATIONS {
        iterations += 1;
        mid = (low + high) / 2.0;
        fitted = value_at(mid);

        if (fitted - target_price).abs() < PRICE_TOLERANCE {
            converged = true;
            break;
        }
        if fitted < target_price {
            low = mid;
        } else {
            high = mid;
        }
    }

    Ok(ImpliedGrowth {
        growth_rate: round_to(mid, 1),
        exact_growth_rate: mid,
        fitted_price: fitted,
        iterations,
        converged,
    })
}
