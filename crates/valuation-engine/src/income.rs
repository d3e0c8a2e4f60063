//! Earnings- and income-based models: Lynch, Earnings Power Value, the Gordon
//! dividend discount model and single-stage residual income.

use valuation_core::{Estimate, NotApplicableReason};

use crate::dcf::EquityBridge;

pub const LYNCH_MAX_GROWTH: f64 = 25.0;
pub const CORPORATE_TAX_RATE: f64 = 0.21;

/// Lynch fair value: a fair P/E equal to growth plus dividend yield (both in %).
pub fn calculate_lynch_value(eps: f64, growth_rate: f64, dividend_yield: f64) -> Estimate {
    if eps <= 0.0 {
        return Estimate::NotApplicable(NotApplicableReason::NegativeEarnings);
    }
    let fair_pe = growth_rate.clamp(0.0, LYNCH_MAX_GROWTH) + dividend_yield.max(0.0);
    if fair_pe <= 0.0 {
        return Estimate::NotApplicable(NotApplicableReason::NonPositiveMultiple);
    }
    Estimate::Applicable(eps * fair_pe)
}

/// Earnings Power Value: after-tax normalized operating income capitalised at
/// WACC (%) with no growth, plus net cash, per share.
pub fn calculate_epv(normalized_operating_income: f64, wacc: f64, bridge: &EquityBridge) -> Estimate {
    if normalized_operating_income <= 0.0 {
        return Estimate::NotApplicable(NotApplicableReason::NegativeEarnings);
    }
    if wacc <= 0.0 {
        return Estimate::NotApplicable(NotApplicableReason::NonPositiveDiscountRate);
    }
    if bridge.shares_outstanding <= 0.0 {
        return Estimate::NotApplicable(NotApplicableReason::MissingSharesOutstanding);
    }
    let earnings_power = normalized_operating_income * (1.0 - CORPORATE_TAX_RATE) / (wacc / 100.0);
    let equity = earnings_power + bridge.net_cash();
    Estimate::Applicable((equity / bridge.shares_outstanding).max(0.0))
}

/// Gordon Growth DDM: `D0 * (1 + g) / (r - g)`, rates in %.
pub fn calculate_ddm(dividend_per_share: f64, cost_of_equity: f64, growth_rate: f64) -> Estimate {
    if dividend_per_share <= 0.0 {
        return Estimate::NotApplicable(NotApplicableReason::NoDividend);
    }
    if cost_of_equity <= growth_rate {
        return Estimate::NotApplicable(NotApplicableReason::DiscountRateNotAboveGrowth);
    }
    let r = cost_of_equity / 100.0;
    let g = growth_rate / 100.0;
    Estimate::Applicable(dividend_per_share * (1.0 + g) / (r - g))
}

/// Single-stage residual income: `B + (ROE - r) * B / (r - g)`, rates in %.
///
/// Book value is the anchor; excess returns on equity are capitalised as a
/// growing perpetuity.
pub fn calculate_residual_income(
    book_value_per_share: f64,
    roe: f64,
    cost_of_equity: f64,
    growth_rate: f64,
) -> Estimate {
    if book_value_per_share <= 0.0 {
        return Estimate::NotApplicable(NotApplicableReason::NegativeBookValue);
    }
    if cost_of_equity <= growth_rate {
        return Estimate::NotApplicable(NotApplicableReason::DiscountRateNotAboveGrowth);
    }
    let r = cost_of_equity / 100.0;
    let g = growth_rate / 100.0;
    let excess = (roe / 100.0 - r) * book_value_per_share / (r - g);
    Estimate::Applicable((book_value_per_share + excess).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lynch() {
        assert_relative_eq!(calculate_lynch_value(2.0, 15.0, 2.0).value(), 34.0);
        // growth capped at 25
        assert_relative_eq!(calculate_lynch_value(2.0, 60.0, 0.0).value(), 50.0);
        assert!(!calculate_lynch_value(-1.0, 15.0, 0.0).is_applicable());
        assert_eq!(
            calculate_lynch_value(2.0, -5.0, 0.0).reason(),
            Some(NotApplicableReason::NonPositiveMultiple)
        );
    }

    #[test]
    fn test_epv() {
        let bridge = EquityBridge { cash: 100.0, investments: 0.0, total_debt: 50.0, shares_outstanding: 10.0 };
        // 100 * 0.79 / 0.10 = 790, + 50 net cash = 840, / 10
        assert_relative_eq!(calculate_epv(100.0, 10.0, &bridge).value(), 84.0, epsilon = 1e-9);
        assert!(!calculate_epv(-5.0, 10.0, &bridge).is_applicable());
        assert!(!calculate_epv(100.0, 0.0, &bridge).is_applicable());
    }

    #[test]
    fn test_ddm() {
        // 2 * 1.025 / (0.09 - 0.025)
        assert_relative_eq!(calculate_ddm(2.0, 9.0, 2.5).value(), 31.538461, epsilon = 1e-5);
        assert_eq!(calculate_ddm(0.0, 9.0, 2.5).reason(), Some(NotApplicableReason::NoDividend));
        assert_eq!(
            calculate_ddm(2.0, 2.0, 2.5).reason(),
            Some(NotApplicableReason::DiscountRateNotAboveGrowth)
        );
    }

    #[test]
    fn test_residual_income() {
        // ROE equal to cost of equity is worth exactly book
        assert_relative_eq!(calculate_residual_income(50.0, 10.0, 10.0, 2.5).value(), 50.0, epsilon = 1e-9);
        // 50 + (0.15 - 0.10) * 50 / 0.075
        assert_relative_eq!(
            calculate_residual_income(50.0, 15.0, 10.0, 2.5).value(),
            83.333333,
            epsilon = 1e-5
        );
        assert_eq!(calculate_residual_income(50.0, -100.0, 10.0, 2.5).value(), 0.0);
        assert!(!calculate_residual_income(-1.0, 15.0, 10.0, 2.5).is_applicable());
    }
}
