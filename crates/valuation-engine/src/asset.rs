//! Asset-based valuation: Graham Number, net-net working capital, and the
//! book-value premium used in place of Graham for REITs.

use valuation_core::{Estimate, FinancialStatementSnapshot, NotApplicableReason};

use crate::switchboard::SectorTag;

pub const GRAHAM_MULTIPLIER: f64 = 22.5;
pub const REIT_BOOK_PREMIUM: f64 = 1.1;

/// `sqrt(22.5 * EPS * BVPS)`. Loss-makers and negative book value are out of model.
pub fn calculate_graham_number(eps: f64, book_value_per_share: f64) -> Estimate {
    if eps < 0.0 {
        return Estimate::NotApplicable(NotApplicableReason::NegativeEarnings);
    }
    if book_value_per_share < 0.0 {
        return Estimate::NotApplicable(NotApplicableReason::NegativeBookValue);
    }
    Estimate::Applicable((GRAHAM_MULTIPLIER * eps * book_value_per_share).sqrt())
}

/// Book value with a 10% premium.
pub fn calculate_book_value_premium(book_value_per_share: f64) -> Estimate {
    if book_value_per_share <= 0.0 {
        return Estimate::NotApplicable(NotApplicableReason::NegativeBookValue);
    }
    Estimate::Applicable(book_value_per_share * REIT_BOOK_PREMIUM)
}

/// Graham Number, except for REITs where reported EPS is depressed by
/// depreciation and the book-value premium is used instead.
pub fn asset_based_value(sector: SectorTag, eps: f64, book_value_per_share: f64) -> Estimate {
    match sector {
        SectorTag::Reit => calculate_book_value_premium(book_value_per_share),
        _ => calculate_graham_number(eps, book_value_per_share),
    }
}

/// Liquidation-value floor:
/// `(cash + 0.75 * receivables + 0.5 * inventory - total liabilities) / shares`, floored at 0.
pub fn calculate_nnwc(
    cash: f64,
    receivables: f64,
    inventory: f64,
    total_liabilities: f64,
    shares_outstanding: f64,
) -> Estimate {
    if shares_outstanding <= 0.0 {
        return Estimate::NotApplicable(NotApplicableReason::MissingSharesOutstanding);
    }
    let net_net = cash + 0.75 * receivables + 0.5 * inventory - total_liabilities;
    Estimate::Applicable((net_net / shares_outstanding).max(0.0))
}

/// NNWC from a statement snapshot, preferring `shares_override` when the
/// statement carries no share count.
pub fn nnwc_from_snapshot(snapshot: &FinancialStatementSnapshot, shares_override: f64) -> Estimate {
    let shares = if snapshot.shares_outstanding > 0.0 {
        snapshot.shares_outstanding
    } else {
        shares_override
    };
    calculate_nnwc(
        snapshot.cash + snapshot.short_term_investments,
        snapshot.receivables,
        snapshot.inventory,
        snapshot.total_liabilities,
        shares,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_graham_reference() {
        let v = calculate_graham_number(5.0, 20.0).value();
        assert_relative_eq!(v, 2250f64.sqrt());
        assert_relative_eq!(v, 47.434, epsilon = 1e-3);
    }

    #[test]
    fn test_graham_rejects_negatives() {
        assert_eq!(calculate_graham_number(-1.0, 20.0).reason(), Some(NotApplicableReason::NegativeEarnings));
        assert_eq!(calculate_graham_number(5.0, -3.0).reason(), Some(NotApplicableReason::NegativeBookValue));
    }

    #[test]
    fn test_reit_uses_book_premium() {
        let v = asset_based_value(SectorTag::Reit, 0.5, 40.0).value();
        assert_relative_eq!(v, 44.0, epsilon = 1e-9);
        let v = asset_based_value(SectorTag::General, 5.0, 20.0).value();
        assert_relative_eq!(v, 2250f64.sqrt());
    }

    #[test]
    fn test_nnwc() {
        // (100 + 75 + 50 - 125) / 10
        let v = calculate_nnwc(100.0, 100.0, 100.0, 125.0, 10.0).value();
        assert_relative_eq!(v, 10.0);
        assert_eq!(calculate_nnwc(10.0, 0.0, 0.0, 500.0, 10.0).value(), 0.0);
        assert!(!calculate_nnwc(10.0, 0.0, 0.0, 5.0, 0.0).is_applicable());
    }

    #[test]
    fn test_nnwc_from_snapshot_uses_override_shares() {
        let s = FinancialStatementSnapshot {
            cash: 80.0,
            short_term_investments: 20.0,
            receivables: 100.0,
            inventory: 100.0,
            total_liabilities: 125.0,
            ..Default::default()
        };
        assert_relative_eq!(nnwc_from_snapshot(&s, 10.0).value(), 10.0);
    }

    proptest! {
        #[test]
        fn prop_graham_sign_rule(eps in -50.0f64..50.0, bvps in -100.0f64..100.0) {
            let v = calculate_graham_number(eps, bvps).value();
            if eps < 0.0 || bvps < 0.0 {
                prop_assert_eq!(v, 0.0);
            } else {
                prop_assert!((v - (22.5 * eps * bvps).sqrt()).abs() < 1e-9);
            }
        }
    }
}
