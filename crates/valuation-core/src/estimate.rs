use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a valuation formula declined to produce a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotApplicableReason {
    NonPositiveCashFlow,
    NonPositiveDiscountRate,
    DiscountRateNotAboveGrowth,
    NegativeEarnings,
    NegativeBookValue,
    MissingSharesOutstanding,
    NoDividend,
    NonPositiveMultiple,
    MissingPrice,
    ExcludedForSector,
}

impl NotApplicableReason {
    pub fn describe(&self) -> &'static str {
        match self {
            NotApplicableReason::NonPositiveCashFlow => "free cash flow is not positive",
            NotApplicableReason::NonPositiveDiscountRate => "discount rate must be positive",
            NotApplicableReason::DiscountRateNotAboveGrowth => {
                "discount rate must exceed the perpetual growth rate"
            }
            NotApplicableReason::NegativeEarnings => "earnings are not positive",
            NotApplicableReason::NegativeBookValue => "book value is not positive",
            NotApplicableReason::MissingSharesOutstanding => "shares outstanding unavailable",
            NotApplicableReason::NoDividend => "company pays no dividend",
            NotApplicableReason::NonPositiveMultiple => "underlying metric or multiple is not positive",
            NotApplicableReason::MissingPrice => "current price unavailable",
            NotApplicableReason::ExcludedForSector => "method not meaningful for this sector",
        }
    }
}

impl fmt::Display for NotApplicableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Outcome of a single valuation formula.
///
/// Formulas never fail on out-of-domain input; they report that the model does
/// not apply. [`Estimate::value`] collapses this to the `0.0` sentinel that
/// dashboards filter out before averaging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Estimate {
    Applicable(f64),
    NotApplicable(NotApplicableReason),
}

impl Estimate {
    pub fn value(&self) -> f64 {
        match self {
            Estimate::Applicable(v) => *v,
            Estimate::NotApplicable(_) => 0.0,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Estimate::Applicable(_))
    }

    pub fn applicable(&self) -> Option<f64> {
        match self {
            Estimate::Applicable(v) => Some(*v),
            Estimate::NotApplicable(_) => None,
        }
    }

    pub fn reason(&self) -> Option<NotApplicableReason> {
        match self {
            Estimate::Applicable(_) => None,
            Estimate::NotApplicable(r) => Some(*r),
        }
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Estimate::Applicable(v) => Estimate::Applicable(f(v)),
            other => other,
        }
    }
}

impl From<NotApplicableReason> for Estimate {
    fn from(reason: NotApplicableReason) -> Self {
        Estimate::NotApplicable(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_value() {
        assert_eq!(Estimate::Applicable(12.5).value(), 12.5);
        assert_eq!(Estimate::NotApplicable(NotApplicableReason::NoDividend).value(), 0.0);
    }

    #[test]
    fn test_map_keeps_reason() {
        let e = Estimate::from(NotApplicableReason::NegativeEarnings).map(|v| v * 2.0);
        assert_eq!(e.reason(), Some(NotApplicableReason::NegativeEarnings));
        assert_eq!(Estimate::Applicable(2.0).map(|v| v * 2.0).applicable(), Some(4.0));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Estimate::Applicable(1.5)).unwrap();
        assert_eq!(json["status"], "applicable");
        assert_eq!(json["value"], 1.5);
        let json = serde_json::to_value(Estimate::from(NotApplicableReason::NoDividend)).unwrap();
        assert_eq!(json["value"], "no_dividend");
    }
}
