//! Combine individual method results into one fair-value picture.

use chrono::Utc;
use valuation_core::{stats, upside_pct, ComprehensiveValuation, ValuationMethodResult, Verdict};

/// Fair values below this fraction of the median are treated as implausible
/// when choosing the conservative estimate.
pub const PLAUSIBILITY_FLOOR: f64 = 0.25;

/// Lowest fair value that is still at least 25% of the median.
pub fn conservative_fair_value(values: &[f64]) -> Option<f64> {
    let median = stats::median(values)?;
    values
        .iter()
        .copied()
        .filter(|v| *v >= median * PLAUSIBILITY_FLOOR)
        .reduce(f64::min)
}

pub fn synthesize(
    symbol: &str,
    current_price: f64,
    currency: &str,
    methods: Vec<ValuationMethodResult>,
) -> ComprehensiveValuation {
    let counted: Vec<&ValuationMethodResult> = methods.iter().filter(|m| m.counts_toward_synthesis()).collect();
    let values: Vec<f64> = counted.iter().map(|m| m.fair_value).collect();
    let weighted_pairs: Vec<(f64, f64)> = counted.iter().map(|m| (m.fair_value, m.confidence.weight())).collect();

    let average = stats::mean(&values);
    let median = stats::median(&values);
    let weighted = stats::weighted_mean(&weighted_pairs);
    let conservative = conservative_fair_value(&values);

    let upside = average.filter(|_| current_price > 0.0).map(|fv| upside_pct(fv, current_price));
    let verdict = upside.map(Verdict::from_upside);

    let summary = match (average, verdict) {
        (Some(avg), Some(v)) => format!(
            "{}: {} across {} method{} (average fair value {:.2} {} vs price {:.2})",
            symbol,
            v.to_label(),
            values.len(),
            if values.len() == 1 { "" } else { "s" },
            avg,
            currency,
            current_price
        ),
        (Some(avg), None) => format!("{}: average fair value {:.2} {}; current price unavailable", symbol, avg, currency),
        _ => format!("{}: no valuation method was applicable", symbol),
    };

    ComprehensiveValuation {
        symbol: symbol.to_string(),
        timestamp: Utc::now(),
        current_price,
        currency: currency.to_string(),
        applicable_methods: values.len(),
        average_fair_value: average.map(|v| stats::round_to(v, 2)),
        median_fair_value: median.map(|v| stats::round_to(v, 2)),
        weighted_fair_value: weighted.map(|v| stats::round_to(v, 2)),
        conservative_fair_value: conservative.map(|v| stats::round_to(v, 2)),
        upside: upside.map(|u| stats::round_to(u, 1)),
        verdict,
        methods,
        summary,
    }
}
