//! Relative valuation against sector-average multiples.
//!
//! Each ratio re-prices the company's own fundamental (EPS, EBITDA, revenue,
//! book value) at the sector multiple. EV-based ratios are bridged back to
//! equity per share through net debt.

use serde::{Deserialize, Serialize};
use valuation_core::{stats, upside_pct, Estimate, NotApplicableReason, SectorAverages, Verdict};

use crate::switchboard::RatioWeights;

/// Market-wide baseline used when a sector is not in the table.
pub const MARKET_AVERAGES: SectorAverages = SectorAverages { pe: 20.0, ev_ebitda: 13.0, ev_sales: 2.5, pb: 3.5 };

/// Static sector baselines keyed by provider sector names and common aliases.
const SECTOR_TABLE: &[(&[&str], SectorAverages)] = &[
    (&["technology", "information technology"], SectorAverages { pe: 28.0, ev_ebitda: 20.0, ev_sales: 6.0, pb: 8.0 }),
    (&["healthcare", "health care"], SectorAverages { pe: 22.0, ev_ebitda: 15.0, ev_sales: 4.0, pb: 4.5 }),
    (&["financial services", "financials", "financial"], SectorAverages { pe: 13.0, ev_ebitda: 10.0, ev_sales: 3.0, pb: 1.3 }),
    (&["real estate"], SectorAverages { pe: 35.0, ev_ebitda: 18.0, ev_sales: 8.0, pb: 2.0 }),
    (&["energy"], SectorAverages { pe: 11.0, ev_ebitda: 6.0, ev_sales: 1.3, pb: 1.8 }),
    (&["basic materials", "materials"], SectorAverages { pe: 15.0, ev_ebitda: 9.0, ev_sales: 1.6, pb: 2.0 }),
    (&["industrials"], SectorAverages { pe: 20.0, ev_ebitda: 13.0, ev_sales: 2.0, pb: 4.0 }),
    (&["consumer cyclical", "consumer discretionary"], SectorAverages { pe: 20.0, ev_ebitda: 12.0, ev_sales: 1.5, pb: 4.5 }),
    (&["consumer defensive", "consumer staples"], SectorAverages { pe: 22.0, ev_ebitda: 14.0, ev_sales: 1.8, pb: 5.0 }),
    (&["utilities"], SectorAverages { pe: 18.0, ev_ebitda: 11.0, ev_sales: 2.5, pb: 1.9 }),
    (&["communication services", "telecommunication services"], SectorAverages { pe: 19.0, ev_ebitda: 11.0, ev_sales: 3.0, pb: 3.2 }),
];

/// Look up baseline multiples for a provider sector name.
pub fn sector_averages(sector: &str) -> SectorAverages {
    let key = sector.trim().to_lowercase();
    SECTOR_TABLE
        .iter()
        .find(|(aliases, _)| aliases.iter().any(|a| *a == key))
        .map(|(_, averages)| *averages)
        .unwrap_or(MARKET_AVERAGES)
}

/// Multiples observed for one peer company.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerMultiples {
    pub pe: f64,
    pub ev_ebitda: f64,
    pub ev_sales: f64,
    pub pb: f64,
}

/// Harmonic-mean averages across peers, ignoring non-positive multiples.
/// Ratios with no usable peer keep the `fallback` value.
pub fn averages_from_peers(peers: &[PeerMultiples], fallback: SectorAverages) -> SectorAverages {
    let collect = |f: fn(&PeerMultiples) -> f64| peers.iter().map(f).collect::<Vec<f64>>();
    SectorAverages {
        pe: stats::harmonic_mean(&collect(|p| p.pe)).unwrap_or(fallback.pe),
        ev_ebitda: stats::harmonic_mean(&collect(|p| p.ev_ebitda)).unwrap_or(fallback.ev_ebitda),
        ev_sales: stats::harmonic_mean(&collect(|p| p.ev_sales)).unwrap_or(fallback.ev_sales),
        pb: stats::harmonic_mean(&collect(|p| p.pb)).unwrap_or(fallback.pb),
    }
}

/// Company fundamentals the ratios are built from (per-share where noted).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RelativeInputs {
    pub price: f64,
    pub eps: f64,
    pub book_value_per_share: f64,
    pub ebitda: f64,
    pub revenue: f64,
    pub total_debt: f64,
    pub cash: f64,
    pub shares_outstanding: f64,
    pub market_cap: f64,
}

impl RelativeInputs {
    pub fn enterprise_value(&self) -> Option<f64> {
        let equity = if self.market_cap > 0.0 {
            self.market_cap
        } else {
            self.price * self.shares_outstanding
        };
        if equity > 0.0 {
            Some(equity + self.total_debt - self.cash)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatioKind {
    #[serde(rename = "P/E")]
    PriceEarnings,
    #[serde(rename = "EV/EBITDA")]
    EvEbitda,
    #[serde(rename = "EV/Sales")]
    EvSales,
    #[serde(rename = "P/B")]
    PriceBook,
}

impl RatioKind {
    pub fn label(&self) -> &'static str {
        match self {
            RatioKind::PriceEarnings => "P/E",
            RatioKind::EvEbitda => "EV/EBITDA",
            RatioKind::EvSales => "EV/Sales",
            RatioKind::PriceBook => "P/B",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioValuation {
    pub ratio: RatioKind,
    pub company_multiple: Option<f64>,
    pub sector_multiple: f64,
    pub fair_value: Estimate,
    pub upside: Option<f64>,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelativeValuation {
    pub sector_averages: SectorAverages,
    pub ratios: Vec<RatioValuation>,
    pub fair_value: Estimate,
    pub upside: Option<f64>,
    pub verdict: Option<Verdict>,
}

fn equity_from_ev(implied_ev: f64, inputs: &RelativeInputs) -> Estimate {
    if inputs.shares_outstanding <= 0.0 {
        return Estimate::NotApplicable(NotApplicableReason::MissingSharesOutstanding);
    }
    let equity = implied_ev - inputs.total_debt + inputs.cash;
    if equity <= 0.0 {
        return Estimate::NotApplicable(NotApplicableReason::NonPositiveMultiple);
    }
    Estimate::Applicable(equity / inputs.shares_outstanding)
}

fn ratio_fair_value(kind: RatioKind, inputs: &RelativeInputs, multiple: f64) -> Estimate {
    if multiple <= 0.0 {
        return Estimate::NotApplicable(NotApplicableReason::NonPositiveMultiple);
    }
    match kind {
        RatioKind::PriceEarnings if inputs.eps > 0.0 => Estimate::Applicable(inputs.eps * multiple),
        RatioKind::PriceEarnings => Estimate::NotApplicable(NotApplicableReason::NegativeEarnings),
        RatioKind::PriceBook if inputs.book_value_per_share > 0.0 => {
            Estimate::Applicable(inputs.book_value_per_share * multiple)
        }
        RatioKind::PriceBook => Estimate::NotApplicable(NotApplicableReason::NegativeBookValue),
        RatioKind::EvEbitda if inputs.ebitda > 0.0 => equity_from_ev(inputs.ebitda * multiple, inputs),
        RatioKind::EvSales if inputs.revenue > 0.0 => equity_from_ev(inputs.revenue * multiple, inputs),
        RatioKind::EvEbitda | RatioKind::EvSales => Estimate::NotApplicable(NotApplicableReason::NonPositiveMultiple),
    }
}

fn company_multiple(kind: RatioKind, inputs: &RelativeInputs) -> Option<f64> {
    let ratio = |num: Option<f64>, den: f64| num.filter(|_| den > 0.0).map(|n| n / den);
    let price = Some(inputs.price).filter(|p| *p > 0.0);
    match kind {
        RatioKind::PriceEarnings => ratio(price, inputs.eps),
        RatioKind::PriceBook => ratio(price, inputs.book_value_per_share),
        RatioKind::EvEbitda => ratio(inputs.enterprise_value(), inputs.ebitda),
        RatioKind::EvSales => ratio(inputs.enterprise_value(), inputs.revenue),
    }
}

/// Re-price the company at sector multiples and blend by weight.
///
/// Ratios with zero weight are reported but excluded from the blend; the
/// remaining weights are renormalized over the applicable ratios.
pub fn relative_valuation(
    inputs: &RelativeInputs,
    averages: &SectorAverages,
    weights: &RatioWeights,
) -> RelativeValuation {
    let plan = [
        (RatioKind::PriceEarnings, averages.pe, weights.pe),
        (RatioKind::EvEbitda, averages.ev_ebitda, weights.ev_ebitda),
        (RatioKind::EvSales, averages.ev_sales, weights.ev_sales),
        (RatioKind::PriceBook, averages.pb, weights.pb),
    ];

    let ratios: Vec<RatioValuation> = plan
        .iter()
        .map(|&(ratio, sector_multiple, weight)| {
            let fair_value = ratio_fair_value(ratio, inputs, sector_multiple);
            RatioValuation {
                ratio,
                company_multiple: company_multiple(ratio, inputs),
                sector_multiple,
                fair_value,
                upside: fair_value
                    .applicable()
                    .filter(|_| inputs.price > 0.0)
                    .map(|fv| upside_pct(fv, inputs.price)),
                weight,
            }
        })
        .collect();

    let weighted: Vec<(f64, f64)> = ratios
        .iter()
        .filter(|r| r.weight > 0.0)
        .filter_map(|r| r.fair_value.applicable().filter(|v| *v > 0.0).map(|v| (v, r.weight)))
        .collect();

    let fair_value = match stats::weighted_mean(&weighted) {
        Some(v) => Estimate::Applicable(v),
        None => Estimate::NotApplicable(NotApplicableReason::NonPositiveMultiple),
    };
    let upside = fair_value
        .applicable()
        .filter(|_| inputs.price > 0.0)
        .map(|fv| upside_pct(fv, inputs.price));

    RelativeValuation {
        sector_averages: *averages,
        ratios,
        fair_value,
        upside,
        verdict: upside.map(Verdict::from_upside),
    }
}
