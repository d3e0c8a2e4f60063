//! Sector switchboard: classify a provider's sector/industry strings and pick
//! the valuation models that make sense for that kind of business.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectorTag {
    General,
    Financial,
    Reit,
    TechGrowth,
    Biotech,
    Cyclical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationModel {
    Dcf,
    GrahamNumber,
    BookValuePremium,
    NetNetWorkingCapital,
    Lynch,
    EarningsPowerValue,
    DividendDiscount,
    ResidualIncome,
    RelativeMultiples,
}

impl ValuationModel {
    pub fn label(&self) -> &'static str {
        match self {
            ValuationModel::Dcf => "DCF",
            ValuationModel::GrahamNumber => "Graham Number",
            ValuationModel::BookValuePremium => "Book Value Premium",
            ValuationModel::NetNetWorkingCapital => "Net-Net Working Capital",
            ValuationModel::Lynch => "Lynch Fair Value",
            ValuationModel::EarningsPowerValue => "Earnings Power Value",
            ValuationModel::DividendDiscount => "Dividend Discount",
            ValuationModel::ResidualIncome => "Residual Income",
            ValuationModel::RelativeMultiples => "Relative Multiples",
        }
    }
}

/// Relative-valuation weights per ratio; they need not sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioWeights {
    pub pe: f64,
    pub ev_ebitda: f64,
    pub ev_sales: f64,
    pub pb: f64,
}

impl Default for RatioWeights {
    fn default() -> Self {
        Self { pe: 0.30, ev_ebitda: 0.30, ev_sales: 0.20, pb: 0.20 }
    }
}

/// What to run for a sector, and what to warn the reader about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorProfile {
    pub tag: SectorTag,
    pub primary: ValuationModel,
    pub secondary: ValuationModel,
    pub excluded: Vec<ValuationModel>,
    pub ratio_weights: RatioWeights,
    pub caveats: Vec<String>,
}

impl SectorProfile {
    pub fn runs(&self, model: ValuationModel) -> bool {
        !self.excluded.contains(&model)
    }

    pub fn is_preferred(&self, model: ValuationModel) -> bool {
        self.primary == model || self.secondary == model
    }
}

/// Keyword rules in priority order; the first rule with any keyword present wins.
const RULES: &[(&[&str], SectorTag)] = &[
    (&["financial", "bank", "insurance"], SectorTag::Financial),
    (&["real estate", "reit"], SectorTag::Reit),
    (&["biotech", "pharma"], SectorTag::Biotech),
    (&["technology", "software"], SectorTag::TechGrowth),
    (&["energy", "materials"], SectorTag::Cyclical),
];

/// Classify a sector/industry pair by case-insensitive keyword match.
pub fn classify_sector(sector: &str, industry: &str) -> SectorTag {
    let haystack = format!("{} {}", sector, industry).to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| haystack.contains(kw)))
        .map(|(_, tag)| *tag)
        .unwrap_or(SectorTag::General)
}

pub fn profile_for(tag: SectorTag) -> SectorProfile {
    use ValuationModel::*;

    let (primary, secondary, excluded, ratio_weights, caveats) = match tag {
        SectorTag::General => (
            Dcf,
            RelativeMultiples,
            vec![BookValuePremium, ResidualIncome],
            RatioWeights::default(),
            vec![],
        ),
        SectorTag::Financial => (
            ResidualIncome,
            RelativeMultiples,
            vec![Dcf, NetNetWorkingCapital, EarningsPowerValue, BookValuePremium],
            RatioWeights { pe: 0.50, ev_ebitda: 0.0, ev_sales: 0.0, pb: 0.50 },
            vec![
                "DCF unreliable for banks; using Residual Income + P/B",
                "Working-capital and EV-based measures are not meaningful for balance-sheet lenders",
            ],
        ),
        SectorTag::Reit => (
            BookValuePremium,
            DividendDiscount,
            vec![GrahamNumber, Lynch, NetNetWorkingCapital, EarningsPowerValue, ResidualIncome],
            RatioWeights { pe: 0.20, ev_ebitda: 0.40, ev_sales: 0.0, pb: 0.40 },
            vec![
                "Graham Number meaningless for REITs; using book value premium proxy",
                "Depreciation depresses reported EPS; FFO-based multiples are preferred",
            ],
        ),
        SectorTag::TechGrowth => (
            Dcf,
            RelativeMultiples,
            vec![BookValuePremium, ResidualIncome],
            RatioWeights { pe: 0.20, ev_ebitda: 0.30, ev_sales: 0.40, pb: 0.10 },
            vec![
                "Terminal value dominates DCF for high-growth companies; stress-test growth assumptions",
                "Asset-based methods understate intangible-heavy businesses",
            ],
        ),
        SectorTag::Biotech => (
            RelativeMultiples,
            NetNetWorkingCapital,
            vec![GrahamNumber, Lynch, EarningsPowerValue, DividendDiscount, BookValuePremium, ResidualIncome],
            RatioWeights { pe: 0.0, ev_ebitda: 0.0, ev_sales: 0.70, pb: 0.30 },
            vec![
                "Earnings and cash flow are often negative before commercialization; DCF frequently not applicable",
                "Pipeline value (rNPV) is not modeled",
            ],
        ),
        SectorTag::Cyclical => (
            EarningsPowerValue,
            RelativeMultiples,
            vec![BookValuePremium, ResidualIncome],
            RatioWeights { pe: 0.20, ev_ebitda: 0.40, ev_sales: 0.20, pb: 0.20 },
            vec![
                "Earnings swing with the commodity cycle; EPV normalizes across available years",
                "Single-year P/E misleads at cycle peaks and troughs",
            ],
        ),
    };

    SectorProfile {
        tag,
        primary,
        secondary,
        excluded,
        ratio_weights,
        caveats: caveats.iter().map(|c| c.to_string()).collect(),
    }
}

/// Classify and look up the profile in one step.
pub fn sector_profile(sector: &str, industry: &str) -> SectorProfile {
    profile_for(classify_sector(sector, industry))
}
