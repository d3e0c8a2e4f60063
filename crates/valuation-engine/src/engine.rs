use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use valuation_core::{
    stats, AnalysisError, ComprehensiveValuation, Confidence, DcfAssumptions, Estimate,
    FinancialStatementSnapshot, MarketSnapshot, NotApplicableReason, ValuationMethodResult,
    DEFAULT_TERMINAL_GROWTH,
};

use crate::asset::{asset_based_value, nnwc_from_snapshot};
use crate::dcf::{calculate_full_dcf, dcf_breakdown};
use crate::income::{calculate_ddm, calculate_epv, calculate_lynch_value, calculate_residual_income};
use crate::metrics::CompanyMetrics;
use crate::relative::{sector_averages, relative_valuation, RelativeValuation};
use crate::reverse_dcf::{calculate_reverse_dcf, ImpliedGrowth};
use crate::switchboard::{sector_profile, SectorProfile, SectorTag, ValuationModel};
use crate::synthesis::synthesize;
use crate::wacc::CapmParams;

/// Revenue growth assumed when the history is too short to measure.
pub const FALLBACK_GROWTH: f64 = 5.0;
pub const MIN_DEFAULT_GROWTH: f64 = -5.0;
pub const MAX_DEFAULT_GROWTH: f64 = 20.0;

/// Caller-supplied overrides for the DCF assumptions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AssumptionOverrides {
    pub revenue_growth: Option<f64>,
    pub terminal_growth: Option<f64>,
    pub wacc: Option<f64>,
}

/// Everything computed for one company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyValuation {
    #[serde(flatten)]
    pub valuation: ComprehensiveValuation,
    pub sector: SectorProfile,
    pub assumptions: DcfAssumptions,
    /// Growth at which the net-cash-bridged DCF reproduces the market price.
    pub implied_growth: Option<ImpliedGrowth>,
    pub relative: RelativeValuation,
    pub metrics: CompanyMetrics,
}

/// Runs every method the sector switchboard allows and synthesizes the results.
#[derive(Debug, Clone, Default)]
pub struct ValuationEngine {
    capm: CapmParams,
}

impl ValuationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capm(capm: CapmParams) -> Self {
        Self { capm }
    }

    pub fn capm(&self) -> &CapmParams {
        &self.capm
    }

    /// Resolve DCF assumptions: overrides first, then history, then defaults.
    pub fn resolve_assumptions(
        &self,
        market: &MarketSnapshot,
        metrics: &CompanyMetrics,
        overrides: &AssumptionOverrides,
    ) -> DcfAssumptions {
        let historical = metrics
            .revenue_growth
            .map(|g| g.clamp(MIN_DEFAULT_GROWTH, MAX_DEFAULT_GROWTH))
            .unwrap_or(FALLBACK_GROWTH);
        DcfAssumptions {
            revenue_growth: overrides.revenue_growth.unwrap_or(historical),
            terminal_growth: overrides.terminal_growth.unwrap_or(DEFAULT_TERMINAL_GROWTH),
            wacc: overrides.wacc.unwrap_or_else(|| self.capm.wacc(Some(market.beta))),
        }
    }

    pub fn value_company(
        &self,
        market: &MarketSnapshot,
        statements: &[FinancialStatementSnapshot],
        overrides: &AssumptionOverrides,
    ) -> Result<CompanyValuation, AnalysisError> {
        if !market.price.is_finite() || market.price < 0.0 {
            return Err(AnalysisError::InvalidData(format!("Invalid price {}", market.price)));
        }

        let metrics = CompanyMetrics::derive(market, statements)?;
        let profile = sector_profile(&market.sector, &market.industry);
        let assumptions = self.resolve_assumptions(market, &metrics, overrides);
        let cost_of_equity = self.capm.cost_of_equity(Some(market.beta));
        let price = market.price;

        debug!(
            symbol = %market.symbol,
            sector = ?profile.tag,
            wacc = assumptions.wacc,
            growth = assumptions.revenue_growth,
            "Running valuation methods"
        );

        let averages = sector_averages(&market.sector);
        let relative = relative_valuation(&metrics.relative_inputs(market), &averages, &profile.ratio_weights);

        let mut methods = Vec::new();
        let mut push = |model: ValuationModel, estimate: Estimate, confidence: Confidence, details: serde_json::Value| {
            let estimate = if profile.runs(model) {
                estimate
            } else {
                debug!(symbol = %market.symbol, model = model.label(), "Skipped for sector");
                Estimate::NotApplicable(NotApplicableReason::ExcludedForSector)
            };
            let confidence = if model == profile.primary { Confidence::High } else { confidence };
            methods.push(ValuationMethodResult::from_estimate(model.label(), estimate, price, confidence, details));
        };

        // --- DCF (enterprise FCF bridged to equity) ---
        let breakdown = dcf_breakdown(&assumptions, metrics.free_cash_flow).ok();
        push(
            ValuationModel::Dcf,
            calculate_full_dcf(&assumptions, metrics.free_cash_flow, &metrics.bridge),
            Confidence::Medium,
            json!({
                "assumptions": assumptions,
                "free_cash_flow": metrics.free_cash_flow,
                "fcf_per_share": metrics.fcf_per_share,
                "net_cash": metrics.bridge.net_cash(),
                "terminal_weight": breakdown.as_ref().map(|b| stats::round_to(b.terminal_weight(), 3)),
                "projection": breakdown.as_ref().map(|b| &b.years),
            }),
        );

        // --- Asset-based (book premium stands in for Graham on REITs) ---
        let asset_model = if profile.tag == SectorTag::Reit {
            ValuationModel::BookValuePremium
        } else {
            ValuationModel::GrahamNumber
        };
        push(
            asset_model,
            asset_based_value(profile.tag, metrics.eps, metrics.book_value_per_share),
            Confidence::Medium,
            json!({ "eps": metrics.eps, "book_value_per_share": metrics.book_value_per_share }),
        );
        push(
            ValuationModel::NetNetWorkingCapital,
            nnwc_from_snapshot(&statements[0], metrics.shares_outstanding),
            Confidence::Low,
            json!({ "shares_outstanding": metrics.shares_outstanding }),
        );

        // --- Earnings and income ---
        let lynch_growth = metrics.eps_growth.or(metrics.revenue_growth).unwrap_or(0.0);
        push(
            ValuationModel::Lynch,
            calculate_lynch_value(metrics.eps, lynch_growth, metrics.dividend_yield),
            Confidence::Low,
            json!({ "growth": lynch_growth, "dividend_yield": metrics.dividend_yield }),
        );
        push(
            ValuationModel::EarningsPowerValue,
            calculate_epv(metrics.normalized_operating_income, assumptions.wacc, &metrics.bridge),
            Confidence::Medium,
            json!({ "normalized_operating_income": metrics.normalized_operating_income }),
        );
        push(
            ValuationModel::DividendDiscount,
            calculate_ddm(metrics.dividend_per_share, cost_of_equity, assumptions.terminal_growth),
            Confidence::Medium,
            json!({ "dividend_per_share": metrics.dividend_per_share, "cost_of_equity": cost_of_equity }),
        );
        push(
            ValuationModel::ResidualIncome,
            calculate_residual_income(metrics.book_value_per_share, metrics.roe, cost_of_equity, assumptions.terminal_growth),
            Confidence::Medium,
            json!({ "roe": metrics.roe, "cost_of_equity": cost_of_equity }),
        );

        // --- Relative ---
        push(
            ValuationModel::RelativeMultiples,
            relative.fair_value,
            Confidence::Medium,
            json!({ "sector_averages": averages, "ratios": relative.ratios }),
        );

        // Solve on the enterprise side so the implied rate agrees with the bridged DCF above.
        let net_cash_per_share = metrics.bridge.net_cash_per_share();
        let implied_growth = calculate_reverse_dcf(
            price - net_cash_per_share,
            metrics.fcf_per_share,
            assumptions.wacc,
            assumptions.terminal_growth,
        )
        .ok()
        .map(|g| ImpliedGrowth { fitted_price: g.fitted_price + net_cash_per_share, ..g });

        let mut valuation = synthesize(&market.symbol, price, &market.currency, methods);
        if !profile.caveats.is_empty() {
            valuation.summary = format!("{}. {}", valuation.summary, profile.caveats.join("; "));
        }

        Ok(CompanyValuation {
            valuation,
            sector: profile,
            assumptions,
            implied_growth,
            relative,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuation_core::Verdict;

    fn statements() -> Vec<FinancialStatementSnapshot> {
        (0..4)
            .map(|i| {
                let scale = 1.08f64.powi(3 - i);
                FinancialStatementSnapshot {
                    fiscal_year: 2024 - i,
                    revenue: 10_000.0 * scale,
                    operating_income: 2_000.0 * scale,
                    net_income: 1_500.0 * scale,
                    ebitda: 2_600.0 * scale,
                    cash: 1_000.0,
                    short_term_investments: 500.0,
                    receivables: 800.0,
                    inventory: 600.0,
                    total_debt: 2_000.0,
                    total_assets: 12_000.0,
                    total_liabilities: 5_000.0,
                    equity: 7_000.0,
                    shares_outstanding: 1_000.0,
                    operating_cash_flow: 2_200.0 * scale,
                    capex: -400.0 * scale,
                    ..Default::default()
                }
            })
            .collect()
    }

    fn market(sector: &str, industry: &str) -> MarketSnapshot {
        MarketSnapshot {
            symbol: "ACME".to_string(),
            price: 25.0,
            market_cap: 25_000.0,
            beta: 1.0,
            sector: sector.to_string(),
            industry: industry.to_string(),
            dividend_per_share: 0.5,
            ..Default::default()
        }
    }

    fn find(v: &CompanyValuation, model: ValuationModel) -> Option<&ValuationMethodResult> {
        v.valuation.methods.iter().find(|m| m.method == model.label())
    }

    fn method(v: &CompanyValuation, model: ValuationModel) -> &ValuationMethodResult {
        find(v, model).unwrap()
    }

    #[test]
    fn test_general_company_runs_core_methods() {
        let engine = ValuationEngine::new();
        let v = engine
            .value_company(&market("Consumer Defensive", "Beverages"), &statements(), &AssumptionOverrides::default())
            .unwrap();

        assert_eq!(v.sector.tag, SectorTag::General);
        assert_eq!(v.assumptions.wacc, 10.0);
        assert_eq!(v.assumptions.terminal_growth, 2.5);
        assert!((v.assumptions.revenue_growth - 8.0).abs() < 1e-9);

        let dcf = method(&v, ValuationModel::Dcf);
        assert!(dcf.applicable);
        assert_eq!(dcf.confidence, Confidence::High);
        assert!(method(&v, ValuationModel::GrahamNumber).applicable);
        assert!(!method(&v, ValuationModel::ResidualIncome).applicable);
        assert!(find(&v, ValuationModel::BookValuePremium).is_none());

        assert!(v.valuation.applicable_methods >= 5);
        assert!(v.valuation.verdict.is_some());
        assert!(v.implied_growth.is_some());
    }

    #[test]
    fn test_implied_growth_matches_bridged_dcf() {
        let engine = ValuationEngine::new();
        let v = engine
            .value_company(&market("Industrials", "Machinery"), &statements(), &AssumptionOverrides::default())
            .unwrap();
        assert_eq!(v.metrics.bridge.net_cash_per_share(), -0.5);

        let implied = v.implied_growth.unwrap();
        assert!(implied.converged);
        assert!((implied.fitted_price - 25.0).abs() < crate::reverse_dcf::PRICE_TOLERANCE);

        let solved = DcfAssumptions { revenue_growth: implied.exact_growth_rate, ..v.assumptions };
        let reproduced = calculate_full_dcf(&solved, v.metrics.free_cash_flow, &v.metrics.bridge).value();
        assert!((reproduced - 25.0).abs() < crate::reverse_dcf::PRICE_TOLERANCE);
    }

    #[test]
    fn test_financial_uses_residual_income_not_dcf() {
        let engine = ValuationEngine::new();
        let v = engine
            .value_company(&market("Financial Services", "Banks—Diversified"), &statements(), &AssumptionOverrides::default())
            .unwrap();

        assert_eq!(v.sector.tag, SectorTag::Financial);
        let dcf = method(&v, ValuationModel::Dcf);
        assert!(!dcf.applicable);
        assert_eq!(dcf.not_applicable_reason.as_deref(), Some("method not meaningful for this sector"));
        let ri = method(&v, ValuationModel::ResidualIncome);
        assert!(ri.applicable);
        assert_eq!(ri.confidence, Confidence::High);
        assert!(v.valuation.summary.contains("DCF unreliable for banks"));
    }

    #[test]
    fn test_reit_swaps_graham_for_book_premium() {
        let engine = ValuationEngine::new();
        let v = engine
            .value_company(&market("Real Estate", "REIT—Industrial"), &statements(), &AssumptionOverrides::default())
            .unwrap();

        assert!(find(&v, ValuationModel::GrahamNumber).is_none());
        let premium = method(&v, ValuationModel::BookValuePremium);
        assert!(premium.applicable);
        assert!((premium.fair_value - 7.7).abs() < 1e-9);
    }

    #[test]
    fn test_overrides_win() {
        let engine = ValuationEngine::new();
        let overrides = AssumptionOverrides { revenue_growth: Some(12.0), terminal_growth: Some(3.0), wacc: Some(9.0) };
        let v = engine
            .value_company(&market("Industrials", "Machinery"), &statements(), &overrides)
            .unwrap();
        assert_eq!(v.assumptions, DcfAssumptions { revenue_growth: 12.0, terminal_growth: 3.0, wacc: 9.0 });
    }

    #[test]
    fn test_undefined_dcf_override_is_not_applicable() {
        let engine = ValuationEngine::new();
        let overrides = AssumptionOverrides { wacc: Some(2.0), ..Default::default() };
        let v = engine
            .value_company(&market("Industrials", "Machinery"), &statements(), &overrides)
            .unwrap();
        assert!(!method(&v, ValuationModel::Dcf).applicable);
        assert!(v.implied_growth.is_none());
    }

    #[test]
    fn test_cheap_stock_is_a_buy() {
        let engine = ValuationEngine::new();
        let mut mkt = market("Industrials", "Machinery");
        mkt.price = 5.0;
        mkt.market_cap = 5_000.0;
        let v = engine.value_company(&mkt, &statements(), &AssumptionOverrides::default()).unwrap();
        assert_eq!(v.valuation.verdict, Some(Verdict::StrongBuy));
    }

    #[test]
    fn test_no_statements_is_an_error() {
        let engine = ValuationEngine::new();
        let err = engine.value_company(&market("Technology", "Software"), &[], &AssumptionOverrides::default());
        assert!(matches!(err, Err(AnalysisError::InsufficientData(_))));
    }
}
