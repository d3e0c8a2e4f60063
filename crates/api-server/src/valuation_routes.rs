//! Comprehensive valuation for a single company.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use valuation_engine::{AssumptionOverrides, CompanyValuation};

use crate::{normalize_symbol, ApiResponse, AppError, AppState};

/// Fiscal years of statements requested per valuation.
const STATEMENT_HISTORY: usize = 5;

#[derive(Debug, Default, Deserialize)]
pub struct AssumptionQuery {
    pub revenue_growth: Option<f64>,
    pub terminal_growth: Option<f64>,
    pub wacc: Option<f64>,
}

impl AssumptionQuery {
    fn into_overrides(self) -> Result<AssumptionOverrides, AppError> {
        for (name, value) in [
            ("revenue_growth", self.revenue_growth),
            ("terminal_growth", self.terminal_growth),
            ("wacc", self.wacc),
        ] {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(AppError::bad_request(format!("{} must be a finite number", name)));
            }
        }
        Ok(AssumptionOverrides {
            revenue_growth: self.revenue_growth,
            terminal_growth: self.terminal_growth,
            wacc: self.wacc,
        })
    }
}

pub fn valuation_routes() -> Router<AppState> {
    Router::new().route("/api/valuation/:symbol", get(get_valuation))
}

async fn get_valuation(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    query: Result<Query<AssumptionQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<CompanyValuation>>, AppError> {
    let Query(query) = query?;
    let symbol = normalize_symbol(&symbol)?;
    let overrides = query.into_overrides()?;

    tracing::info!(%symbol, provider = state.provider.name(), "Valuation request");

    let (market, statements) = tokio::try_join!(
        state.provider.market_snapshot(&symbol),
        state.provider.statements(&symbol, STATEMENT_HISTORY),
    )?;

    let valuation = state.engine.value_company(&market, &statements, &overrides)?;
    Ok(Json(ApiResponse::success(valuation)))
}
