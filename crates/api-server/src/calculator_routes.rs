//! Stateless calculators: DCF, reverse DCF, WACC and sector classification.
//! None of these touch the market data provider.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use valuation_core::{DcfAssumptions, Estimate, SectorAverages, DEFAULT_TERMINAL_GROWTH};
use valuation_engine::{
    calculate_dcf, calculate_reverse_dcf, dcf_breakdown, sector_averages, sector_profile, DcfBreakdown,
    ImpliedGrowth, SectorProfile,
};

use crate::{ApiResponse, AppError, AppState};

fn require_finite(name: &str, value: f64) -> Result<f64, AppError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AppError::bad_request(format!("{} must be a finite number", name)))
    }
}

#[derive(Debug, Deserialize)]
pub struct DcfQuery {
    pub fcf_per_share: f64,
    pub revenue_growth: f64,
    pub terminal_growth: Option<f64>,
    pub wacc: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct DcfResponse {
    pub assumptions: DcfAssumptions,
    pub fcf_per_share: f64,
    pub fair_value: Estimate,
    pub breakdown: Option<DcfBreakdown>,
}

#[derive(Debug, Deserialize)]
pub struct ReverseDcfQuery {
    pub price: f64,
    pub fcf_per_share: f64,
    pub wacc: Option<f64>,
    pub terminal_growth: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ReverseDcfResponse {
    pub price: f64,
    pub fcf_per_share: f64,
    pub wacc: f64,
    pub terminal_growth: f64,
    pub implied_growth: Option<ImpliedGrowth>,
    pub not_applicable_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WaccQuery {
    pub beta: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct WaccResponse {
    pub beta: Option<f64>,
    pub risk_free_rate: f64,
    pub equity_risk_premium: f64,
    pub cost_of_equity: f64,
    pub wacc: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct SectorQuery {
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub industry: String,
}

#[derive(Debug, Serialize)]
pub struct SectorResponse {
    pub sector: String,
    pub industry: String,
    pub profile: SectorProfile,
    pub averages: SectorAverages,
}

pub fn calculator_routes() -> Router<AppState> {
    Router::new()
        .route("/api/dcf", get(dcf))
        .route("/api/reverse-dcf", get(reverse_dcf))
        .route("/api/wacc", get(wacc))
        .route("/api/sector", get(sector))
}

async fn dcf(
    State(state): State<AppState>,
    query: Result<Query<DcfQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<DcfResponse>>, AppError> {
    let Query(q) = query?;
    let fcf_per_share = require_finite("fcf_per_share", q.fcf_per_share)?;
    let assumptions = DcfAssumptions {
        revenue_growth: require_finite("revenue_growth", q.revenue_growth)?,
        terminal_growth: require_finite("terminal_growth", q.terminal_growth.unwrap_or(DEFAULT_TERMINAL_GROWTH))?,
        wacc: require_finite("wacc", q.wacc.unwrap_or_else(|| state.config.capm.wacc(None)))?,
    };

    Ok(Json(ApiResponse::success(DcfResponse {
        assumptions,
        fcf_per_share,
        fair_value: calculate_dcf(&assumptions, fcf_per_share),
        breakdown: dcf_breakdown(&assumptions, fcf_per_share).ok(),
    })))
}

async fn reverse_dcf(
    State(state): State<AppState>,
    query: Result<Query<ReverseDcfQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ReverseDcfResponse>>, AppError> {
    let Query(q) = query?;
    let price = require_finite("price", q.price)?;
    let fcf_per_share = require_finite("fcf_per_share", q.fcf_per_share)?;
    let wacc = require_finite("wacc", q.wacc.unwrap_or_else(|| state.config.capm.wacc(None)))?;
    let terminal_growth = require_finite("terminal_growth", q.terminal_growth.unwrap_or(DEFAULT_TERMINAL_GROWTH))?;

    let (implied_growth, not_applicable_reason) =
        match calculate_reverse_dcf(price, fcf_per_share, wacc, terminal_growth) {
            Ok(implied) => (Some(implied), None),
            Err(reason) => (None, Some(reason.to_string())),
        };

    Ok(Json(ApiResponse::success(ReverseDcfResponse {
        price,
        fcf_per_share,
        wacc,
        terminal_growth,
        implied_growth,
        not_applicable_reason,
    })))
}

async fn wacc(
    State(state): State<AppState>,
    query: Result<Query<WaccQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<WaccResponse>>, AppError> {
    let Query(q) = query?;
    let capm = state.config.capm;
    Ok(Json(ApiResponse::success(WaccResponse {
        beta: q.beta,
        risk_free_rate: capm.risk_free_rate,
        equity_risk_premium: capm.equity_risk_premium,
        cost_of_equity: capm.cost_of_equity(q.beta),
        wacc: capm.wacc(q.beta),
    })))
}

async fn sector(
    query: Result<Query<SectorQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<SectorResponse>>, AppError> {
    let Query(q) = query?;
    if q.sector.trim().is_empty() && q.industry.trim().is_empty() {
        return Err(AppError::bad_request("sector or industry is required"));
    }

    Ok(Json(ApiResponse::success(SectorResponse {
        profile: sector_profile(&q.sector, &q.industry),
        averages: sector_averages(&q.sector),
        sector: q.sector,
        industry: q.industry,
    })))
}

#[cfg(test)]
mod tests {
    use crate::test_support::get_json;
    use approx::assert_relative_eq;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_dcf_reference_value() {
        let (status, body) = get_json("/api/dcf?fcf_per_share=5&revenue_growth=8&terminal_growth=2.5&wacc=10").await;
        assert_eq!(status, StatusCode::OK);

        let data = &body["data"];
        assert_eq!(data["fair_value"]["status"], "applicable");
        assert_relative_eq!(data["fair_value"]["value"].as_f64().unwrap(), 78.96568, epsilon = 1e-4);
        assert_eq!(data["breakdown"]["years"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_dcf_defaults_and_inapplicable() {
        let (status, body) = get_json("/api/dcf?fcf_per_share=-1&revenue_growth=8").await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["assumptions"]["wacc"], 10.0);
        assert_eq!(data["assumptions"]["terminal_growth"], 2.5);
        assert_eq!(data["fair_value"]["status"], "not_applicable");
        assert!(data["breakdown"].is_null());
    }

    #[tokio::test]
    async fn test_dcf_missing_parameter() {
        let (status, body) = get_json("/api/dcf?revenue_growth=8").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Bad request");
        assert!(body["details"].as_str().unwrap().contains("fcf_per_share"));
    }

    #[tokio::test]
    async fn test_reverse_dcf_recovers_growth() {
        let (status, body) = get_json("/api/reverse-dcf?price=78.96568&fcf_per_share=5&wacc=10&terminal_growth=2.5").await;
        assert_eq!(status, StatusCode::OK);
        let implied = &body["data"]["implied_growth"];
        assert_eq!(implied["converged"], true);
        assert_relative_eq!(implied["growth_rate"].as_f64().unwrap(), 8.0, epsilon = 0.15);
    }

    #[tokio::test]
    async fn test_reverse_dcf_undefined_model() {
        let (status, body) = get_json("/api/reverse-dcf?price=50&fcf_per_share=5&wacc=2&terminal_growth=3").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["implied_growth"].is_null());
        assert!(body["data"]["not_applicable_reason"].is_string());
    }

    #[tokio::test]
    async fn test_wacc() {
        let (status, body) = get_json("/api/wacc?beta=1.0").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["wacc"], 10.0);

        let (_, body) = get_json("/api/wacc?beta=5").await;
        assert_eq!(body["data"]["wacc"], 15.0);

        let (_, body) = get_json("/api/wacc").await;
        assert_eq!(body["data"]["wacc"], 10.0);
    }

    #[tokio::test]
    async fn test_sector_classification() {
        let (status, body) = get_json("/api/sector?sector=Real%20Estate&industry=REIT%20-%20Retail").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["profile"]["tag"], "REIT");
        assert!(body["data"]["averages"]["pe"].is_number());

        let (status, _) = get_json("/api/sector").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["provider"], "stub");
    }
}
