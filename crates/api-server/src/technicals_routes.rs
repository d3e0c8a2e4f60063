//! Technical indicator snapshot over recent daily bars.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use market_data::PriceRange;
use serde::{Deserialize, Serialize};
use technical_analysis::{TechnicalOptions, TechnicalSnapshot};

use crate::{normalize_symbol, ApiResponse, AppError, AppState};

const MAX_ZONES: usize = 20;

#[derive(Debug, Default, Deserialize)]
pub struct TechnicalsQuery {
    pub range: Option<String>,
    pub pivot_lookback: Option<usize>,
    pub zones: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TechnicalsResponse {
    pub name: Option<String>,
    pub currency: String,
    pub range: PriceRange,
    #[serde(flatten)]
    pub snapshot: TechnicalSnapshot,
}

pub fn technicals_routes() -> Router<AppState> {
    Router::new().route("/api/technicals/:symbol", get(get_technicals))
}

async fn get_technicals(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    query: Result<Query<TechnicalsQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<TechnicalsResponse>>, AppError> {
    let Query(query) = query?;
    let symbol = normalize_symbol(&symbol)?;

    let range: PriceRange = match query.range.as_deref() {
        Some(r) => r.parse()?,
        None => PriceRange::default(),
    };
    let defaults = TechnicalOptions::default();
    let options = TechnicalOptions {
        pivot_lookback: query.pivot_lookback.unwrap_or(defaults.pivot_lookback),
        zone_count: query.zones.unwrap_or(defaults.zone_count),
    };
    if options.pivot_lookback == 0 {
        return Err(AppError::bad_request("pivot_lookback must be at least 1"));
    }
    if options.zone_count == 0 || options.zone_count > MAX_ZONES {
        return Err(AppError::bad_request(format!("zones must be between 1 and {}", MAX_ZONES)));
    }

    tracing::info!(%symbol, %range, "Technicals request");

    let (market, bars) = tokio::try_join!(
        state.provider.market_snapshot(&symbol),
        state.provider.price_history(&symbol, range),
    )?;

    let snapshot = state.technicals.analyze(&symbol, &bars, &options)?;

    Ok(Json(ApiResponse::success(TechnicalsResponse {
        name: market.name,
        currency: market.currency,
        range,
        snapshot,
    })))
}
