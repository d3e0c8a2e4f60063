//! HTTP surface for the valuation and technical engines.

pub mod calculator_routes;
pub mod config;
pub mod technicals_routes;
pub mod valuation_routes;

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use anyhow::Context;
use market_data::{FmpClient, MarketDataError, MarketDataProvider, YahooClient};
use serde::Serialize;
use serde_json::json;
use technical_analysis::TechnicalAnalysisEngine;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use valuation_core::AnalysisError;
use valuation_engine::ValuationEngine;

use crate::config::{LogFormat, ProviderKind, ServerConfig};

/// Per-process state handed to every handler. Nothing in it is mutated
/// after startup; each request derives its inputs from scratch.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn MarketDataProvider>,
    pub config: Arc<ServerConfig>,
    pub engine: Arc<ValuationEngine>,
    pub technicals: TechnicalAnalysisEngine,
}

impl AppState {
    pub fn new(config: ServerConfig, provider: Arc<dyn MarketDataProvider>) -> Self {
        let engine = ValuationEngine::with_capm(config.capm);
        Self {
            provider,
            config: Arc::new(config),
            engine: Arc::new(engine),
            technicals: TechnicalAnalysisEngine::new(),
        }
    }
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Error response rendered as `{ "error": .., "details": .. }`.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: &'static str,
    details: String,
}

impl AppError {
    pub fn with_status(status: StatusCode, details: impl Into<String>) -> Self {
        let error = match status {
            StatusCode::BAD_REQUEST => "Bad request",
            StatusCode::NOT_FOUND => "Not found",
            _ => "Internal server error",
        };
        Self {
            status,
            error,
            details: details.into(),
        }
    }

    pub fn bad_request(details: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, details)
    }

    pub fn not_found(details: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, details)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(details = %self.details, "Request failed");
        }
        (
            self.status,
            Json(json!({ "error": self.error, "details": self.details })),
        )
            .into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", err))
    }
}

impl From<MarketDataError> for AppError {
    fn from(err: MarketDataError) -> Self {
        match err {
            e if e.is_not_found() => Self::not_found(e.to_string()),
            e @ MarketDataError::InvalidRange(_) => Self::bad_request(e.to_string()),
            e => Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::InsufficientData(_) => Self::not_found(err.to_string()),
            AnalysisError::InvalidData(_) | AnalysisError::InvalidAssumption(_) => {
                Self::bad_request(err.to_string())
            }
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

/// Uppercase a ticker and reject anything that is not a plausible symbol.
pub fn normalize_symbol(raw: &str) -> Result<String, AppError> {
    let symbol = raw.trim().to_uppercase();
    let valid = !symbol.is_empty()
        && symbol.len() <= 12
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    if valid {
        Ok(symbol)
    } else {
        Err(AppError::bad_request(format!("Invalid symbol '{}'", raw)))
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "provider": state.provider.name(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let allow_origin = if origin == "*" {
        AllowOrigin::from(Any)
    } else {
        let value = HeaderValue::from_str(origin).context("CORS_ALLOW_ORIGIN is not a valid header value")?;
        AllowOrigin::exact(value)
    };
    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET])
        .allow_headers(Any))
}

pub fn create_router(state: AppState) -> anyhow::Result<Router> {
    let cors = cors_layer(&state.config.cors_allow_origin)?;

    Ok(Router::new()
        .route("/health", get(health))
        .merge(valuation_routes::valuation_routes())
        .merge(technicals_routes::technicals_routes())
        .merge(calculator_routes::calculator_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

pub fn build_provider(config: &ServerConfig) -> anyhow::Result<Arc<dyn MarketDataProvider>> {
    let provider: Arc<dyn MarketDataProvider> = match config.provider {
        ProviderKind::Yahoo => Arc::new(YahooClient::new(config.http_timeout)?),
        ProviderKind::Fmp => {
            let key = config.fmp_api_key.clone().unwrap_or_default();
            Arc::new(FmpClient::new(key, config.http_timeout)?)
        }
    };
    Ok(provider)
}

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("api_server=info,market_data=info,tower_http=info"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;
    init_tracing(config.log_format);

    let provider = build_provider(&config)?;
    let bind_addr = config.bind_addr;
    tracing::info!(provider = provider.name(), %bind_addr, "Starting fair value API");

    let app = create_router(AppState::new(config, provider))?;
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support;
