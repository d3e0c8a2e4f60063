use anyhow::{bail, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use valuation_engine::CapmParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Yahoo,
    Fmp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Server settings, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub provider: ProviderKind,
    pub fmp_api_key: Option<String>,
    pub http_timeout: Duration,
    pub capm: CapmParams,
    pub cors_allow_origin: String,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            provider: ProviderKind::Yahoo,
            fmp_api_key: None,
            http_timeout: Duration::from_secs(30),
            capm: CapmParams::default(),
            cors_allow_origin: "*".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse()
            .context("BIND_ADDR must be host:port")?;

        let provider = match get("MARKET_DATA_PROVIDER")
            .unwrap_or_else(|| "yahoo".to_string())
            .to_lowercase()
            .as_str()
        {
            "yahoo" => ProviderKind::Yahoo,
            "fmp" => ProviderKind::Fmp,
            other => bail!("MARKET_DATA_PROVIDER must be 'yahoo' or 'fmp', got '{}'", other),
        };

        let fmp_api_key = get("FMP_API_KEY");
        if provider == ProviderKind::Fmp && fmp_api_key.is_none() {
            bail!("FMP_API_KEY is required when MARKET_DATA_PROVIDER=fmp");
        }

        let timeout_secs: u64 = get("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_string())
            .parse()
            .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?;

        let defaults = CapmParams::default();
        let risk_free_rate = match get("RISK_FREE_RATE") {
            Some(v) => v.parse().context("RISK_FREE_RATE must be a percentage")?,
            None => defaults.risk_free_rate,
        };
        let equity_risk_premium = match get("EQUITY_RISK_PREMIUM") {
            Some(v) => v.parse().context("EQUITY_RISK_PREMIUM must be a percentage")?,
            None => defaults.equity_risk_premium,
        };

        let log_format = match get("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            bind_addr,
            provider,
            fmp_api_key,
            http_timeout: Duration::from_secs(timeout_secs),
            capm: CapmParams {
                risk_free_rate,
                equity_risk_premium,
            },
            cors_allow_origin: get("CORS_ALLOW_ORIGIN").unwrap_or_else(|| "*".to_string()),
            log_format,
        })
    }
}
