use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Unexpected response shape: {0}")]
    Decode(String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Missing API key: {0}")]
    MissingApiKey(&'static str),

    #[error("Invalid price range: {0}")]
    InvalidRange(String),
}

impl MarketDataError {
    /// True when the upstream has no data for the requested symbol.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MarketDataError::SymbolNotFound(_))
            || matches!(self, MarketDataError::Status { status: 404, .. })
    }
}
