//! Market data providers and the normalization boundary that turns their JSON
//! into `valuation_core` snapshots.

pub mod error;
pub mod fmp;
pub mod normalize;
pub mod provider;
pub mod yahoo;

pub use error::MarketDataError;
pub use fmp::FmpClient;
pub use provider::{MarketDataProvider, PriceRange};
pub use yahoo::YahooClient;
