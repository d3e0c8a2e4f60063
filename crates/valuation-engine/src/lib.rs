pub mod asset;
pub mod dcf;
pub mod engine;
pub mod income;
pub mod metrics;
pub mod relative;
pub mod reverse_dcf;
pub mod switchboard;
pub mod synthesis;
pub mod wacc;

pub use asset::{asset_based_value, calculate_book_value_premium, calculate_graham_number, calculate_nnwc};
pub use dcf::{calculate_dcf, calculate_full_dcf, dcf_breakdown, DcfBreakdown, EquityBridge};
pub use engine::{AssumptionOverrides, CompanyValuation, ValuationEngine};
pub use income::{calculate_ddm, calculate_epv, calculate_lynch_value, calculate_residual_income};
pub use metrics::CompanyMetrics;
pub use relative::{averages_from_peers, relative_valuation, sector_averages, PeerMultiples, RelativeValuation};
pub use reverse_dcf::{calculate_reverse_dcf, ImpliedGrowth};
pub use switchboard::{classify_sector, profile_for, sector_profile, SectorProfile, SectorTag, ValuationModel};
pub use synthesis::synthesize;
pub use wacc::{calculate_wacc, CapmParams};
