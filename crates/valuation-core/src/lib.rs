pub mod error;
pub mod estimate;
pub mod stats;
pub mod types;

pub use error::*;
pub use estimate::*;
pub use types::*;
