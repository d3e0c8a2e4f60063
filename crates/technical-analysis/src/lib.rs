pub mod analyzer;
pub mod indicators;
pub mod levels;

#[cfg(test)]
mod indicators_tests;

pub use analyzer::*;
pub use indicators::*;
pub use levels::*;
