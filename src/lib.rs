//! Endowment Pricing - profit testing and loading optimization for endowment insurance
//!
//! This library provides:
//! - Net and gross premiums from commutation-style present values
//! - Reserves, surrender values and in-force decrements
//! - Year-by-year profit-test cashflows with IRR and new business value
//! - Premium-ratio sweeps and a staged loading-coefficient optimizer

pub mod error;
pub mod policy;
pub mod assumptions;
pub mod reserves;
pub mod projection;
pub mod scenario;
pub mod sweep;
pub mod optimize;
pub mod config;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types
pub use error::{PricingError, Result};
pub use policy::{ModelPoint, Sex};
pub use assumptions::{Assumptions, LoadingCoefficients, LoadingSource, LoadingTriple, MortalityTable};
pub use projection::{BatchResult, CashflowRow, ProfitTestResult, ProjectionConfig, ProjectionEngine};
pub use scenario::{ProfitTester, ScenarioRunner};
pub use optimize::{LoadingOptimizer, OptimizationResult, OptimizationSettings};
pub use config::PricingConfig;
