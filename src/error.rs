//! Error taxonomy for the pricing pipeline
//!
//! Input and numeric failures propagate to the caller unchanged. Constraint
//! infeasibility is not an error: the optimizer reports it as an outcome.

use thiserror::Error;

/// Errors raised by the pricing, projection, and optimization layers
#[derive(Error, Debug)]
pub enum PricingError {
    // Input errors
    #[error("mortality rate missing for age {age}")]
    MissingMortalityRate { age: u32 },

    #[error("spot rate missing for policy year {year}")]
    MissingSpotRate { year: u32 },

    #[error("unsupported sex label: {0}")]
    UnsupportedSex(String),

    #[error("unsupported interest type: {0} (only flat rates are supported)")]
    UnsupportedInterestType(String),

    #[error("invalid model point {label}: {reason}")]
    InvalidModelPoint { label: String, reason: String },

    #[error("{what} must be positive, got {value}")]
    NonPositive { what: &'static str, value: f64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Numeric errors
    #[error("IRR not bracketed: no sign change in NPV up to rate {upper}")]
    IrrNotBracketed { upper: f64 },

    #[error("IRR did not converge within {iterations} iterations")]
    IrrNotConverged { iterations: usize },

    // Configuration errors
    #[error("unsupported exemption method: {0}")]
    UnsupportedExemptionMethod(String),

    #[error("unsupported expense model mode: {0}")]
    UnsupportedExpenseMode(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    // Boundary IO
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PricingError {
    /// True for the numeric failures raised by the IRR root finder
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PricingError::IrrNotBracketed { .. } | PricingError::IrrNotConverged { .. }
        )
    }

    /// True for configuration errors (unknown mode tags, malformed settings)
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PricingError::UnsupportedExemptionMethod(_)
                | PricingError::UnsupportedExpenseMode(_)
                | PricingError::Configuration(_)
                | PricingError::Json(_)
        )
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, PricingError>;
