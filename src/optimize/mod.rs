//! Loading-coefficient optimizer
//!
//! Searches the ten linear loading coefficients for a point that satisfies
//! every hard constraint on every constrained model point while keeping the
//! soft penalties small.

mod constraints;
mod evaluation;
mod search;
pub mod settings;

pub use constraints::{point_reports, ConstraintCheck, PointReport, PointStatus};
pub use evaluation::{CandidateEvaluation, MinIrr};
pub use search::{
    FallbackProposal, LoadingOptimizer, OptimizationOutcome, OptimizationResult, SearchState, StageSummary,
};
pub use settings::{
    CoefficientBounds, ExemptionMethod, ExemptionSettings, FallbackOverride, FallbackPolicy, ObjectiveMode,
    OptimizationSettings, OverrideAdjustment, Stage,
};
