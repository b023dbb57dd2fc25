//! Profit-test projection: yearly cashflows and profit metrics

mod basis;
mod engine;
mod cashflows;
mod metrics;
pub mod irr;

pub use basis::ProjectionBasis;
pub use engine::{
    ProjectionConfig, ProjectionEngine, DEFAULT_ACQUISITION_EXPENSE_SHARE, DEFAULT_LAPSE_RATE,
    DEFAULT_VALUATION_INTEREST,
};
pub use cashflows::{BatchResult, CashflowRow, ProfitTestResult, SummaryRow};
pub use metrics::ProfitMetrics;
pub use irr::calc_irr;
