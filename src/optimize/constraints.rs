//! Hard-constraint checks for one profit-tested model point

use serde::{Deserialize, Serialize};
use std::fmt;

use super::settings::OptimizationSettings;
use crate::projection::{BatchResult, ProfitTestResult};

/// Per-point status in optimizer reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointStatus {
    Pass,
    Fail,
    Watch,
    Exempt,
}

impl fmt::Display for PointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PointStatus::Pass => "pass",
            PointStatus::Fail => "fail",
            PointStatus::Watch => "watch",
            PointStatus::Exempt => "exempt",
        };
        f.pad(s)
    }
}

/// Shortfalls of one model point against every hard constraint (0 = satisfied)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintCheck {
    pub label: String,
    pub irr_shortfall: f64,
    pub loading_surplus_shortfall: f64,
    pub premium_to_maturity_excess: f64,
    pub nbv_shortfall: f64,
    pub alpha_shortfall: f64,
    pub beta_shortfall: f64,
    pub gamma_shortfall: f64,
    /// (net - gross + 1) when the gross premium does not exceed the net premium
    pub premium_margin_shortfall: f64,
}

impl ConstraintCheck {
    pub fn evaluate(result: &ProfitTestResult, settings: &OptimizationSettings) -> Self {
        let threshold = settings.loading_surplus_threshold(result.model_point.sum_assured);
        let loadings = &result.loadings;
        let premiums = &result.premiums;

        let premium_margin_shortfall = if premiums.gross_annual_premium <= premiums.net_annual_premium {
            (premiums.net_annual_premium - premiums.gross_annual_premium + 1) as f64
        } else {
            0.0
        };

        Self {
            label: result.label(),
            irr_shortfall: (settings.irr_hard - result.irr).max(0.0),
            loading_surplus_shortfall: (threshold - result.loading_surplus).max(0.0),
            premium_to_maturity_excess: (result.premium_to_maturity_ratio - settings.premium_to_maturity_hard_max)
                .max(0.0),
            nbv_shortfall: (settings.nbv_hard - result.new_business_value).max(0.0),
            alpha_shortfall: (-loadings.alpha).max(0.0),
            beta_shortfall: (-loadings.beta).max(0.0),
            gamma_shortfall: (-loadings.gamma).max(0.0),
            premium_margin_shortfall,
        }
    }

    /// Sum of squared shortfalls
    pub fn violation(&self) -> f64 {
        [
            self.irr_shortfall,
            self.loading_surplus_shortfall,
            self.premium_to_maturity_excess,
            self.nbv_shortfall,
            self.alpha_shortfall,
            self.beta_shortfall,
            self.gamma_shortfall,
            self.premium_margin_shortfall,
        ]
        .iter()
        .map(|x| x * x)
        .sum()
    }

    pub fn is_satisfied(&self) -> bool {
        self.violation() <= 0.0
    }

    pub fn failure_details(&self) -> Vec<String> {
        let label = &self.label;
        let mut details = Vec::new();
        if self.irr_shortfall > 0.0 {
            details.push(format!("{} irr_hard shortfall={:.6}", label, self.irr_shortfall));
        }
        if self.loading_surplus_shortfall > 0.0 {
            details.push(format!(
                "{} loading_surplus_hard shortfall={:.2}",
                label, self.loading_surplus_shortfall
            ));
        }
        if self.premium_to_maturity_excess > 0.0 {
            details.push(format!(
                "{} premium_to_maturity_hard_max excess={:.6}",
                label, self.premium_to_maturity_excess
            ));
        }
        if self.nbv_shortfall > 0.0 {
            details.push(format!("{} nbv_hard shortfall={:.2}", label, self.nbv_shortfall));
        }
        if self.alpha_shortfall > 0.0 {
            details.push(format!("{} alpha negative", label));
        }
        if self.beta_shortfall > 0.0 {
            details.push(format!("{} beta negative", label));
        }
        if self.gamma_shortfall > 0.0 {
            details.push(format!("{} gamma negative", label));
        }
        if self.premium_margin_shortfall > 0.0 {
            details.push(format!("{} gross premium not above net premium", label));
        }
        details
    }
}

/// Reported metrics and status of one model point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointReport {
    pub model_point: String,
    pub status: PointStatus,
    pub irr: f64,
    pub new_business_value: f64,
    pub loading_surplus: f64,
    pub loading_surplus_threshold: f64,
    pub premium_to_maturity_ratio: f64,
    pub failures: Vec<String>,
}

/// Status of every model point in `batch`, watch taking precedence over exempt
pub fn point_reports(batch: &BatchResult, settings: &OptimizationSettings, exempt: &[String]) -> Vec<PointReport> {
    batch
        .results
        .iter()
        .map(|result| {
            let label = result.label();
            let check = ConstraintCheck::evaluate(result, settings);
            let status = if settings.is_watched(&label) {
                PointStatus::Watch
            } else if exempt.contains(&label) {
                PointStatus::Exempt
            } else if check.is_satisfied() {
                PointStatus::Pass
            } else {
                PointStatus::Fail
            };

            PointReport {
                model_point: label,
                status,
                irr: result.irr,
                new_business_value: result.new_business_value,
                loading_surplus: result.loading_surplus,
                loading_surplus_threshold: settings.loading_surplus_threshold(result.model_point.sum_assured),
                premium_to_maturity_ratio: result.premium_to_maturity_ratio,
                failures: check.failure_details(),
            }
        })
        .collect()
}
