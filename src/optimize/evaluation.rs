//! Candidate evaluation and the ranking between candidates

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::constraints::ConstraintCheck;
use super::settings::{ObjectiveMode, OptimizationSettings};
use crate::assumptions::{Coefficient, LoadingCoefficients};
use crate::projection::BatchResult;

/// Ranking tolerance
const TIE_TOLERANCE: f64 = 1e-12;

/// Lowest IRR among the constrained model points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinIrr {
    pub model_point: String,
    pub irr: f64,
}

/// One evaluated coefficient vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    pub coefficients: LoadingCoefficients,
    pub batch: BatchResult,
    pub feasible: bool,
    /// Soft objective: IRR and premium penalties plus the L2 term
    pub objective: f64,
    /// Sum of squared hard-constraint shortfalls
    pub violation: f64,
    pub irr_penalty: f64,
    pub premium_penalty: f64,
    pub l2_penalty: f64,
    /// Squared shortfall against the soft minimum ratio
    pub premium_floor_penalty: f64,
    pub min_irr: Option<MinIrr>,
    pub failure_details: Vec<String>,
}

impl CandidateEvaluation {
    /// Aggregate a batch over every model point not in `excluded`
    ///
    /// Only `stage_variables` enter the L2 term.
    pub fn evaluate(
        coefficients: LoadingCoefficients,
        batch: BatchResult,
        settings: &OptimizationSettings,
        stage_variables: &[Coefficient],
        excluded: &[String],
    ) -> Self {
        let mut violation = 0.0;
        let mut irr_penalty = 0.0;
        let mut premium_penalty = 0.0;
        let mut premium_floor_penalty = 0.0;
        let mut min_irr: Option<MinIrr> = None;
        let mut failure_details = Vec::new();

        for result in &batch.results {
            let label = result.label();
            if excluded.contains(&label) {
                continue;
            }

            let check = ConstraintCheck::evaluate(result, settings);
            violation += check.violation();
            failure_details.extend(check.failure_details());

            let irr_gap = (settings.irr_target - result.irr).max(0.0);
            irr_penalty += irr_gap * irr_gap;
            let premium_gap = (result.premium_to_maturity_ratio - settings.premium_to_maturity_target).max(0.0);
            premium_penalty += premium_gap * premium_gap;
            if let Some(soft_min) = settings.premium_to_maturity_soft_min {
                let floor_gap = (soft_min - result.premium_to_maturity_ratio).max(0.0);
                premium_floor_penalty += floor_gap * floor_gap;
            }

            if min_irr.as_ref().map_or(true, |m| result.irr < m.irr) {
                min_irr = Some(MinIrr { model_point: label, irr: result.irr });
            }
        }

        let l2_penalty = settings.l2_lambda
            * stage_variables
                .iter()
                .map(|&c| coefficients.get(c).powi(2))
                .sum::<f64>();

        let feasible = violation <= 0.0;
        if feasible {
            failure_details.clear();
        }

        Self {
            coefficients,
            batch,
            feasible,
            objective: irr_penalty + premium_penalty + l2_penalty,
            violation,
            irr_penalty,
            premium_penalty,
            l2_penalty,
            premium_floor_penalty,
            min_irr,
            failure_details,
        }
    }

    /// Whether `self` should replace `best`
    ///
    /// Feasible beats infeasible. Two feasible candidates compare by soft
    /// objective, or in max-min-IRR mode by minimum IRR, then soft-minimum
    /// penalty, then objective. Two infeasible candidates compare by
    /// violation, then objective. All comparisons use a 1e-12 tolerance.
    pub fn is_better_than(&self, best: Option<&CandidateEvaluation>, mode: ObjectiveMode) -> bool {
        let Some(best) = best else {
            return true;
        };

        match (self.feasible, best.feasible) {
            (true, false) => true,
            (false, true) => false,
            (true, true) => match mode {
                ObjectiveMode::MaximizeMinIrr => match compare_min_irr(self.min_irr.as_ref(), best.min_irr.as_ref()) {
                    Ordering::Greater => true,
                    Ordering::Less => false,
                    Ordering::Equal => {
                        if self.premium_floor_penalty < best.premium_floor_penalty - TIE_TOLERANCE {
                            true
                        } else if (self.premium_floor_penalty - best.premium_floor_penalty).abs() <= TIE_TOLERANCE {
                            self.objective < best.objective - TIE_TOLERANCE
                        } else {
                            false
                        }
                    }
                },
                ObjectiveMode::MinimizePenalty => self.objective < best.objective - TIE_TOLERANCE,
            },
            (false, false) => {
                if self.violation < best.violation - TIE_TOLERANCE {
                    true
                } else if (self.violation - best.violation).abs() <= TIE_TOLERANCE {
                    self.objective < best.objective - TIE_TOLERANCE
                } else {
                    false
                }
            }
        }
    }
}

/// Minimum IRRs within tolerance compare equal; a missing value ranks lowest
fn compare_min_irr(candidate: Option<&MinIrr>, best: Option<&MinIrr>) -> Ordering {
    match (candidate, best) {
        (Some(c), Some(b)) => {
            if c.irr > b.irr + TIE_TOLERANCE {
                Ordering::Greater
            } else if c.irr < b.irr - TIE_TOLERANCE {
                Ordering::Less
            } else {
                Ordering::Equal
            }
        }
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}
