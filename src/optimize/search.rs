//! Staged first-improvement coordinate descent over loading coefficients
//!
//! Each stage moves only its own coefficients, one step at a time, and
//! accepts the first neighbour that ranks better than the incumbent. A stage
//! ends after a full pass with no improving move or once its evaluation
//! budget is spent; the next stage starts from where it ended. When no
//! feasible point is found the named fallback overrides are tried in order.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::constraints::{point_reports, PointReport};
use super::evaluation::{CandidateEvaluation, MinIrr};
use super::settings::{ExemptionMethod, ObjectiveMode, OptimizationSettings, OverrideAdjustment, Stage};
use crate::assumptions::{Coefficient, LoadingCoefficients};
use crate::error::{PricingError, Result};
use crate::projection::{BatchResult, ProjectionConfig};
use crate::scenario::ProfitTester;

/// Mutable search position shared across stages
#[derive(Debug, Clone)]
pub struct SearchState {
    current: CandidateEvaluation,
    best: Option<CandidateEvaluation>,
    stage_index: usize,
    stage_evaluations: usize,
    total_evaluations: usize,
    budget: usize,
}

impl SearchState {
    fn start(stage_index: usize, seed: CandidateEvaluation, budget: usize) -> Self {
        Self {
            current: seed,
            best: None,
            stage_index,
            stage_evaluations: 1,
            total_evaluations: 1,
            budget,
        }
    }

    /// Move to the next stage, re-seeded at the current point
    fn begin_stage(&mut self, stage_index: usize, seed: CandidateEvaluation) {
        self.current = seed;
        self.stage_index = stage_index;
        self.stage_evaluations = 1;
        self.total_evaluations += 1;
    }

    pub fn point(&self) -> LoadingCoefficients {
        self.current.coefficients
    }

    pub fn current(&self) -> &CandidateEvaluation {
        &self.current
    }

    pub fn stage_index(&self) -> usize {
        self.stage_index
    }

    pub fn stage_evaluations(&self) -> usize {
        self.stage_evaluations
    }

    pub fn total_evaluations(&self) -> usize {
        self.total_evaluations
    }

    pub fn remaining(&self) -> usize {
        self.budget.saturating_sub(self.stage_evaluations)
    }

    pub fn exhausted(&self) -> bool {
        self.remaining() == 0
    }

    fn record_evaluation(&mut self) {
        self.stage_evaluations += 1;
        self.total_evaluations += 1;
    }

    fn accept(&mut self, candidate: CandidateEvaluation) {
        self.current = candidate;
    }

    /// Promote the stage result if it ranks above the best so far
    fn finish_stage(&mut self, mode: ObjectiveMode) {
        if self.current.is_better_than(self.best.as_ref(), mode) {
            self.best = Some(self.current.clone());
        }
    }

    fn into_best(self) -> CandidateEvaluation {
        match self.best {
            Some(best) => best,
            None => self.current,
        }
    }
}

/// Per-stage trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSummary {
    pub name: String,
    pub evaluations: usize,
    pub feasible: bool,
    pub objective: f64,
    pub violation: f64,
    pub coefficients: LoadingCoefficients,
}

/// Result of one full staged search under fixed configuration
#[derive(Debug, Clone)]
struct SearchRun {
    best: CandidateEvaluation,
    evaluations: usize,
    exempt: Vec<String>,
    stages: Vec<StageSummary>,
}

/// Override that made the search feasible
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackProposal {
    pub name: String,
    pub adjustment: OverrideAdjustment,
    pub justification: String,
    /// Evaluations spent by the unmodified search before the override
    pub primary_evaluations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OptimizationOutcome {
    /// Feasible without overrides
    Success,
    /// Feasible only under a fallback override
    ConditionalSuccess(FallbackProposal),
    /// No feasible point; the unmodified search result is reported
    Infeasible,
}

/// Everything the optimizer reports
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub outcome: OptimizationOutcome,
    pub success: bool,
    /// Evaluations of the returned search run
    pub evaluations: usize,
    pub coefficients: LoadingCoefficients,
    pub batch: BatchResult,
    pub objective: f64,
    pub violation: f64,
    /// Shortfall lines; empty when feasible
    pub failure_details: Vec<String>,
    pub exempt_model_points: Vec<String>,
    pub watch_model_points: Vec<String>,
    pub min_irr: Option<MinIrr>,
    pub points: Vec<PointReport>,
    pub stages: Vec<StageSummary>,
}

impl OptimizationResult {
    pub fn fallback(&self) -> Option<&FallbackProposal> {
        match &self.outcome {
            OptimizationOutcome::ConditionalSuccess(proposal) => Some(proposal),
            _ => None,
        }
    }

    pub fn is_conditional(&self) -> bool {
        self.fallback().is_some()
    }
}

/// Searches loading coefficients against a profit tester
pub struct LoadingOptimizer<'a, T: ProfitTester + ?Sized> {
    tester: &'a T,
    config: ProjectionConfig,
    settings: OptimizationSettings,
}

impl<'a, T: ProfitTester + ?Sized> LoadingOptimizer<'a, T> {
    pub fn new(tester: &'a T, config: ProjectionConfig, settings: OptimizationSettings) -> Result<Self> {
        settings.check()?;
        Ok(Self { tester, config, settings })
    }

    pub fn settings(&self) -> &OptimizationSettings {
        &self.settings
    }

    /// Run the staged search, then the fallback overrides if it stays infeasible
    pub fn optimize(&self, initial: &LoadingCoefficients) -> Result<OptimizationResult> {
        let primary = self.search(&self.config, &self.settings, initial)?;
        if primary.best.feasible {
            info!("optimization feasible after {} evaluations", primary.evaluations);
            return Ok(self.finish(primary, &self.settings, OptimizationOutcome::Success));
        }

        if self.settings.fallback.enabled {
            warn!(
                "no feasible loading found after {} evaluations; trying {} fallback override(s)",
                primary.evaluations,
                self.settings.fallback.overrides.len()
            );

            for candidate in &self.settings.fallback.overrides {
                let justification = candidate.justification(&self.config, &self.settings);
                info!("fallback attempt {}", justification);

                let (config, settings) = candidate.apply(&self.config, &self.settings);
                let attempt = self.search(&config, &settings, initial)?;
                if attempt.best.feasible {
                    info!("fallback {} reached feasibility", candidate.name);
                    let proposal = FallbackProposal {
                        name: candidate.name.clone(),
                        adjustment: candidate.adjustment,
                        justification,
                        primary_evaluations: primary.evaluations,
                    };
                    return Ok(self.finish(attempt, &settings, OptimizationOutcome::ConditionalSuccess(proposal)));
                }
            }
            warn!("no fallback override reached feasibility");
        }

        Ok(self.finish(primary, &self.settings, OptimizationOutcome::Infeasible))
    }

    /// Model points for which no scanned premium ratio clears the exemption threshold
    pub fn exempt_model_points(
        &self,
        config: &ProjectionConfig,
        settings: &OptimizationSettings,
        coefficients: &LoadingCoefficients,
    ) -> Result<Vec<String>> {
        let exemption = &settings.exemption;
        if !exemption.enabled {
            return Ok(Vec::new());
        }

        match exemption.method {
            ExemptionMethod::SweepPtm => {
                let minimums = self.tester.minimum_ratios(config, coefficients, &exemption.sweep)?;
                let exempt: Vec<String> = minimums
                    .into_iter()
                    .filter(|m| m.ratio.is_none())
                    .map(|m| m.model_point)
                    .collect();
                for label in &exempt {
                    warn!("model point {} exempt: no ratio in sweep range clears IRR threshold", label);
                }
                Ok(exempt)
            }
        }
    }

    fn search(
        &self,
        config: &ProjectionConfig,
        settings: &OptimizationSettings,
        initial: &LoadingCoefficients,
    ) -> Result<SearchRun> {
        let seed_point = settings.clamp(initial);
        let exempt = self.exempt_model_points(config, settings, &seed_point)?;

        let mut excluded = exempt.clone();
        excluded.extend(settings.watch_model_point_ids.iter().cloned());

        let mut state: Option<SearchState> = None;
        let mut stages = Vec::with_capacity(settings.stages.len());

        for (index, stage) in settings.stages.iter().enumerate() {
            let variables = stage.tunable();
            let point = state.as_ref().map_or(seed_point, |s| s.point());
            let seed = self.evaluate(config, settings, point, &variables, &excluded)?;

            let mut stage_state = match state.take() {
                Some(mut existing) => {
                    existing.begin_stage(index, seed);
                    existing
                }
                None => SearchState::start(index, seed, settings.max_iterations_per_stage),
            };

            self.run_stage(config, settings, stage, &variables, &excluded, &mut stage_state)?;
            stage_state.finish_stage(settings.objective);

            let current = stage_state.current();
            info!(
                "stage {} finished: evaluations={} feasible={} objective={:.6} violation={:.6}",
                stage.name,
                stage_state.stage_evaluations(),
                current.feasible,
                current.objective,
                current.violation
            );
            stages.push(StageSummary {
                name: stage.name.clone(),
                evaluations: stage_state.stage_evaluations(),
                feasible: current.feasible,
                objective: current.objective,
                violation: current.violation,
                coefficients: current.coefficients,
            });
            state = Some(stage_state);
        }

        let state = state.ok_or_else(|| PricingError::Configuration("optimization stages are empty".into()))?;
        Ok(SearchRun {
            evaluations: state.total_evaluations(),
            best: state.into_best(),
            exempt,
            stages,
        })
    }

    fn run_stage(
        &self,
        config: &ProjectionConfig,
        settings: &OptimizationSettings,
        stage: &Stage,
        variables: &[Coefficient],
        excluded: &[String],
        state: &mut SearchState,
    ) -> Result<()> {
        while !state.exhausted() {
            let mut improved = false;

            'variables: for &variable in variables {
                let Some(bounds) = settings.bounds_for(variable) else {
                    continue;
                };
                if bounds.step <= 0.0 {
                    continue;
                }

                for delta in [bounds.step, -bounds.step] {
                    let value = state.point().get(variable) + delta;
                    if !bounds.contains(value) {
                        continue;
                    }

                    let neighbour = state.point().with(variable, value);
                    let candidate = self.evaluate(config, settings, neighbour, variables, excluded)?;
                    state.record_evaluation();

                    if candidate.is_better_than(Some(state.current()), settings.objective) {
                        debug!(
                            "stage {} accepted {}={:.6} objective={:.6} violation={:.6}",
                            stage.name, variable, value, candidate.objective, candidate.violation
                        );
                        state.accept(candidate);
                        improved = true;
                        break 'variables;
                    }
                }

                if state.exhausted() {
                    break;
                }
            }

            if !improved {
                break;
            }
        }
        Ok(())
    }

    fn evaluate(
        &self,
        config: &ProjectionConfig,
        settings: &OptimizationSettings,
        coefficients: LoadingCoefficients,
        variables: &[Coefficient],
        excluded: &[String],
    ) -> Result<CandidateEvaluation> {
        let batch = self.tester.profit_test(config, &coefficients)?;
        Ok(CandidateEvaluation::evaluate(coefficients, batch, settings, variables, excluded))
    }

    fn finish(&self, run: SearchRun, settings: &OptimizationSettings, outcome: OptimizationOutcome) -> OptimizationResult {
        let best = run.best;
        let points = point_reports(&best.batch, settings, &run.exempt);
        let success = best.feasible;

        OptimizationResult {
            outcome,
            success,
            evaluations: run.evaluations,
            coefficients: best.coefficients,
            objective: best.objective,
            violation: best.violation,
            failure_details: if success { Vec::new() } else { best.failure_details },
            exempt_model_points: run.exempt,
            watch_model_points: settings.watch_model_point_ids.clone(),
            min_irr: best.min_irr,
            points,
            stages: run.stages,
            batch: best.batch,
        }
    }
}
