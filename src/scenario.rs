//! Scenario runner for repeated profit tests
//!
//! Pre-loads assumptions and model points once, then runs many profit
//! tests, sweeps and optimizer evaluations without re-reading input files.

use std::path::Path;

use crate::assumptions::{Assumptions, LoadingCoefficients, LoadingSource};
use crate::error::{PricingError, Result};
use crate::policy::ModelPoint;
use crate::projection::{BatchResult, ProjectionConfig, ProjectionEngine};
use crate::sweep::{self, MinimumRatio, RatioScan, SweepAllOutcome, SweepOutcome, SweepThresholds};

/// The evaluations the loading optimizer needs from the pipeline
pub trait ProfitTester {
    /// Profit test every model point with per-point loadings from `coefficients`
    fn profit_test(&self, config: &ProjectionConfig, coefficients: &LoadingCoefficients) -> Result<BatchResult>;

    /// Smallest ratio in `scan` whose IRR clears the scan threshold, per model point
    fn minimum_ratios(
        &self,
        config: &ProjectionConfig,
        coefficients: &LoadingCoefficients,
        scan: &RatioScan,
    ) -> Result<Vec<MinimumRatio>>;
}

/// Pre-loaded runner over a fixed set of model points
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_csv_path(Path::new("data/assumptions"), points)?;
///
/// for lapse in [0.02, 0.03, 0.05] {
///     let config = ProjectionConfig { lapse_rate: lapse, ..Default::default() };
///     let batch = runner.run(&config, &source)?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    assumptions: Assumptions,
    model_points: Vec<ModelPoint>,
}

impl ScenarioRunner {
    pub fn new(assumptions: Assumptions, model_points: Vec<ModelPoint>) -> Result<Self> {
        if model_points.is_empty() {
            return Err(PricingError::InvalidInput("model points are missing".into()));
        }
        for point in &model_points {
            point.validate()?;
        }
        Ok(Self { assumptions, model_points })
    }

    /// Create runner from a specific assumptions directory
    pub fn from_csv_path(path: &Path, model_points: Vec<ModelPoint>) -> Result<Self> {
        Self::new(Assumptions::from_csv_path(path)?, model_points)
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    pub fn model_points(&self) -> &[ModelPoint] {
        &self.model_points
    }

    pub fn find_model_point(&self, label: &str) -> Option<&ModelPoint> {
        self.model_points.iter().find(|p| p.label() == label)
    }

    /// Profit test every model point
    pub fn run(&self, config: &ProjectionConfig, source: &LoadingSource) -> Result<BatchResult> {
        let engine = ProjectionEngine::new(&self.assumptions, config);
        engine.project_batch(&self.model_points, source)
    }

    /// Premium sweep of one model point
    pub fn sweep_model_point(
        &self,
        config: &ProjectionConfig,
        label: &str,
        source: &LoadingSource,
        scan: &RatioScan,
    ) -> Result<SweepOutcome> {
        let point = self
            .find_model_point(label)
            .ok_or_else(|| PricingError::InvalidInput(format!("unknown model point: {}", label)))?;
        let engine = ProjectionEngine::new(&self.assumptions, config);
        sweep::sweep_model_point(&engine, point, source.loadings_for(point), scan)
    }

    /// Premium sweep of every model point
    pub fn sweep_all(
        &self,
        config: &ProjectionConfig,
        source: &LoadingSource,
        scan: &RatioScan,
        thresholds: &SweepThresholds,
    ) -> Result<SweepAllOutcome> {
        let engine = ProjectionEngine::new(&self.assumptions, config);
        sweep::sweep_all(&engine, &self.model_points, source, scan, thresholds)
    }
}

impl ProfitTester for ScenarioRunner {
    fn profit_test(&self, config: &ProjectionConfig, coefficients: &LoadingCoefficients) -> Result<BatchResult> {
        self.run(config, &LoadingSource::Coefficients(*coefficients))
    }

    fn minimum_ratios(
        &self,
        config: &ProjectionConfig,
        coefficients: &LoadingCoefficients,
        scan: &RatioScan,
    ) -> Result<Vec<MinimumRatio>> {
        let source = LoadingSource::Coefficients(*coefficients);
        let outcome = self.sweep_all(config, &source, scan, &SweepThresholds::irr_only(scan.irr_threshold))?;
        Ok(outcome.minimum_ratios())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn runner() -> ScenarioRunner {
        ScenarioRunner::new(fixtures::assumptions(), fixtures::model_points()).unwrap()
    }

    #[test]
    fn test_requires_model_points() {
        assert!(ScenarioRunner::new(fixtures::assumptions(), Vec::new()).is_err());
    }

    #[test]
    fn test_scenario_runner_lapse_scenarios() {
        let runner = runner();
        let source = LoadingSource::Coefficients(LoadingCoefficients::default());

        let results: Vec<_> = [0.01, 0.03, 0.06]
            .iter()
            .map(|&lapse| {
                let config = ProjectionConfig { lapse_rate: lapse, ..fixtures::projection_config() };
                runner.run(&config, &source).unwrap()
            })
            .collect();

        assert_eq!(results.len(), 3);
        // Higher lapse leaves fewer policies in force at maturity
        let final_inforce = |batch: &BatchResult| batch.results[0].cashflows.last().unwrap().inforce_end;
        assert!(final_inforce(&results[2]) < final_inforce(&results[0]));
    }

    #[test]
    fn test_profit_tester_matches_run() {
        let runner = runner();
        let config = fixtures::projection_config();
        let coefficients = LoadingCoefficients::default();

        let via_trait = runner.profit_test(&config, &coefficients).unwrap();
        let direct = runner.run(&config, &LoadingSource::Coefficients(coefficients)).unwrap();
        assert_eq!(via_trait.summary(), direct.summary());
    }

    #[test]
    fn test_sweep_unknown_model_point() {
        let runner = runner();
        let source = LoadingSource::Coefficients(LoadingCoefficients::default());
        let result = runner.sweep_model_point(&fixtures::projection_config(), "nope", &source, &RatioScan::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_minimum_ratios_in_point_order() {
        let runner = runner();
        let scan = RatioScan { irr_threshold: -0.99, ..Default::default() };
        let minimums = runner
            .minimum_ratios(&fixtures::projection_config(), &LoadingCoefficients::default(), &scan)
            .unwrap();
        let labels: Vec<_> = minimums.iter().map(|m| m.model_point.as_str()).collect();
        assert_eq!(labels, vec!["m30_10", "f45_20", "m50_15"]);
    }
}
