//! Premium scaling sweep
//!
//! Re-projects a model point over a grid of premium ratios and reports the
//! smallest ratio whose results clear the thresholds. The optimizer uses the
//! same scan to decide which model points are exempt.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assumptions::{LoadingSource, LoadingTriple};
use crate::error::{PricingError, Result};
use crate::policy::ModelPoint;
use crate::projection::{ProfitTestResult, ProjectionEngine};
use crate::reserves::round_currency;

const GRID_TOLERANCE: f64 = 1e-12;

/// What the swept ratio multiplies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioBasis {
    /// gross = round(baseline gross premium * r)
    #[default]
    BaselinePremium,
    /// gross = round(r * sum assured / premium-paying years)
    PremiumToMaturity,
}

impl RatioBasis {
    pub fn gross_premium(&self, ratio: f64, baseline_gross: i64, point: &ModelPoint) -> i64 {
        match self {
            RatioBasis::BaselinePremium => round_currency(baseline_gross as f64 * ratio),
            RatioBasis::PremiumToMaturity => {
                round_currency(ratio * point.sum_assured as f64 / point.premium_paying_years as f64)
            }
        }
    }
}

/// Ratio grid and IRR threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatioScan {
    pub start: f64,
    pub end: f64,
    pub step: f64,
    pub irr_threshold: f64,
    pub basis: RatioBasis,
}

impl Default for RatioScan {
    fn default() -> Self {
        Self {
            start: 1.0,
            end: 1.05,
            step: 0.01,
            irr_threshold: 0.0,
            basis: RatioBasis::BaselinePremium,
        }
    }
}

impl RatioScan {
    /// Ascending ratios start, start+step, ... up to end (inclusive), rounded to 10 places
    pub fn ratios(&self) -> Result<Vec<f64>> {
        if !(self.step > 0.0) {
            return Err(PricingError::NonPositive { what: "sweep step", value: self.step });
        }

        let mut ratios = Vec::new();
        let mut k = 0u32;
        loop {
            let value = round10(self.start + k as f64 * self.step);
            if value > self.end + GRID_TOLERANCE {
                break;
            }
            ratios.push(value);
            k += 1;
        }
        Ok(ratios)
    }
}

fn round10(value: f64) -> f64 {
    (value * 1e10).round() / 1e10
}

/// Joint thresholds for the all-points scan; `None` disables a check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepThresholds {
    pub irr: f64,
    pub nbv: Option<f64>,
    pub loading_surplus_ratio: Option<f64>,
    pub premium_to_maturity_max: Option<f64>,
}

impl SweepThresholds {
    pub fn irr_only(irr: f64) -> Self {
        Self {
            irr,
            nbv: None,
            loading_surplus_ratio: None,
            premium_to_maturity_max: None,
        }
    }

    fn passes(&self, row: &SweepRow) -> bool {
        row.irr >= self.irr
            && self.nbv.map_or(true, |floor| row.new_business_value >= floor)
            && self
                .loading_surplus_ratio
                .map_or(true, |floor| row.loading_surplus_ratio >= floor)
            && self
                .premium_to_maturity_max
                .map_or(true, |cap| row.premium_to_maturity_ratio <= cap)
    }
}

/// Results at one scanned ratio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub model_point: String,
    pub ratio: f64,
    pub gross_annual_premium: i64,
    pub irr: f64,
    pub new_business_value: f64,
    pub loading_surplus: f64,
    pub loading_surplus_ratio: f64,
    pub premium_to_maturity_ratio: f64,
    pub passes: bool,
}

impl SweepRow {
    fn from_result(result: &ProfitTestResult, ratio: f64) -> Self {
        Self {
            model_point: result.label(),
            ratio,
            gross_annual_premium: result.premiums.gross_annual_premium,
            irr: result.irr,
            new_business_value: result.new_business_value,
            loading_surplus: result.loading_surplus,
            loading_surplus_ratio: result.loading_surplus_ratio(),
            premium_to_maturity_ratio: result.premium_to_maturity_ratio,
            passes: false,
        }
    }
}

/// Scan of one model point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub model_point: String,
    pub rows: Vec<SweepRow>,
    /// Smallest passing ratio, if any
    pub minimum_ratio: Option<f64>,
    /// Gross premium at the minimum ratio
    pub minimum_gross_premium: Option<i64>,
}

/// Minimum passing ratio for one model point (None: not found)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimumRatio {
    pub model_point: String,
    pub ratio: Option<f64>,
}

/// Scan of every model point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepAllOutcome {
    pub outcomes: Vec<SweepOutcome>,
}

impl SweepAllOutcome {
    pub fn rows(&self) -> impl Iterator<Item = &SweepRow> {
        self.outcomes.iter().flat_map(|o| o.rows.iter())
    }

    pub fn minimum_ratios(&self) -> Vec<MinimumRatio> {
        self.outcomes
            .iter()
            .map(|o| MinimumRatio {
                model_point: o.model_point.clone(),
                ratio: o.minimum_ratio,
            })
            .collect()
    }

    /// Model points with no passing ratio in range
    pub fn not_found(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| o.minimum_ratio.is_none())
            .map(|o| o.model_point.clone())
            .collect()
    }
}

/// Scan one model point against the IRR threshold of `scan`
pub fn sweep_model_point(
    engine: &ProjectionEngine,
    point: &ModelPoint,
    loadings: LoadingTriple,
    scan: &RatioScan,
) -> Result<SweepOutcome> {
    scan_point(engine, point, loadings, scan, &SweepThresholds::irr_only(scan.irr_threshold))
}

/// Scan every model point against joint thresholds
pub fn sweep_all(
    engine: &ProjectionEngine,
    points: &[ModelPoint],
    source: &LoadingSource,
    scan: &RatioScan,
    thresholds: &SweepThresholds,
) -> Result<SweepAllOutcome> {
    let outcomes = points
        .par_iter()
        .map(|point| scan_point(engine, point, source.loadings_for(point), scan, thresholds))
        .collect::<Result<Vec<_>>>()?;

    Ok(SweepAllOutcome { outcomes })
}

fn scan_point(
    engine: &ProjectionEngine,
    point: &ModelPoint,
    loadings: LoadingTriple,
    scan: &RatioScan,
    thresholds: &SweepThresholds,
) -> Result<SweepOutcome> {
    let ratios = scan.ratios()?;
    let baseline_gross = engine.premiums(point, &loadings)?.gross_annual_premium;

    let mut rows = Vec::with_capacity(ratios.len());
    let mut minimum: Option<(f64, i64)> = None;

    for ratio in ratios {
        let gross = scan.basis.gross_premium(ratio, baseline_gross, point);
        let result = engine.project_with_gross_premium(point, loadings, gross)?;

        let mut row = SweepRow::from_result(&result, ratio);
        row.passes = thresholds.passes(&row);
        if row.passes && minimum.is_none() {
            minimum = Some((ratio, gross));
        }
        rows.push(row);
    }

    Ok(SweepOutcome {
        model_point: point.label(),
        rows,
        minimum_ratio: minimum.map(|(r, _)| r),
        minimum_gross_premium: minimum.map(|(_, g)| g),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::LoadingCoefficients;
    use crate::fixtures;

    #[test]
    fn test_ratio_grid() {
        let scan = RatioScan::default();
        let ratios = scan.ratios().unwrap();
        assert_eq!(ratios, vec![1.0, 1.01, 1.02, 1.03, 1.04, 1.05]);

        let scan = RatioScan { start: 0.9, end: 1.0, step: 0.05, ..Default::default() };
        assert_eq!(scan.ratios().unwrap(), vec![0.9, 0.95, 1.0]);
    }

    #[test]
    fn test_non_positive_step() {
        let scan = RatioScan { step: 0.0, ..Default::default() };
        assert!(scan.ratios().is_err());
        let scan = RatioScan { step: -0.01, ..Default::default() };
        assert!(scan.ratios().is_err());
    }

    #[test]
    fn test_gross_premium_by_basis() {
        let point = fixtures::model_point();
        assert_eq!(RatioBasis::BaselinePremium.gross_premium(1.02, 100_000, &point), 102_000);
        assert_eq!(RatioBasis::PremiumToMaturity.gross_premium(1.02, 100_000, &point), 102_000);
        assert_eq!(RatioBasis::PremiumToMaturity.gross_premium(1.0, 0, &point), 100_000);
    }

    #[test]
    fn test_sweep_single_point() {
        let assumptions = fixtures::assumptions();
        let config = fixtures::projection_config();
        let engine = ProjectionEngine::new(&assumptions, &config);
        let point = fixtures::model_point();

        let scan = RatioScan { irr_threshold: 0.04, ..Default::default() };
        let outcome = sweep_model_point(&engine, &point, fixtures::loadings(), &scan).unwrap();

        assert_eq!(outcome.rows.len(), 6);
        let first_passing = outcome.rows.iter().find(|r| r.irr >= 0.04).map(|r| r.ratio);
        assert_eq!(outcome.minimum_ratio, first_passing);

        // Scaling the premium up raises the IRR
        for window in outcome.rows.windows(2) {
            assert!(window[1].irr > window[0].irr);
        }
    }

    #[test]
    fn test_unreachable_threshold_not_found() {
        let assumptions = fixtures::assumptions();
        let config = fixtures::projection_config();
        let engine = ProjectionEngine::new(&assumptions, &config);

        let scan = RatioScan { irr_threshold: 5.0, ..Default::default() };
        let outcome = sweep_model_point(&engine, &fixtures::model_point(), fixtures::loadings(), &scan).unwrap();
        assert_eq!(outcome.rows.len(), 6);
        assert_eq!(outcome.minimum_ratio, None);
        assert_eq!(outcome.minimum_gross_premium, None);
    }

    #[test]
    fn test_sweep_all_joint_thresholds() {
        let assumptions = fixtures::assumptions();
        let config = fixtures::projection_config();
        let engine = ProjectionEngine::new(&assumptions, &config);
        let points = fixtures::model_points();
        let source = LoadingSource::Coefficients(LoadingCoefficients::default());
        let scan = RatioScan::default();

        let loose = sweep_all(&engine, &points, &source, &scan, &SweepThresholds::irr_only(-0.99)).unwrap();
        assert_eq!(loose.outcomes.len(), 3);
        assert_eq!(loose.rows().count(), 18);
        assert!(loose.not_found().is_empty());
        assert!(loose.minimum_ratios().iter().all(|m| m.ratio == Some(1.0)));

        let capped = SweepThresholds {
            premium_to_maturity_max: Some(0.0),
            ..SweepThresholds::irr_only(-0.99)
        };
        let strict = sweep_all(&engine, &points, &source, &scan, &capped).unwrap();
        assert_eq!(strict.not_found().len(), 3);
    }
}
