//! Optimizer settings: thresholds, stages, bounds, exemption and fallback

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::assumptions::{Coefficient, LoadingCoefficients};
use crate::error::{PricingError, Result};
use crate::projection::ProjectionConfig;
use crate::sweep::{RatioBasis, RatioScan};

/// Search bounds and step of one coefficient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoefficientBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl CoefficientBounds {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

/// Bounds as written in configuration; absent fields keep the default
#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct PartialBounds {
    min: Option<f64>,
    max: Option<f64>,
    step: Option<f64>,
}

pub fn default_bounds() -> BTreeMap<Coefficient, CoefficientBounds> {
    use Coefficient::*;
    BTreeMap::from([
        (A0, CoefficientBounds::new(0.0, 0.1, 0.002)),
        (AAge, CoefficientBounds::new(-0.005, 0.005, 0.0005)),
        (ATerm, CoefficientBounds::new(-0.005, 0.005, 0.0005)),
        (ASex, CoefficientBounds::new(-0.01, 0.01, 0.001)),
        (B0, CoefficientBounds::new(0.0, 0.05, 0.001)),
        (BAge, CoefficientBounds::new(-0.002, 0.002, 0.0002)),
        (BTerm, CoefficientBounds::new(-0.002, 0.002, 0.0002)),
        (BSex, CoefficientBounds::new(-0.01, 0.01, 0.001)),
        (G0, CoefficientBounds::new(0.0, 0.2, 0.005)),
        (GTerm, CoefficientBounds::new(-0.02, 0.02, 0.002)),
    ])
}

fn merge_bounds<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<Coefficient, CoefficientBounds>, D::Error>
where
    D: Deserializer<'de>,
{
    let configured = BTreeMap::<Coefficient, PartialBounds>::deserialize(deserializer)?;
    let mut bounds = default_bounds();
    for (coefficient, partial) in configured {
        let base = bounds
            .get(&coefficient)
            .copied()
            .unwrap_or(CoefficientBounds::new(f64::NEG_INFINITY, f64::INFINITY, 0.0));
        bounds.insert(
            coefficient,
            CoefficientBounds {
                min: partial.min.unwrap_or(base.min),
                max: partial.max.unwrap_or(base.max),
                step: partial.step.unwrap_or(base.step),
            },
        );
    }
    Ok(bounds)
}

/// One stage of the staged search: the coefficients it may move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub variables: Vec<Coefficient>,
}

impl Stage {
    pub fn new(name: impl Into<String>, variables: Vec<Coefficient>) -> Self {
        Self { name: name.into(), variables }
    }

    /// Stage variables with duplicates removed, first occurrence kept
    pub fn tunable(&self) -> Vec<Coefficient> {
        let mut seen = Vec::with_capacity(self.variables.len());
        for &variable in &self.variables {
            if !seen.contains(&variable) {
                seen.push(variable);
            }
        }
        seen
    }
}

pub fn default_stages() -> Vec<Stage> {
    use Coefficient::*;
    vec![
        Stage::new("base", vec![A0, B0, G0]),
        Stage::new("age_term", vec![A0, B0, G0, AAge, ATerm, BAge, BTerm, GTerm]),
        Stage::new("sex", vec![A0, B0, G0, AAge, ATerm, BAge, BTerm, GTerm, ASex, BSex]),
    ]
}

/// How two feasible candidates are ranked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveMode {
    #[default]
    MinimizePenalty,
    MaximizeMinIrr,
}

/// How exempt model points are determined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExemptionMethod {
    /// Premium-to-maturity sweep; points with no passing ratio are exempt
    #[default]
    SweepPtm,
}

impl FromStr for ExemptionMethod {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sweep_ptm" => Ok(ExemptionMethod::SweepPtm),
            _ => Err(PricingError::UnsupportedExemptionMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for ExemptionMethod {
    type Error = PricingError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ExemptionMethod> for String {
    fn from(method: ExemptionMethod) -> Self {
        method.to_string()
    }
}

impl fmt::Display for ExemptionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExemptionMethod::SweepPtm => write!(f, "sweep_ptm"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExemptionSettings {
    pub enabled: bool,
    pub method: ExemptionMethod,
    pub sweep: RatioScan,
}

impl Default for ExemptionSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            method: ExemptionMethod::SweepPtm,
            sweep: RatioScan {
                basis: RatioBasis::PremiumToMaturity,
                ..RatioScan::default()
            },
        }
    }
}

/// A single configuration change tried by the fallback search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverrideAdjustment {
    /// Lengthen the surrender-charge term
    SurrenderChargeYears { years: u32 },
    /// Lower the IRR floor and IRR target together
    LowerIrr { by: f64 },
    /// Raise the premium-to-maturity ceiling
    PremiumToMaturityCeiling { max: f64 },
}

/// Named, auditable override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackOverride {
    pub name: String,
    pub adjustment: OverrideAdjustment,
}

impl FallbackOverride {
    pub fn new(name: impl Into<String>, adjustment: OverrideAdjustment) -> Self {
        Self { name: name.into(), adjustment }
    }

    /// Configuration and settings with the override applied
    pub fn apply(
        &self,
        config: &ProjectionConfig,
        settings: &OptimizationSettings,
    ) -> (ProjectionConfig, OptimizationSettings) {
        let mut config = config.clone();
        let mut settings = settings.clone();
        match self.adjustment {
            OverrideAdjustment::SurrenderChargeYears { years } => config.surrender_charge_years = years,
            OverrideAdjustment::LowerIrr { by } => {
                settings.irr_hard -= by;
                settings.irr_target -= by;
            }
            OverrideAdjustment::PremiumToMaturityCeiling { max } => settings.premium_to_maturity_hard_max = max,
        }
        (config, settings)
    }

    /// Human-readable account of what the override changes
    pub fn justification(&self, config: &ProjectionConfig, settings: &OptimizationSettings) -> String {
        match self.adjustment {
            OverrideAdjustment::SurrenderChargeYears { years } => format!(
                "{}: surrender charge term extended from {} to {} years",
                self.name, config.surrender_charge_years, years
            ),
            OverrideAdjustment::LowerIrr { by } => format!(
                "{}: irr_hard lowered from {:.4} to {:.4} and irr_target from {:.4} to {:.4}",
                self.name,
                settings.irr_hard,
                settings.irr_hard - by,
                settings.irr_target,
                settings.irr_target - by
            ),
            OverrideAdjustment::PremiumToMaturityCeiling { max } => format!(
                "{}: premium_to_maturity_hard_max raised from {:.4} to {:.4}",
                self.name, settings.premium_to_maturity_hard_max, max
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackPolicy {
    pub enabled: bool,
    pub overrides: Vec<FallbackOverride>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            overrides: vec![
                FallbackOverride::new(
                    "extend_surrender_charge_term",
                    OverrideAdjustment::SurrenderChargeYears { years: 15 },
                ),
                FallbackOverride::new("relax_irr_hard", OverrideAdjustment::LowerIrr { by: 0.01 }),
            ],
        }
    }
}

/// Thresholds, penalties and search controls of the loading optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationSettings {
    pub irr_hard: f64,
    pub irr_target: f64,
    /// Absolute loading-surplus floor, used when no ratio is set
    pub loading_surplus_hard: f64,
    /// Loading-surplus floor per unit sum assured
    pub loading_surplus_hard_ratio: Option<f64>,
    pub premium_to_maturity_hard_max: f64,
    pub premium_to_maturity_target: f64,
    /// Tie-break only
    pub premium_to_maturity_soft_min: Option<f64>,
    pub nbv_hard: f64,
    pub l2_lambda: f64,
    pub max_iterations_per_stage: usize,
    pub objective: ObjectiveMode,
    pub watch_model_point_ids: Vec<String>,
    pub stages: Vec<Stage>,
    #[serde(deserialize_with = "merge_bounds")]
    pub bounds: BTreeMap<Coefficient, CoefficientBounds>,
    pub exemption: ExemptionSettings,
    pub fallback: FallbackPolicy,
}

impl Default for OptimizationSettings {
    fn default() -> Self {
        Self {
            irr_hard: 0.07,
            irr_target: 0.08,
            loading_surplus_hard: 0.0,
            loading_surplus_hard_ratio: Some(-0.10),
            premium_to_maturity_hard_max: 1.05,
            premium_to_maturity_target: 1.0,
            premium_to_maturity_soft_min: None,
            nbv_hard: 0.0,
            l2_lambda: 0.1,
            max_iterations_per_stage: 5000,
            objective: ObjectiveMode::MinimizePenalty,
            watch_model_point_ids: Vec::new(),
            stages: default_stages(),
            bounds: default_bounds(),
            exemption: ExemptionSettings::default(),
            fallback: FallbackPolicy::default(),
        }
    }
}

impl OptimizationSettings {
    /// Loading-surplus floor for a model point
    pub fn loading_surplus_threshold(&self, sum_assured: i64) -> f64 {
        match self.loading_surplus_hard_ratio {
            Some(ratio) => ratio * sum_assured as f64,
            None => self.loading_surplus_hard,
        }
    }

    pub fn bounds_for(&self, coefficient: Coefficient) -> Option<&CoefficientBounds> {
        self.bounds.get(&coefficient)
    }

    pub fn is_watched(&self, label: &str) -> bool {
        self.watch_model_point_ids.iter().any(|id| id == label)
    }

    /// Coefficients with every bounded value clamped into its range
    pub fn clamp(&self, coefficients: &LoadingCoefficients) -> LoadingCoefficients {
        self.bounds.iter().fold(*coefficients, |acc, (&coefficient, bounds)| {
            acc.with(coefficient, bounds.clamp(acc.get(coefficient)))
        })
    }

    /// Reject settings the search cannot run with
    pub fn check(&self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(PricingError::Configuration("optimization stages are empty".into()));
        }
        if self.max_iterations_per_stage == 0 {
            return Err(PricingError::Configuration(
                "max_iterations_per_stage must be positive".into(),
            ));
        }
        for (coefficient, bounds) in &self.bounds {
            if bounds.min > bounds.max {
                return Err(PricingError::Configuration(format!(
                    "bounds for {} have min {} above max {}",
                    coefficient, bounds.min, bounds.max
                )));
            }
        }
        Ok(())
    }
}
