//! JSON run configuration
//!
//! Paths inside the file are resolved against the directory holding it.

mod validation;

pub use validation::{has_errors, validate, IssueLevel, ValidationIssue};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::assumptions::{
    loader, Assumptions, ExpenseAssumptions, ExpenseModel, LoadingCoefficients, LoadingSource, LoadingTriple,
    OverheadSplit,
};
use crate::error::{PricingError, Result};
use crate::optimize::OptimizationSettings;
use crate::policy::{load_model_points, ModelPoint, Sex};
use crate::projection::{
    ProjectionConfig, DEFAULT_ACQUISITION_EXPENSE_SHARE, DEFAULT_LAPSE_RATE, DEFAULT_VALUATION_INTEREST,
};
use crate::reserves::DEFAULT_SURRENDER_CHARGE_YEARS;
use crate::scenario::ScenarioRunner;

/// Product-level defaults for model-point fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductDefaults {
    pub term_years: Option<u32>,
    pub premium_paying_years: Option<u32>,
    pub sum_assured: Option<i64>,
}

/// One model point as configured; missing fields fall back to the product block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPointEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub issue_age: u32,
    pub sex: String,
    #[serde(default)]
    pub term_years: Option<u32>,
    #[serde(default)]
    pub premium_paying_years: Option<u32>,
    #[serde(default)]
    pub sum_assured: Option<i64>,
}

impl ModelPointEntry {
    pub fn resolve(&self, product: &ProductDefaults) -> Result<ModelPoint> {
        let label = self.id.clone().unwrap_or_else(|| format!("{}_age{}", self.sex, self.issue_age));
        let missing = |field: &str| PricingError::InvalidModelPoint {
            label: label.clone(),
            reason: format!("{} is missing", field),
        };

        let sex = Sex::from_str(&self.sex)?;
        let term = self.term_years.or(product.term_years).ok_or_else(|| missing("term_years"))?;
        let premium_years = self
            .premium_paying_years
            .or(product.premium_paying_years)
            .ok_or_else(|| missing("premium_paying_years"))?;
        let sum_assured = self.sum_assured.or(product.sum_assured).ok_or_else(|| missing("sum_assured"))?;

        let point = ModelPoint::new(self.issue_age, sex, term, premium_years, sum_assured)?;
        Ok(match &self.id {
            Some(id) => point.with_id(id.clone()),
            None => point,
        })
    }
}

/// Interest term structure selector; only flat rates are supported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum InterestKind {
    #[default]
    Flat,
}

impl FromStr for InterestKind {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "flat" => Ok(InterestKind::Flat),
            other => Err(PricingError::UnsupportedInterestType(other.to_string())),
        }
    }
}

impl TryFrom<String> for InterestKind {
    type Error = PricingError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<InterestKind> for String {
    fn from(kind: InterestKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for InterestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterestKind::Flat => write!(f, "flat"),
        }
    }
}

/// Interest block, `{"type": "flat", "flat_rate": ..}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestConfig {
    #[serde(rename = "type")]
    pub kind: InterestKind,
    #[serde(default)]
    pub flat_rate: Option<f64>,
}

impl InterestConfig {
    pub fn flat(rate: f64) -> Self {
        Self { kind: InterestKind::Flat, flat_rate: Some(rate) }
    }

    pub fn flat_rate(&self) -> Result<f64> {
        match self.kind {
            InterestKind::Flat => self
                .flat_rate
                .ok_or_else(|| PricingError::Configuration("pricing.interest.flat_rate is missing".into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSection {
    pub interest: InterestConfig,
    pub mortality_path: PathBuf,
}

/// Expense-model selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExpenseMode {
    #[default]
    Company,
    Loading,
}

impl FromStr for ExpenseMode {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "company" => Ok(ExpenseMode::Company),
            "loading" => Ok(ExpenseMode::Loading),
            other => Err(PricingError::UnsupportedExpenseMode(other.to_string())),
        }
    }
}

impl TryFrom<String> for ExpenseMode {
    type Error = PricingError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ExpenseMode> for String {
    fn from(mode: ExpenseMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for ExpenseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExpenseMode::Company => "company",
            ExpenseMode::Loading => "loading",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseModelConfig {
    #[serde(default)]
    pub mode: ExpenseMode,
    #[serde(default)]
    pub company_data_path: Option<PathBuf>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub overhead_split: OverheadSplit,
}

fn default_valuation_interest() -> f64 {
    DEFAULT_VALUATION_INTEREST
}

fn default_lapse_rate() -> f64 {
    DEFAULT_LAPSE_RATE
}

fn default_surrender_charge_years() -> u32 {
    DEFAULT_SURRENDER_CHARGE_YEARS
}

fn default_acquisition_expense_share() -> f64 {
    DEFAULT_ACQUISITION_EXPENSE_SHARE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitTestSection {
    #[serde(default = "default_valuation_interest")]
    pub valuation_interest_rate: f64,
    #[serde(default = "default_lapse_rate")]
    pub lapse_rate: f64,
    #[serde(default = "default_surrender_charge_years")]
    pub surrender_charge_years: u32,
    #[serde(default = "default_acquisition_expense_share")]
    pub acquisition_expense_share: f64,
    pub mortality_actual_path: PathBuf,
    pub discount_curve_path: PathBuf,
    #[serde(default)]
    pub expense_model: ExpenseModelConfig,
}

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub product: ProductDefaults,
    /// Single model point, used when `model_points` is empty
    #[serde(default)]
    pub model_point: Option<ModelPointEntry>,
    #[serde(default)]
    pub model_points: Vec<ModelPointEntry>,
    /// CSV of model points; takes precedence over inline entries
    #[serde(default)]
    pub model_points_path: Option<PathBuf>,
    pub pricing: PricingSection,
    pub profit_test: ProfitTestSection,
    #[serde(default)]
    pub loading_parameters: Option<LoadingCoefficients>,
    #[serde(default)]
    pub loading_alpha_beta_gamma: Option<LoadingTriple>,
    #[serde(default)]
    pub optimization: OptimizationSettings,
    #[serde(skip)]
    base_dir: PathBuf,
}

impl PricingConfig {
    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_json_str(&text, base_dir)
    }

    pub fn from_json_str(json: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut config: PricingConfig = serde_json::from_str(json)?;
        config.base_dir = base_dir.into();
        Ok(config)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Configured inline entries, in order
    pub fn model_point_entries(&self) -> Vec<&ModelPointEntry> {
        if self.model_points.is_empty() {
            self.model_point.iter().collect()
        } else {
            self.model_points.iter().collect()
        }
    }

    pub fn model_points(&self) -> Result<Vec<ModelPoint>> {
        if let Some(path) = &self.model_points_path {
            return load_model_points(self.resolve_path(path));
        }

        let entries = self.model_point_entries();
        if entries.is_empty() {
            return Err(PricingError::Configuration("no model points configured".into()));
        }
        entries.iter().map(|entry| entry.resolve(&self.product)).collect()
    }

    pub fn expense_model(&self) -> Result<ExpenseModel> {
        let expense = &self.profit_test.expense_model;
        match expense.mode {
            ExpenseMode::Loading => Ok(ExpenseModel::Loading),
            ExpenseMode::Company => {
                let path = expense.company_data_path.as_ref().ok_or_else(|| {
                    PricingError::Configuration("expense_model.company_data_path is required in company mode".into())
                })?;
                let records = loader::load_company_expenses(&self.resolve_path(path))?;
                let assumptions = ExpenseAssumptions::from_records(&records, expense.year, expense.overhead_split)?;
                Ok(ExpenseModel::Company(assumptions))
            }
        }
    }

    pub fn projection_config(&self) -> Result<ProjectionConfig> {
        let profit_test = &self.profit_test;
        Ok(ProjectionConfig {
            pricing_interest: self.pricing.interest.flat_rate()?,
            valuation_interest: profit_test.valuation_interest_rate,
            lapse_rate: profit_test.lapse_rate,
            surrender_charge_years: profit_test.surrender_charge_years,
            acquisition_expense_share: profit_test.acquisition_expense_share,
            expense_model: self.expense_model()?,
        })
    }

    pub fn assumptions(&self) -> Result<Assumptions> {
        let pricing = loader::load_mortality_rows(&self.resolve_path(&self.pricing.mortality_path))?;
        let actual = loader::load_mortality_rows(&self.resolve_path(&self.profit_test.mortality_actual_path))?;
        let curve = loader::load_spot_curve(&self.resolve_path(&self.profit_test.discount_curve_path))?;
        Ok(Assumptions::new(&pricing, &actual, curve))
    }

    /// Loading coefficients win over a fixed triple
    pub fn loading_source(&self) -> Result<LoadingSource> {
        match (self.loading_parameters, self.loading_alpha_beta_gamma) {
            (Some(coefficients), _) => Ok(LoadingSource::Coefficients(coefficients)),
            (None, Some(triple)) => Ok(LoadingSource::Fixed(triple)),
            (None, None) => Err(PricingError::Configuration(
                "either loading_parameters or loading_alpha_beta_gamma is required".into(),
            )),
        }
    }

    /// Optimizer starting point
    pub fn initial_coefficients(&self) -> LoadingCoefficients {
        self.loading_parameters.unwrap_or_default()
    }

    pub fn scenario_runner(&self) -> Result<ScenarioRunner> {
        ScenarioRunner::new(self.assumptions()?, self.model_points()?)
    }
}
