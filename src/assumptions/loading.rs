//! Expense loadings: the ten-coefficient linear formula and its per-point output

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PricingError, Result};
use crate::policy::ModelPoint;

/// Reference issue age of the age-sensitivity terms
const REFERENCE_AGE: f64 = 30.0;
/// Reference term of the term-sensitivity terms
const REFERENCE_TERM: f64 = 10.0;
/// Upper clamp on the collection (rate-type) loading
const GAMMA_CAP: f64 = 0.5;

/// Loadings applied to one model point
///
/// alpha and beta are per unit of sum assured; gamma is a rate on gross premium.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadingTriple {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl LoadingTriple {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }
}

/// Name of one tunable loading coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coefficient {
    A0,
    AAge,
    ATerm,
    ASex,
    B0,
    BAge,
    BTerm,
    BSex,
    G0,
    GTerm,
}

impl Coefficient {
    pub const ALL: [Coefficient; 10] = [
        Coefficient::A0,
        Coefficient::AAge,
        Coefficient::ATerm,
        Coefficient::ASex,
        Coefficient::B0,
        Coefficient::BAge,
        Coefficient::BTerm,
        Coefficient::BSex,
        Coefficient::G0,
        Coefficient::GTerm,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Coefficient::A0 => "a0",
            Coefficient::AAge => "a_age",
            Coefficient::ATerm => "a_term",
            Coefficient::ASex => "a_sex",
            Coefficient::B0 => "b0",
            Coefficient::BAge => "b_age",
            Coefficient::BTerm => "b_term",
            Coefficient::BSex => "b_sex",
            Coefficient::G0 => "g0",
            Coefficient::GTerm => "g_term",
        }
    }
}

impl FromStr for Coefficient {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self> {
        Coefficient::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| PricingError::Configuration(format!("unknown loading coefficient: {}", s)))
    }
}

impl fmt::Display for Coefficient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Linear loading formula coefficients
///
/// `alpha = a0 + a_age*(age-30) + a_term*(term-10) + a_sex*is_female`,
/// beta likewise with the `b` terms, and
/// `gamma = clamp(g0 + g_term*(term-10), 0, 0.5)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingCoefficients {
    pub a0: f64,
    pub a_age: f64,
    pub a_term: f64,
    pub a_sex: f64,
    pub b0: f64,
    pub b_age: f64,
    pub b_term: f64,
    pub b_sex: f64,
    pub g0: f64,
    pub g_term: f64,
}

impl Default for LoadingCoefficients {
    fn default() -> Self {
        Self {
            a0: 0.03,
            a_age: 0.0,
            a_term: 0.0,
            a_sex: 0.0,
            b0: 0.007,
            b_age: 0.0,
            b_term: 0.0,
            b_sex: 0.0,
            g0: 0.03,
            g_term: 0.0,
        }
    }
}

impl LoadingCoefficients {
    pub fn get(&self, coefficient: Coefficient) -> f64 {
        match coefficient {
            Coefficient::A0 => self.a0,
            Coefficient::AAge => self.a_age,
            Coefficient::ATerm => self.a_term,
            Coefficient::ASex => self.a_sex,
            Coefficient::B0 => self.b0,
            Coefficient::BAge => self.b_age,
            Coefficient::BTerm => self.b_term,
            Coefficient::BSex => self.b_sex,
            Coefficient::G0 => self.g0,
            Coefficient::GTerm => self.g_term,
        }
    }

    /// New snapshot with one coefficient replaced
    pub fn with(&self, coefficient: Coefficient, value: f64) -> Self {
        let mut next = *self;
        let slot = match coefficient {
            Coefficient::A0 => &mut next.a0,
            Coefficient::AAge => &mut next.a_age,
            Coefficient::ATerm => &mut next.a_term,
            Coefficient::ASex => &mut next.a_sex,
            Coefficient::B0 => &mut next.b0,
            Coefficient::BAge => &mut next.b_age,
            Coefficient::BTerm => &mut next.b_term,
            Coefficient::BSex => &mut next.b_sex,
            Coefficient::G0 => &mut next.g0,
            Coefficient::GTerm => &mut next.g_term,
        };
        *slot = value;
        next
    }

    /// Loadings for one model point
    pub fn loadings_for(&self, point: &ModelPoint) -> LoadingTriple {
        let age_diff = point.issue_age as f64 - REFERENCE_AGE;
        let term_diff = point.term_years as f64 - REFERENCE_TERM;
        let female = if point.is_female() { 1.0 } else { 0.0 };

        let alpha = self.a0 + self.a_age * age_diff + self.a_term * term_diff + self.a_sex * female;
        let beta = self.b0 + self.b_age * age_diff + self.b_term * term_diff + self.b_sex * female;
        let gamma = (self.g0 + self.g_term * term_diff).clamp(0.0, GAMMA_CAP);

        LoadingTriple { alpha, beta, gamma }
    }
}

/// Where a profit-test run takes its loadings from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingSource {
    /// Per-point loadings from the linear formula
    Coefficients(LoadingCoefficients),
    /// The same loadings for every model point
    Fixed(LoadingTriple),
}

impl LoadingSource {
    pub fn loadings_for(&self, point: &ModelPoint) -> LoadingTriple {
        match self {
            LoadingSource::Coefficients(coefficients) => coefficients.loadings_for(point),
            LoadingSource::Fixed(triple) => *triple,
        }
    }
}
