//! Value types produced by the present-value and reserve calculations

use serde::{Deserialize, Serialize};

/// Present-value factors per unit sum assured
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndowmentFactors {
    /// A: death benefit (mid-year) plus maturity benefit (end of term)
    pub benefit: f64,
    /// a: premium annuity-due over the paying period
    pub annuity: f64,
}

/// Premium rates and rounded annual/monthly premiums
///
/// The integer amounts are rounded once, here, and never again downstream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EndowmentPremiums {
    pub factors: EndowmentFactors,
    pub net_rate: f64,
    pub gross_rate: f64,
    pub net_annual_premium: i64,
    pub gross_annual_premium: i64,
    pub monthly_premium: i64,
}

impl EndowmentPremiums {
    /// Same rates with the gross premium replaced by an externally chosen amount
    pub fn with_gross_premium(&self, gross_annual_premium: i64) -> Self {
        Self {
            gross_annual_premium,
            monthly_premium: super::round_currency(gross_annual_premium as f64 / 12.0),
            ..*self
        }
    }

    /// Gross minus net annual premium
    pub fn loading_margin(&self) -> i64 {
        self.gross_annual_premium - self.net_annual_premium
    }
}

/// Reserve (tV) and surrender value (tW) factors for t = 0..=term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReserveSeries {
    pub interest_rate: f64,
    /// Net premium rate fixed at issue
    pub net_rate: f64,
    pub reserve: Vec<f64>,
    pub surrender_value: Vec<f64>,
}

/// In-force roll-forward for t = 0..term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecrementSeries {
    pub inforce_begin: Vec<f64>,
    pub inforce_end: Vec<f64>,
    pub death_rate: Vec<f64>,
    pub lapse_rate: Vec<f64>,
}

impl DecrementSeries {
    pub fn len(&self) -> usize {
        self.inforce_begin.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inforce_begin.is_empty()
    }
}
