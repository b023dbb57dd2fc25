//! Mortality tables built from raw (age, male rate, female rate) rows
//!
//! A table holds one sex's annual rates keyed by integer age. Lookups for an
//! age that is not in the table fail; there is no extrapolation or default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};
use crate::policy::Sex;

/// One raw row of a mortality input file
///
/// Either rate may be absent; a missing value only removes the age from
/// that sex's table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortalityRow {
    pub age: u32,
    pub q_male: Option<f64>,
    pub q_female: Option<f64>,
}

impl MortalityRow {
    pub fn new(age: u32, q_male: Option<f64>, q_female: Option<f64>) -> Self {
        Self { age, q_male, q_female }
    }

    /// Rate for the requested sex, if present and a valid probability
    pub fn rate(&self, sex: Sex) -> Option<f64> {
        let q = match sex {
            Sex::Male => self.q_male,
            Sex::Female => self.q_female,
        }?;
        (q.is_finite() && (0.0..=1.0).contains(&q)).then_some(q)
    }
}

/// Age-indexed annual mortality rates for one sex
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MortalityTable {
    rates: BTreeMap<u32, f64>,
}

impl MortalityTable {
    /// Select one sex's column from raw rows, skipping invalid values
    pub fn from_rows(rows: &[MortalityRow], sex: Sex) -> Self {
        let rates = rows
            .iter()
            .filter_map(|row| row.rate(sex).map(|q| (row.age, q)))
            .collect();
        Self { rates }
    }

    /// Build directly from (age, rate) pairs
    pub fn from_rates<I: IntoIterator<Item = (u32, f64)>>(rates: I) -> Self {
        Self {
            rates: rates.into_iter().collect(),
        }
    }

    /// Annual mortality rate at `age`
    pub fn rate(&self, age: u32) -> Result<f64> {
        self.rates
            .get(&age)
            .copied()
            .ok_or(PricingError::MissingMortalityRate { age })
    }

    pub fn contains(&self, age: u32) -> bool {
        self.rates.contains_key(&age)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Highest age present in the table
    pub fn max_age(&self) -> Option<u32> {
        self.rates.keys().next_back().copied()
    }

    /// Survival probabilities p[0..=years] from `issue_age`
    ///
    /// p[0] is exactly 1.0 and p[t+1] = p[t] * (1 - q[issue_age + t]).
    pub fn survival_probabilities(&self, issue_age: u32, years: u32) -> Result<Vec<f64>> {
        let mut p = Vec::with_capacity(years as usize + 1);
        p.push(1.0);

        let mut current = 1.0;
        for t in 0..years {
            let q = self.rate(issue_age + t)?;
            current *= 1.0 - q;
            p.push(current);
        }

        Ok(p)
    }
}

/// Build one sex's rate table from raw rows
///
/// Fails for any sex label other than male/female.
pub fn build_rate_table(rows: &[MortalityRow], sex: &str) -> Result<MortalityTable> {
    let sex: Sex = sex.parse()?;
    Ok(MortalityTable::from_rows(rows, sex))
}

/// Free-function form of [`MortalityTable::survival_probabilities`]
pub fn survival_probabilities(
    table: &MortalityTable,
    issue_age: u32,
    years: u32,
) -> Result<Vec<f64>> {
    table.survival_probabilities(issue_age, years)
}
