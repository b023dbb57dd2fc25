//! Spot-rate discount curve indexed by policy year
//!
//! Year 1 is the first policy year. Every lookup for a missing year is an
//! error; the curve is never extrapolated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};

/// Annual spot rates by whole policy year
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscountCurve {
    spot_rates: BTreeMap<u32, f64>,
}

impl DiscountCurve {
    /// Create discount curve from (year, spot rate) pairs
    pub fn from_spot_rates<I: IntoIterator<Item = (u32, f64)>>(rates: I) -> Self {
        Self {
            spot_rates: rates.into_iter().collect(),
        }
    }

    /// Flat curve for years 1..=years
    pub fn flat(rate: f64, years: u32) -> Self {
        Self::from_spot_rates((1..=years).map(|y| (y, rate)))
    }

    /// Spot rate to the end of policy year `year`
    pub fn spot(&self, year: u32) -> Result<f64> {
        self.spot_rates
            .get(&year)
            .copied()
            .ok_or(PricingError::MissingSpotRate { year })
    }

    pub fn max_year(&self) -> Option<u32> {
        self.spot_rates.keys().next_back().copied()
    }

    /// One-year forward rates for projection years 0..term
    ///
    /// The first year's forward is the year-1 spot; later years use
    /// `(1+s[t+1])^(t+1) / (1+s[t])^t - 1`.
    pub fn forward_rates(&self, term_years: u32) -> Result<Vec<f64>> {
        let mut forwards = Vec::with_capacity(term_years as usize);

        for t in 0..term_years {
            let spot_next = self.spot(t + 1)?;
            if t == 0 {
                forwards.push(spot_next);
                continue;
            }
            let spot_prev = self.spot(t)?;
            let forward = (1.0 + spot_next).powi(t as i32 + 1) / (1.0 + spot_prev).powi(t as i32) - 1.0;
            forwards.push(forward);
        }

        Ok(forwards)
    }

    /// Discount factor for a cashflow at the end of projection year `t` (0-based)
    pub fn discount_factor(&self, t: u32) -> Result<f64> {
        let spot = self.spot(t + 1)?;
        Ok((1.0 / (1.0 + spot)).powi(t as i32 + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_curve_forwards_equal_spot() {
        let curve = DiscountCurve::flat(0.02, 10);
        let forwards = curve.forward_rates(10).unwrap();
        assert_eq!(forwards.len(), 10);
        for f in forwards {
            assert_relative_eq!(f, 0.02, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_forward_from_rising_curve() {
        let curve = DiscountCurve::from_spot_rates([(1, 0.01), (2, 0.02)]);
        let forwards = curve.forward_rates(2).unwrap();
        assert_eq!(forwards[0], 0.01);
        assert_relative_eq!(forwards[1], 1.02_f64.powi(2) / 1.01 - 1.0, epsilon = 1e-15);
        assert!(forwards[1] > 0.02);
    }

    #[test]
    fn test_discount_factor() {
        let curve = DiscountCurve::from_spot_rates([(1, 0.01), (2, 0.02)]);
        assert_relative_eq!(curve.discount_factor(0).unwrap(), 1.0 / 1.01, epsilon = 1e-15);
        assert_relative_eq!(curve.discount_factor(1).unwrap(), 1.0 / 1.02_f64.powi(2), epsilon = 1e-15);
    }

    #[test]
    fn test_missing_year_is_error() {
        let curve = DiscountCurve::flat(0.01, 5);
        assert!(matches!(
            curve.forward_rates(6),
            Err(PricingError::MissingSpotRate { year: 6 })
        ));
        assert!(matches!(
            curve.discount_factor(5),
            Err(PricingError::MissingSpotRate { year: 6 })
        ));
    }
}
