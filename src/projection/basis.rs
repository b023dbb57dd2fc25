//! Per-model-point inputs to the yearly cashflow calculation
//!
//! Everything that depends only on the model point, its loadings and the
//! assumptions is computed once here; the yearly rows then read from it by
//! index and carry no state between years.

use crate::assumptions::{Assumptions, LoadingTriple};
use crate::error::Result;
use crate::policy::ModelPoint;
use crate::reserves::{inforce_series, reserve_factors, DecrementSeries, EndowmentPremiums, ReserveSeries};

use super::engine::ProjectionConfig;

/// Series shared by every projection year of one model point
#[derive(Debug, Clone)]
pub struct ProjectionBasis {
    pub loadings: LoadingTriple,
    pub premiums: EndowmentPremiums,
    /// Pricing-rate reserves; surrender values feed surrender benefits
    pub pricing_reserves: ReserveSeries,
    /// Valuation-rate reserves; feed the reserve movement
    pub valuation_reserves: ReserveSeries,
    pub decrements: DecrementSeries,
    pub forward_rates: Vec<f64>,
}

impl ProjectionBasis {
    pub fn build(
        assumptions: &Assumptions,
        config: &ProjectionConfig,
        point: &ModelPoint,
        loadings: LoadingTriple,
        premiums: EndowmentPremiums,
    ) -> Result<Self> {
        let pricing_table = assumptions.pricing_table(point.sex);
        let actual_table = assumptions.actual_table(point.sex);

        let pricing_reserves = reserve_factors(
            pricing_table,
            point.issue_age,
            point.term_years,
            point.premium_paying_years,
            config.pricing_interest,
            loadings.alpha,
            config.surrender_charge_years,
        )?;
        let valuation_reserves = reserve_factors(
            pricing_table,
            point.issue_age,
            point.term_years,
            point.premium_paying_years,
            config.valuation_interest,
            loadings.alpha,
            config.surrender_charge_years,
        )?;
        let decrements = inforce_series(actual_table, point.issue_age, point.term_years, config.lapse_rate)?;
        let forward_rates = assumptions.discount_curve.forward_rates(point.term_years)?;

        Ok(Self {
            loadings,
            premiums,
            pricing_reserves,
            valuation_reserves,
            decrements,
            forward_rates,
        })
    }

    /// Average surrender value factor over projection year `t`
    pub fn mean_surrender_value(&self, t: usize) -> f64 {
        let tw = &self.pricing_reserves.surrender_value;
        (tw[t] + tw[t + 1]) / 2.0
    }
}
