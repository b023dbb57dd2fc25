//! Core projection engine for yearly profit-test cashflows

use rayon::prelude::*;

use crate::assumptions::{Assumptions, ExpenseModel, LoadingSource, LoadingTriple};
use crate::error::Result;
use crate::policy::ModelPoint;
use crate::reserves::{calc_endowment_premiums, EndowmentPremiums, DEFAULT_SURRENDER_CHARGE_YEARS};

use super::basis::ProjectionBasis;
use super::cashflows::{BatchResult, CashflowRow, ProfitTestResult};
use super::metrics::ProfitMetrics;

/// Valuation interest used for the reserve movement when not configured
pub const DEFAULT_VALUATION_INTEREST: f64 = 0.0025;

/// Annual lapse rate when not configured
pub const DEFAULT_LAPSE_RATE: f64 = 0.03;

/// Share of alpha spent as acquisition cost in loading mode
pub const DEFAULT_ACQUISITION_EXPENSE_SHARE: f64 = 0.5;

/// Configuration for a projection run
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionConfig {
    /// Flat pricing interest (premiums, surrender values)
    pub pricing_interest: f64,

    /// Flat valuation interest (reserve movement)
    pub valuation_interest: f64,

    /// Assumed annual lapse rate
    pub lapse_rate: f64,

    /// Years over which the acquisition deduction from surrender values runs off
    pub surrender_charge_years: u32,

    /// Loading mode only: acquisition expense as a share of alpha
    pub acquisition_expense_share: f64,

    /// Expense basis
    pub expense_model: ExpenseModel,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            pricing_interest: 0.01,
            valuation_interest: DEFAULT_VALUATION_INTEREST,
            lapse_rate: DEFAULT_LAPSE_RATE,
            surrender_charge_years: DEFAULT_SURRENDER_CHARGE_YEARS,
            acquisition_expense_share: DEFAULT_ACQUISITION_EXPENSE_SHARE,
            expense_model: ExpenseModel::Loading,
        }
    }
}

/// Main projection engine
pub struct ProjectionEngine<'a> {
    assumptions: &'a Assumptions,
    config: &'a ProjectionConfig,
}

impl<'a> ProjectionEngine<'a> {
    /// Create a new projection engine with given assumptions and config
    pub fn new(assumptions: &'a Assumptions, config: &'a ProjectionConfig) -> Self {
        Self { assumptions, config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        self.config
    }

    /// Premiums at the pricing basis
    pub fn premiums(&self, point: &ModelPoint, loadings: &LoadingTriple) -> Result<EndowmentPremiums> {
        calc_endowment_premiums(
            self.assumptions.pricing_table(point.sex),
            point,
            self.config.pricing_interest,
            loadings,
        )
    }

    /// Profit test at the formula premium
    pub fn project(&self, point: &ModelPoint, loadings: LoadingTriple) -> Result<ProfitTestResult> {
        let premiums = self.premiums(point, &loadings)?;
        self.project_with_premiums(point, loadings, premiums)
    }

    /// Profit test with the gross annual premium replaced
    ///
    /// Net premium, reserves and surrender values stay on the formula basis.
    pub fn project_with_gross_premium(
        &self,
        point: &ModelPoint,
        loadings: LoadingTriple,
        gross_annual_premium: i64,
    ) -> Result<ProfitTestResult> {
        let premiums = self.premiums(point, &loadings)?.with_gross_premium(gross_annual_premium);
        self.project_with_premiums(point, loadings, premiums)
    }

    /// Profit tests for every model point, in input order
    pub fn project_batch(&self, points: &[ModelPoint], source: &LoadingSource) -> Result<BatchResult> {
        let results = points
            .par_iter()
            .map(|point| self.project(point, source.loadings_for(point)))
            .collect::<Result<Vec<_>>>()?;

        Ok(BatchResult {
            results,
            expense_assumptions: self.config.expense_model.assumptions().copied(),
        })
    }

    fn project_with_premiums(
        &self,
        point: &ModelPoint,
        loadings: LoadingTriple,
        premiums: EndowmentPremiums,
    ) -> Result<ProfitTestResult> {
        point.validate()?;
        let basis = ProjectionBasis::build(self.assumptions, self.config, point, loadings, premiums)?;

        let cashflows = (0..point.term_years)
            .map(|t| self.calculate_year(point, &basis, t))
            .collect::<Result<Vec<_>>>()?;

        let metrics = ProfitMetrics::calculate(&cashflows, premiums.gross_annual_premium, point)?;

        Ok(ProfitTestResult {
            model_point: point.clone(),
            loadings,
            premiums,
            cashflows,
            irr: metrics.irr,
            new_business_value: metrics.new_business_value,
            pv_loading: metrics.pv_loading,
            pv_expense: metrics.pv_expense,
            loading_surplus: metrics.loading_surplus,
            premium_total: metrics.premium_total,
            premium_to_maturity_ratio: metrics.premium_to_maturity_ratio,
        })
    }

    /// Calculate cashflows for a single projection year
    fn calculate_year(&self, point: &ModelPoint, basis: &ProjectionBasis, t: u32) -> Result<CashflowRow> {
        let i = t as usize;
        let mut row = CashflowRow::new(t);

        row.inforce_begin = basis.decrements.inforce_begin[i];
        row.inforce_end = basis.decrements.inforce_end[i];
        row.death_rate = basis.decrements.death_rate[i];
        row.lapse_rate = basis.decrements.lapse_rate[i];

        self.calculate_premiums(point, basis, &mut row);
        self.calculate_benefits(point, basis, &mut row);
        self.calculate_expenses(point, basis, &mut row);
        self.calculate_reserve_change(point, basis, &mut row);
        self.calculate_investment_income(point, basis, &mut row);

        row.net_cashflow = row.premium_income + row.investment_income
            - (row.death_benefit + row.surrender_benefit + row.expenses_total + row.reserve_change);

        self.calculate_present_values(&mut row)?;

        Ok(row)
    }

    fn calculate_premiums(&self, point: &ModelPoint, basis: &ProjectionBasis, row: &mut CashflowRow) {
        if !point.is_premium_year(row.t) {
            return;
        }
        row.premium_income = basis.premiums.gross_annual_premium as f64 * row.inforce_begin;
        row.net_premium_income = basis.premiums.net_annual_premium as f64 * row.inforce_begin;
        row.loading_income = row.premium_income - row.net_premium_income;
    }

    fn calculate_benefits(&self, point: &ModelPoint, basis: &ProjectionBasis, row: &mut CashflowRow) {
        let sum_assured = point.sum_assured as f64;

        if row.t + 1 == point.term_years {
            row.maturity_benefit = row.inforce_end * sum_assured;
        }

        // Claims after the paying period are met from the paid-up reserve
        if !point.is_premium_year(row.t) {
            return;
        }
        row.death_benefit = row.inforce_begin * row.death_rate * sum_assured;
        row.surrender_benefit =
            row.inforce_begin * row.lapse_rate * basis.mean_surrender_value(row.t as usize) * sum_assured;
    }

    fn calculate_expenses(&self, point: &ModelPoint, basis: &ProjectionBasis, row: &mut CashflowRow) {
        let first_year = row.t == 0;
        let paying = point.is_premium_year(row.t);

        match &self.config.expense_model {
            ExpenseModel::Company(unit_costs) => {
                if first_year {
                    row.expenses_acquisition = unit_costs.acq_per_policy * row.inforce_begin;
                }
                if paying {
                    row.expenses_maintenance = unit_costs.maint_per_policy * row.inforce_begin;
                }
                row.expenses_collection = unit_costs.coll_rate * row.premium_income;
            }
            ExpenseModel::Loading => {
                let sum_assured = point.sum_assured as f64;
                let loadings = &basis.loadings;
                if first_year {
                    row.expenses_acquisition = self.config.acquisition_expense_share * loadings.alpha * sum_assured;
                }
                if paying {
                    row.expenses_maintenance = row.inforce_begin * sum_assured * loadings.beta;
                    row.expenses_collection =
                        row.inforce_begin * basis.premiums.gross_annual_premium as f64 * loadings.gamma;
                }
            }
        }

        row.expenses_total = row.expenses_acquisition + row.expenses_maintenance + row.expenses_collection;
    }

    fn calculate_reserve_change(&self, point: &ModelPoint, basis: &ProjectionBasis, row: &mut CashflowRow) {
        let i = row.t as usize;
        let sum_assured = point.sum_assured as f64;
        let tv = &basis.valuation_reserves.reserve;

        row.reserve_begin = tv[i] * sum_assured;
        row.reserve_end = tv[i + 1] * sum_assured;

        if point.is_premium_year(row.t) {
            row.reserve_change = sum_assured * (row.inforce_end * tv[i + 1] - row.inforce_begin * tv[i]);
        }
    }

    /// Interest on opening funds for a full year, claims assumed paid mid-year
    ///
    /// Paying years only; later years carry no company cashflow.
    fn calculate_investment_income(&self, point: &ModelPoint, basis: &ProjectionBasis, row: &mut CashflowRow) {
        let i = row.t as usize;
        let forward = basis.forward_rates[i];
        row.forward_rate = forward;
        if !point.is_premium_year(row.t) {
            return;
        }

        let opening_reserve = row.inforce_begin * basis.valuation_reserves.reserve[i] * point.sum_assured as f64;
        row.investment_income = (opening_reserve + row.premium_income - row.expenses_total) * forward
            - (row.death_benefit + row.surrender_benefit) * ((1.0 + forward).powf(0.5) - 1.0);
    }

    fn calculate_present_values(&self, row: &mut CashflowRow) -> Result<()> {
        let curve = &self.assumptions.discount_curve;
        row.spot_rate = curve.spot(row.t + 1)?;
        row.discount_factor = curve.discount_factor(row.t)?;

        row.pv_net_cashflow = row.net_cashflow * row.discount_factor;
        row.pv_loading = row.loading_income * row.discount_factor;
        row.pv_expense = row.expenses_total * row.discount_factor;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{ExpenseAssumptions, LoadingCoefficients};
    use crate::fixtures;
    use crate::policy::Sex;
    use crate::reserves::DiscountCurve;
    use approx::assert_relative_eq;

    #[test]
    fn test_projection_runs() {
        let assumptions = fixtures::assumptions();
        let config = fixtures::projection_config();
        let engine = ProjectionEngine::new(&assumptions, &config);

        let result = engine.project(&fixtures::model_point(), fixtures::loadings()).unwrap();

        assert_eq!(result.cashflows.len(), 10);
        assert!(result.irr.is_finite());
        let factors = result.premiums.factors;
        assert_eq!(
            result.premiums.net_annual_premium,
            (factors.benefit / factors.annuity * 1_000_000.0).round() as i64
        );
    }

    #[test]
    fn test_row_identities() {
        let assumptions = fixtures::assumptions();
        let config = fixtures::projection_config();
        let engine = ProjectionEngine::new(&assumptions, &config);
        let result = engine.project(&fixtures::model_point(), fixtures::loadings()).unwrap();

        for row in &result.cashflows {
            let expected = row.premium_income + row.investment_income
                - (row.death_benefit + row.surrender_benefit + row.expenses_total + row.reserve_change);
            assert_relative_eq!(row.net_cashflow, expected, epsilon = 1e-9);
            assert_relative_eq!(row.loading_income, row.premium_income - row.net_premium_income, epsilon = 1e-9);
            assert_relative_eq!(row.pv_net_cashflow, row.net_cashflow * row.discount_factor, epsilon = 1e-9);
        }

        let nbv: f64 = result.cashflows.iter().map(|r| r.pv_net_cashflow).sum();
        assert_relative_eq!(result.new_business_value, nbv, epsilon = 1e-9);
    }

    #[test]
    fn test_maturity_only_in_final_year() {
        let assumptions = fixtures::assumptions();
        let config = fixtures::projection_config();
        let engine = ProjectionEngine::new(&assumptions, &config);
        let result = engine.project(&fixtures::model_point(), fixtures::loadings()).unwrap();

        let (last, earlier) = result.cashflows.split_last().unwrap();
        assert!(earlier.iter().all(|r| r.maturity_benefit == 0.0));
        assert_relative_eq!(last.maturity_benefit, last.inforce_end * 1_000_000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_loading_mode_expenses() {
        let assumptions = fixtures::assumptions();
        let config = fixtures::projection_config();
        let engine = ProjectionEngine::new(&assumptions, &config);
        let result = engine.project(&fixtures::model_point(), fixtures::loadings()).unwrap();
        let gross = result.premiums.gross_annual_premium as f64;

        let first = &result.cashflows[0];
        assert_relative_eq!(first.expenses_acquisition, 0.5 * 0.03 * 1_000_000.0, epsilon = 1e-9);
        assert_relative_eq!(first.expenses_maintenance, 0.007 * 1_000_000.0, epsilon = 1e-9);
        assert_relative_eq!(first.expenses_collection, gross * 0.03, epsilon = 1e-9);
        assert!(result.cashflows[1..].iter().all(|r| r.expenses_acquisition == 0.0));
    }

    #[test]
    fn test_company_mode_expenses() {
        let assumptions = fixtures::assumptions();
        let config = ProjectionConfig {
            expense_model: ExpenseModel::Company(ExpenseAssumptions {
                year: 2024,
                acq_per_policy: 40_000.0,
                maint_per_policy: 5_000.0,
                coll_rate: 0.01,
            }),
            ..fixtures::projection_config()
        };
        let engine = ProjectionEngine::new(&assumptions, &config);
        let result = engine.project(&fixtures::model_point(), fixtures::loadings()).unwrap();

        let first = &result.cashflows[0];
        assert_relative_eq!(first.expenses_acquisition, 40_000.0, epsilon = 1e-9);
        assert_relative_eq!(first.expenses_maintenance, 5_000.0, epsilon = 1e-9);
        assert_relative_eq!(first.expenses_collection, 0.01 * first.premium_income, epsilon = 1e-9);

        let second = &result.cashflows[1];
        assert_eq!(second.expenses_acquisition, 0.0);
        assert_relative_eq!(second.expenses_maintenance, 5_000.0 * second.inforce_begin, epsilon = 1e-9);
    }

    #[test]
    fn test_limited_pay_gating() {
        let assumptions = fixtures::assumptions();
        let config = fixtures::projection_config();
        let engine = ProjectionEngine::new(&assumptions, &config);
        let point = ModelPoint::new(40, Sex::Female, 15, 5, 1_000_000).unwrap();

        let result = engine.project(&point, fixtures::loadings()).unwrap();
        assert_eq!(result.cashflows.len(), 15);

        for row in &result.cashflows[..5] {
            assert!(row.premium_income > 0.0);
            assert!(row.reserve_change != 0.0);
        }
        for row in &result.cashflows[5..] {
            assert_eq!(row.premium_income, 0.0);
            assert_eq!(row.loading_income, 0.0);
            assert_eq!(row.expenses_total, 0.0);
            assert_eq!(row.reserve_change, 0.0);
            assert_eq!(row.death_benefit, 0.0);
            assert_eq!(row.surrender_benefit, 0.0);
            assert_eq!(row.investment_income, 0.0);
            assert_eq!(row.net_cashflow, 0.0);
            assert!(row.inforce_end < row.inforce_begin);
        }
        assert!(result.cashflows[14].maturity_benefit > 0.0);
        assert!(result.irr.is_finite());
        assert_relative_eq!(result.premium_total, result.premiums.gross_annual_premium as f64 * 5.0);
    }

    #[test]
    fn test_limited_pay_irr_matches_paying_years() {
        let assumptions = fixtures::assumptions();
        let config = fixtures::projection_config();
        let engine = ProjectionEngine::new(&assumptions, &config);
        let point = fixtures::model_points().remove(2);
        assert_eq!((point.term_years, point.premium_paying_years), (15, 10));

        let result = engine.project(&point, fixtures::loadings()).unwrap();
        let paying: Vec<f64> = result.cashflows[..10].iter().map(|r| r.net_cashflow).collect();
        assert_relative_eq!(result.irr, crate::projection::calc_irr(&paying).unwrap(), epsilon = 1e-12);
        assert!(result.irr > -0.5);
    }

    #[test]
    fn test_long_term_short_pay_reports_unbracketed_irr() {
        let assumptions = fixtures::assumptions();
        let config = fixtures::projection_config();
        let engine = ProjectionEngine::new(&assumptions, &config);
        let point = ModelPoint::new(0, Sex::Female, 60, 5, 1_000_000).unwrap();

        let result = engine.project(&point, fixtures::loadings());
        assert!(matches!(result, Err(crate::PricingError::IrrNotBracketed { .. })));
    }

    #[test]
    fn test_missing_spot_rate_fails() {
        let mut assumptions = fixtures::assumptions();
        assumptions.discount_curve = DiscountCurve::flat(0.01, 5);
        let config = fixtures::projection_config();
        let engine = ProjectionEngine::new(&assumptions, &config);

        let result = engine.project(&fixtures::model_point(), fixtures::loadings());
        assert!(matches!(result, Err(crate::PricingError::MissingSpotRate { year: 6 })));
    }

    #[test]
    fn test_gross_premium_override() {
        let assumptions = fixtures::assumptions();
        let config = fixtures::projection_config();
        let engine = ProjectionEngine::new(&assumptions, &config);
        let point = fixtures::model_point();

        let base = engine.project(&point, fixtures::loadings()).unwrap();
        let higher_gross = base.premiums.gross_annual_premium + 5_000;
        let scaled = engine.project_with_gross_premium(&point, fixtures::loadings(), higher_gross).unwrap();

        assert_eq!(scaled.premiums.net_annual_premium, base.premiums.net_annual_premium);
        assert!(scaled.irr > base.irr);
        assert!(scaled.premium_to_maturity_ratio > base.premium_to_maturity_ratio);
    }

    #[test]
    fn test_batch_preserves_order() {
        let assumptions = fixtures::assumptions();
        let config = fixtures::projection_config();
        let engine = ProjectionEngine::new(&assumptions, &config);
        let points = fixtures::model_points();

        let batch = engine
            .project_batch(&points, &LoadingSource::Coefficients(LoadingCoefficients::default()))
            .unwrap();

        let labels: Vec<_> = batch.results.iter().map(|r| r.label()).collect();
        assert_eq!(labels, vec!["m30_10", "f45_20", "m50_15"]);
        assert!(batch.expense_assumptions.is_none());
        assert_eq!(batch.summary().len(), 3);
    }
}
