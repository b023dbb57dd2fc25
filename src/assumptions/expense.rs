//! Expense assumptions: company experience or direct loadings

use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};

/// One year of company expense experience
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyExpenseRecord {
    pub year: i32,
    pub new_policies: f64,
    pub inforce_avg: f64,
    pub premium_income: f64,
    pub acq_var_total: f64,
    pub acq_fixed_total: f64,
    pub maint_var_total: f64,
    pub maint_fixed_total: f64,
    pub coll_var_total: f64,
    pub overhead_total: f64,
}

/// Share of overhead allocated to acquisition and maintenance
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverheadSplit {
    pub acquisition: f64,
    pub maintenance: f64,
}

/// Unit costs derived from company experience
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpenseAssumptions {
    pub year: i32,
    /// Per new policy
    pub acq_per_policy: f64,
    /// Per in-force policy per year
    pub maint_per_policy: f64,
    /// Per unit of premium income
    pub coll_rate: f64,
}

impl ExpenseAssumptions {
    /// Derive unit costs from one year of experience
    ///
    /// With `year` set, that year's record is used; otherwise the first record.
    pub fn from_records(
        records: &[CompanyExpenseRecord],
        year: Option<i32>,
        split: OverheadSplit,
    ) -> Result<Self> {
        let record = match year {
            Some(y) => records
                .iter()
                .find(|r| r.year == y)
                .ok_or_else(|| PricingError::InvalidInput(format!("no company expense data for year {}", y)))?,
            None => records
                .first()
                .ok_or_else(|| PricingError::InvalidInput("company expense data is empty".into()))?,
        };

        Self::from_record(record, split)
    }

    pub fn from_record(record: &CompanyExpenseRecord, split: OverheadSplit) -> Result<Self> {
        positive("new_policies", record.new_policies)?;
        positive("inforce_avg", record.inforce_avg)?;
        positive("premium_income", record.premium_income)?;

        let acq_total = record.acq_var_total
            + record.acq_fixed_total
            + record.overhead_total * split.acquisition;
        let maint_total = record.maint_var_total
            + record.maint_fixed_total
            + record.overhead_total * split.maintenance;

        Ok(Self {
            year: record.year,
            acq_per_policy: acq_total / record.new_policies,
            maint_per_policy: maint_total / record.inforce_avg,
            coll_rate: record.coll_var_total / record.premium_income,
        })
    }
}

fn positive(what: &'static str, value: f64) -> Result<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(PricingError::NonPositive { what, value })
    }
}

/// Expense basis for a run; exactly one is active
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExpenseModel {
    /// Unit costs from company experience
    Company(ExpenseAssumptions),
    /// Expenses equal to the premium loadings
    Loading,
}

impl ExpenseModel {
    pub fn mode_name(&self) -> &'static str {
        match self {
            ExpenseModel::Company(_) => "company",
            ExpenseModel::Loading => "loading",
        }
    }

    pub fn assumptions(&self) -> Option<&ExpenseAssumptions> {
        match self {
            ExpenseModel::Company(assumptions) => Some(assumptions),
            ExpenseModel::Loading => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn record(year: i32) -> CompanyExpenseRecord {
        CompanyExpenseRecord {
            year,
            new_policies: 1_000.0,
            inforce_avg: 10_000.0,
            premium_income: 1.0e9,
            acq_var_total: 20_000_000.0,
            acq_fixed_total: 5_000_000.0,
            maint_var_total: 30_000_000.0,
            maint_fixed_total: 10_000_000.0,
            coll_var_total: 15_000_000.0,
            overhead_total: 10_000_000.0,
        }
    }

    #[test]
    fn test_unit_costs() {
        let split = OverheadSplit { acquisition: 0.4, maintenance: 0.6 };
        let assumptions = ExpenseAssumptions::from_record(&record(2024), split).unwrap();

        assert_relative_eq!(assumptions.acq_per_policy, 29_000.0);
        assert_relative_eq!(assumptions.maint_per_policy, 4_600.0);
        assert_relative_eq!(assumptions.coll_rate, 0.015);
    }

    #[test]
    fn test_year_selection() {
        let mut later = record(2025);
        later.new_policies = 500.0;
        let records = vec![record(2024), later];

        let first = ExpenseAssumptions::from_records(&records, None, OverheadSplit::default()).unwrap();
        assert_eq!(first.year, 2024);

        let selected = ExpenseAssumptions::from_records(&records, Some(2025), OverheadSplit::default()).unwrap();
        assert_eq!(selected.year, 2025);
        assert_relative_eq!(selected.acq_per_policy, 50_000.0);

        assert!(ExpenseAssumptions::from_records(&records, Some(2030), OverheadSplit::default()).is_err());
    }

    #[test]
    fn test_non_positive_denominator() {
        let mut bad = record(2024);
        bad.inforce_avg = 0.0;
        let result = ExpenseAssumptions::from_record(&bad, OverheadSplit::default());
        assert!(matches!(
            result,
            Err(PricingError::NonPositive { what: "inforce_avg", .. })
        ));
    }
}
