//! Cashflow output structures for profit tests

use serde::{Deserialize, Serialize};

use crate::assumptions::{ExpenseAssumptions, LoadingTriple};
use crate::policy::{ModelPoint, Sex};
use crate::reserves::EndowmentPremiums;

/// A single row of projection output for one policy year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowRow {
    // Timing (0-based projection year)
    pub t: u32,

    // Decrements
    pub inforce_begin: f64,
    pub inforce_end: f64,
    pub death_rate: f64,
    pub lapse_rate: f64,

    // Income
    pub premium_income: f64,
    pub net_premium_income: f64,
    pub loading_income: f64,

    // Benefits
    pub death_benefit: f64,
    pub surrender_benefit: f64,
    pub maturity_benefit: f64,

    // Expenses
    pub expenses_acquisition: f64,
    pub expenses_maintenance: f64,
    pub expenses_collection: f64,
    pub expenses_total: f64,

    // Reserves (valuation basis, per surviving policy)
    pub reserve_begin: f64,
    pub reserve_end: f64,
    pub reserve_change: f64,

    // Investment and result
    pub investment_income: f64,
    pub net_cashflow: f64,

    // Discounting
    pub spot_rate: f64,
    pub forward_rate: f64,
    pub discount_factor: f64,
    pub pv_net_cashflow: f64,
    pub pv_loading: f64,
    pub pv_expense: f64,
}

impl CashflowRow {
    /// Create a new cashflow row with all amounts zero
    pub fn new(t: u32) -> Self {
        Self {
            t,
            inforce_begin: 0.0,
            inforce_end: 0.0,
            death_rate: 0.0,
            lapse_rate: 0.0,
            premium_income: 0.0,
            net_premium_income: 0.0,
            loading_income: 0.0,
            death_benefit: 0.0,
            surrender_benefit: 0.0,
            maturity_benefit: 0.0,
            expenses_acquisition: 0.0,
            expenses_maintenance: 0.0,
            expenses_collection: 0.0,
            expenses_total: 0.0,
            reserve_begin: 0.0,
            reserve_end: 0.0,
            reserve_change: 0.0,
            investment_income: 0.0,
            net_cashflow: 0.0,
            spot_rate: 0.0,
            forward_rate: 0.0,
            discount_factor: 1.0,
            pv_net_cashflow: 0.0,
            pv_loading: 0.0,
            pv_expense: 0.0,
        }
    }
}

/// Complete profit test for one model point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitTestResult {
    pub model_point: ModelPoint,
    pub loadings: LoadingTriple,
    pub premiums: EndowmentPremiums,
    pub cashflows: Vec<CashflowRow>,
    pub irr: f64,
    pub new_business_value: f64,
    pub pv_loading: f64,
    pub pv_expense: f64,
    pub loading_surplus: f64,
    pub premium_total: f64,
    pub premium_to_maturity_ratio: f64,
}

impl ProfitTestResult {
    pub fn label(&self) -> String {
        self.model_point.label()
    }

    /// Loading surplus per unit sum assured
    pub fn loading_surplus_ratio(&self) -> f64 {
        self.loading_surplus / self.model_point.sum_assured as f64
    }

    pub fn net_cashflows(&self) -> Vec<f64> {
        self.cashflows.iter().map(|r| r.net_cashflow).collect()
    }

    pub fn summary_row(&self) -> SummaryRow {
        let point = &self.model_point;
        SummaryRow {
            model_point: point.label(),
            sex: point.sex,
            issue_age: point.issue_age,
            term_years: point.term_years,
            premium_paying_years: point.premium_paying_years,
            sum_assured: point.sum_assured,
            net_annual_premium: self.premiums.net_annual_premium,
            gross_annual_premium: self.premiums.gross_annual_premium,
            monthly_premium: self.premiums.monthly_premium,
            irr: self.irr,
            new_business_value: self.new_business_value,
            pv_loading: self.pv_loading,
            pv_expense: self.pv_expense,
            loading_surplus: self.loading_surplus,
            premium_total: self.premium_total,
            premium_to_maturity_ratio: self.premium_to_maturity_ratio,
        }
    }
}

/// One line of the model-point summary table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub model_point: String,
    pub sex: Sex,
    pub issue_age: u32,
    pub term_years: u32,
    pub premium_paying_years: u32,
    pub sum_assured: i64,
    pub net_annual_premium: i64,
    pub gross_annual_premium: i64,
    pub monthly_premium: i64,
    pub irr: f64,
    pub new_business_value: f64,
    pub pv_loading: f64,
    pub pv_expense: f64,
    pub loading_surplus: f64,
    pub premium_total: f64,
    pub premium_to_maturity_ratio: f64,
}

/// Profit tests for every model point of one evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub results: Vec<ProfitTestResult>,
    pub expense_assumptions: Option<ExpenseAssumptions>,
}

impl BatchResult {
    pub fn summary(&self) -> Vec<SummaryRow> {
        self.results.iter().map(|r| r.summary_row()).collect()
    }

    pub fn find(&self, label: &str) -> Option<&ProfitTestResult> {
        self.results.iter().find(|r| r.label() == label)
    }

    pub fn total_new_business_value(&self) -> f64 {
        self.results.iter().map(|r| r.new_business_value).sum()
    }
}
