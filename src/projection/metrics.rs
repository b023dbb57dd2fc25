//! Profit metrics derived from a projected cashflow table

use serde::{Deserialize, Serialize};

use super::cashflows::CashflowRow;
use super::irr::calc_irr;
use crate::error::Result;
use crate::policy::ModelPoint;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfitMetrics {
    pub irr: f64,
    /// Sum of discounted net cashflows
    pub new_business_value: f64,
    pub pv_loading: f64,
    pub pv_expense: f64,
    /// PV(loading income) - PV(expense)
    pub loading_surplus: f64,
    /// Gross annual premium times premium-paying years
    pub premium_total: f64,
    /// Premium total per unit sum assured
    pub premium_to_maturity_ratio: f64,
}

impl ProfitMetrics {
    pub fn calculate(rows: &[CashflowRow], gross_annual_premium: i64, point: &ModelPoint) -> Result<Self> {
        let net_cashflows: Vec<f64> = rows.iter().map(|r| r.net_cashflow).collect();
        let irr = calc_irr(&net_cashflows)?;

        let new_business_value = rows.iter().map(|r| r.pv_net_cashflow).sum();
        let pv_loading: f64 = rows.iter().map(|r| r.pv_loading).sum();
        let pv_expense: f64 = rows.iter().map(|r| r.pv_expense).sum();
        let premium_total = gross_annual_premium as f64 * point.premium_paying_years as f64;

        Ok(Self {
            irr,
            new_business_value,
            pv_loading,
            pv_expense,
            loading_surplus: pv_loading - pv_expense,
            premium_total,
            premium_to_maturity_ratio: premium_total / point.sum_assured as f64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Sex;

    fn row(t: u32, net: f64, loading: f64, expense: f64, df: f64) -> CashflowRow {
        let mut row = CashflowRow::new(t);
        row.net_cashflow = net;
        row.discount_factor = df;
        row.pv_net_cashflow = net * df;
        row.pv_loading = loading * df;
        row.pv_expense = expense * df;
        row
    }

    #[test]
    fn test_metrics() {
        let point = ModelPoint::new(30, Sex::Male, 2, 2, 100_000).unwrap();
        let rows = vec![row(0, -1_000.0, 300.0, 500.0, 0.99), row(1, 1_100.0, 300.0, 100.0, 0.98)];

        let metrics = ProfitMetrics::calculate(&rows, 52_000, &point).unwrap();

        assert!((metrics.irr - 0.10).abs() < 1e-9);
        assert!((metrics.new_business_value - (-990.0 + 1_078.0)).abs() < 1e-9);
        assert!((metrics.loading_surplus - (297.0 + 294.0 - 495.0 - 98.0)).abs() < 1e-9);
        assert_eq!(metrics.premium_total, 104_000.0);
        assert!((metrics.premium_to_maturity_ratio - 1.04).abs() < 1e-12);
    }

    #[test]
    fn test_irr_failure_propagates() {
        let point = ModelPoint::new(30, Sex::Male, 2, 2, 100_000).unwrap();
        let rows = vec![row(0, 10.0, 0.0, 0.0, 1.0), row(1, 10.0, 0.0, 0.0, 1.0)];
        assert!(ProfitMetrics::calculate(&rows, 1_000, &point).is_err());
    }
}
