//! Shared in-memory test fixtures

use crate::assumptions::{Assumptions, ExpenseModel, LoadingTriple, MortalityRow, MortalityTable};
use crate::policy::{ModelPoint, Sex};
use crate::projection::ProjectionConfig;
use crate::reserves::DiscountCurve;

/// Gompertz-like pricing mortality, ages 0..=110
pub fn pricing_rows() -> Vec<MortalityRow> {
    (0..=110)
        .map(|age| {
            let male = (0.0004 + 0.00003 * 1.1_f64.powi(age as i32)).min(1.0);
            MortalityRow::new(age, Some(male), Some(male * 0.8))
        })
        .collect()
}

/// Actual experience: 90% of pricing
pub fn actual_rows() -> Vec<MortalityRow> {
    pricing_rows()
        .into_iter()
        .map(|row| MortalityRow::new(row.age, row.q_male.map(|q| q * 0.9), row.q_female.map(|q| q * 0.9)))
        .collect()
}

pub fn mortality_table(sex: Sex) -> MortalityTable {
    MortalityTable::from_rows(&pricing_rows(), sex)
}

/// Upward-sloping spot curve for years 1..=60
pub fn discount_curve() -> DiscountCurve {
    DiscountCurve::from_spot_rates((1..=60).map(|year| (year, 0.005 + 0.0004 * year as f64)))
}

pub fn assumptions() -> Assumptions {
    Assumptions::new(&pricing_rows(), &actual_rows(), discount_curve())
}

/// Age 30 male, 10-year term and premium period, sum assured 1,000,000
pub fn model_point() -> ModelPoint {
    ModelPoint::new(30, Sex::Male, 10, 10, 1_000_000).expect("valid model point")
}

pub fn loadings() -> LoadingTriple {
    LoadingTriple::new(0.03, 0.007, 0.03)
}

/// Pricing 1%, valuation 0.25%, lapse 3%, loading-mode expenses
pub fn projection_config() -> ProjectionConfig {
    ProjectionConfig {
        pricing_interest: 0.01,
        valuation_interest: 0.0025,
        lapse_rate: 0.03,
        expense_model: ExpenseModel::Loading,
        ..Default::default()
    }
}

/// A small multi-point portfolio
pub fn model_points() -> Vec<ModelPoint> {
    vec![
        ModelPoint::new(30, Sex::Male, 10, 10, 1_000_000).expect("valid").with_id("m30_10"),
        ModelPoint::new(45, Sex::Female, 20, 20, 2_000_000).expect("valid").with_id("f45_20"),
        ModelPoint::new(50, Sex::Male, 15, 10, 3_000_000).expect("valid").with_id("m50_15"),
    ]
}
