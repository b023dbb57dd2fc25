//! Actuarial assumptions: mortality, expense basis, and loading formula

mod mortality;
mod expense;
mod loading;
pub mod loader;

pub use mortality::{build_rate_table, survival_probabilities, MortalityRow, MortalityTable};
pub use expense::{CompanyExpenseRecord, ExpenseAssumptions, ExpenseModel, OverheadSplit};
pub use loading::{Coefficient, LoadingCoefficients, LoadingSource, LoadingTriple};
pub use loader::LoadedAssumptions;

use std::path::Path;

use crate::error::Result;
use crate::policy::Sex;
use crate::reserves::DiscountCurve;

/// Male and female tables of one mortality basis
#[derive(Debug, Clone, Default)]
pub struct MortalityBasis {
    male: MortalityTable,
    female: MortalityTable,
}

impl MortalityBasis {
    pub fn from_rows(rows: &[MortalityRow]) -> Self {
        Self {
            male: MortalityTable::from_rows(rows, Sex::Male),
            female: MortalityTable::from_rows(rows, Sex::Female),
        }
    }

    pub fn table(&self, sex: Sex) -> &MortalityTable {
        match sex {
            Sex::Male => &self.male,
            Sex::Female => &self.female,
        }
    }
}

/// Container for all projection assumptions
///
/// Pricing mortality drives premiums and reserves; actual mortality drives
/// the in-force roll-forward.
#[derive(Debug, Clone)]
pub struct Assumptions {
    pub pricing_mortality: MortalityBasis,
    pub actual_mortality: MortalityBasis,
    pub discount_curve: DiscountCurve,
}

impl Assumptions {
    pub fn new(
        pricing_rows: &[MortalityRow],
        actual_rows: &[MortalityRow],
        discount_curve: DiscountCurve,
    ) -> Self {
        Self {
            pricing_mortality: MortalityBasis::from_rows(pricing_rows),
            actual_mortality: MortalityBasis::from_rows(actual_rows),
            discount_curve,
        }
    }

    /// Load assumptions from CSV files in a specific directory
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let loaded = LoadedAssumptions::load_from(path)?;
        Ok(Self::from_loaded(&loaded))
    }

    pub fn from_loaded(loaded: &LoadedAssumptions) -> Self {
        Self::new(
            &loaded.pricing_mortality,
            &loaded.actual_mortality,
            loaded.spot_curve.clone(),
        )
    }

    pub fn pricing_table(&self, sex: Sex) -> &MortalityTable {
        self.pricing_mortality.table(sex)
    }

    pub fn actual_table(&self, sex: Sex) -> &MortalityTable {
        self.actual_mortality.table(sex)
    }
}
