//! CSV-based assumption loader
//!
//! Reads the boundary input files: mortality tables (pricing and actual),
//! the spot-rate curve and company expense experience.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::expense::CompanyExpenseRecord;
use super::mortality::MortalityRow;
use crate::error::{PricingError, Result};
use crate::reserves::DiscountCurve;

/// Default path to assumptions directory
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/assumptions";

pub const PRICING_MORTALITY_FILE: &str = "mortality_pricing.csv";
pub const ACTUAL_MORTALITY_FILE: &str = "mortality_actual.csv";
pub const SPOT_CURVE_FILE: &str = "spot_curve.csv";
pub const COMPANY_EXPENSE_FILE: &str = "company_expense.csv";

/// Parse a numeric field leniently; blank or unparseable values give None
fn parse_number(field: &str) -> Option<f64> {
    let text = field.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Load mortality rows (age,q_male,q_female) from CSV
///
/// Ages are read through a float and rounded. Rows without a usable age are
/// skipped; a blank rate only drops that sex's entry.
pub fn load_mortality_rows(path: &Path) -> Result<Vec<MortalityRow>> {
    load_mortality_rows_from_reader(File::open(path)?)
}

pub fn load_mortality_rows_from_reader<R: Read>(reader: R) -> Result<Vec<MortalityRow>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let age_col = column("age").unwrap_or(0);
    let male_col = column("q_male").unwrap_or(1);
    let female_col = column("q_female").unwrap_or(2);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let age = match record.get(age_col).and_then(parse_number) {
            Some(age) if age >= 0.0 => age.round() as u32,
            _ => continue,
        };
        let q_male = record.get(male_col).and_then(parse_number);
        let q_female = record.get(female_col).and_then(parse_number);
        rows.push(MortalityRow::new(age, q_male, q_female));
    }

    Ok(rows)
}

/// Load the spot curve (t,spot_rate) from CSV
pub fn load_spot_curve(path: &Path) -> Result<DiscountCurve> {
    load_spot_curve_from_reader(File::open(path)?)
}

pub fn load_spot_curve_from_reader<R: Read>(reader: R) -> Result<DiscountCurve> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rates = Vec::new();

    for result in reader.records() {
        let record = result?;
        let field = |index: usize, name: &str| {
            record
                .get(index)
                .ok_or_else(|| PricingError::InvalidInput(format!("spot curve row is missing {}", name)))
        };

        let year_text = field(0, "t")?;
        let year: u32 = year_text
            .trim()
            .parse()
            .map_err(|_| PricingError::InvalidInput(format!("invalid spot curve year: {}", year_text)))?;
        let rate_text = field(1, "spot_rate")?;
        let rate: f64 = rate_text
            .trim()
            .parse()
            .map_err(|_| PricingError::InvalidInput(format!("invalid spot rate: {}", rate_text)))?;
        rates.push((year, rate));
    }

    Ok(DiscountCurve::from_spot_rates(rates))
}

/// Load company expense experience from CSV
pub fn load_company_expenses(path: &Path) -> Result<Vec<CompanyExpenseRecord>> {
    load_company_expenses_from_reader(File::open(path)?)
}

pub fn load_company_expenses_from_reader<R: Read>(reader: R) -> Result<Vec<CompanyExpenseRecord>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for result in reader.deserialize() {
        let record: CompanyExpenseRecord = result?;
        records.push(record);
    }

    Ok(records)
}

/// All boundary assumption files from one directory
pub struct LoadedAssumptions {
    pub pricing_mortality: Vec<MortalityRow>,
    pub actual_mortality: Vec<MortalityRow>,
    pub spot_curve: DiscountCurve,
}

impl LoadedAssumptions {
    /// Load all assumptions from the default path
    pub fn load_default() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load all assumptions from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        Ok(Self {
            pricing_mortality: load_mortality_rows(&path.join(PRICING_MORTALITY_FILE))?,
            actual_mortality: load_mortality_rows(&path.join(ACTUAL_MORTALITY_FILE))?,
            spot_curve: load_spot_curve(&path.join(SPOT_CURVE_FILE))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn data_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_ASSUMPTIONS_PATH)
    }

    #[test]
    fn test_mortality_rows_lenient() {
        let data = "\
age,q_male,q_female
30,0.00091,0.00052
31.0,,0.00055
x,0.1,0.1
32,abc,0.0006
";
        let rows = load_mortality_rows_from_reader(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].age, 31);
        assert_eq!(rows[1].q_male, None);
        assert_eq!(rows[2].q_male, None);
        assert_eq!(rows[2].q_female, Some(0.0006));
    }

    #[test]
    fn test_spot_curve_reader() {
        let data = "t,spot_rate\n1,0.001\n2,0.0015\n";
        let curve = load_spot_curve_from_reader(data.as_bytes()).unwrap();
        assert_eq!(curve.spot(2).unwrap(), 0.0015);
        assert!(curve.spot(3).is_err());
    }

    #[test]
    fn test_spot_curve_missing_column() {
        let data = "t\n1\n2\n";
        let result = load_spot_curve_from_reader(data.as_bytes());
        assert!(matches!(result, Err(PricingError::InvalidInput(msg)) if msg.contains("spot_rate")));
    }

    #[test]
    fn test_load_default_assumptions() {
        let result = LoadedAssumptions::load_from(&data_dir());
        assert!(result.is_ok(), "Failed to load assumptions: {:?}", result.err());

        let loaded = result.unwrap();
        assert!(loaded.pricing_mortality.len() >= 100);
        assert!(loaded.actual_mortality.len() >= 100);
        assert!(loaded.spot_curve.max_year().unwrap_or(0) >= 50);
    }

    #[test]
    fn test_load_company_expenses() {
        let records = load_company_expenses(&data_dir().join(COMPANY_EXPENSE_FILE)).unwrap();
        assert!(!records.is_empty());
        assert!(records.iter().all(|r| r.new_policies > 0.0));
    }
}
