//! Load model points from a CSV file

use super::{ModelPoint, Sex};
use crate::error::{PricingError, Result};
use csv::Reader;
use std::path::Path;

/// Raw CSV row: id,issue_age,sex,term_years,premium_paying_years,sum_assured
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(default)]
    id: Option<String>,
    issue_age: u32,
    sex: String,
    term_years: u32,
    premium_paying_years: u32,
    sum_assured: i64,
}

impl CsvRow {
    fn to_model_point(self) -> Result<ModelPoint> {
        let sex: Sex = self.sex.parse()?;
        let point = ModelPoint::new(
            self.issue_age,
            sex,
            self.term_years,
            self.premium_paying_years,
            self.sum_assured,
        )?;

        Ok(match self.id.filter(|id| !id.trim().is_empty()) {
            Some(id) => point.with_id(id.trim()),
            None => point,
        })
    }
}

/// Load all model points from a CSV file
pub fn load_model_points<P: AsRef<Path>>(path: P) -> Result<Vec<ModelPoint>> {
    let file = std::fs::File::open(path)?;
    load_model_points_from_reader(file)
}

/// Load model points from any reader (e.g., string buffer)
pub fn load_model_points_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<ModelPoint>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut points = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        points.push(row.to_model_point()?);
    }

    if points.is_empty() {
        return Err(PricingError::InvalidInput("model point file is empty".into()));
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_reader() {
        let data = "\
id,issue_age,sex,term_years,premium_paying_years,sum_assured
mp_a,30,male,10,10,1000000
,45,Female,20,15,3000000
";
        let points = load_model_points_from_reader(data.as_bytes()).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].label(), "mp_a");
        assert_eq!(points[1].label(), "female_age45_term20");
        assert_eq!(points[1].premium_paying_years, 15);
    }

    #[test]
    fn test_unknown_sex_rejected() {
        let data = "\
id,issue_age,sex,term_years,premium_paying_years,sum_assured
mp_a,30,unknown,10,10,1000000
";
        let result = load_model_points_from_reader(data.as_bytes());
        assert!(matches!(result, Err(PricingError::UnsupportedSex(_))));
    }

    #[test]
    fn test_load_sample_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/model_points.csv");
        let points = load_model_points(path).expect("Failed to load model points");
        assert!(!points.is_empty());
        assert!(points.iter().all(|p| p.validate().is_ok()));
    }
}
