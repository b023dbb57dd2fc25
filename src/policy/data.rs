//! Model point definitions for the endowment product

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PricingError, Result};

/// Sex of the insured cohort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }

    pub fn is_female(&self) -> bool {
        matches!(self, Sex::Female)
    }
}

impl FromStr for Sex {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            _ => Err(PricingError::UnsupportedSex(s.to_string())),
        }
    }
}

impl TryFrom<String> for Sex {
    type Error = PricingError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One representative policy cohort
///
/// Built once from configuration and never mutated. Amounts are whole
/// currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPoint {
    /// Optional identifier; when absent the label is derived from the cohort
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub issue_age: u32,
    pub sex: Sex,
    pub term_years: u32,
    pub premium_paying_years: u32,
    pub sum_assured: i64,
}

impl ModelPoint {
    /// Create a validated model point without an id
    pub fn new(
        issue_age: u32,
        sex: Sex,
        term_years: u32,
        premium_paying_years: u32,
        sum_assured: i64,
    ) -> Result<Self> {
        let point = Self {
            id: None,
            issue_age,
            sex,
            term_years,
            premium_paying_years,
            sum_assured,
        };
        point.validate()?;
        Ok(point)
    }

    /// Attach an identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Identifier used in reports, watch lists and exemption lists
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!(
                "{}_age{}_term{}",
                self.sex, self.issue_age, self.term_years
            ),
        }
    }

    pub fn is_female(&self) -> bool {
        self.sex.is_female()
    }

    /// Premiums are collected in projection year `t` (0-based)
    pub fn is_premium_year(&self, t: u32) -> bool {
        t < self.premium_paying_years
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| PricingError::InvalidModelPoint {
            label: self.label(),
            reason: reason.to_string(),
        };

        if self.term_years == 0 {
            return Err(invalid("term_years must be positive"));
        }
        if self.premium_paying_years == 0 {
            return Err(invalid("premium_paying_years must be positive"));
        }
        if self.premium_paying_years > self.term_years {
            return Err(invalid("premium_paying_years exceeds term_years"));
        }
        if self.sum_assured <= 0 {
            return Err(invalid("sum_assured must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_parsing() {
        assert_eq!("male".parse::<Sex>().unwrap(), Sex::Male);
        assert_eq!(" Female ".parse::<Sex>().unwrap(), Sex::Female);
        assert!(matches!(
            "other".parse::<Sex>(),
            Err(PricingError::UnsupportedSex(_))
        ));
    }

    #[test]
    fn test_sex_serde() {
        let sex: Sex = serde_json::from_str("\"FEMALE\"").unwrap();
        assert_eq!(sex, Sex::Female);
        assert_eq!(serde_json::to_string(&Sex::Male).unwrap(), "\"male\"");
        assert!(serde_json::from_str::<Sex>("\"x\"").is_err());
    }

    #[test]
    fn test_label() {
        let point = ModelPoint::new(30, Sex::Male, 10, 10, 1_000_000).unwrap();
        assert_eq!(point.label(), "male_age30_term10");

        let point = point.with_id("mp_001");
        assert_eq!(point.label(), "mp_001");
    }

    #[test]
    fn test_validation() {
        assert!(ModelPoint::new(30, Sex::Male, 0, 0, 1_000_000).is_err());
        assert!(ModelPoint::new(30, Sex::Male, 10, 0, 1_000_000).is_err());
        assert!(ModelPoint::new(30, Sex::Male, 10, 12, 1_000_000).is_err());
        assert!(ModelPoint::new(30, Sex::Male, 10, 10, 0).is_err());
        assert!(ModelPoint::new(30, Sex::Female, 20, 10, 500_000).is_ok());
    }

    #[test]
    fn test_premium_year() {
        let point = ModelPoint::new(40, Sex::Female, 20, 10, 1_000_000).unwrap();
        assert!(point.is_premium_year(0));
        assert!(point.is_premium_year(9));
        assert!(!point.is_premium_year(10));
    }
}
