//! Configuration checks that run before any projection
//!
//! Errors block `run` and `optimize`; warnings are reported and ignored.
//! Unknown interest and expense tags never get here: they fail to parse.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ExpenseMode, PricingConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub level: IssueLevel,
    pub code: String,
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    fn error(code: &str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            code: code.to_string(),
            path: path.into(),
            message: message.into(),
        }
    }

    fn warning(code: &str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            code: code.to_string(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            IssueLevel::Error => "error",
            IssueLevel::Warning => "warning",
        };
        write!(f, "[{}] {} at {}: {}", level, self.code, self.path, self.message)
    }
}

pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(|i| i.level == IssueLevel::Error)
}

/// Every issue found in `config`, in a stable order
pub fn validate(config: &PricingConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    check_model_points(config, &mut issues);
    check_expense_model(config, &mut issues);
    check_optimization(config, &mut issues);
    issues
}

fn check_model_points(config: &PricingConfig, issues: &mut Vec<ValidationIssue>) {
    if config.model_point.is_some() && !config.model_points.is_empty() {
        issues.push(ValidationIssue::warning(
            "duplicated_model_point_definition",
            "model_point/model_points",
            "both model_point and model_points are set; model_points is used",
        ));
    }

    let mut seen = BTreeSet::new();
    for (index, entry) in config.model_points.iter().enumerate() {
        let path = format!("model_points[{}]", index);

        if let Some(id) = &entry.id {
            if !seen.insert(id.clone()) {
                issues.push(ValidationIssue::error(
                    "duplicate_model_point_id",
                    format!("{}.id", path),
                    format!("duplicate model point id: {}", id),
                ));
            }
        }

        let term = entry.term_years.or(config.product.term_years);
        let premium_years = entry.premium_paying_years.or(config.product.premium_paying_years);
        if let (Some(term), Some(premium_years)) = (term, premium_years) {
            if premium_years > term {
                issues.push(ValidationIssue::error(
                    "premium_years_exceed_term",
                    format!("{}.premium_paying_years", path),
                    format!("premium_paying_years {} exceeds term_years {}", premium_years, term),
                ));
            }
        }

        if let Some(sum_assured) = entry.sum_assured.or(config.product.sum_assured) {
            if sum_assured <= 0 {
                issues.push(ValidationIssue::error(
                    "non_positive_sum_assured",
                    format!("{}.sum_assured", path),
                    format!("sum_assured must be positive, got {}", sum_assured),
                ));
            }
        }
    }
}

fn check_expense_model(config: &PricingConfig, issues: &mut Vec<ValidationIssue>) {
    let expense = &config.profit_test.expense_model;
    let split = expense.overhead_split;
    let total = split.acquisition + split.maintenance;
    if expense.mode == ExpenseMode::Company && (total - 1.0).abs() > 1e-9 {
        issues.push(ValidationIssue::warning(
            "overhead_split_sum",
            "profit_test.expense_model.overhead_split",
            format!("overhead split sums to {:.6}, not 1", total),
        ));
    }
}

fn check_optimization(config: &PricingConfig, issues: &mut Vec<ValidationIssue>) {
    let settings = &config.optimization;

    if settings.irr_target < settings.irr_hard {
        issues.push(ValidationIssue::warning(
            "irr_target_below_hard",
            "optimization.irr_target",
            format!("irr_target {} is below irr_hard {}", settings.irr_target, settings.irr_hard),
        ));
    }

    if settings.premium_to_maturity_target > settings.premium_to_maturity_hard_max {
        issues.push(ValidationIssue::warning(
            "ptm_target_above_hard_max",
            "optimization.premium_to_maturity_target",
            format!(
                "premium_to_maturity_target {} is above premium_to_maturity_hard_max {}",
                settings.premium_to_maturity_target, settings.premium_to_maturity_hard_max
            ),
        ));
    }

    if !settings.watch_model_point_ids.is_empty() {
        match config.model_points() {
            Ok(points) => {
                let labels: BTreeSet<String> = points.iter().map(|p| p.label()).collect();
                for (index, id) in settings.watch_model_point_ids.iter().enumerate() {
                    if !labels.contains(id) {
                        issues.push(ValidationIssue::warning(
                            "watch_id_unknown",
                            format!("optimization.watch_model_point_ids[{}]", index),
                            format!("watch id {} matches no model point", id),
                        ));
                    }
                }
            }
            Err(e) => issues.push(ValidationIssue::error("invalid_model_points", "model_points", e.to_string())),
        }
    }

    for (index, stage) in settings.stages.iter().enumerate() {
        for variable in stage.tunable() {
            let movable = settings.bounds_for(variable).map_or(false, |b| b.step > 0.0);
            if !movable {
                issues.push(ValidationIssue::warning(
                    "stage_variable_without_step",
                    format!("optimization.stages[{}].variables", index),
                    format!("{} in stage {} has no positive step and never moves", variable, stage.name),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(extra: &str) -> PricingConfig {
        let json = format!(
            r#"{{
                "product": {{ "term_years": 10, "premium_paying_years": 10, "sum_assured": 1000000 }},
                "model_points": [
                    {{ "id": "a", "issue_age": 30, "sex": "male" }},
                    {{ "id": "b", "issue_age": 40, "sex": "female" }}
                ],
                "pricing": {{
                    "interest": {{ "type": "flat", "flat_rate": 0.01 }},
                    "mortality_path": "m.csv"
                }},
                "profit_test": {{
                    "mortality_actual_path": "a.csv",
                    "discount_curve_path": "s.csv",
                    "expense_model": {{ "mode": "loading" }}
                }}
                {}
            }}"#,
            extra
        );
        PricingConfig::from_json_str(&json, ".").unwrap()
    }

    fn codes(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.code.as_str()).collect()
    }

    #[test]
    fn test_clean_config() {
        let issues = validate(&config(""));
        assert!(issues.is_empty(), "{:?}", issues);
        assert!(!has_errors(&issues));
    }

    #[test]
    fn test_duplicate_id_and_premium_years() {
        let mut config = config("");
        config.model_points[1].id = Some("a".into());
        config.model_points[0].premium_paying_years = Some(12);
        config.model_points[1].sum_assured = Some(0);

        let issues = validate(&config);
        assert_eq!(
            codes(&issues),
            vec!["premium_years_exceed_term", "duplicate_model_point_id", "non_positive_sum_assured"]
        );
        assert!(has_errors(&issues));
    }

    #[test]
    fn test_overhead_split_warning() {
        let mut config = config("");
        config.profit_test.expense_model.mode = ExpenseMode::Company;
        config.profit_test.expense_model.overhead_split.acquisition = 0.3;
        config.profit_test.expense_model.overhead_split.maintenance = 0.3;

        let issues = validate(&config);
        assert_eq!(codes(&issues), vec!["overhead_split_sum"]);
        assert!(!has_errors(&issues));
    }

    #[test]
    fn test_optimization_warnings() {
        let config = config(
            r#", "optimization": {
                "irr_hard": 0.08, "irr_target": 0.07,
                "premium_to_maturity_target": 1.2,
                "watch_model_point_ids": ["a", "zz"],
                "bounds": { "a_sex": { "step": 0.0 } }
            }"#,
        );
        let issues = validate(&config);
        assert_eq!(
            codes(&issues),
            vec![
                "irr_target_below_hard",
                "ptm_target_above_hard_max",
                "watch_id_unknown",
                "stage_variable_without_step",
            ]
        );
        assert!(issues[2].message.contains("zz"));
    }
}
