//! Internal Rate of Return (IRR) calculation
//!
//! Expanding-bracket search followed by bisection. Failure to bracket or to
//! converge is reported as an error, never as an approximate rate.

use crate::error::{PricingError, Result};

const LOWER_BOUND: f64 = -0.999999;
const INITIAL_UPPER_BOUND: f64 = 1.0;
const MAX_UPPER_BOUND: f64 = 1024.0;
const TOLERANCE: f64 = 1e-12;
const MAX_ITERATIONS: usize = 200;

/// Annual IRR of a yearly cashflow series (index 0 undiscounted)
pub fn calc_irr(cashflows: &[f64]) -> Result<f64> {
    if cashflows.is_empty() {
        return Err(PricingError::InvalidInput("cashflow series is empty".into()));
    }

    // Trailing zeros leave NPV unchanged but turn it into 0/0 near rate = -1
    let last_nonzero = cashflows.iter().rposition(|&cf| cf != 0.0);
    let Some(last_nonzero) = last_nonzero else {
        return Err(PricingError::IrrNotBracketed { upper: INITIAL_UPPER_BOUND });
    };
    let cashflows = &cashflows[..=last_nonzero];

    let low_value = npv_sign_value(cashflows, LOWER_BOUND);
    let mut high = INITIAL_UPPER_BOUND;
    let mut high_value = npv_at_rate(cashflows, high);

    while same_sign(low_value, high_value) && high < MAX_UPPER_BOUND {
        high *= 2.0;
        high_value = npv_at_rate(cashflows, high);
    }
    if same_sign(low_value, high_value) {
        return Err(PricingError::IrrNotBracketed { upper: high });
    }

    let mut low = LOWER_BOUND;
    let mut low_value = low_value;
    for _ in 0..MAX_ITERATIONS {
        let mid = (low + high) / 2.0;
        let mid_value = npv_at_rate(cashflows, mid);

        if mid_value.abs() < TOLERANCE {
            return Ok(mid);
        }
        if same_sign(low_value, mid_value) {
            low = mid;
            low_value = mid_value;
        } else {
            high = mid;
        }
        if high - low < TOLERANCE {
            return Ok((low + high) / 2.0);
        }
    }

    Err(PricingError::IrrNotConverged { iterations: MAX_ITERATIONS })
}

/// Calculate NPV at a given annual rate
pub fn npv_at_rate(cashflows: &[f64], rate: f64) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

/// NPV, or a same-signed substitute when NPV overflows near rate = -1
///
/// Multiplying NPV by (1+r)^n (positive) preserves the sign and keeps the
/// terms bounded.
fn npv_sign_value(cashflows: &[f64], rate: f64) -> f64 {
    let npv = npv_at_rate(cashflows, rate);
    if npv.is_finite() {
        return npv;
    }
    let n = cashflows.len() as i32 - 1;
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf * (1.0 + rate).powi(n - t as i32))
        .sum()
}

fn same_sign(a: f64, b: f64) -> bool {
    (a > 0.0 && b > 0.0) || (a < 0.0 && b < 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_simple_irr() {
        // Invest 1000, receive 1100 after one year
        let irr = calc_irr(&[-1000.0, 1100.0]).unwrap();
        assert_abs_diff_eq!(irr, 0.10, epsilon = 1e-9);
    }

    #[test]
    fn test_level_cashflows() {
        let mut cashflows = vec![-10_000.0];
        cashflows.extend(vec![1_200.0; 10]);

        let irr = calc_irr(&cashflows).unwrap();
        assert!(npv_at_rate(&cashflows, irr).abs() < 1e-6);
        assert!(irr > 0.03 && irr < 0.04, "Expected ~3.5% IRR, got {}", irr);
    }

    #[test]
    fn test_negative_irr() {
        let irr = calc_irr(&[-1000.0, 500.0, 400.0]).unwrap();
        assert!(irr < 0.0);
        assert!(npv_at_rate(&[-1000.0, 500.0, 400.0], irr).abs() < 1e-6);
    }

    #[test]
    fn test_idempotent() {
        let cashflows = [-5000.0, 800.0, 900.0, 1000.0, 1100.0, 1200.0, 1300.0];
        let first = calc_irr(&cashflows).unwrap();
        let second = calc_irr(&cashflows).unwrap();
        assert!((first - second).abs() < 1e-9);
    }

    #[test]
    fn test_high_irr_expands_bracket() {
        // 300% return needs the upper bound to grow past 1.0
        let irr = calc_irr(&[-100.0, 400.0]).unwrap();
        assert_abs_diff_eq!(irr, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_no_sign_change_not_bracketed() {
        let result = calc_irr(&[100.0, 100.0, 100.0]);
        assert!(matches!(result, Err(PricingError::IrrNotBracketed { .. })));

        let result = calc_irr(&[-100.0, -50.0]);
        assert!(matches!(result, Err(PricingError::IrrNotBracketed { .. })));
    }

    #[test]
    fn test_trailing_zeros_ignored() {
        let short = [-100.0, 50.0, 60.0];
        let mut padded = short.to_vec();
        padded.extend(vec![0.0; 57]);

        let expected = calc_irr(&short).unwrap();
        assert_abs_diff_eq!(expected, 0.0639410298, epsilon = 1e-9);
        assert_abs_diff_eq!(calc_irr(&padded).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_padded_without_sign_change_not_bracketed() {
        let mut cashflows = vec![-100.0, -50.0];
        cashflows.extend(vec![0.0; 58]);
        assert!(matches!(calc_irr(&cashflows), Err(PricingError::IrrNotBracketed { .. })));

        assert!(matches!(calc_irr(&[0.0; 10]), Err(PricingError::IrrNotBracketed { .. })));
    }

    #[test]
    fn test_empty_series() {
        assert!(calc_irr(&[]).is_err());
    }
}
