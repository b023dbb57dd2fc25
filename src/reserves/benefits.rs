//! Present values of endowment benefits and premiums
//!
//! Death benefits are assumed paid mid-year (`v^(t+0.5)`), the maturity
//! benefit at the end of the term, and premiums annually in advance.

use super::types::{EndowmentFactors, EndowmentPremiums};
use crate::assumptions::{LoadingTriple, MortalityTable};
use crate::error::{PricingError, Result};
use crate::policy::ModelPoint;

/// Round a currency amount to whole units, halves away from zero
pub fn round_currency(amount: f64) -> i64 {
    amount.round() as i64
}

/// A and a on an arbitrary remaining horizon
///
/// A zero remaining term is the maturity point itself: A = 1, a = 0.
pub(crate) fn endowment_values(
    table: &MortalityTable,
    issue_age: u32,
    term_years: u32,
    premium_years: u32,
    interest_rate: f64,
) -> Result<EndowmentFactors> {
    if term_years == 0 {
        return Ok(EndowmentFactors { benefit: 1.0, annuity: 0.0 });
    }

    let p = table.survival_probabilities(issue_age, term_years)?;
    let v = 1.0 / (1.0 + interest_rate);

    let mut death_pv = 0.0;
    for t in 0..term_years {
        let q = table.rate(issue_age + t)?;
        death_pv += v.powf(t as f64 + 0.5) * p[t as usize] * q;
    }
    let maturity_pv = v.powi(term_years as i32) * p[term_years as usize];

    let annuity = (0..premium_years.min(term_years))
        .map(|t| v.powi(t as i32) * p[t as usize])
        .sum();

    Ok(EndowmentFactors {
        benefit: death_pv + maturity_pv,
        annuity,
    })
}

/// Endowment benefit and premium annuity factors at issue
pub fn calc_endowment_factors(
    table: &MortalityTable,
    issue_age: u32,
    term_years: u32,
    premium_years: u32,
    interest_rate: f64,
) -> Result<EndowmentFactors> {
    if term_years == 0 {
        return Err(PricingError::NonPositive { what: "term_years", value: 0.0 });
    }
    if premium_years == 0 {
        return Err(PricingError::NonPositive { what: "premium_paying_years", value: 0.0 });
    }
    if premium_years > term_years {
        return Err(PricingError::InvalidInput(format!(
            "premium_paying_years {} exceeds term_years {}",
            premium_years, term_years
        )));
    }

    endowment_values(table, issue_age, term_years, premium_years, interest_rate)
}

/// Net and gross premiums for a model point
///
/// `net_rate = A/a`, `gross_rate = (net_rate + alpha/a + beta) / (1 - gamma)`.
pub fn calc_endowment_premiums(
    table: &MortalityTable,
    point: &ModelPoint,
    interest_rate: f64,
    loadings: &LoadingTriple,
) -> Result<EndowmentPremiums> {
    let factors = calc_endowment_factors(
        table,
        point.issue_age,
        point.term_years,
        point.premium_paying_years,
        interest_rate,
    )?;
    premiums_from_factors(factors, point.sum_assured, loadings)
}

pub fn premiums_from_factors(
    factors: EndowmentFactors,
    sum_assured: i64,
    loadings: &LoadingTriple,
) -> Result<EndowmentPremiums> {
    if factors.annuity <= 0.0 {
        return Err(PricingError::NonPositive { what: "premium annuity factor", value: factors.annuity });
    }
    if loadings.gamma >= 1.0 {
        return Err(PricingError::InvalidInput(format!(
            "gamma must be below 1, got {}",
            loadings.gamma
        )));
    }

    let net_rate = factors.benefit / factors.annuity;
    let gross_rate = (net_rate + loadings.alpha / factors.annuity + loadings.beta) / (1.0 - loadings.gamma);

    let sum_assured = sum_assured as f64;
    let gross_annual_premium = round_currency(gross_rate * sum_assured);

    Ok(EndowmentPremiums {
        factors,
        net_rate,
        gross_rate,
        net_annual_premium: round_currency(net_rate * sum_assured),
        gross_annual_premium,
        monthly_premium: round_currency(gross_annual_premium as f64 / 12.0),
    })
}
