//! Net premium reserves, surrender values and the in-force roll-forward

use super::benefits::endowment_values;
use super::types::{DecrementSeries, ReserveSeries};
use crate::assumptions::MortalityTable;
use crate::error::{PricingError, Result};

/// Default length of the surrender charge (acquisition deduction) period
pub const DEFAULT_SURRENDER_CHARGE_YEARS: u32 = 10;

/// Reserve and surrender value factors for t = 0..=term
///
/// The net premium rate is fixed from the issue-date factors; each later
/// reserve values the remaining term and remaining premium period with that
/// rate. The surrender value deducts `alpha` scaled down linearly to zero
/// over `surrender_charge_years`, floored at zero.
pub fn reserve_factors(
    table: &MortalityTable,
    issue_age: u32,
    term_years: u32,
    premium_years: u32,
    interest_rate: f64,
    alpha: f64,
    surrender_charge_years: u32,
) -> Result<ReserveSeries> {
    if term_years == 0 {
        return Err(PricingError::NonPositive { what: "term_years", value: 0.0 });
    }
    if surrender_charge_years == 0 {
        return Err(PricingError::NonPositive { what: "surrender_charge_years", value: 0.0 });
    }

    let issue = endowment_values(table, issue_age, term_years, premium_years, interest_rate)?;
    if issue.annuity <= 0.0 {
        return Err(PricingError::NonPositive { what: "premium annuity factor", value: issue.annuity });
    }
    let net_rate = issue.benefit / issue.annuity;

    let charge_years = surrender_charge_years as f64;
    let mut reserve = Vec::with_capacity(term_years as usize + 1);
    let mut surrender_value = Vec::with_capacity(term_years as usize + 1);

    for t in 0..=term_years {
        let remaining = endowment_values(
            table,
            issue_age + t,
            term_years - t,
            premium_years.saturating_sub(t),
            interest_rate,
        )?;
        let tv = remaining.benefit - net_rate * remaining.annuity;

        let deduction = (charge_years - (t as f64).min(charge_years)) / charge_years;
        reserve.push(tv);
        surrender_value.push((tv - deduction * alpha).max(0.0));
    }

    Ok(ReserveSeries {
        interest_rate,
        net_rate,
        reserve,
        surrender_value,
    })
}

/// In-force, death and lapse series from actual mortality and a flat lapse rate
///
/// Each decrement is reduced by half of the other to approximate mid-year
/// occurrence: `death = q*(1 - lapse/2)`, `lapse' = lapse*(1 - q/2)`.
pub fn inforce_series(
    table: &MortalityTable,
    issue_age: u32,
    term_years: u32,
    lapse_rate: f64,
) -> Result<DecrementSeries> {
    let n = term_years as usize;
    let mut series = DecrementSeries {
        inforce_begin: Vec::with_capacity(n),
        inforce_end: Vec::with_capacity(n),
        death_rate: Vec::with_capacity(n),
        lapse_rate: Vec::with_capacity(n),
    };

    let mut inforce = 1.0;
    for t in 0..term_years {
        let q = table.rate(issue_age + t)?;
        let death = q * (1.0 - lapse_rate / 2.0);
        let lapse = lapse_rate * (1.0 - q / 2.0);
        let end = inforce * (1.0 - death - lapse);

        series.inforce_begin.push(inforce);
        series.inforce_end.push(end);
        series.death_rate.push(death);
        series.lapse_rate.push(lapse);
        inforce = end;
    }

    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::policy::Sex;
    use crate::reserves::calc_endowment_factors;
    use approx::assert_relative_eq;

    #[test]
    fn test_reserve_at_issue_matches_factors() {
        let table = fixtures::mortality_table(Sex::Male);
        let factors = calc_endowment_factors(&table, 30, 10, 10, 0.01).unwrap();
        let issue = endowment_values(&table, 30, 10, 10, 0.01).unwrap();
        assert_relative_eq!(issue.benefit, factors.benefit, epsilon = 1e-15);
        assert_relative_eq!(issue.annuity, factors.annuity, epsilon = 1e-15);

        let series = reserve_factors(&table, 30, 10, 10, 0.01, 0.03, 10).unwrap();
        assert_relative_eq!(series.net_rate, factors.benefit / factors.annuity, epsilon = 1e-15);
        // tV[0] = A - (A/a) * a = 0
        assert!(series.reserve[0].abs() < 1e-12);
        assert_eq!(series.reserve.len(), 11);
        assert_eq!(series.surrender_value.len(), 11);
    }

    #[test]
    fn test_reserve_reaches_one_at_maturity() {
        let table = fixtures::mortality_table(Sex::Female);
        let series = reserve_factors(&table, 40, 15, 10, 0.0025, 0.03, 10).unwrap();
        assert_relative_eq!(series.reserve[15], 1.0, epsilon = 1e-15);
        for window in series.reserve.windows(2) {
            assert!(window[1] > window[0]);
        }
    }

    #[test]
    fn test_surrender_deduction_runs_off() {
        let table = fixtures::mortality_table(Sex::Male);
        let alpha = 0.05;
        let series = reserve_factors(&table, 30, 20, 20, 0.01, alpha, 10).unwrap();

        assert_eq!(series.surrender_value[0], 0.0);
        let expected_5 = (series.reserve[5] - 0.5 * alpha).max(0.0);
        assert_relative_eq!(series.surrender_value[5], expected_5, epsilon = 1e-15);
        for t in 10..=20 {
            assert_relative_eq!(series.surrender_value[t], series.reserve[t], epsilon = 1e-15);
        }
    }

    #[test]
    fn test_longer_charge_period_lowers_values() {
        let table = fixtures::mortality_table(Sex::Male);
        let short = reserve_factors(&table, 30, 20, 20, 0.01, 0.05, 10).unwrap();
        let long = reserve_factors(&table, 30, 20, 20, 0.01, 0.05, 15).unwrap();
        for t in 0..=20 {
            assert!(long.surrender_value[t] <= short.surrender_value[t]);
        }
        assert!(long.surrender_value[12] < short.surrender_value[12]);
    }

    #[test]
    fn test_inforce_series() {
        let table = MortalityTable::from_rates([(30, 0.01), (31, 0.02)]);
        let series = inforce_series(&table, 30, 2, 0.03).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.inforce_begin[0], 1.0);
        assert_relative_eq!(series.death_rate[0], 0.01 * 0.985, epsilon = 1e-15);
        assert_relative_eq!(series.lapse_rate[0], 0.03 * 0.995, epsilon = 1e-15);
        let end0 = 1.0 - 0.01 * 0.985 - 0.03 * 0.995;
        assert_relative_eq!(series.inforce_end[0], end0, epsilon = 1e-15);
        assert_eq!(series.inforce_begin[1], series.inforce_end[0]);
    }

    #[test]
    fn test_inforce_missing_age() {
        let table = MortalityTable::from_rates([(30, 0.01)]);
        assert!(matches!(
            inforce_series(&table, 30, 2, 0.03),
            Err(PricingError::MissingMortalityRate { age: 31 })
        ));
    }
}
