//! Present values, premiums, reserves and decrements for the endowment product
//!
//! - **Benefits**: endowment benefit and premium annuity factors, premium rates
//! - **Valuation**: net premium reserves (tV), surrender values (tW), in-force series
//! - **Discount**: spot curve with derived forward rates and discount factors
//!
//! Two reserve series are built per model point: one at the pricing rate
//! feeding surrender benefits, one at the valuation rate feeding the reserve
//! movement in the cashflow.

mod types;
mod discount;
mod benefits;
mod valuation;

pub use types::{DecrementSeries, EndowmentFactors, EndowmentPremiums, ReserveSeries};
pub use discount::DiscountCurve;
pub use benefits::{calc_endowment_factors, calc_endowment_premiums, premiums_from_factors, round_currency};
pub use valuation::{inforce_series, reserve_factors, DEFAULT_SURRENDER_CHARGE_YEARS};
