//! Splitting one expense into monthly installments.
//!
//! Every installment gets `total / payments` (plain `f64` division, the
//! rounding error is not pushed onto the last installment) and the expense
//! timestamp moved forward by its index in calendar months.

use chrono::{DateTime, Datelike, Days, Months, Utc};

use crate::{EngineError, ResultEngine};

/// One generated installment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Installment {
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

/// Amount of a single installment.
pub fn calc_amount(total: f64, payments: u32) -> f64 {
    total / f64::from(payments)
}

/// Moves `timestamp` forward by `months` calendar months.
///
/// The day of month is kept when the target month has it. Otherwise the
/// surplus days roll into the following month, so January 31st plus one
/// month is March 3rd (March 2nd in leap years). Time of day is untouched.
pub fn add_months(timestamp: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    let naive = timestamp.naive_utc();
    let date = naive.date();
    let shifted = date
        .with_day(1)?
        .checked_add_months(Months::new(months))?
        .checked_add_days(Days::new(u64::from(date.day() - 1)))?;
    Some(shifted.and_time(naive.time()).and_utc())
}

/// Builds the `payments` installments for an expense of `total`.
pub fn split(total: f64, payments: u32, timestamp: DateTime<Utc>) -> ResultEngine<Vec<Installment>> {
    if payments == 0 {
        return Err(EngineError::InvalidPayments(
            "payments must be >= 1".to_string(),
        ));
    }
    if !total.is_finite() {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be a finite number, got {total}"
        )));
    }

    let amount = calc_amount(total, payments);
    (0..payments)
        .map(|i| {
            let timestamp = add_months(timestamp, i).ok_or_else(|| {
                EngineError::InvalidPayments(format!("installment {i} is out of the date range"))
            })?;
            Ok(Installment { amount, timestamp })
        })
        .collect()
}
