//! Standalone conversions: glucose concentration and date-of-birth to age.

use crate::units::{Measurement, Substance, Unit};
use crate::{Error, Result};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Serialize;

// ============================================================================
// Glucose
// ============================================================================

fn convert_glucose(value: f64, from: Unit, to: Unit) -> Result<f64> {
    if !value.is_finite() {
        return Err(Error::domain("glucose", format!("cannot convert {}", value)));
    }
    Ok(Measurement::new(value, from)
        .convert_as(Substance::Glucose, to)?
        .value)
}

/// Glucose mmol/L → mg/dL (× 18.01528)
pub fn glucose_mmol_l_to_mg_dl(mmol_l: f64) -> Result<f64> {
    convert_glucose(mmol_l, Unit::MillimolesPerLiter, Unit::MilligramsPerDeciliter)
}

/// Glucose mg/dL → mmol/L
pub fn glucose_mg_dl_to_mmol_l(mg_dl: f64) -> Result<f64> {
    convert_glucose(mg_dl, Unit::MilligramsPerDeciliter, Unit::MillimolesPerLiter)
}

// ============================================================================
// Age
// ============================================================================

/// Age split into whole years, months and days
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AgeYmd {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

fn check_order(dob: NaiveDate, on: NaiveDate) -> Result<()> {
    if dob > on {
        return Err(Error::domain(
            "age",
            format!("date of birth {} is after {}", dob, on),
        ));
    }
    Ok(())
}

fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = NaiveDate::from_ymd_opt(next_year, next_month, 1);
    match (first, next) {
        (Some(first), Some(next)) => Ok((next - first).num_days() as u32),
        _ => Err(Error::domain("age", format!("invalid month {}-{}", year, month))),
    }
}

/// Completed years between `dob` and `on`
pub fn age_in_years(dob: NaiveDate, on: NaiveDate) -> Result<u32> {
    check_order(dob, on)?;
    let mut years = on.year() - dob.year();
    if (on.month(), on.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    Ok(years as u32)
}

/// Calendar age in years, months and days.
///
/// Missing days borrow from the month preceding `on`.
pub fn age_ymd(dob: NaiveDate, on: NaiveDate) -> Result<AgeYmd> {
    check_order(dob, on)?;

    let mut years = on.year() - dob.year();
    let mut months = on.month() as i32 - dob.month() as i32;
    let mut days = on.day() as i32 - dob.day() as i32;

    if days < 0 {
        months -= 1;
        let (year, month) = if on.month() == 1 {
            (on.year() - 1, 12)
        } else {
            (on.year(), on.month() - 1)
        };
        // A birth day past the end of that month counts from its last day
        days += days_in_month(year, month)?.max(dob.day()) as i32;
    }
    if months < 0 {
        years -= 1;
        months += 12;
    }

    Ok(AgeYmd {
        years: years as u32,
        months: months as u32,
        days: days as u32,
    })
}

/// Completed years as of today (UTC)
pub fn age_today(dob: NaiveDate) -> Result<u32> {
    age_in_years(dob, Utc::now().date_naive())
}

/// Age as a measurement ready to pass as a formula's `age` input
pub fn age_measurement(dob: NaiveDate, on: NaiveDate) -> Result<Measurement> {
    Ok(Measurement::new(f64::from(age_in_years(dob, on)?), Unit::Years))
}
