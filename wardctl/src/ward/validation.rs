//! Input checks shared by the ward services. These run before any transaction
//! is opened and only ever produce [`Error::InvalidArgument`].

use crate::errors::{Error, Result};
use crate::types::{BedKey, BedNumber, RoomNumber};
use chrono::NaiveDate;

/// Room and bed must be supplied together or not at all
pub fn bed_pair(room_number: Option<RoomNumber>, bed_number: Option<BedNumber>) -> Result<Option<BedKey>> {
    match (room_number, bed_number) {
        (Some(room), Some(bed)) => Ok(Some(BedKey::new(room, bed))),
        (None, None) => Ok(None),
        (Some(_), None) => Err(Error::invalid("bed_number is required when room_number is given")),
        (None, Some(_)) => Err(Error::invalid("room_number is required when bed_number is given")),
    }
}

/// An end date, when present, may not precede the start date
pub fn end_not_before_start(start_date: NaiveDate, end_date: Option<NaiveDate>) -> Result<()> {
    match end_date {
        Some(end) if end < start_date => Err(Error::invalid(format!("end date {end} is before start date {start_date}"))),
        _ => Ok(()),
    }
}

/// A vacation range must not be inverted. A single-day range is valid.
pub fn vacation_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<()> {
    if start_date > end_date {
        return Err(Error::invalid(format!(
            "vacation start {start_date} is after its end {end_date}"
        )));
    }
    Ok(())
}

/// Clamp list pagination parameters to sane bounds
pub fn pagination(skip: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    (skip.unwrap_or(0).max(0), limit.unwrap_or(100).clamp(1, 1000))
}
