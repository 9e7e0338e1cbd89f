//! Database models for physician vacation periods.

use crate::types::License;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A vacation window. Identified by physician and both dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct VacationPeriod {
    pub physician_license: License,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl VacationPeriod {
    pub fn new(physician_license: License, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            physician_license,
            start_date,
            end_date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct VacationDBResponse {
    pub physician_license: License,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl VacationDBResponse {
    pub fn period(&self) -> VacationPeriod {
        VacationPeriod::new(self.physician_license, self.start_date, self.end_date)
    }
}
