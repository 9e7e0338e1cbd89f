//! API request/response models for physician vacations and shifts.

use crate::db::models::{shifts::ShiftDBResponse, vacations::VacationDBResponse};
use crate::types::License;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Requested vacation window, both ends inclusive. Also used to move an
/// existing vacation to new dates.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VacationDates {
    #[schema(example = "2024-01-10")]
    pub start_date: NaiveDate,
    #[schema(example = "2024-01-20")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VacationResponse {
    pub physician_license: License,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<VacationDBResponse> for VacationResponse {
    fn from(db: VacationDBResponse) -> Self {
        Self {
            physician_license: db.physician_license,
            start_date: db.start_date,
            end_date: db.end_date,
            created_at: db.created_at,
        }
    }
}

/// A duty shift from the roster
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShiftResponse {
    pub id: i64,
    pub shift_at: DateTime<Utc>,
    pub specialty: String,
    pub turn: String,
}

impl From<ShiftDBResponse> for ShiftResponse {
    fn from(db: ShiftDBResponse) -> Self {
        Self {
            id: db.id,
            shift_at: db.shift_at,
            specialty: db.specialty,
            turn: db.turn,
        }
    }
}
