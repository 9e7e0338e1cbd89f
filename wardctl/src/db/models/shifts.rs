use crate::types::License;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A duty slot from the roster. Specialty and turn are reference values owned
/// by the scheduling subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ShiftDBResponse {
    pub id: i64,
    pub physician_license: License,
    pub shift_at: DateTime<Utc>,
    pub specialty: String,
    pub turn: String,
}
