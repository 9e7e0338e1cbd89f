use crate::types::{AdmissionId, BedKey, BedNumber, RoomNumber};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of the append-only assignment history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AssignmentDBResponse {
    pub admission_id: AdmissionId,
    pub assigned_at: DateTime<Utc>,
    pub room_number: RoomNumber,
    pub bed_number: BedNumber,
}

impl AssignmentDBResponse {
    pub fn bed(&self) -> BedKey {
        BedKey::new(self.room_number, self.bed_number)
    }
}
