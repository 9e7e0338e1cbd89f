//! Database models for the bed registry.

use crate::types::{BedKey, BedNumber, RoomNumber};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;

/// Bed state stored as TEXT in database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BedState {
    Available,
    Occupied,
    Maintenance,
}

impl BedState {
    /// Administrative transitions. Occupancy changes (AVAILABLE <-> OCCUPIED)
    /// only happen through the admission orchestrator.
    pub fn can_enter_maintenance(self) -> bool {
        !matches!(self, BedState::Occupied)
    }
}

impl fmt::Display for BedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BedState::Available => "available",
            BedState::Occupied => "occupied",
            BedState::Maintenance => "maintenance",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct BedDBResponse {
    pub room_number: RoomNumber,
    pub bed_number: BedNumber,
    pub state: BedState,
}

impl BedDBResponse {
    pub fn key(&self) -> BedKey {
        BedKey::new(self.room_number, self.bed_number)
    }
}

/// Database request for registering a new bed
#[derive(Debug, Clone)]
pub struct BedCreateDBRequest {
    pub key: BedKey,
    pub state: BedState,
}

/// Database request for moving a bed to a new state
#[derive(Debug, Clone)]
pub struct BedStateUpdateDBRequest {
    pub state: BedState,
}

/// Filter for listing beds
#[derive(Debug, Clone, Default)]
pub struct BedFilter {
    pub room_number: Option<RoomNumber>,
    pub state: Option<BedState>,
}
