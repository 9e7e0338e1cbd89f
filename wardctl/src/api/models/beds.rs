//! API request/response models for beds.

use crate::db::models::beds::{BedDBResponse, BedFilter, BedState};
use crate::types::{BedNumber, RoomNumber};
use crate::ward::BedDetails;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Request body for registering a bed. New beds start out available.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BedCreate {
    #[schema(example = 101)]
    pub room_number: RoomNumber,
    #[schema(example = 3)]
    pub bed_number: BedNumber,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BedResponse {
    pub room_number: RoomNumber,
    pub bed_number: BedNumber,
    pub state: BedState,
    /// Open assignments referencing the bed; only on single-bed lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_assignments: Option<i64>,
}

impl From<BedDBResponse> for BedResponse {
    fn from(db: BedDBResponse) -> Self {
        Self {
            room_number: db.room_number,
            bed_number: db.bed_number,
            state: db.state,
            open_assignments: None,
        }
    }
}

impl From<BedDetails> for BedResponse {
    fn from(details: BedDetails) -> Self {
        Self {
            open_assignments: Some(details.open_assignments),
            ..details.bed.into()
        }
    }
}

/// Query parameters for listing beds
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListBedsQuery {
    pub room_number: Option<RoomNumber>,
    /// One of `available`, `occupied`, `maintenance`
    pub state: Option<BedState>,
}

impl From<ListBedsQuery> for BedFilter {
    fn from(query: ListBedsQuery) -> Self {
        Self {
            room_number: query.room_number,
            state: query.state,
        }
    }
}
