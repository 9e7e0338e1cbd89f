//! Common identifier types shared by the database, ward and API layers.
//!
//! Reference data keys (rooms, physicians) are plain integers wrapped in type
//! aliases; composite keys (patient documents, beds) are small value structs.
//!
//! [`BedKey`] orders by room first and bed second. Operations that lock more
//! than one bed sort their keys with this ordering so that concurrent
//! transactions always acquire row locks in the same order.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

// Type aliases for IDs
pub type AdmissionId = i64;
pub type RoomNumber = i32;
pub type BedNumber = i32;
pub type License = i32;

/// Identity document of a patient (document type + number).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct PatientDoc {
    pub doc_type: String,
    pub doc_number: String,
}

impl PatientDoc {
    pub fn new(doc_type: impl Into<String>, doc_number: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            doc_number: doc_number.into(),
        }
    }
}

impl fmt::Display for PatientDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.doc_type, self.doc_number)
    }
}

/// Physical bed, keyed by room and bed number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub struct BedKey {
    pub room_number: RoomNumber,
    pub bed_number: BedNumber,
}

impl BedKey {
    pub fn new(room_number: RoomNumber, bed_number: BedNumber) -> Self {
        Self { room_number, bed_number }
    }
}

impl fmt::Display for BedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "room {} bed {}", self.room_number, self.bed_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bed_keys_sort_by_room_then_bed() {
        let mut keys = vec![BedKey::new(2, 1), BedKey::new(1, 3), BedKey::new(1, 2)];
        keys.sort();
        assert_eq!(keys, vec![BedKey::new(1, 2), BedKey::new(1, 3), BedKey::new(2, 1)]);
    }

    #[test]
    fn test_display() {
        assert_eq!(BedKey::new(101, 2).to_string(), "room 101 bed 2");
        assert_eq!(PatientDoc::new("DNI", "30111222").to_string(), "DNI 30111222");
    }
}
