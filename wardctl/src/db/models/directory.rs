//! Reference data records. Patients and physicians both embed a [`Person`]
//! rather than sharing a base type.

use crate::types::License;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Identity fields shared by patients and physicians
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Person {
    pub doc_type: String,
    pub doc_number: String,
    pub first_name: String,
    pub last_name: String,
}

impl Person {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PatientDBResponse {
    #[sqlx(flatten)]
    pub person: Person,
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PhysicianDBResponse {
    pub license: License,
    #[sqlx(flatten)]
    pub person: Person,
}
