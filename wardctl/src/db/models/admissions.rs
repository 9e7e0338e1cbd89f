//! Database models for the admission ledger.

use crate::types::{AdmissionId, License, PatientDoc};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database request for inserting a new admission
#[derive(Debug, Clone)]
pub struct AdmissionCreateDBRequest {
    pub patient: PatientDoc,
    pub physician_license: License,
    pub start_date: NaiveDate,
    pub expected_end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AdmissionDBResponse {
    pub id: AdmissionId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub expected_end_date: Option<NaiveDate>,
    pub patient_doc_type: String,
    pub patient_doc_number: String,
    pub physician_license: License,
    pub created_at: DateTime<Utc>,
}

impl AdmissionDBResponse {
    pub fn is_ongoing(&self) -> bool {
        self.end_date.is_none()
    }

    pub fn patient(&self) -> PatientDoc {
        PatientDoc::new(self.patient_doc_type.clone(), self.patient_doc_number.clone())
    }
}

/// Filter for listing admissions
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    pub patient: Option<PatientDoc>,
    pub physician_license: Option<License>,
    pub ongoing_only: bool,
    pub skip: i64,
    pub limit: i64,
}

impl Default for AdmissionFilter {
    fn default() -> Self {
        Self {
            patient: None,
            physician_license: None,
            ongoing_only: false,
            skip: 0,
            limit: 100,
        }
    }
}
