//! API request/response models for admissions and bed assignments.

use crate::db::models::{admissions::AdmissionFilter, assignments::AssignmentDBResponse};
use crate::errors::{Error, Result};
use crate::types::{AdmissionId, BedKey, BedNumber, License, PatientDoc, RoomNumber};
use crate::ward::{AdmissionDetails, CreateAdmission, validation};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Request body for admitting a patient.
///
/// `room_number` and `bed_number` must be given together. When both are
/// omitted the lowest available bed is assigned.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdmissionCreate {
    #[schema(example = "DNI")]
    pub patient_doc_type: String,
    #[schema(example = "30111222")]
    pub patient_doc_number: String,
    #[schema(example = 42)]
    pub physician_license: License,
    pub start_date: NaiveDate,
    /// Planned discharge date
    pub end_date: Option<NaiveDate>,
    #[schema(example = 101)]
    pub room_number: Option<RoomNumber>,
    #[schema(example = 2)]
    pub bed_number: Option<BedNumber>,
}

impl From<AdmissionCreate> for CreateAdmission {
    fn from(body: AdmissionCreate) -> Self {
        Self {
            patient: PatientDoc::new(body.patient_doc_type, body.patient_doc_number),
            physician_license: body.physician_license,
            start_date: body.start_date,
            end_date: body.end_date,
            room_number: body.room_number,
            bed_number: body.bed_number,
        }
    }
}

/// Destination bed of a transfer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferRequest {
    #[schema(example = 102)]
    pub room_number: RoomNumber,
    #[schema(example = 1)]
    pub bed_number: BedNumber,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdmissionResponse {
    pub id: AdmissionId,
    pub start_date: NaiveDate,
    /// Set when the patient is discharged
    pub end_date: Option<NaiveDate>,
    /// Planned discharge date supplied at admission
    pub expected_end_date: Option<NaiveDate>,
    pub patient: PatientDoc,
    /// Only present when a single admission is fetched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    pub physician_license: License,
    /// Only present when a single admission is fetched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physician_name: Option<String>,
    /// Bed currently held; absent once discharged
    pub current_bed: Option<BedKey>,
    pub created_at: DateTime<Utc>,
}

impl From<AdmissionDetails> for AdmissionResponse {
    fn from(details: AdmissionDetails) -> Self {
        let patient = details.admission.patient();
        let admission = details.admission;
        Self {
            id: admission.id,
            start_date: admission.start_date,
            end_date: admission.end_date,
            expected_end_date: admission.expected_end_date,
            patient,
            patient_name: details.patient.map(|p| p.person.full_name()),
            physician_license: admission.physician_license,
            physician_name: details.physician.map(|p| p.person.full_name()),
            current_bed: details.current_bed,
            created_at: admission.created_at,
        }
    }
}

/// One entry in an admission's bed history
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AssignmentResponse {
    pub admission_id: AdmissionId,
    pub assigned_at: DateTime<Utc>,
    pub room_number: RoomNumber,
    pub bed_number: BedNumber,
}

impl From<AssignmentDBResponse> for AssignmentResponse {
    fn from(db: AssignmentDBResponse) -> Self {
        Self {
            admission_id: db.admission_id,
            assigned_at: db.assigned_at,
            room_number: db.room_number,
            bed_number: db.bed_number,
        }
    }
}

/// Query parameters for listing admissions
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListAdmissionsQuery {
    /// Patient document type; requires `patient_doc_number`
    pub patient_doc_type: Option<String>,
    pub patient_doc_number: Option<String>,
    pub physician_license: Option<License>,
    /// Only admissions without an end date
    pub ongoing: Option<bool>,
    /// Number of items to skip (default: 0)
    pub skip: Option<i64>,
    /// Maximum number of items to return (default: 100, max: 1000)
    pub limit: Option<i64>,
}

impl ListAdmissionsQuery {
    pub fn to_filter(&self) -> Result<AdmissionFilter> {
        let patient = match (&self.patient_doc_type, &self.patient_doc_number) {
            (Some(doc_type), Some(doc_number)) => Some(PatientDoc::new(doc_type, doc_number)),
            (None, None) => None,
            _ => {
                return Err(Error::invalid(
                    "patient_doc_type and patient_doc_number must be given together",
                ));
            }
        };
        let (skip, limit) = validation::pagination(self.skip, self.limit);

        Ok(AdmissionFilter {
            patient,
            physician_license: self.physician_license,
            ongoing_only: self.ongoing.unwrap_or(false),
            skip,
            limit,
        })
    }
}
