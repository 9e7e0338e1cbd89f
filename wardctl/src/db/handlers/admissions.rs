use crate::db::{
    errors::{DbError, Result},
    models::admissions::{AdmissionCreateDBRequest, AdmissionDBResponse, AdmissionFilter},
};
use crate::types::{AdmissionId, PatientDoc};
use chrono::NaiveDate;
use sqlx::PgConnection;
use tracing::instrument;

const ADMISSION_COLUMNS: &str =
    "id, start_date, end_date, expected_end_date, patient_doc_type, patient_doc_number, physician_license, created_at";

pub struct Admissions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Admissions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(patient = %request.patient), err)]
    pub async fn create(&mut self, request: &AdmissionCreateDBRequest) -> Result<AdmissionDBResponse> {
        let admission = sqlx::query_as::<_, AdmissionDBResponse>(&format!(
            r#"
            INSERT INTO admissions (start_date, expected_end_date, patient_doc_type, patient_doc_number, physician_license)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ADMISSION_COLUMNS}
            "#
        ))
        .bind(request.start_date)
        .bind(request.expected_end_date)
        .bind(&request.patient.doc_type)
        .bind(&request.patient.doc_number)
        .bind(request.physician_license)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(admission)
    }

    #[instrument(skip(self), err)]
    pub async fn get(&mut self, id: AdmissionId) -> Result<Option<AdmissionDBResponse>> {
        let admission = sqlx::query_as::<_, AdmissionDBResponse>(&format!("SELECT {ADMISSION_COLUMNS} FROM admissions WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(admission)
    }

    /// Lock the admission row for the rest of the transaction. Concurrent
    /// transfers and closures of the same admission serialize here.
    #[instrument(skip(self), err)]
    pub async fn lock(&mut self, id: AdmissionId) -> Result<Option<AdmissionDBResponse>> {
        let admission = sqlx::query_as::<_, AdmissionDBResponse>(&format!(
            "SELECT {ADMISSION_COLUMNS} FROM admissions WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(admission)
    }

    /// The patient's ongoing admission, if any
    #[instrument(skip(self), err)]
    pub async fn ongoing_for_patient(&mut self, patient: &PatientDoc) -> Result<Option<AdmissionDBResponse>> {
        let admission = sqlx::query_as::<_, AdmissionDBResponse>(&format!(
            r#"
            SELECT {ADMISSION_COLUMNS}
            FROM admissions
            WHERE patient_doc_type = $1 AND patient_doc_number = $2 AND end_date IS NULL
            "#
        ))
        .bind(&patient.doc_type)
        .bind(&patient.doc_number)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(admission)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn list(&mut self, filter: &AdmissionFilter) -> Result<Vec<AdmissionDBResponse>> {
        let (doc_type, doc_number) = match &filter.patient {
            Some(doc) => (Some(doc.doc_type.as_str()), Some(doc.doc_number.as_str())),
            None => (None, None),
        };

        let admissions = sqlx::query_as::<_, AdmissionDBResponse>(&format!(
            r#"
            SELECT {ADMISSION_COLUMNS}
            FROM admissions
            WHERE ($1::text IS NULL OR (patient_doc_type = $1 AND patient_doc_number = $2))
              AND ($3::int4 IS NULL OR physician_license = $3)
              AND (NOT $4 OR end_date IS NULL)
            ORDER BY start_date DESC, id DESC
            OFFSET $5
            LIMIT $6
            "#
        ))
        .bind(doc_type)
        .bind(doc_number)
        .bind(filter.physician_license)
        .bind(filter.ongoing_only)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(admissions)
    }

    /// The database's notion of today, used for discharge dates
    #[instrument(skip(self), err)]
    pub async fn current_date(&mut self) -> Result<NaiveDate> {
        let today = sqlx::query_scalar::<_, NaiveDate>("SELECT CURRENT_DATE")
            .fetch_one(&mut *self.db)
            .await?;

        Ok(today)
    }

    /// Stamp today's date as the end of an ongoing admission.
    /// Returns [`DbError::NotFound`] if the admission is unknown or already closed.
    #[instrument(skip(self), err)]
    pub async fn close(&mut self, id: AdmissionId) -> Result<AdmissionDBResponse> {
        let admission = sqlx::query_as::<_, AdmissionDBResponse>(&format!(
            r#"
            UPDATE admissions
            SET end_date = CURRENT_DATE
            WHERE id = $1 AND end_date IS NULL
            RETURNING {ADMISSION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        admission.ok_or(DbError::NotFound)
    }
}
