//! Append-only bed assignment history.
//!
//! Rows are never updated (a trigger rejects UPDATE). The open assignment of an
//! admission is its latest row while the admission has no end date; a transfer
//! supersedes it by appending a newer row and a closure ends it by stamping the
//! admission's end date. An admission therefore holds at most one bed at a time.

use crate::db::{errors::Result, models::assignments::AssignmentDBResponse};
use crate::types::{AdmissionId, BedKey};
use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::instrument;

pub struct Assignments<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Assignments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Append a new assignment stamped with the current wall-clock time
    #[instrument(skip(self), err)]
    pub async fn append(&mut self, admission_id: AdmissionId, bed: BedKey) -> Result<AssignmentDBResponse> {
        let assignment = sqlx::query_as::<_, AssignmentDBResponse>(
            r#"
            INSERT INTO bed_assignments (admission_id, room_number, bed_number)
            VALUES ($1, $2, $3)
            RETURNING admission_id, assigned_at, room_number, bed_number
            "#,
        )
        .bind(admission_id)
        .bind(bed.room_number)
        .bind(bed.bed_number)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(assignment)
    }

    /// Latest assignment of the admission, regardless of whether it is still open
    #[instrument(skip(self), err)]
    pub async fn latest(&mut self, admission_id: AdmissionId) -> Result<Option<AssignmentDBResponse>> {
        let assignment = sqlx::query_as::<_, AssignmentDBResponse>(
            r#"
            SELECT admission_id, assigned_at, room_number, bed_number
            FROM bed_assignments
            WHERE admission_id = $1
            ORDER BY assigned_at DESC
            LIMIT 1
            "#,
        )
        .bind(admission_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(assignment)
    }

    /// Beds the admission currently holds: its latest assignment, if the admission is ongoing
    #[instrument(skip(self), err)]
    pub async fn open_beds(&mut self, admission_id: AdmissionId) -> Result<Vec<BedKey>> {
        let rows = sqlx::query_as::<_, AssignmentDBResponse>(
            r#"
            SELECT DISTINCT ON (ba.admission_id) ba.admission_id, ba.assigned_at, ba.room_number, ba.bed_number
            FROM bed_assignments ba
            JOIN admissions a ON a.id = ba.admission_id
            WHERE ba.admission_id = $1 AND a.end_date IS NULL
            ORDER BY ba.admission_id, ba.assigned_at DESC
            "#,
        )
        .bind(admission_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows.iter().map(AssignmentDBResponse::bed).collect())
    }

    /// Latest assignment for each of the given admissions
    #[instrument(skip(self, admission_ids), fields(count = admission_ids.len()), err)]
    pub async fn latest_bulk(&mut self, admission_ids: &[AdmissionId]) -> Result<HashMap<AdmissionId, AssignmentDBResponse>> {
        if admission_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, AssignmentDBResponse>(
            r#"
            SELECT DISTINCT ON (admission_id) admission_id, assigned_at, room_number, bed_number
            FROM bed_assignments
            WHERE admission_id = ANY($1)
            ORDER BY admission_id, assigned_at DESC
            "#,
        )
        .bind(admission_ids)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows.into_iter().map(|row| (row.admission_id, row)).collect())
    }

    /// Full history of an admission in timestamp order
    #[instrument(skip(self), err)]
    pub async fn history(&mut self, admission_id: AdmissionId) -> Result<Vec<AssignmentDBResponse>> {
        let rows = sqlx::query_as::<_, AssignmentDBResponse>(
            r#"
            SELECT admission_id, assigned_at, room_number, bed_number
            FROM bed_assignments
            WHERE admission_id = $1
            ORDER BY assigned_at ASC
            "#,
        )
        .bind(admission_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    /// Number of open assignments referencing a bed (0 or 1 while invariants hold)
    #[instrument(skip(self), err)]
    pub async fn count_open_for_bed(&mut self, bed: BedKey) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM (
                SELECT DISTINCT ON (ba.admission_id) ba.room_number, ba.bed_number
                FROM bed_assignments ba
                JOIN admissions a ON a.id = ba.admission_id
                WHERE a.end_date IS NULL
                ORDER BY ba.admission_id, ba.assigned_at DESC
            ) open
            WHERE open.room_number = $1 AND open.bed_number = $2
            "#,
        )
        .bind(bed.room_number)
        .bind(bed.bed_number)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }
}
