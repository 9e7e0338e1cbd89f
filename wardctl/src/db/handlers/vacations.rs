use crate::db::{
    errors::Result,
    models::vacations::{VacationDBResponse, VacationPeriod},
};
use crate::types::License;
use chrono::NaiveDate;
use sqlx::PgConnection;
use tracing::instrument;

pub struct Vacations<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Vacations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn insert(&mut self, period: &VacationPeriod) -> Result<VacationDBResponse> {
        let vacation = sqlx::query_as::<_, VacationDBResponse>(
            r#"
            INSERT INTO vacations (physician_license, start_date, end_date)
            VALUES ($1, $2, $3)
            RETURNING physician_license, start_date, end_date, created_at
            "#,
        )
        .bind(period.physician_license)
        .bind(period.start_date)
        .bind(period.end_date)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(vacation)
    }

    /// Delete an exact period. Returns whether a row was removed.
    #[instrument(skip(self), err)]
    pub async fn delete(&mut self, period: &VacationPeriod) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM vacations
            WHERE physician_license = $1 AND start_date = $2 AND end_date = $3
            "#,
        )
        .bind(period.physician_license)
        .bind(period.start_date)
        .bind(period.end_date)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Periods of the physician overlapping [start, end]: start1 < end2 AND end1 > start2
    #[instrument(skip(self), err)]
    pub async fn overlapping(&mut self, license: License, start: NaiveDate, end: NaiveDate) -> Result<Vec<VacationDBResponse>> {
        let rows = sqlx::query_as::<_, VacationDBResponse>(
            r#"
            SELECT physician_license, start_date, end_date, created_at
            FROM vacations
            WHERE physician_license = $1
              AND start_date < $3
              AND end_date > $2
            ORDER BY start_date
            "#,
        )
        .bind(license)
        .bind(start)
        .bind(end)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    /// Look a period up by its key (physician and start date)
    #[instrument(skip(self), err)]
    pub async fn get(&mut self, license: License, start_date: NaiveDate) -> Result<Option<VacationDBResponse>> {
        let vacation = sqlx::query_as::<_, VacationDBResponse>(
            r#"
            SELECT physician_license, start_date, end_date, created_at
            FROM vacations
            WHERE physician_license = $1 AND start_date = $2
            "#,
        )
        .bind(license)
        .bind(start_date)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(vacation)
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self, license: License) -> Result<Vec<VacationDBResponse>> {
        let rows = sqlx::query_as::<_, VacationDBResponse>(
            r#"
            SELECT physician_license, start_date, end_date, created_at
            FROM vacations
            WHERE physician_license = $1
            ORDER BY start_date
            "#,
        )
        .bind(license)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }
}
