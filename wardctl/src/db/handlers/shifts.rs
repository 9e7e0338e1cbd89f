//! Duty roster access. The roster belongs to the scheduling subsystem; this
//! repository only reads it and takes the table lock used by vacation scheduling.

use crate::db::{errors::Result, models::shifts::ShiftDBResponse};
use crate::types::License;
use chrono::NaiveDate;
use sqlx::PgConnection;
use tracing::instrument;

pub struct Shifts<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Shifts<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Take a SHARE ROW EXCLUSIVE lock on the roster until the transaction ends.
    /// The mode conflicts with itself and with every writer, so concurrent vacation
    /// requests queue behind each other and the roster cannot change underneath them.
    /// Must run before the transaction's first query so its snapshot sees the
    /// work of whoever held the lock previously.
    #[instrument(skip(self), err)]
    pub async fn lock_table(&mut self) -> Result<()> {
        sqlx::query("LOCK TABLE shifts IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *self.db)
            .await?;
        Ok(())
    }

    /// Shifts of the physician dated inside [start, end], inclusive
    #[instrument(skip(self), err)]
    pub async fn within(&mut self, license: License, start: NaiveDate, end: NaiveDate) -> Result<Vec<ShiftDBResponse>> {
        let rows = sqlx::query_as::<_, ShiftDBResponse>(
            r#"
            SELECT id, physician_license, shift_at, specialty, turn
            FROM shifts
            WHERE physician_license = $1
              AND (shift_at AT TIME ZONE 'UTC')::date BETWEEN $2 AND $3
            ORDER BY shift_at
            "#,
        )
        .bind(license)
        .bind(start)
        .bind(end)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self, license: License) -> Result<Vec<ShiftDBResponse>> {
        let rows = sqlx::query_as::<_, ShiftDBResponse>(
            r#"
            SELECT id, physician_license, shift_at, specialty, turn
            FROM shifts
            WHERE physician_license = $1
            ORDER BY shift_at
            "#,
        )
        .bind(license)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{seed_physician, seed_shift};
    use chrono::{TimeZone, Utc};
    use sqlx::PgPool;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_within_is_inclusive_by_utc_date(pool: PgPool) {
        seed_physician(&pool, 42).await;
        seed_shift(&pool, 42, Utc.with_ymd_and_hms(2024, 1, 10, 23, 30, 0).unwrap()).await;
        seed_shift(&pool, 42, Utc.with_ymd_and_hms(2024, 1, 21, 0, 15, 0).unwrap()).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Shifts::new(&mut conn);

        let hits = repo.within(42, date(2024, 1, 10), date(2024, 1, 20)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].shift_at.date_naive(), date(2024, 1, 10));

        assert_eq!(repo.within(42, date(2024, 1, 21), date(2024, 1, 21)).await.unwrap().len(), 1);
        assert_eq!(repo.list(42).await.unwrap().len(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_lock_table_inside_transaction(pool: PgPool) {
        let mut tx = pool.begin().await.unwrap();
        Shifts::new(&mut tx).lock_table().await.unwrap();
        tx.rollback().await.unwrap();
    }
}
