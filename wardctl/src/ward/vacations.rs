//! Physician vacation scheduling.
//!
//! Requests and updates run under SERIALIZABLE isolation and take a
//! `SHARE ROW EXCLUSIVE` lock on `shifts` before their first read. Concurrent
//! vacation transactions therefore queue on the table lock, and each one's
//! snapshot includes everything committed by the transaction ahead of it.
//! Whatever the lock does not cover is caught by PostgreSQL's serialization
//! checks, which surface as a retryable [`Conflict`](crate::errors::ErrorKind::Conflict).
//! [`retry_serializable`] repeats the whole operation in that case.

use crate::db::{
    handlers::{Physicians, Shifts, Vacations},
    models::{
        shifts::ShiftDBResponse,
        vacations::{VacationDBResponse, VacationPeriod},
    },
};
use crate::errors::{Error, Result};
use crate::types::License;
use crate::ward::{finish, validation};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use std::future::Future;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Run `op` until it succeeds, fails with a non-retryable error, or
/// `max_attempts` runs have been made. Each retry re-executes the whole
/// operation in a fresh transaction, sleeping `backoff * attempt` first.
pub async fn retry_serializable<T, F, Fut>(max_attempts: u32, backoff: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                warn!("Attempt {}/{} lost a serialization race, retrying: {}", attempt, max_attempts, err);
                tokio::time::sleep(backoff * attempt).await;
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

#[derive(Clone)]
pub struct VacationScheduler {
    pool: PgPool,
}

impl VacationScheduler {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Book a vacation for a physician.
    ///
    /// Fails with `Conflict` if it overlaps another vacation of the same physician
    /// or if the physician has a shift on any day inside the period.
    #[instrument(skip(self), fields(physician = period.physician_license), err)]
    pub async fn request_vacation(&self, period: VacationPeriod) -> Result<VacationDBResponse> {
        validation::vacation_range(period.start_date, period.end_date)?;

        let mut tx = self.begin_serializable().await?;
        let outcome = Self::schedule(&mut tx, &period).await;
        let vacation = finish(tx, outcome).await?;

        info!(
            "Booked vacation for physician {} from {} to {}",
            period.physician_license, period.start_date, period.end_date
        );
        Ok(vacation)
    }

    /// Replace `old` with `new` atomically. If the new period is rejected the old
    /// one stays in place.
    #[instrument(skip(self), fields(physician = old.physician_license), err)]
    pub async fn update_vacation(&self, old: VacationPeriod, new: VacationPeriod) -> Result<VacationDBResponse> {
        let mut tx = self.begin_serializable().await?;
        let outcome = Self::reschedule(&mut tx, &old, &new).await;
        let vacation = finish(tx, outcome).await?;

        info!(
            "Moved vacation of physician {} from {}..{} to {}..{}",
            old.physician_license, old.start_date, old.end_date, new.start_date, new.end_date
        );
        Ok(vacation)
    }

    #[instrument(skip(self), fields(physician = period.physician_license), err)]
    pub async fn cancel_vacation(&self, period: VacationPeriod) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let outcome = Self::remove(&mut tx, &period).await;
        finish(tx, outcome).await?;

        info!(
            "Cancelled vacation of physician {} from {} to {}",
            period.physician_license, period.start_date, period.end_date
        );
        Ok(())
    }

    /// Vacation of the physician starting on `start_date`
    #[instrument(skip(self), err)]
    pub async fn get_vacation(&self, license: License, start_date: NaiveDate) -> Result<VacationDBResponse> {
        let mut conn = self.pool.acquire().await?;
        Vacations::new(&mut conn)
            .get(license, start_date)
            .await?
            .ok_or_else(|| Error::not_found("Vacation", format!("{license}/{start_date}")))
    }

    /// All vacations of a physician, ordered by start date
    #[instrument(skip(self), err)]
    pub async fn list_vacations(&self, license: License) -> Result<Vec<VacationDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        if !Physicians::new(&mut conn).exists(license).await? {
            return Err(Error::not_found("Physician", license));
        }
        Ok(Vacations::new(&mut conn).list(license).await?)
    }

    #[instrument(skip(self), err)]
    pub async fn list_shifts(&self, license: License) -> Result<Vec<ShiftDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        if !Physicians::new(&mut conn).exists(license).await? {
            return Err(Error::not_found("Physician", license));
        }
        Ok(Shifts::new(&mut conn).list(license).await?)
    }

    /// SERIALIZABLE transaction with the roster already locked.
    /// Nothing may be read before the lock, or the snapshot predates it.
    async fn begin_serializable(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;
        Shifts::new(&mut tx).lock_table().await?;
        Ok(tx)
    }

    async fn schedule(conn: &mut PgConnection, period: &VacationPeriod) -> Result<VacationDBResponse> {
        let license = period.physician_license;
        if !Physicians::new(&mut *conn).exists(license).await? {
            return Err(Error::not_found("Physician", license));
        }

        let overlapping = Vacations::new(&mut *conn)
            .overlapping(license, period.start_date, period.end_date)
            .await?;
        if let Some(existing) = overlapping.first() {
            return Err(Error::conflict(format!(
                "Physician {} already has a vacation from {} to {}",
                license, existing.start_date, existing.end_date
            )));
        }

        let shifts = Shifts::new(&mut *conn)
            .within(license, period.start_date, period.end_date)
            .await?;
        if let Some(shift) = shifts.first() {
            return Err(Error::conflict(format!(
                "Physician {} has {} shift(s) in the period, first on {}",
                license,
                shifts.len(),
                shift.shift_at.date_naive()
            )));
        }

        Ok(Vacations::new(&mut *conn).insert(period).await?)
    }

    async fn reschedule(conn: &mut PgConnection, old: &VacationPeriod, new: &VacationPeriod) -> Result<VacationDBResponse> {
        if !Vacations::new(&mut *conn).delete(old).await? {
            return Err(Error::not_found(
                "Vacation",
                format!("{}/{}..{}", old.physician_license, old.start_date, old.end_date),
            ));
        }
        validation::vacation_range(new.start_date, new.end_date)?;
        Self::schedule(conn, new).await
    }

    async fn remove(conn: &mut PgConnection, period: &VacationPeriod) -> Result<()> {
        if !Vacations::new(&mut *conn).delete(period).await? {
            return Err(Error::not_found(
                "Vacation",
                format!("{}/{}..{}", period.physician_license, period.start_date, period.end_date),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use crate::errors::ErrorKind;
    use crate::test_utils::{seed_physician, seed_shift};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn period(start: NaiveDate, end: NaiveDate) -> VacationPeriod {
        VacationPeriod::new(42, start, end)
    }

    fn serialization_failure() -> Error {
        Error::Database(DbError::SerializationFailure {
            message: "could not serialize access due to read/write dependencies".to_string(),
        })
    }

    async fn scheduler(pool: &PgPool) -> VacationScheduler {
        seed_physician(pool, 42).await;
        VacationScheduler::new(pool.clone())
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_request_vacation(pool: PgPool) {
        let scheduler = scheduler(&pool).await;

        let vacation = scheduler
            .request_vacation(period(date(2024, 1, 10), date(2024, 1, 20)))
            .await
            .unwrap();
        assert_eq!(vacation.period(), period(date(2024, 1, 10), date(2024, 1, 20)));

        let listed = scheduler.list_vacations(42).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_overlapping_request_is_rejected(pool: PgPool) {
        let scheduler = scheduler(&pool).await;
        scheduler
            .request_vacation(period(date(2024, 1, 10), date(2024, 1, 20)))
            .await
            .unwrap();

        let err = scheduler
            .request_vacation(period(date(2024, 1, 15), date(2024, 1, 25)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(!err.is_retryable());

        let listed = scheduler.list_vacations(42).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].start_date, date(2024, 1, 10));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_shift_inside_period_is_rejected(pool: PgPool) {
        let scheduler = scheduler(&pool).await;
        seed_shift(&pool, 42, Utc.with_ymd_and_hms(2024, 1, 12, 8, 0, 0).unwrap()).await;

        let err = scheduler
            .request_vacation(period(date(2024, 1, 10), date(2024, 1, 20)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(scheduler.list_vacations(42).await.unwrap().is_empty());

        // Shifts outside the window do not matter
        scheduler
            .request_vacation(period(date(2024, 1, 13), date(2024, 1, 20)))
            .await
            .unwrap();
        assert_eq!(scheduler.list_shifts(42).await.unwrap().len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invalid_and_unknown_inputs(pool: PgPool) {
        let scheduler = scheduler(&pool).await;

        let err = scheduler
            .request_vacation(period(date(2024, 1, 20), date(2024, 1, 10)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = scheduler
            .request_vacation(VacationPeriod::new(7, date(2024, 1, 10), date(2024, 1, 20)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert_eq!(scheduler.list_vacations(7).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(scheduler.list_shifts(7).await.unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            scheduler.get_vacation(42, date(2024, 1, 10)).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_vacation(pool: PgPool) {
        let scheduler = scheduler(&pool).await;
        let old = period(date(2024, 1, 10), date(2024, 1, 20));
        scheduler.request_vacation(old).await.unwrap();

        // The new period may overlap the one it replaces
        let new = period(date(2024, 1, 15), date(2024, 1, 25));
        let updated = scheduler.update_vacation(old, new).await.unwrap();
        assert_eq!(updated.period(), new);

        let listed = scheduler.list_vacations(42).await.unwrap();
        assert_eq!(listed.iter().map(|v| v.period()).collect::<Vec<_>>(), vec![new]);

        let err = scheduler.update_vacation(old, new).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_failed_update_keeps_old_period(pool: PgPool) {
        let scheduler = scheduler(&pool).await;
        let old = period(date(2024, 1, 10), date(2024, 1, 20));
        scheduler.request_vacation(old).await.unwrap();
        seed_shift(&pool, 42, Utc.with_ymd_and_hms(2024, 2, 3, 8, 0, 0).unwrap()).await;

        let err = scheduler
            .update_vacation(old, period(date(2024, 2, 1), date(2024, 2, 5)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = scheduler
            .update_vacation(old, period(date(2024, 2, 5), date(2024, 2, 1)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let kept = scheduler.get_vacation(42, date(2024, 1, 10)).await.unwrap();
        assert_eq!(kept.period(), old);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_cancel_vacation(pool: PgPool) {
        let scheduler = scheduler(&pool).await;
        let booked = period(date(2024, 1, 10), date(2024, 1, 20));
        scheduler.request_vacation(booked).await.unwrap();

        scheduler.cancel_vacation(booked).await.unwrap();
        assert!(scheduler.list_vacations(42).await.unwrap().is_empty());

        let err = scheduler.cancel_vacation(booked).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_concurrent_disjoint_requests_both_succeed(pool: PgPool) {
        let scheduler = scheduler(&pool).await;

        let (a, b) = tokio::join!(
            scheduler.request_vacation(period(date(2024, 1, 1), date(2024, 1, 5))),
            scheduler.request_vacation(period(date(2024, 2, 1), date(2024, 2, 5))),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(scheduler.list_vacations(42).await.unwrap().len(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_concurrent_overlapping_requests_admit_exactly_one(pool: PgPool) {
        let scheduler = scheduler(&pool).await;

        let (a, b) = tokio::join!(
            scheduler.request_vacation(period(date(2024, 1, 10), date(2024, 1, 20))),
            scheduler.request_vacation(period(date(2024, 1, 15), date(2024, 1, 25))),
        );

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let err = results.into_iter().find_map(|r| r.err()).unwrap();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        assert_eq!(scheduler.list_vacations(42).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_repeats_serialization_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = retry_serializable(3, Duration::ZERO, move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(serialization_failure())
            } else {
                Ok("booked")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "booked");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = retry_serializable(2, Duration::ZERO, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(serialization_failure())
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_passes_business_conflicts_through() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = retry_serializable(5, Duration::ZERO, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(Error::conflict("overlapping vacation"))
        })
        .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Conflict);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
