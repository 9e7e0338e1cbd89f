//! Administrative bed lifecycle.
//!
//! Occupancy (available <-> occupied) is owned by the admission orchestrator.
//! This registry only creates and deletes beds and moves them in and out of
//! maintenance, always under a row lock on the bed.

use crate::db::{
    handlers::{Assignments, Beds, Repository, Rooms},
    models::beds::{BedCreateDBRequest, BedDBResponse, BedFilter, BedState, BedStateUpdateDBRequest},
};
use crate::errors::{Error, Result};
use crate::types::BedKey;
use crate::ward::finish;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

/// A bed plus the number of open assignments that reference it (0 or 1).
#[derive(Debug, Clone)]
pub struct BedDetails {
    pub bed: BedDBResponse,
    pub open_assignments: i64,
}

#[derive(Clone)]
pub struct BedRegistry {
    pool: PgPool,
}

impl BedRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a new, available bed in an existing room
    #[instrument(skip(self), fields(bed = %key), err)]
    pub async fn create_bed(&self, key: BedKey) -> Result<BedDBResponse> {
        let mut tx = self.pool.begin().await?;
        let outcome = Self::create(&mut tx, key).await;
        let bed = finish(tx, outcome).await?;

        info!("Created {}", key);
        Ok(bed)
    }

    async fn create(conn: &mut PgConnection, key: BedKey) -> Result<BedDBResponse> {
        if !Rooms::new(&mut *conn).exists(key.room_number).await? {
            return Err(Error::not_found("Room", key.room_number));
        }
        if Beds::new(&mut *conn).get_by_id(key).await?.is_some() {
            return Err(Error::conflict(format!("{key} already exists")));
        }

        // A concurrent insert of the same key still surfaces as a unique violation
        let bed = Beds::new(&mut *conn)
            .create(&BedCreateDBRequest {
                key,
                state: BedState::Available,
            })
            .await?;
        Ok(bed)
    }

    #[instrument(skip(self), fields(bed = %key), err)]
    pub async fn get_bed(&self, key: BedKey) -> Result<BedDetails> {
        let mut conn = self.pool.acquire().await?;
        let bed = Beds::new(&mut conn)
            .get_by_id(key)
            .await?
            .ok_or_else(|| Error::not_found("Bed", key))?;
        let open_assignments = Assignments::new(&mut conn).count_open_for_bed(key).await?;

        Ok(BedDetails { bed, open_assignments })
    }

    #[instrument(skip(self, filter), err)]
    pub async fn list_beds(&self, filter: &BedFilter) -> Result<Vec<BedDBResponse>> {
        let mut conn = self.pool.acquire().await?;
        Ok(Beds::new(&mut conn).list(filter).await?)
    }

    /// Take a bed out of service. Occupied beds are rejected.
    #[instrument(skip(self), fields(bed = %key), err)]
    pub async fn set_maintenance(&self, key: BedKey) -> Result<BedDBResponse> {
        let mut tx = self.pool.begin().await?;
        let outcome = Self::transition(&mut tx, key, BedState::Maintenance).await;
        let bed = finish(tx, outcome).await?;

        info!("{} is now {}", key, bed.state);
        Ok(bed)
    }

    /// Return a bed from maintenance to the available pool
    #[instrument(skip(self), fields(bed = %key), err)]
    pub async fn set_available(&self, key: BedKey) -> Result<BedDBResponse> {
        let mut tx = self.pool.begin().await?;
        let outcome = Self::transition(&mut tx, key, BedState::Available).await;
        let bed = finish(tx, outcome).await?;

        info!("{} is now {}", key, bed.state);
        Ok(bed)
    }

    async fn transition(conn: &mut PgConnection, key: BedKey, target: BedState) -> Result<BedDBResponse> {
        let bed = Beds::new(&mut *conn)
            .lock(key)
            .await?
            .ok_or_else(|| Error::not_found("Bed", key))?;

        let allowed = match target {
            BedState::Maintenance => bed.state.can_enter_maintenance(),
            BedState::Available => bed.state == BedState::Maintenance,
            // Occupancy only changes through admissions
            BedState::Occupied => false,
        };
        if !allowed {
            return Err(Error::conflict(format!("{} is {}, cannot move it to {}", key, bed.state, target)));
        }
        if bed.state == target {
            return Ok(bed);
        }

        Ok(Beds::new(&mut *conn)
            .update(key, &BedStateUpdateDBRequest { state: target })
            .await?)
    }

    /// Remove a bed that no admission has ever used
    #[instrument(skip(self), fields(bed = %key), err)]
    pub async fn delete_bed(&self, key: BedKey) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let outcome = Self::delete(&mut tx, key).await;
        finish(tx, outcome).await?;

        info!("Deleted {}", key);
        Ok(())
    }

    async fn delete(conn: &mut PgConnection, key: BedKey) -> Result<()> {
        Beds::new(&mut *conn)
            .lock(key)
            .await?
            .ok_or_else(|| Error::not_found("Bed", key))?;
        if Beds::new(&mut *conn).has_history(key).await? {
            return Err(Error::conflict(format!("{key} is referenced by assignment history")));
        }

        Beds::new(&mut *conn).delete(key).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_utils::{seed_bed, seed_patient, seed_physician, seed_room};
    use crate::ward::{AdmissionOrchestrator, CreateAdmission};
    use chrono::NaiveDate;

    async fn admit_into(pool: &PgPool, key: BedKey) {
        seed_physician(pool, 42).await;
        let patient = seed_patient(pool, "DNI", "30111222").await;
        AdmissionOrchestrator::new(pool.clone())
            .create_admission(&CreateAdmission {
                patient,
                physician_license: 42,
                start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                end_date: None,
                room_number: Some(key.room_number),
                bed_number: Some(key.bed_number),
            })
            .await
            .unwrap();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_bed(pool: PgPool) {
        seed_room(&pool, 101).await;
        let registry = BedRegistry::new(pool.clone());

        let bed = registry.create_bed(BedKey::new(101, 1)).await.unwrap();
        assert_eq!(bed.state, BedState::Available);

        let err = registry.create_bed(BedKey::new(101, 1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = registry.create_bed(BedKey::new(999, 1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let details = registry.get_bed(BedKey::new(101, 1)).await.unwrap();
        assert_eq!(details.open_assignments, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_maintenance_round_trip(pool: PgPool) {
        seed_room(&pool, 101).await;
        let key = BedKey::new(101, 1);
        seed_bed(&pool, key, BedState::Available).await;
        let registry = BedRegistry::new(pool.clone());

        // Only maintenance beds can be made available
        let err = registry.set_available(key).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        assert_eq!(registry.set_maintenance(key).await.unwrap().state, BedState::Maintenance);
        assert_eq!(registry.set_maintenance(key).await.unwrap().state, BedState::Maintenance);
        assert_eq!(registry.set_available(key).await.unwrap().state, BedState::Available);

        let err = registry.set_maintenance(BedKey::new(101, 9)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_occupied_bed_is_locked_in_place(pool: PgPool) {
        seed_room(&pool, 101).await;
        let key = BedKey::new(101, 1);
        seed_bed(&pool, key, BedState::Available).await;
        admit_into(&pool, key).await;
        let registry = BedRegistry::new(pool.clone());

        let err = registry.set_maintenance(key).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        let err = registry.set_available(key).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let details = registry.get_bed(key).await.unwrap();
        assert_eq!(details.bed.state, BedState::Occupied);
        assert_eq!(details.open_assignments, 1);

        // Referenced by history, so it cannot be deleted
        let err = registry.delete_bed(key).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_unused_bed(pool: PgPool) {
        seed_room(&pool, 101).await;
        seed_bed(&pool, BedKey::new(101, 1), BedState::Maintenance).await;
        seed_bed(&pool, BedKey::new(101, 2), BedState::Available).await;
        let registry = BedRegistry::new(pool.clone());

        registry.delete_bed(BedKey::new(101, 1)).await.unwrap();

        let err = registry.delete_bed(BedKey::new(101, 1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let remaining = registry.list_beds(&BedFilter::default()).await.unwrap();
        assert_eq!(remaining.iter().map(|b| b.key()).collect::<Vec<_>>(), vec![BedKey::new(101, 2)]);
    }
}
