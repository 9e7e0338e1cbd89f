use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::beds::{BedCreateDBRequest, BedDBResponse, BedFilter, BedStateUpdateDBRequest},
};
use crate::types::BedKey;
use sqlx::PgConnection;
use tracing::instrument;

pub struct Beds<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Beds<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Lock a single bed row for the rest of the transaction
    #[instrument(skip(self), err)]
    pub async fn lock(&mut self, key: BedKey) -> Result<Option<BedDBResponse>> {
        let bed = sqlx::query_as::<_, BedDBResponse>(
            r#"
            SELECT room_number, bed_number, state
            FROM beds
            WHERE room_number = $1 AND bed_number = $2
            FOR UPDATE
            "#,
        )
        .bind(key.room_number)
        .bind(key.bed_number)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(bed)
    }

    /// Lock several beds at once. Rows are locked in (room, bed) order so two
    /// transactions locking overlapping sets cannot deadlock each other.
    #[instrument(skip(self, keys), fields(count = keys.len()), err)]
    pub async fn lock_many(&mut self, keys: &[BedKey]) -> Result<Vec<BedDBResponse>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let (rooms, beds): (Vec<i32>, Vec<i32>) = keys.iter().map(|k| (k.room_number, k.bed_number)).unzip();

        let locked = sqlx::query_as::<_, BedDBResponse>(
            r#"
            SELECT room_number, bed_number, state
            FROM beds
            WHERE (room_number, bed_number) IN (SELECT * FROM UNNEST($1::int4[], $2::int4[]))
            ORDER BY room_number, bed_number
            FOR UPDATE
            "#,
        )
        .bind(rooms)
        .bind(beds)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(locked)
    }

    /// Lock the lowest-numbered available bed (bed number, then room number).
    /// Beds already locked by a concurrent admission are skipped rather than waited on.
    #[instrument(skip(self), err)]
    pub async fn lock_first_available(&mut self) -> Result<Option<BedDBResponse>> {
        let bed = sqlx::query_as::<_, BedDBResponse>(
            r#"
            SELECT room_number, bed_number, state
            FROM beds
            WHERE state = 'available'
            ORDER BY bed_number, room_number
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(bed)
    }

    /// Mark a bed as occupied. Fails with [`DbError::NotFound`] unless the bed is available.
    #[instrument(skip(self), err)]
    pub async fn occupy(&mut self, key: BedKey) -> Result<BedDBResponse> {
        let bed = sqlx::query_as::<_, BedDBResponse>(
            r#"
            UPDATE beds
            SET state = 'occupied'
            WHERE room_number = $1 AND bed_number = $2 AND state = 'available'
            RETURNING room_number, bed_number, state
            "#,
        )
        .bind(key.room_number)
        .bind(key.bed_number)
        .fetch_optional(&mut *self.db)
        .await?;

        bed.ok_or(DbError::NotFound)
    }

    /// Return an occupied bed to the available pool. Beds in any other state are
    /// left untouched; returns whether a row changed.
    #[instrument(skip(self), err)]
    pub async fn release(&mut self, key: BedKey) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE beds
            SET state = 'available'
            WHERE room_number = $1 AND bed_number = $2 AND state = 'occupied'
            "#,
        )
        .bind(key.room_number)
        .bind(key.bed_number)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether any assignment, open or historical, references the bed
    #[instrument(skip(self), err)]
    pub async fn has_history(&mut self, key: BedKey) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM bed_assignments
                WHERE room_number = $1 AND bed_number = $2
            )
            "#,
        )
        .bind(key.room_number)
        .bind(key.bed_number)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(exists)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Beds<'c> {
    type CreateRequest = BedCreateDBRequest;
    type UpdateRequest = BedStateUpdateDBRequest;
    type Response = BedDBResponse;
    type Id = BedKey;
    type Filter = BedFilter;

    #[instrument(skip(self, request), fields(bed = %request.key), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let bed = sqlx::query_as::<_, BedDBResponse>(
            r#"
            INSERT INTO beds (room_number, bed_number, state)
            VALUES ($1, $2, $3)
            RETURNING room_number, bed_number, state
            "#,
        )
        .bind(request.key.room_number)
        .bind(request.key.bed_number)
        .bind(request.state)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(bed)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let bed = sqlx::query_as::<_, BedDBResponse>(
            "SELECT room_number, bed_number, state FROM beds WHERE room_number = $1 AND bed_number = $2",
        )
        .bind(id.room_number)
        .bind(id.bed_number)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(bed)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let beds = sqlx::query_as::<_, BedDBResponse>(
            r#"
            SELECT room_number, bed_number, state
            FROM beds
            WHERE ($1::int4 IS NULL OR room_number = $1)
              AND ($2::text IS NULL OR state = $2)
            ORDER BY room_number, bed_number
            "#,
        )
        .bind(filter.room_number)
        .bind(filter.state)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(beds)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM beds WHERE room_number = $1 AND bed_number = $2")
            .bind(id.room_number)
            .bind(id.bed_number)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(state = %request.state), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let bed = sqlx::query_as::<_, BedDBResponse>(
            r#"
            UPDATE beds
            SET state = $3
            WHERE room_number = $1 AND bed_number = $2
            RETURNING room_number, bed_number, state
            "#,
        )
        .bind(id.room_number)
        .bind(id.bed_number)
        .bind(request.state)
        .fetch_optional(&mut *self.db)
        .await?;

        bed.ok_or(DbError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::beds::BedState;
    use crate::test_utils::{seed_bed, seed_room};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_first_available_orders_by_bed_then_room(pool: PgPool) {
        seed_room(&pool, 101).await;
        seed_room(&pool, 102).await;
        seed_bed(&pool, BedKey::new(101, 3), BedState::Available).await;
        seed_bed(&pool, BedKey::new(102, 1), BedState::Available).await;
        seed_bed(&pool, BedKey::new(101, 1), BedState::Occupied).await;
        seed_bed(&pool, BedKey::new(101, 2), BedState::Maintenance).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Beds::new(&mut conn);

        let bed = repo.lock_first_available().await.unwrap().expect("an available bed");
        assert_eq!(bed.key(), BedKey::new(102, 1));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_release_only_touches_occupied_beds(pool: PgPool) {
        seed_room(&pool, 101).await;
        seed_bed(&pool, BedKey::new(101, 1), BedState::Occupied).await;
        seed_bed(&pool, BedKey::new(101, 2), BedState::Maintenance).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Beds::new(&mut conn);

        assert!(repo.release(BedKey::new(101, 1)).await.unwrap());
        assert!(!repo.release(BedKey::new(101, 2)).await.unwrap());

        let released = repo.get_by_id(BedKey::new(101, 1)).await.unwrap().expect("bed exists");
        assert_eq!(released.state, BedState::Available);
        let untouched = repo.get_by_id(BedKey::new(101, 2)).await.unwrap().expect("bed exists");
        assert_eq!(untouched.state, BedState::Maintenance);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_occupy_requires_available(pool: PgPool) {
        seed_room(&pool, 101).await;
        seed_bed(&pool, BedKey::new(101, 1), BedState::Maintenance).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Beds::new(&mut conn);

        let err = repo.occupy(BedKey::new(101, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_room_and_state(pool: PgPool) {
        seed_room(&pool, 101).await;
        seed_room(&pool, 102).await;
        seed_bed(&pool, BedKey::new(101, 1), BedState::Available).await;
        seed_bed(&pool, BedKey::new(101, 2), BedState::Occupied).await;
        seed_bed(&pool, BedKey::new(102, 1), BedState::Available).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Beds::new(&mut conn);

        let available = repo
            .list(&BedFilter {
                room_number: None,
                state: Some(BedState::Available),
            })
            .await
            .unwrap();
        assert_eq!(available.len(), 2);

        let room_101 = repo
            .list(&BedFilter {
                room_number: Some(101),
                state: None,
            })
            .await
            .unwrap();
        assert_eq!(
            room_101.iter().map(|b| b.key()).collect::<Vec<_>>(),
            vec![BedKey::new(101, 1), BedKey::new(101, 2)]
        );
    }
}
