//! Read-only lookups against reference data owned by other subsystems.

use crate::db::{
    errors::Result,
    models::directory::{PatientDBResponse, PhysicianDBResponse},
};
use crate::types::{License, PatientDoc, RoomNumber};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Patients<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Patients<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn exists(&mut self, doc: &PatientDoc) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM patients WHERE doc_type = $1 AND doc_number = $2)")
            .bind(&doc.doc_type)
            .bind(&doc.doc_number)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }

    #[instrument(skip(self), err)]
    pub async fn get(&mut self, doc: &PatientDoc) -> Result<Option<PatientDBResponse>> {
        let patient = sqlx::query_as::<_, PatientDBResponse>(
            r#"
            SELECT doc_type, doc_number, first_name, last_name, birth_date
            FROM patients
            WHERE doc_type = $1 AND doc_number = $2
            "#,
        )
        .bind(&doc.doc_type)
        .bind(&doc.doc_number)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(patient)
    }
}

pub struct Physicians<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Physicians<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn exists(&mut self, license: License) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM physicians WHERE license = $1)")
            .bind(license)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }

    #[instrument(skip(self), err)]
    pub async fn get(&mut self, license: License) -> Result<Option<PhysicianDBResponse>> {
        let physician = sqlx::query_as::<_, PhysicianDBResponse>(
            r#"
            SELECT license, doc_type, doc_number, first_name, last_name
            FROM physicians
            WHERE license = $1
            "#,
        )
        .bind(license)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(physician)
    }
}

pub struct Rooms<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Rooms<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn exists(&mut self, room_number: RoomNumber) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM rooms WHERE room_number = $1)")
            .bind(room_number)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{seed_patient, seed_physician, seed_room};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_patient_lookup_composes_person(pool: PgPool) {
        let doc = seed_patient(&pool, "DNI", "30111222").await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Patients::new(&mut conn);

        assert!(repo.exists(&doc).await.unwrap());
        assert!(!repo.exists(&PatientDoc::new("DNI", "0")).await.unwrap());

        let patient = repo.get(&doc).await.unwrap().expect("patient");
        assert_eq!(patient.person.doc_number, doc.doc_number);
        assert_eq!(patient.person.full_name(), "Test Patient");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_physician_and_room_exists(pool: PgPool) {
        seed_physician(&pool, 42).await;
        seed_room(&pool, 101).await;

        let mut conn = pool.acquire().await.unwrap();
        assert!(Physicians::new(&mut conn).exists(42).await.unwrap());
        assert!(!Physicians::new(&mut conn).exists(43).await.unwrap());
        assert!(Rooms::new(&mut conn).exists(101).await.unwrap());
        assert!(!Rooms::new(&mut conn).exists(999).await.unwrap());

        let physician = Physicians::new(&mut conn).get(42).await.unwrap().expect("physician");
        assert_eq!(physician.person.doc_number, "MP-42");
    }
}
