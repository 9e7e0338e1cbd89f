//! Test fixtures: reference data seeding and an in-process test server.

use crate::config::{Config, CorsConfig, DatabaseConfig, PoolSettings, VacationConfig};
use crate::db::models::beds::BedState;
use crate::types::{BedKey, License, PatientDoc, RoomNumber};
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::time::Duration;

pub async fn create_test_app(pool: PgPool) -> TestServer {
    let app = crate::Application::new_with_pool(create_test_config(), Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: None,
        database: DatabaseConfig {
            // Unused, the test pool is injected
            url: "postgres://unused".to_string(),
            pool: PoolSettings {
                max_connections: 2,
                ..Default::default()
            },
        },
        enable_otel_export: false,
        vacations: VacationConfig {
            max_attempts: 3,
            retry_backoff: Duration::ZERO,
        },
        cors: CorsConfig::default(),
    }
}

/// Insert a room if it does not exist yet
pub async fn seed_room(pool: &PgPool, room_number: RoomNumber) {
    sqlx::query("INSERT INTO rooms (room_number, sector) VALUES ($1, 'General') ON CONFLICT DO NOTHING")
        .bind(room_number)
        .execute(pool)
        .await
        .expect("Failed to seed room");
}

pub async fn seed_bed(pool: &PgPool, key: BedKey, state: BedState) {
    sqlx::query("INSERT INTO beds (room_number, bed_number, state) VALUES ($1, $2, $3)")
        .bind(key.room_number)
        .bind(key.bed_number)
        .bind(state)
        .execute(pool)
        .await
        .expect("Failed to seed bed");
}

/// Insert a patient named "Test Patient"
pub async fn seed_patient(pool: &PgPool, doc_type: &str, doc_number: &str) -> PatientDoc {
    sqlx::query(
        r#"
        INSERT INTO patients (doc_type, doc_number, first_name, last_name, birth_date)
        VALUES ($1, $2, 'Test', 'Patient', DATE '1980-05-17')
        "#,
    )
    .bind(doc_type)
    .bind(doc_number)
    .execute(pool)
    .await
    .expect("Failed to seed patient");

    PatientDoc::new(doc_type, doc_number)
}

/// Insert a physician whose document number is `MP-<license>`
pub async fn seed_physician(pool: &PgPool, license: License) {
    sqlx::query(
        r#"
        INSERT INTO physicians (license, doc_type, doc_number, first_name, last_name)
        VALUES ($1, 'DNI', 'MP-' || $1::text, 'Test', 'Physician')
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(license)
    .execute(pool)
    .await
    .expect("Failed to seed physician");
}

pub async fn seed_shift(pool: &PgPool, license: License, shift_at: DateTime<Utc>) {
    sqlx::query("INSERT INTO shifts (physician_license, shift_at, specialty, turn) VALUES ($1, $2, 'Clinical', 'Morning')")
        .bind(license)
        .bind(shift_at)
        .execute(pool)
        .await
        .expect("Failed to seed shift");
}
