//! Ward services: the transactional core.
//!
//! Each service is constructed with a [`PgPool`](sqlx::PgPool) and opens exactly one
//! transaction per operation. All consistency guarantees come from PostgreSQL
//! isolation and row/table locks; nothing here holds an in-process lock.
//!
//! - [`AdmissionOrchestrator`]: creates, transfers and closes admissions together
//!   with bed state and assignment history (READ COMMITTED + `FOR UPDATE`)
//! - [`BedRegistry`]: administrative bed lifecycle
//! - [`VacationScheduler`]: vacation periods under SERIALIZABLE isolation with a
//!   table lock on the duty roster
//!
//! Every operation ends in [`finish`]: commit on success, explicit rollback before
//! the error is handed back otherwise. A connection is never held across operations.

pub mod admissions;
pub mod beds;
pub mod validation;
pub mod vacations;

pub use admissions::{AdmissionDetails, AdmissionOrchestrator, CreateAdmission};
pub use beds::{BedDetails, BedRegistry};
pub use vacations::{VacationScheduler, retry_serializable};

use crate::errors::Result;
use sqlx::{Postgres, Transaction};

/// Commit the transaction if the operation succeeded, roll it back otherwise.
pub(crate) async fn finish<T>(tx: Transaction<'static, Postgres>, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                // Dropping the connection aborts the transaction server-side anyway
                tracing::warn!("Rollback failed after {}: {}", err, rollback_err);
            }
            Err(err)
        }
    }
}
