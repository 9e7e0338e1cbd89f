//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection` borrowed from a transaction (or a pooled
//! connection for read-only work) and exposes strongly typed queries for one table.
//! Repositories never open, commit or roll back transactions themselves; the ward
//! services in [`crate::ward`] own transaction boundaries so that bed state changes and
//! assignment inserts always share the transaction of the operation that triggered them.
//!
//! # Available Repositories
//!
//! - [`Admissions`]: admission ledger, including `FOR UPDATE` row locks
//! - [`Assignments`]: append-only bed assignment history
//! - [`Beds`]: bed registry (implements [`Repository`])
//! - [`Vacations`]: physician vacation periods
//! - [`Shifts`]: duty roster reads and the table lock used by vacation scheduling
//! - [`Patients`], [`Physicians`], [`Rooms`]: reference data lookups
//!
//! # Common Pattern
//!
//! ```ignore
//! use wardctl::db::handlers::{Beds, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut beds = Beds::new(&mut tx);
//!     let free = beds.lock_first_available().await?;
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod admissions;
pub mod assignments;
pub mod beds;
pub mod directory;
pub mod repository;
pub mod shifts;
pub mod vacations;

pub use admissions::Admissions;
pub use assignments::Assignments;
pub use beds::Beds;
pub use directory::{Patients, Physicians, Rooms};
pub use repository::Repository;
pub use shifts::Shifts;
pub use vacations::Vacations;
