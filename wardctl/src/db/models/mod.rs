//! Database record models matching table schemas.
//!
//! Each struct here corresponds to a row of one table (or a fixed projection of
//! it) and derives `sqlx::FromRow`. They are distinct from the API models in
//! [`crate::api::models`] so storage and wire formats can evolve independently.
//!
//! - [`directory`]: patients, physicians and rooms (read-only reference data)
//! - [`beds`]: bed registry rows and the bed state machine
//! - [`admissions`]: admission ledger rows
//! - [`assignments`]: append-only bed assignment history
//! - [`vacations`]: physician vacation periods
//! - [`shifts`]: duty roster rows (read-only)

pub mod admissions;
pub mod assignments;
pub mod beds;
pub mod directory;
pub mod shifts;
pub mod vacations;
