//! PostgreSQL persistence for the ward.
//!
//! Tables and their owners:
//!
//! | table          | written by                          |
//! |----------------|-------------------------------------|
//! | `admissions`   | [`crate::ward::AdmissionOrchestrator`] |
//! | `bed_assignments` | [`crate::ward::AdmissionOrchestrator`] (insert only) |
//! | `beds`         | orchestrator (occupancy) and [`crate::ward::BedRegistry`] (lifecycle) |
//! | `vacations`    | [`crate::ward::VacationScheduler`]  |
//! | `patients`, `physicians`, `rooms`, `shifts` | other subsystems; read and locked here |
//!
//! [`handlers`] holds one repository per table. A repository borrows a
//! `&mut PgConnection`, which is normally the open transaction of a ward
//! operation, so it never commits on its own. [`models`] holds the row types
//! and [`errors`] classifies sqlx failures by SQLSTATE.
//!
//! The schema lives in `migrations/` and is applied through [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
