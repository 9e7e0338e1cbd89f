//! API request and response models.
//!
//! These are distinct from the database models in [`crate::db::models`] so the
//! wire format can evolve independently of storage. All of them derive
//! `utoipa::ToSchema` for the OpenAPI document.

pub mod admissions;
pub mod beds;
pub mod vacations;
