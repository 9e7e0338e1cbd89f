//! HTTP API: axum route handlers and their request/response models.
//!
//! - **Admissions** (`/api/v1/admissions/*`): admit, transfer, discharge, history
//! - **Beds** (`/api/v1/beds`, `/api/v1/rooms/{room}/beds/{bed}/*`): bed administration
//! - **Physicians** (`/api/v1/physicians/{license}/*`): vacations and duty shifts
//!
//! Every error is returned as `{ "kind", "message", "retryable" }`, see
//! [`crate::errors::ErrorBody`]. OpenAPI documentation is served at `/docs`.

pub mod handlers;
pub mod models;
