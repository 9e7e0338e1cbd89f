//! Axum route handlers, one module per resource.
//!
//! Handlers only translate between HTTP and the ward services: they parse
//! paths, queries and bodies, call exactly one service operation (vacation
//! writes go through [`crate::ward::retry_serializable`]) and map the result
//! into a response model. Errors convert into responses through
//! [`crate::errors::Error`]'s `IntoResponse` implementation.

pub mod admissions;
pub mod beds;
pub mod vacations;
