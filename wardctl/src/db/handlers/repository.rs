//! CRUD contract for tables with a natural key.

use crate::db::errors::Result;

/// Keyed CRUD over one table, borrowed from the caller's connection.
///
/// Implementors that also need row locks or state flips (see [`Beds`](super::Beds))
/// expose those as inherent methods; this trait only covers plain record access.
#[async_trait::async_trait]
pub trait Repository {
    type CreateRequest;
    type UpdateRequest;
    type Response;
    /// Natural key, e.g. [`BedKey`](crate::types::BedKey)
    type Id: Send + Sync;
    type Filter: Send + Sync;

    /// Insert a row. A duplicate key surfaces as [`DbError::UniqueViolation`](crate::db::errors::DbError::UniqueViolation).
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// Rows matching `filter`, in key order
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Returns whether a row was removed
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;

    /// Fails with [`DbError::NotFound`](crate::db::errors::DbError::NotFound) when no row has `id`
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;
}
