pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::order::DeliveryOrder;

pub use memory::MemoryOrderStore;
pub use postgres::PgOrderStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0}")]
    Backend(String),
}

/// Result of a single compare-and-set on an order's `taken` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed,
    AlreadyTaken,
    NotFound,
}

/// Durable order records.
///
/// `claim` must be atomic across every caller sharing the backend: of any
/// number of concurrent claims on one id, exactly one sees `Claimed`.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, distance: f64) -> Result<DeliveryOrder, StoreError>;

    async fn claim(&self, id: i64) -> Result<ClaimOutcome, StoreError>;

    /// Up to `limit` orders from `offset`, ascending by id.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<DeliveryOrder>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
