use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::{ClaimOutcome, OrderStore, StoreError};
use crate::models::order::DeliveryOrder;

/// In-process store. Claims are serialized per id by the map's shard lock.
/// `last_id` is held across id allocation plus insert, and across listing,
/// so a page never shows an id before all smaller ids exist.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: DashMap<i64, DeliveryOrder>,
    last_id: Mutex<i64>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    fn lock_ids(&self) -> Result<MutexGuard<'_, i64>, StoreError> {
        self.last_id
            .lock()
            .map_err(|err| StoreError::Backend(format!("id lock poisoned: {err}")))
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create(&self, distance: f64) -> Result<DeliveryOrder, StoreError> {
        let mut last_id = self.lock_ids()?;
        let id = *last_id + 1;
        let order = DeliveryOrder {
            id,
            distance,
            taken: false,
            created_at: Utc::now(),
        };

        self.orders.insert(id, order.clone());
        *last_id = id;
        Ok(order)
    }

    async fn claim(&self, id: i64) -> Result<ClaimOutcome, StoreError> {
        let Some(mut order) = self.orders.get_mut(&id) else {
            return Ok(ClaimOutcome::NotFound);
        };

        if order.taken {
            return Ok(ClaimOutcome::AlreadyTaken);
        }

        order.taken = true;
        Ok(ClaimOutcome::Claimed)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<DeliveryOrder>, StoreError> {
        let limit = usize::try_from(limit)
            .map_err(|_| StoreError::Backend(format!("invalid limit {limit}")))?;
        let offset = usize::try_from(offset)
            .map_err(|_| StoreError::Backend(format!("invalid offset {offset}")))?;

        let mut orders: Vec<DeliveryOrder> = {
            let _ids = self.lock_ids()?;
            self.orders
                .iter()
                .map(|entry| entry.value().clone())
                .collect()
        };
        orders.sort_by_key(|order| order.id);

        Ok(orders.into_iter().skip(offset).take(limit).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
