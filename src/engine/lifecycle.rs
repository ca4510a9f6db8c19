//! Order lifecycle: `Created(taken = false)` → `Taken(taken = true)`.
//!
//! Every operation validates its input before touching the resolver or the
//! store, so a rejected request has no side effects.

use std::time::Instant;

use tracing::{info, warn};

use crate::error::AppError;
use crate::models::location::{Location, Route};
use crate::models::order::{OrderView, CLAIM_KEYWORD};
use crate::state::AppState;
use crate::store::ClaimOutcome;

pub const MAX_PAGE_LIMIT: i64 = 1000;

pub async fn place_order(state: &AppState, location: Location) -> Result<OrderView, AppError> {
    let route = Route::try_from(location)?;

    let start = Instant::now();
    let resolved = state
        .resolver
        .distance_meters(&route.origin, &route.destination)
        .await;
    let outcome = if resolved.is_ok() { "success" } else { "error" };
    state
        .metrics
        .distance_lookup_seconds
        .with_label_values(&[outcome])
        .observe(start.elapsed().as_secs_f64());

    let distance = resolved?;
    if !distance.is_finite() || distance <= 0.0 {
        return Err(AppError::DistanceUnavailable(format!(
            "resolver returned {distance}m for {route:?}"
        )));
    }

    let order = state.store.create(distance).await?;
    state.metrics.orders_created_total.inc();
    info!(order_id = order.id, distance, "order placed");

    Ok(OrderView::from(&order))
}

pub async fn claim_order(state: &AppState, id: i64, requested_status: &str) -> Result<(), AppError> {
    if id <= 0 {
        return Err(AppError::BadRequest(format!("invalid order id {id}")));
    }
    if requested_status != CLAIM_KEYWORD {
        return Err(AppError::BadRequest(format!(
            "unsupported status {requested_status:?}"
        )));
    }

    let outcome = state.store.claim(id).await?;
    let label = match outcome {
        ClaimOutcome::Claimed => "claimed",
        ClaimOutcome::AlreadyTaken => "already_taken",
        ClaimOutcome::NotFound => "not_found",
    };
    state
        .metrics
        .order_claims_total
        .with_label_values(&[label])
        .inc();

    match outcome {
        ClaimOutcome::Claimed => {
            info!(order_id = id, "order taken");
            Ok(())
        }
        ClaimOutcome::AlreadyTaken => {
            warn!(order_id = id, "claim lost: order already taken");
            Err(AppError::AlreadyTaken(id))
        }
        ClaimOutcome::NotFound => Err(AppError::NotFound(format!("order {id} not found"))),
    }
}

pub async fn list_orders(state: &AppState, page: i64, limit: i64) -> Result<Vec<OrderView>, AppError> {
    if page < 0 {
        return Err(AppError::BadRequest(format!("page {page} must be >= 0")));
    }
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(AppError::BadRequest(format!(
            "limit {limit} outside 1..={MAX_PAGE_LIMIT}"
        )));
    }
    let offset = page
        .checked_mul(limit)
        .ok_or_else(|| AppError::BadRequest(format!("page {page} too large")))?;

    let orders = state.store.list(limit, offset).await?;

    let mut views: Vec<OrderView> = orders.iter().map(OrderView::from).collect();
    views.sort_by_key(|view| view.id);
    Ok(views)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::geo::{DistanceResolver, ResolveError};
    use crate::models::location::GeoPoint;
    use crate::models::order::OrderStatus;
    use crate::store::{MemoryOrderStore, OrderStore};

    struct Fixed(Result<f64, &'static str>);

    #[async_trait]
    impl DistanceResolver for Fixed {
        async fn distance_meters(&self, _: &GeoPoint, _: &GeoPoint) -> Result<f64, ResolveError> {
            self.0.map_err(|msg| ResolveError::Upstream(msg.to_string()))
        }
    }

    fn state_with(resolver: Fixed) -> (AppState, Arc<MemoryOrderStore>) {
        let store = Arc::new(MemoryOrderStore::new());
        (AppState::new(store.clone(), Arc::new(resolver)), store)
    }

    fn hong_kong() -> Location {
        Location {
            origin: vec!["22.33".into(), "114.14".into()],
            destination: vec!["22.32".into(), "114.14".into()],
        }
    }

    #[tokio::test]
    async fn place_order_persists_unassigned_order() {
        let (state, store) = state_with(Fixed(Ok(500.0)));

        let view = place_order(&state, hong_kong()).await.unwrap();

        assert_eq!(view.id, 1);
        assert_eq!(view.distance, 500.0);
        assert_eq!(view.status, OrderStatus::Unassigned);
        assert_eq!(store.len(), 1);
        assert_eq!(state.metrics.orders_created_total.get(), 1);
    }

    #[tokio::test]
    async fn zero_distance_creates_nothing() {
        let (state, store) = state_with(Fixed(Ok(0.0)));

        let err = place_order(&state, hong_kong()).await.unwrap_err();

        assert!(matches!(err, AppError::DistanceUnavailable(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn resolver_failure_creates_nothing() {
        let (state, store) = state_with(Fixed(Err("timeout")));

        let err = place_order(&state, hong_kong()).await.unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn malformed_location_is_rejected_before_resolving() {
        let (state, store) = state_with(Fixed(Ok(500.0)));
        let location = Location {
            origin: vec!["22.33".into()],
            destination: vec!["22.32".into(), "114.14".into()],
        };

        let err = place_order(&state, location).await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(store.is_empty());
        assert_eq!(
            state
                .metrics
                .distance_lookup_seconds
                .with_label_values(&["success"])
                .get_sample_count(),
            0
        );
    }

    #[tokio::test]
    async fn claim_maps_store_outcomes() {
        let (state, store) = state_with(Fixed(Ok(500.0)));
        let order = store.create(500.0).await.unwrap();

        assert!(claim_order(&state, order.id, "taken").await.is_ok());
        assert!(matches!(
            claim_order(&state, order.id, "taken").await,
            Err(AppError::AlreadyTaken(id)) if id == order.id
        ));
        assert!(matches!(
            claim_order(&state, 999, "taken").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn claim_rejects_bad_input_without_touching_store() {
        let (state, store) = state_with(Fixed(Ok(500.0)));
        let order = store.create(500.0).await.unwrap();

        for status in ["TAKEN", "SUCCESS", ""] {
            assert!(matches!(
                claim_order(&state, order.id, status).await,
                Err(AppError::BadRequest(_))
            ));
        }
        assert!(matches!(
            claim_order(&state, 0, "taken").await,
            Err(AppError::BadRequest(_))
        ));

        assert_eq!(store.claim(order.id).await.unwrap(), ClaimOutcome::Claimed);
    }

    #[tokio::test]
    async fn list_enforces_page_and_limit_bounds() {
        let (state, _store) = state_with(Fixed(Ok(500.0)));

        for (page, limit) in [(0, 0), (0, 1001), (-1, 10)] {
            assert!(matches!(
                list_orders(&state, page, limit).await,
                Err(AppError::BadRequest(_))
            ));
        }
        for (page, limit) in [(0, 1), (0, 1000), (3, 10)] {
            assert!(list_orders(&state, page, limit).await.is_ok());
        }
        assert!(matches!(
            list_orders(&state, i64::MAX, 1000).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn list_projects_claimed_orders() {
        let (state, store) = state_with(Fixed(Ok(500.0)));
        for _ in 0..3 {
            store.create(500.0).await.unwrap();
        }
        store.claim(2).await.unwrap();

        let views = list_orders(&state, 0, 10).await.unwrap();
        let statuses: Vec<_> = views.iter().map(|v| (v.id, v.status)).collect();

        assert_eq!(
            statuses,
            vec![
                (1, OrderStatus::Unassigned),
                (2, OrderStatus::Taken),
                (3, OrderStatus::Unassigned)
            ]
        );
    }
}
