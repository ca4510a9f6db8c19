use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tracing::{info, warn};

use super::{ClaimOutcome, OrderStore, StoreError};
use crate::models::order::DeliveryOrder;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct PgSettings {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub statement_timeout: Duration,
    pub connect_attempts: u32,
    pub retry_delay: Duration,
}

#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects, retrying with doubling delay, then applies migrations.
    /// Runs once at startup.
    pub async fn connect(settings: &PgSettings) -> Result<Self, StoreError> {
        let options = PgConnectOptions::from_str(&settings.url)?.options([(
            "statement_timeout",
            settings.statement_timeout.as_millis().to_string(),
        )]);

        let attempts = settings.connect_attempts.max(1);
        let mut delay = settings.retry_delay;
        let mut attempt = 1;

        let pool = loop {
            let result = PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .acquire_timeout(settings.acquire_timeout)
                .connect_with(options.clone())
                .await;

            match result {
                Ok(pool) => break pool,
                Err(err) if attempt < attempts => {
                    warn!(
                        attempt,
                        attempts,
                        retry_in = ?delay,
                        error = %err,
                        "database connection failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_RETRY_DELAY);
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        };

        info!(attempt, "connected to database");

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("database migrations applied");
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ClaimRow {
    found: bool,
    claimed: bool,
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create(&self, distance: f64) -> Result<DeliveryOrder, StoreError> {
        let order: DeliveryOrder = sqlx::query_as(
            r#"
            INSERT INTO delivery_order (distance)
            VALUES ($1)
            RETURNING id, distance, is_taken, created_at
            "#,
        )
        .bind(distance)
        .fetch_one(&self.pool)
        .await?;

        Ok(order)
    }

    async fn claim(&self, id: i64) -> Result<ClaimOutcome, StoreError> {
        // One statement: the guarded UPDATE is the compare-and-set. A losing
        // concurrent claim blocks on the row lock, re-checks `is_taken` and
        // updates nothing.
        let row: ClaimRow = sqlx::query_as(
            r#"
            WITH target AS (
                SELECT id FROM delivery_order WHERE id = $1
            ), claimed AS (
                UPDATE delivery_order
                SET is_taken = TRUE
                WHERE id = $1 AND is_taken = FALSE
                RETURNING id
            )
            SELECT
                EXISTS (SELECT 1 FROM target) AS found,
                EXISTS (SELECT 1 FROM claimed) AS claimed
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(match (row.found, row.claimed) {
            (_, true) => ClaimOutcome::Claimed,
            (true, false) => ClaimOutcome::AlreadyTaken,
            (false, false) => ClaimOutcome::NotFound,
        })
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<DeliveryOrder>, StoreError> {
        let orders: Vec<DeliveryOrder> = sqlx::query_as(
            r#"
            SELECT id, distance, is_taken, created_at
            FROM delivery_order
            ORDER BY id ASC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
