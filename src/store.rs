use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use thiserror::Error;
use tracing::info;

use crate::{
    db,
    models::{CreateOrderMappingEntity, OrderMappingEntity},
    schema::orders,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Persistent SellApp → Followiz order mappings.
///
/// Every operation opens its own connection and drops it before returning, so no
/// connection outlives the request that needed it.
#[derive(Clone, Debug)]
pub struct OrderStore {
    database_url: String,
}

impl OrderStore {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Creates the `orders` table if it does not exist yet. Safe to call on every start.
    pub async fn init(&self) -> Result<usize, StoreError> {
        let applied = db::run_migrations_blocking(db::MIGRATIONS, &self.database_url).await?;
        info!("Applied {} new migrations to {}", applied, self.database_url);
        Ok(applied)
    }

    /// Appends a mapping. Duplicate SellApp ids are accepted.
    pub async fn insert(
        &self,
        sellapp_order_id: &str,
        followiz_order_id: &str,
    ) -> Result<(), StoreError> {
        let conn = &mut db::connect(&self.database_url).await?;

        diesel::insert_into(orders::table)
            .values(CreateOrderMappingEntity {
                sellapp_order_id: sellapp_order_id.to_owned(),
                followiz_order_id: followiz_order_id.to_owned(),
            })
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Returns the oldest mapping recorded for a SellApp order.
    pub async fn find_by_checkout_id(
        &self,
        sellapp_order_id: &str,
    ) -> Result<Option<OrderMappingEntity>, StoreError> {
        let conn = &mut db::connect(&self.database_url).await?;

        let mapping = orders::table
            .filter(orders::sellapp_order_id.eq(sellapp_order_id.to_owned()))
            .order_by(orders::id.asc())
            .select(OrderMappingEntity::as_select())
            .first(conn)
            .await
            .optional()?;

        Ok(mapping)
    }

    /// Matches `id` against SellApp ids first, then against Followiz ids.
    pub async fn find_by_either_id(
        &self,
        id: &str,
    ) -> Result<Option<OrderMappingEntity>, StoreError> {
        if let Some(mapping) = self.find_by_checkout_id(id).await? {
            return Ok(Some(mapping));
        }

        let conn = &mut db::connect(&self.database_url).await?;

        let mapping = orders::table
            .filter(orders::followiz_order_id.eq(id.to_owned()))
            .order_by(orders::id.asc())
            .select(OrderMappingEntity::as_select())
            .first(conn)
            .await
            .optional()?;

        Ok(mapping)
    }

    /// Number of stored mappings.
    pub async fn count(&self) -> Result<i64, StoreError> {
        let conn = &mut db::connect(&self.database_url).await?;
        Ok(orders::table.count().get_result(conn).await?)
    }
}
