use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Select, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::stock_movement::{self, MovementType},
    errors::ServiceError,
};

/// The only movement fields that may change after the fact.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct MovementNoteChanges {
    #[validate(length(max = 64))]
    pub invoice_number: Option<String>,
    pub notes: Option<String>,
}

/// Read access to the stock ledger. Movements are written by
/// [`InventoryService::adjust_stock`](super::inventory::InventoryService::adjust_stock) only.
#[derive(Clone)]
pub struct StockMovementService {
    db_pool: Arc<DbPool>,
}

impl StockMovementService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    fn newest_first() -> Select<stock_movement::Entity> {
        stock_movement::Entity::find()
            .order_by_desc(stock_movement::Column::CreatedAt)
            .order_by_desc(stock_movement::Column::Id)
    }

    async fn all_where(
        &self,
        condition: impl sea_orm::sea_query::IntoCondition,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        Ok(Self::newest_first()
            .filter(condition)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_movement::Model>, u64), ServiceError> {
        super::fetch_page(&self.db_pool, Self::newest_first(), page, limit).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<Option<stock_movement::Model>, ServiceError> {
        Ok(stock_movement::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?)
    }

    pub async fn by_item(&self, item_id: i32) -> Result<Vec<stock_movement::Model>, ServiceError> {
        self.all_where(stock_movement::Column::ItemId.eq(item_id)).await
    }

    pub async fn by_type(
        &self,
        movement_type: MovementType,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        self.all_where(stock_movement::Column::MovementType.eq(movement_type))
            .await
    }

    pub async fn by_order(&self, order_id: i32) -> Result<Vec<stock_movement::Model>, ServiceError> {
        self.all_where(stock_movement::Column::OrderId.eq(order_id)).await
    }

    pub async fn by_supplier(
        &self,
        supplier_id: i32,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        self.all_where(stock_movement::Column::SupplierId.eq(supplier_id))
            .await
    }

    pub async fn by_user(&self, user_id: i32) -> Result<Vec<stock_movement::Model>, ServiceError> {
        self.all_where(stock_movement::Column::UserId.eq(user_id)).await
    }

    #[instrument(skip(self))]
    pub async fn by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        if from > to {
            return Err(ServiceError::ValidationError(
                "'from' must not be after 'to'".to_string(),
            ));
        }
        self.all_where(stock_movement::Column::CreatedAt.between(from, to))
            .await
    }

    #[instrument(skip(self, changes))]
    pub async fn update_notes(
        &self,
        id: i32,
        changes: MovementNoteChanges,
    ) -> Result<stock_movement::Model, ServiceError> {
        changes.validate()?;
        let current = self
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Stock movement", id))?;

        let mut movement: stock_movement::ActiveModel = current.into();
        if changes.invoice_number.is_some() {
            movement.invoice_number = Set(changes.invoice_number);
        }
        if changes.notes.is_some() {
            movement.notes = Set(changes.notes);
        }
        Ok(movement.update(&*self.db_pool).await?)
    }
}
