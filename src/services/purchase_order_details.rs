use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::{self, DbPool},
    entities::{
        inventory_item, purchase_order,
        purchase_order_detail::{self, PurchaseOrderDetailStatus},
    },
    errors::ServiceError,
};

use super::purchase_orders::{insert_line, recompute_po_total, NewPurchaseOrderLine};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewPurchaseOrderDetail {
    pub purchase_order_id: i32,
    pub item_id: i32,
    #[validate(range(min = 1))]
    pub ordered_quantity: i32,
    #[schema(value_type = Option<String>)]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct PurchaseOrderDetailChanges {
    pub item_id: Option<i32>,
    #[validate(range(min = 1))]
    pub ordered_quantity: Option<i32>,
    #[schema(value_type = Option<String>)]
    pub unit_price: Option<Decimal>,
}

async fn modifiable_order<C>(conn: &C, purchase_order_id: i32) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    purchase_order::Entity::find_by_id(purchase_order_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::reference_not_found("Purchase order", purchase_order_id))?
        .ensure_modifiable()
}

async fn load<C>(conn: &C, id: i32) -> Result<purchase_order_detail::Model, ServiceError>
where
    C: ConnectionTrait,
{
    purchase_order_detail::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Purchase order detail", id))
}

/// Lines of supplier orders.
#[derive(Clone)]
pub struct PurchaseOrderDetailService {
    db_pool: Arc<DbPool>,
}

impl PurchaseOrderDetailService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub async fn get(&self, id: i32) -> Result<Option<purchase_order_detail::Model>, ServiceError> {
        Ok(purchase_order_detail::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?)
    }

    async fn all_where(
        &self,
        condition: impl sea_orm::sea_query::IntoCondition,
    ) -> Result<Vec<purchase_order_detail::Model>, ServiceError> {
        Ok(purchase_order_detail::Entity::find()
            .filter(condition)
            .order_by_asc(purchase_order_detail::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn by_order(
        &self,
        purchase_order_id: i32,
    ) -> Result<Vec<purchase_order_detail::Model>, ServiceError> {
        self.all_where(purchase_order_detail::Column::PurchaseOrderId.eq(purchase_order_id))
            .await
    }

    pub async fn by_item(&self, item_id: i32) -> Result<Vec<purchase_order_detail::Model>, ServiceError> {
        self.all_where(purchase_order_detail::Column::ItemId.eq(item_id))
            .await
    }

    pub async fn by_status(
        &self,
        status: PurchaseOrderDetailStatus,
    ) -> Result<Vec<purchase_order_detail::Model>, ServiceError> {
        self.all_where(purchase_order_detail::Column::Status.eq(status))
            .await
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        input: NewPurchaseOrderDetail,
    ) -> Result<purchase_order_detail::Model, ServiceError> {
        input.validate()?;
        let detail = db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                modifiable_order(txn, input.purchase_order_id).await?;
                let line = NewPurchaseOrderLine {
                    item_id: input.item_id,
                    ordered_quantity: input.ordered_quantity,
                    unit_price: input.unit_price,
                };
                let created = insert_line(txn, input.purchase_order_id, &line).await?;
                recompute_po_total(txn, created.purchase_order_id).await?;
                Ok(created)
            })
        })
        .await?;

        info!(
            detail_id = detail.id,
            purchase_order_id = detail.purchase_order_id,
            "purchase order line added"
        );
        Ok(detail)
    }

    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: i32,
        changes: PurchaseOrderDetailChanges,
    ) -> Result<purchase_order_detail::Model, ServiceError> {
        changes.validate()?;
        if matches!(changes.unit_price, Some(p) if p.is_sign_negative()) {
            return Err(ServiceError::ValidationError(
                "unit_price must not be negative".to_string(),
            ));
        }

        db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let current = load(txn, id).await?;
                modifiable_order(txn, current.purchase_order_id).await?;

                let received = current.received_quantity;
                let mut model: purchase_order_detail::ActiveModel = current.into();
                if let Some(item_id) = changes.item_id {
                    inventory_item::Entity::find_by_id(item_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| ServiceError::reference_not_found("Inventory item", item_id))?;
                    model.item_id = Set(item_id);
                }
                if let Some(v) = changes.ordered_quantity {
                    model.ordered_quantity = Set(v);
                    model.status = Set(PurchaseOrderDetailStatus::after_reorder(v, received));
                }
                if let Some(v) = changes.unit_price {
                    model.unit_price = Set(v);
                }
                let updated = model.update(txn).await?;
                recompute_po_total(txn, updated.purchase_order_id).await?;
                Ok(updated)
            })
        })
        .await
    }

    /// Records how many units arrived for a line. Zero leaves the status as is.
    #[instrument(skip(self))]
    pub async fn update_received_quantity(
        &self,
        id: i32,
        received: i32,
    ) -> Result<purchase_order_detail::Model, ServiceError> {
        if received < 0 {
            return Err(ServiceError::ValidationError(
                "received quantity must not be negative".to_string(),
            ));
        }

        db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let current = load(txn, id).await?;
                modifiable_order(txn, current.purchase_order_id).await?;

                let status = current
                    .status
                    .after_receipt(current.ordered_quantity, received);
                let mut model: purchase_order_detail::ActiveModel = current.into();
                model.received_quantity = Set(received);
                model.status = Set(status);
                Ok(model.update(txn).await?)
            })
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let current = load(txn, id).await?;
                modifiable_order(txn, current.purchase_order_id).await?;

                purchase_order_detail::Entity::delete_by_id(id).exec(txn).await?;
                recompute_po_total(txn, current.purchase_order_id).await?;
                Ok(())
            })
        })
        .await
    }
}
