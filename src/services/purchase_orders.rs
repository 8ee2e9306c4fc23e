use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::{self, DbPool},
    entities::{
        inventory_item,
        purchase_order::{self, PurchaseOrderStatus},
        purchase_order_detail::{self, PurchaseOrderDetailStatus},
        stock_movement::MovementType,
        supplier,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

use super::inventory::{apply_adjustment, AdjustmentOutcome, InventoryService, StockAdjustment};

pub const RECEIPT_MOTIVE: &str = "purchase order receipt";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewPurchaseOrderLine {
    pub item_id: i32,
    #[validate(range(min = 1))]
    pub ordered_quantity: i32,
    /// Defaults to the item's purchase price.
    #[schema(value_type = Option<String>, example = "80.00")]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewPurchaseOrder {
    pub supplier_id: i32,
    #[schema(value_type = Option<String>, format = Date)]
    pub expected_delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(default)]
    #[validate]
    pub lines: Vec<NewPurchaseOrderLine>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct PurchaseOrderChanges {
    pub supplier_id: Option<i32>,
    #[schema(value_type = Option<String>, format = Date)]
    pub expected_delivery_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Optional body of a receipt: the supplier invoice backing the delivery.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ReceivePurchaseOrder {
    #[validate(length(min = 1, max = 64))]
    pub invoice_number: Option<String>,
}

/// A received purchase order with the ledger movements it produced.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub order: purchase_order::Model,
    pub movements: Vec<AdjustmentOutcome>,
}

/// Supplier orders and their receipt into stock.
#[derive(Clone)]
pub struct PurchaseOrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    inventory: Arc<InventoryService>,
}

impl PurchaseOrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        inventory: Arc<InventoryService>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            inventory,
        }
    }

    pub async fn list(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<purchase_order::Model>, u64), ServiceError> {
        let query = purchase_order::Entity::find()
            .order_by_desc(purchase_order::Column::OrderDate)
            .order_by_desc(purchase_order::Column::Id);
        super::fetch_page(&self.db_pool, query, page, limit).await
    }

    pub async fn get(&self, id: i32) -> Result<Option<purchase_order::Model>, ServiceError> {
        Ok(purchase_order::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?)
    }

    pub async fn require(&self, id: i32) -> Result<purchase_order::Model, ServiceError> {
        self.get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Purchase order", id))
    }

    pub async fn by_supplier(&self, supplier_id: i32) -> Result<Vec<purchase_order::Model>, ServiceError> {
        Ok(purchase_order::Entity::find()
            .filter(purchase_order::Column::SupplierId.eq(supplier_id))
            .order_by_desc(purchase_order::Column::OrderDate)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn by_requester(&self, user_id: i32) -> Result<Vec<purchase_order::Model>, ServiceError> {
        Ok(purchase_order::Entity::find()
            .filter(purchase_order::Column::RequestedBy.eq(user_id))
            .order_by_desc(purchase_order::Column::OrderDate)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn details(&self, id: i32) -> Result<Vec<purchase_order_detail::Model>, ServiceError> {
        self.require(id).await?;
        Ok(purchase_order_detail::Entity::find()
            .filter(purchase_order_detail::Column::PurchaseOrderId.eq(id))
            .order_by_asc(purchase_order_detail::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, input), fields(supplier_id = input.supplier_id, lines = input.lines.len()))]
    pub async fn create(
        &self,
        input: NewPurchaseOrder,
        requested_by: i32,
    ) -> Result<purchase_order::Model, ServiceError> {
        input.validate()?;

        let order = db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                supplier::Entity::find_by_id(input.supplier_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::reference_not_found("Supplier", input.supplier_id))?;

                let created = purchase_order::ActiveModel {
                    supplier_id: Set(input.supplier_id),
                    requested_by: Set(requested_by),
                    order_date: Set(Utc::now()),
                    expected_delivery_date: Set(input.expected_delivery_date),
                    received_date: Set(None),
                    status: Set(PurchaseOrderStatus::Pendiente),
                    total: Set(Decimal::ZERO),
                    notes: Set(input.notes),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                for line in input.lines {
                    insert_line(txn, created.id, &line).await?;
                }
                let total = recompute_po_total(txn, created.id).await?;

                let mut model: purchase_order::ActiveModel = created.into();
                model.total = Set(total);
                Ok(model.update(txn).await?)
            })
        })
        .await?;

        info!(purchase_order_id = order.id, total = %order.total, "purchase order created");
        Ok(order)
    }

    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: i32,
        changes: PurchaseOrderChanges,
    ) -> Result<purchase_order::Model, ServiceError> {
        changes.validate()?;
        let current = self.require(id).await?;
        current.ensure_modifiable()?;

        let mut model: purchase_order::ActiveModel = current.into();
        if let Some(supplier_id) = changes.supplier_id {
            supplier::Entity::find_by_id(supplier_id)
                .one(&*self.db_pool)
                .await?
                .ok_or_else(|| ServiceError::reference_not_found("Supplier", supplier_id))?;
            model.supplier_id = Set(supplier_id);
        }
        if changes.expected_delivery_date.is_some() {
            model.expected_delivery_date = Set(changes.expected_delivery_date);
        }
        if changes.notes.is_some() {
            model.notes = Set(changes.notes);
        }
        Ok(model.update(&*self.db_pool).await?)
    }

    /// Receives the order into stock.
    ///
    /// Every line with a received quantity becomes an `entrada` movement
    /// attributed to the supplier. Item locks are taken in ascending id order
    /// before the transaction begins.
    #[instrument(skip(self))]
    pub async fn receive(
        &self,
        id: i32,
        user_id: i32,
        invoice_number: Option<String>,
    ) -> Result<Receipt, ServiceError> {
        let current = self.require(id).await?;
        current.ensure_modifiable()?;

        let item_ids: Vec<i32> = purchase_order_detail::Entity::find()
            .filter(purchase_order_detail::Column::PurchaseOrderId.eq(id))
            .all(&*self.db_pool)
            .await?
            .iter()
            .map(|line| line.item_id)
            .collect();

        let guards = self.inventory.locks().acquire_many(&item_ids).await;
        let locked = item_ids.clone();
        let result = db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let order = purchase_order::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Purchase order", id))?;
                order.ensure_modifiable()?;

                let lines = purchase_order_detail::Entity::find()
                    .filter(purchase_order_detail::Column::PurchaseOrderId.eq(id))
                    .order_by_asc(purchase_order_detail::Column::Id)
                    .all(txn)
                    .await?;
                if lines.iter().any(|line| !locked.contains(&line.item_id)) {
                    return Err(ServiceError::Conflict(format!(
                        "purchase order {} changed while being received; retry",
                        id
                    )));
                }

                let total: Decimal = lines.iter().map(|line| line.line_total()).sum();
                let mut movements = Vec::new();
                for line in lines.iter().filter(|line| line.received_quantity > 0) {
                    let outcome = apply_adjustment(
                        txn,
                        &StockAdjustment {
                            item_id: line.item_id,
                            quantity: line.received_quantity,
                            movement_type: MovementType::Entrada,
                            user_id,
                            motive: RECEIPT_MOTIVE.to_string(),
                            order_id: None,
                            supplier_id: Some(order.supplier_id),
                            invoice_number: invoice_number.clone(),
                            notes: Some(format!("purchase order #{}", id)),
                        },
                    )
                    .await?;
                    movements.push(outcome);
                }

                let mut model: purchase_order::ActiveModel = order.into();
                model.status = Set(PurchaseOrderStatus::Recibido);
                model.received_date = Set(Some(Utc::now()));
                model.total = Set(total);
                let order = model.update(txn).await?;
                Ok(Receipt { order, movements })
            })
        })
        .await;
        drop(guards);
        let receipt = result?;

        for outcome in &receipt.movements {
            self.inventory.publish_adjustment(outcome).await;
        }
        self.event_sender
            .publish(Event::PurchaseOrderReceived {
                purchase_order_id: id,
                lines_received: receipt.movements.len(),
            })
            .await;
        info!(
            purchase_order_id = id,
            lines_received = receipt.movements.len(),
            "purchase order received"
        );
        Ok(receipt)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let order = purchase_order::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Purchase order", id))?;
                order.ensure_modifiable()?;

                purchase_order_detail::Entity::delete_many()
                    .filter(purchase_order_detail::Column::PurchaseOrderId.eq(id))
                    .exec(txn)
                    .await?;
                purchase_order::Entity::delete_by_id(id).exec(txn).await?;
                Ok(())
            })
        })
        .await
    }
}

/// Inserts one line, pricing it from the item when no price is given.
pub(crate) async fn insert_line<C>(
    conn: &C,
    purchase_order_id: i32,
    line: &NewPurchaseOrderLine,
) -> Result<purchase_order_detail::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let item = inventory_item::Entity::find_by_id(line.item_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::reference_not_found("Inventory item", line.item_id))?;

    let unit_price = line.unit_price.unwrap_or(item.purchase_price);
    if unit_price.is_sign_negative() {
        return Err(ServiceError::ValidationError(
            "unit_price must not be negative".to_string(),
        ));
    }

    Ok(purchase_order_detail::ActiveModel {
        purchase_order_id: Set(purchase_order_id),
        item_id: Set(item.id),
        ordered_quantity: Set(line.ordered_quantity),
        received_quantity: Set(0),
        unit_price: Set(unit_price),
        status: Set(PurchaseOrderDetailStatus::Pendiente),
        ..Default::default()
    }
    .insert(conn)
    .await?)
}

/// Sets the order total to the sum of ordered quantity times unit price.
pub(crate) async fn recompute_po_total<C>(conn: &C, purchase_order_id: i32) -> Result<Decimal, ServiceError>
where
    C: ConnectionTrait,
{
    let total: Decimal = purchase_order_detail::Entity::find()
        .filter(purchase_order_detail::Column::PurchaseOrderId.eq(purchase_order_id))
        .all(conn)
        .await?
        .iter()
        .map(|line| line.line_total())
        .sum();

    purchase_order::Entity::update_many()
        .col_expr(purchase_order::Column::Total, Expr::value(total))
        .filter(purchase_order::Column::Id.eq(purchase_order_id))
        .exec(conn)
        .await?;
    Ok(total)
}
