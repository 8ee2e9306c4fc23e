use chrono::Utc;
use dashmap::DashMap;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    Order, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::{self, DbPool},
    entities::{
        inventory_item::{self, DEFAULT_STOCK_MAXIMUM, DEFAULT_STOCK_MINIMUM},
        service_order, stock_movement, supplier, user,
        stock_movement::MovementType,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

/// One requested change to an item's stock, recorded as a ledger movement.
#[derive(Debug, Clone, Validate)]
pub struct StockAdjustment {
    pub item_id: i32,
    #[validate(range(min = 1, message = "quantity must be positive"))]
    pub quantity: i32,
    pub movement_type: MovementType,
    pub user_id: i32,
    #[validate(length(min = 1, max = 255))]
    pub motive: String,
    pub order_id: Option<i32>,
    pub supplier_id: Option<i32>,
    #[validate(length(max = 64))]
    pub invoice_number: Option<String>,
    pub notes: Option<String>,
}

/// The stored movement and the item as it stands after the adjustment.
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentOutcome {
    pub movement: stock_movement::Model,
    pub item: inventory_item::Model,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewInventoryItem {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    /// Opening stock; later changes go through the ledger.
    #[validate(range(min = 0))]
    #[serde(default)]
    pub stock_quantity: i32,
    #[validate(range(min = 0))]
    pub stock_minimum: Option<i32>,
    #[validate(range(min = 0))]
    pub stock_maximum: Option<i32>,
    pub unit_of_measure: Option<String>,
    pub location: Option<String>,
    #[schema(value_type = String, example = "80.00")]
    pub purchase_price: Decimal,
    #[schema(value_type = String, example = "120.00")]
    pub sale_price: Decimal,
}

/// Item fields editable outside the ledger; stock only moves through `adjust_stock`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct InventoryItemChanges {
    #[validate(length(min = 1, max = 50))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    #[validate(range(min = 0))]
    pub stock_minimum: Option<i32>,
    #[validate(range(min = 0))]
    pub stock_maximum: Option<i32>,
    pub unit_of_measure: Option<String>,
    pub location: Option<String>,
    #[schema(value_type = Option<String>)]
    pub purchase_price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub sale_price: Option<Decimal>,
}

/// Per-item async locks serializing ledger writes inside this process.
///
/// Entries live only while someone holds or waits on them.
#[derive(Clone, Default)]
pub struct ItemLocks {
    inner: Arc<DashMap<i32, Arc<Mutex<()>>>>,
}

/// Held lock on one item; releasing it prunes the registry entry when idle.
pub struct ItemLockGuard {
    guard: Option<OwnedMutexGuard<()>>,
    item_id: i32,
    registry: Arc<DashMap<i32, Arc<Mutex<()>>>>,
}

impl Drop for ItemLockGuard {
    fn drop(&mut self) {
        self.guard.take();
        // the map's own Arc is the last one when no guard or waiter remains
        self.registry
            .remove_if(&self.item_id, |_, handle| Arc::strong_count(handle) == 1);
    }
}

impl ItemLocks {
    fn handle(&self, item_id: i32) -> Arc<Mutex<()>> {
        self.inner
            .entry(item_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn acquire(&self, item_id: i32) -> ItemLockGuard {
        let guard = self.handle(item_id).lock_owned().await;
        ItemLockGuard {
            guard: Some(guard),
            item_id,
            registry: self.inner.clone(),
        }
    }

    /// Locks every id once, in ascending order.
    pub async fn acquire_many(&self, item_ids: &[i32]) -> Vec<ItemLockGuard> {
        let mut ids = item_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.acquire(id).await);
        }
        guards
    }

    /// Number of items currently tracked by the registry.
    pub fn tracked(&self) -> usize {
        self.inner.len()
    }
}

/// Inventory items and the stock ledger.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    locks: ItemLocks,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
            locks: ItemLocks::default(),
        }
    }

    pub fn locks(&self) -> &ItemLocks {
        &self.locks
    }

    /// Applies one stock movement atomically.
    ///
    /// The item lock is held for the whole transaction and the decrement is
    /// conditional on `stock_quantity >= quantity`, so stock never goes negative
    /// even with writers outside this process.
    #[instrument(skip(self), fields(item_id = adjustment.item_id, movement_type = %adjustment.movement_type))]
    pub async fn adjust_stock(
        &self,
        adjustment: StockAdjustment,
    ) -> Result<AdjustmentOutcome, ServiceError> {
        adjustment.validate()?;

        let guard = self.locks.acquire(adjustment.item_id).await;
        let outcome = db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move { apply_adjustment(txn, &adjustment).await })
        })
        .await;
        drop(guard);
        let outcome = outcome?;

        self.publish_adjustment(&outcome).await;
        Ok(outcome)
    }

    pub(crate) async fn publish_adjustment(&self, outcome: &AdjustmentOutcome) {
        self.event_sender
            .publish(Event::StockAdjusted {
                item_id: outcome.item.id,
                movement_id: outcome.movement.id,
                movement_type: outcome.movement.movement_type,
                quantity: outcome.movement.quantity,
                new_stock: outcome.item.stock_quantity,
            })
            .await;

        if outcome.item.is_low_stock() {
            self.event_sender
                .publish(Event::LowStock {
                    item_id: outcome.item.id,
                    code: outcome.item.code.clone(),
                    stock: outcome.item.stock_quantity,
                    minimum: outcome.item.stock_minimum,
                })
                .await;
        }
    }

    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<inventory_item::Model>, u64), ServiceError> {
        let query = inventory_item::Entity::find().order_by_asc(inventory_item::Column::Name);
        super::fetch_page(&self.db_pool, query, page, limit).await
    }

    #[instrument(skip(self))]
    pub async fn get_item(&self, id: i32) -> Result<Option<inventory_item::Model>, ServiceError> {
        Ok(inventory_item::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?)
    }

    pub async fn require_item(&self, id: i32) -> Result<inventory_item::Model, ServiceError> {
        self.get_item(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Inventory item", id))
    }

    #[instrument(skip(self))]
    pub async fn get_by_code(&self, code: &str) -> Result<Option<inventory_item::Model>, ServiceError> {
        Ok(inventory_item::Entity::find()
            .filter(inventory_item::Column::Code.eq(code))
            .one(&*self.db_pool)
            .await?)
    }

    /// Substring match on name, code, description, brand and model.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<inventory_item::Model>, ServiceError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ServiceError::ValidationError(
                "search term must not be empty".to_string(),
            ));
        }
        Ok(inventory_item::Entity::find()
            .filter(
                Condition::any()
                    .add(inventory_item::Column::Name.contains(term))
                    .add(inventory_item::Column::Code.contains(term))
                    .add(inventory_item::Column::Description.contains(term))
                    .add(inventory_item::Column::Brand.contains(term))
                    .add(inventory_item::Column::Model.contains(term)),
            )
            .order_by_asc(inventory_item::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn list_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<inventory_item::Model>, ServiceError> {
        Ok(inventory_item::Entity::find()
            .filter(inventory_item::Column::Category.eq(category))
            .order_by_asc(inventory_item::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    /// Items at or below their minimum, most critical first.
    #[instrument(skip(self))]
    pub async fn low_stock(&self) -> Result<Vec<inventory_item::Model>, ServiceError> {
        Ok(inventory_item::Entity::find()
            .filter(
                Expr::col(inventory_item::Column::StockQuantity)
                    .lte(Expr::col(inventory_item::Column::StockMinimum)),
            )
            .order_by(
                Expr::col(inventory_item::Column::StockQuantity)
                    .sub(Expr::col(inventory_item::Column::StockMinimum)),
                Order::Asc,
            )
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn count_low_stock(&self) -> Result<u64, ServiceError> {
        Ok(inventory_item::Entity::find()
            .filter(
                Expr::col(inventory_item::Column::StockQuantity)
                    .lte(Expr::col(inventory_item::Column::StockMinimum)),
            )
            .count(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_item(
        &self,
        input: NewInventoryItem,
    ) -> Result<inventory_item::Model, ServiceError> {
        input.validate()?;
        if self.get_by_code(&input.code).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "inventory item code '{}' already exists",
                input.code
            )));
        }

        let item = inventory_item::ActiveModel {
            code: Set(input.code),
            name: Set(input.name),
            description: Set(input.description),
            category: Set(input.category),
            subcategory: Set(input.subcategory),
            brand: Set(input.brand),
            model: Set(input.model),
            stock_quantity: Set(input.stock_quantity),
            stock_minimum: Set(input.stock_minimum.unwrap_or(DEFAULT_STOCK_MINIMUM)),
            stock_maximum: Set(input.stock_maximum.unwrap_or(DEFAULT_STOCK_MAXIMUM)),
            unit_of_measure: Set(input.unit_of_measure),
            location: Set(input.location),
            purchase_price: Set(input.purchase_price),
            sale_price: Set(input.sale_price),
            last_updated: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(item_id = item.id, "inventory item created");
        Ok(item)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_item(
        &self,
        id: i32,
        changes: InventoryItemChanges,
    ) -> Result<inventory_item::Model, ServiceError> {
        changes.validate()?;
        let current = self.require_item(id).await?;

        if let Some(code) = &changes.code {
            if code != &current.code && self.get_by_code(code).await?.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "inventory item code '{}' already exists",
                    code
                )));
            }
        }

        let mut item: inventory_item::ActiveModel = current.into();
        if let Some(v) = changes.code {
            item.code = Set(v);
        }
        if let Some(v) = changes.name {
            item.name = Set(v);
        }
        if changes.description.is_some() {
            item.description = Set(changes.description);
        }
        if changes.category.is_some() {
            item.category = Set(changes.category);
        }
        if changes.subcategory.is_some() {
            item.subcategory = Set(changes.subcategory);
        }
        if changes.brand.is_some() {
            item.brand = Set(changes.brand);
        }
        if changes.model.is_some() {
            item.model = Set(changes.model);
        }
        if let Some(v) = changes.stock_minimum {
            item.stock_minimum = Set(v);
        }
        if let Some(v) = changes.stock_maximum {
            item.stock_maximum = Set(v);
        }
        if changes.unit_of_measure.is_some() {
            item.unit_of_measure = Set(changes.unit_of_measure);
        }
        if changes.location.is_some() {
            item.location = Set(changes.location);
        }
        if let Some(v) = changes.purchase_price {
            item.purchase_price = Set(v);
        }
        if let Some(v) = changes.sale_price {
            item.sale_price = Set(v);
        }
        item.last_updated = Set(Utc::now());

        Ok(item.update(&*self.db_pool).await?)
    }

    /// Deletes an item that has never moved. Items with ledger history are kept.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: i32) -> Result<(), ServiceError> {
        let item = self.require_item(id).await?;

        let movements = stock_movement::Entity::find()
            .filter(stock_movement::Column::ItemId.eq(id))
            .count(&*self.db_pool)
            .await?;
        if movements > 0 {
            return Err(ServiceError::HasMovements(format!(
                "inventory item {} has {} recorded movements",
                item.code, movements
            )));
        }

        inventory_item::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        info!(item_id = id, "inventory item deleted");
        Ok(())
    }
}

/// Applies one adjustment on an open connection or transaction.
///
/// Callers must already hold the item's lock.
pub(crate) async fn apply_adjustment<C>(
    conn: &C,
    adjustment: &StockAdjustment,
) -> Result<AdjustmentOutcome, ServiceError>
where
    C: ConnectionTrait,
{
    let quantity = adjustment.quantity;
    if quantity <= 0 {
        return Err(ServiceError::ValidationError(
            "quantity must be positive".to_string(),
        ));
    }

    let item = inventory_item::Entity::find_by_id(adjustment.item_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::reference_not_found("Inventory item", adjustment.item_id))?;

    if user::Entity::find_by_id(adjustment.user_id)
        .one(conn)
        .await?
        .is_none()
    {
        return Err(ServiceError::reference_not_found("User", adjustment.user_id));
    }
    if let Some(order_id) = adjustment.order_id {
        if service_order::Entity::find_by_id(order_id)
            .one(conn)
            .await?
            .is_none()
        {
            return Err(ServiceError::reference_not_found("Service order", order_id));
        }
    }
    if let Some(supplier_id) = adjustment.supplier_id {
        if supplier::Entity::find_by_id(supplier_id)
            .one(conn)
            .await?
            .is_none()
        {
            return Err(ServiceError::reference_not_found("Supplier", supplier_id));
        }
    }

    let mut update = inventory_item::Entity::update_many()
        .col_expr(
            inventory_item::Column::StockQuantity,
            Expr::col(inventory_item::Column::StockQuantity)
                .add(adjustment.movement_type.signed(quantity)),
        )
        .col_expr(inventory_item::Column::LastUpdated, Expr::value(Utc::now()))
        .filter(inventory_item::Column::Id.eq(item.id));
    if adjustment.movement_type == MovementType::Salida {
        update = update.filter(inventory_item::Column::StockQuantity.gte(quantity));
    }

    let result = update.exec(conn).await?;
    if result.rows_affected == 0 {
        counter!("taller_inventory.insufficient_stock", 1);
        warn!(
            item_id = item.id,
            available = item.stock_quantity,
            requested = quantity,
            "salida rejected"
        );
        return Err(ServiceError::InsufficientStock(format!(
            "item {} has {} units, {} requested",
            item.code, item.stock_quantity, quantity
        )));
    }

    let movement = stock_movement::ActiveModel {
        item_id: Set(item.id),
        movement_type: Set(adjustment.movement_type),
        quantity: Set(quantity),
        unit_price: Set(adjustment.movement_type.unit_price(&item)),
        user_id: Set(adjustment.user_id),
        order_id: Set(adjustment.order_id),
        supplier_id: Set(adjustment.supplier_id),
        motive: Set(adjustment.motive.clone()),
        invoice_number: Set(adjustment.invoice_number.clone()),
        notes: Set(adjustment.notes.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    let item = inventory_item::Entity::find_by_id(item.id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Inventory item", adjustment.item_id))?;

    counter!("taller_inventory.adjustments", 1);
    info!(
        item_id = item.id,
        movement_id = movement.id,
        new_stock = item.stock_quantity,
        "stock adjusted"
    );

    Ok(AdjustmentOutcome { movement, item })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_item_lock_is_exclusive() {
        let locks = ItemLocks::default();
        let guard = locks.acquire(3).await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _g = contender.acquire(3).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn distinct_items_do_not_block() {
        let locks = ItemLocks::default();
        let _a = locks.acquire(1).await;
        tokio::time::timeout(Duration::from_millis(100), locks.acquire(2))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn acquire_many_dedups_ids() {
        let locks = ItemLocks::default();
        let guards = locks.acquire_many(&[5, 2, 5, 9, 2]).await;
        assert_eq!(guards.len(), 3);
    }

    #[tokio::test]
    async fn released_locks_leave_no_entries() {
        let locks = ItemLocks::default();
        let guards = locks.acquire_many(&[4, 8, 15]).await;
        assert_eq!(locks.tracked(), 3);
        drop(guards);
        assert_eq!(locks.tracked(), 0);
    }

    #[tokio::test]
    async fn waiter_keeps_entry_alive() {
        let locks = ItemLocks::default();
        let first = locks.acquire(7).await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _g = contender.acquire(7).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        assert_eq!(locks.tracked(), 1, "waiter still holds the handle");

        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(locks.tracked(), 0);
    }

    #[test]
    fn adjustment_rejects_non_positive_quantity() {
        let adj = StockAdjustment {
            item_id: 1,
            quantity: 0,
            movement_type: MovementType::Salida,
            user_id: 1,
            motive: "consumo".into(),
            order_id: None,
            supplier_id: None,
            invoice_number: None,
            notes: None,
        };
        assert!(adj.validate().is_err());
    }
}
