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
        catalog_service,
        order_detail::{self, OrderDetailStatus},
        role,
        service_order::{self, ServiceOrderStatus},
        user,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

use super::service_orders::recompute_total;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewOrderDetail {
    pub order_id: i32,
    pub service_id: i32,
    pub mechanic_id: Option<i32>,
    pub description: Option<String>,
    /// Defaults to the catalog's estimated price.
    #[schema(value_type = Option<String>, example = "450.00")]
    pub price: Option<Decimal>,
    #[schema(value_type = Option<String>, example = "1.5")]
    pub work_hours: Option<Decimal>,
}

/// A work line given inline when an order is opened.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewOrderLine {
    pub service_id: i32,
    pub mechanic_id: Option<i32>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "450.00")]
    pub price: Option<Decimal>,
    #[schema(value_type = Option<String>, example = "1.5")]
    pub work_hours: Option<Decimal>,
}

impl NewOrderLine {
    pub(crate) fn check_amounts(&self) -> Result<(), ServiceError> {
        ensure_non_negative("price", self.price)?;
        ensure_non_negative("work_hours", self.work_hours)
    }
}

impl From<NewOrderDetail> for NewOrderLine {
    fn from(input: NewOrderDetail) -> Self {
        Self {
            service_id: input.service_id,
            mechanic_id: input.mechanic_id,
            description: input.description,
            price: input.price,
            work_hours: input.work_hours,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct OrderDetailChanges {
    pub service_id: Option<i32>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub work_hours: Option<Decimal>,
}

fn ensure_non_negative(field: &str, value: Option<Decimal>) -> Result<(), ServiceError> {
    match value {
        Some(v) if v.is_sign_negative() => Err(ServiceError::ValidationError(format!(
            "{} must not be negative",
            field
        ))),
        _ => Ok(()),
    }
}

/// Loads the parent order of a detail and rejects changes once it is finalized.
async fn editable_order<C>(conn: &C, order_id: i32) -> Result<service_order::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let order = service_order::Entity::find_by_id(order_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::reference_not_found("Service order", order_id))?;
    order.ensure_editable()?;
    Ok(order)
}

pub(crate) async fn ensure_mechanic<C>(conn: &C, mechanic_id: i32) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    match user::Entity::find_by_id(mechanic_id)
        .find_also_related(role::Entity)
        .one(conn)
        .await?
    {
        None => Err(ServiceError::reference_not_found("Mechanic", mechanic_id)),
        Some((_, Some(r))) if r.name == role::MECHANIC => Ok(()),
        Some(_) => Err(ServiceError::BusinessRuleViolation(format!(
            "user {} is not a mechanic",
            mechanic_id
        ))),
    }
}

/// Inserts a `pendiente` line; the price defaults to the catalog estimate.
/// The caller recomputes the order total.
pub(crate) async fn insert_detail<C>(
    conn: &C,
    order_id: i32,
    line: NewOrderLine,
) -> Result<order_detail::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let service = catalog_service::Entity::find_by_id(line.service_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::reference_not_found("Service", line.service_id))?;
    if let Some(mechanic_id) = line.mechanic_id {
        ensure_mechanic(conn, mechanic_id).await?;
    }

    Ok(order_detail::ActiveModel {
        order_id: Set(order_id),
        service_id: Set(line.service_id),
        mechanic_id: Set(line.mechanic_id),
        description: Set(line.description),
        status: Set(OrderDetailStatus::Pendiente),
        price: Set(line.price.unwrap_or(service.estimated_price)),
        work_hours: Set(line.work_hours.unwrap_or(Decimal::ZERO)),
        ..Default::default()
    }
    .insert(conn)
    .await?)
}

/// Service lines on an order.
#[derive(Clone)]
pub struct OrderDetailService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl OrderDetailService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    pub async fn list(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<order_detail::Model>, u64), ServiceError> {
        let query = order_detail::Entity::find().order_by_asc(order_detail::Column::Id);
        super::fetch_page(&self.db_pool, query, page, limit).await
    }

    pub async fn get(&self, id: i32) -> Result<Option<order_detail::Model>, ServiceError> {
        Ok(order_detail::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?)
    }

    async fn all_where(
        &self,
        condition: impl sea_orm::sea_query::IntoCondition,
    ) -> Result<Vec<order_detail::Model>, ServiceError> {
        Ok(order_detail::Entity::find()
            .filter(condition)
            .order_by_asc(order_detail::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn by_order(&self, order_id: i32) -> Result<Vec<order_detail::Model>, ServiceError> {
        self.all_where(order_detail::Column::OrderId.eq(order_id)).await
    }

    pub async fn by_mechanic(&self, mechanic_id: i32) -> Result<Vec<order_detail::Model>, ServiceError> {
        self.all_where(order_detail::Column::MechanicId.eq(mechanic_id))
            .await
    }

    pub async fn by_status(
        &self,
        status: OrderDetailStatus,
    ) -> Result<Vec<order_detail::Model>, ServiceError> {
        self.all_where(order_detail::Column::Status.eq(status)).await
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewOrderDetail) -> Result<order_detail::Model, ServiceError> {
        input.validate()?;
        let order_id = input.order_id;
        let line = NewOrderLine::from(input);
        line.check_amounts()?;

        let detail = db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                editable_order(txn, order_id).await?;
                let created = insert_detail(txn, order_id, line).await?;
                recompute_total(txn, created.order_id).await?;
                Ok(created)
            })
        })
        .await?;

        info!(detail_id = detail.id, order_id = detail.order_id, "order detail added");
        Ok(detail)
    }

    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: i32,
        changes: OrderDetailChanges,
    ) -> Result<order_detail::Model, ServiceError> {
        changes.validate()?;
        ensure_non_negative("price", changes.price)?;
        ensure_non_negative("work_hours", changes.work_hours)?;

        db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let current = order_detail::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Order detail", id))?;
                editable_order(txn, current.order_id).await?;

                let mut model: order_detail::ActiveModel = current.into();
                if let Some(service_id) = changes.service_id {
                    catalog_service::Entity::find_by_id(service_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| ServiceError::reference_not_found("Service", service_id))?;
                    model.service_id = Set(service_id);
                }
                if changes.description.is_some() {
                    model.description = Set(changes.description);
                }
                if let Some(v) = changes.price {
                    model.price = Set(v);
                }
                if let Some(v) = changes.work_hours {
                    model.work_hours = Set(v);
                }
                let updated = model.update(txn).await?;
                recompute_total(txn, updated.order_id).await?;
                Ok(updated)
            })
        })
        .await
    }

    /// Moves a detail along its state machine. The first `completado` detail
    /// puts an `abierta` order in progress.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: i32,
        next: OrderDetailStatus,
    ) -> Result<order_detail::Model, ServiceError> {
        let (detail, order_moved) = db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let current = order_detail::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Order detail", id))?;
                let order = editable_order(txn, current.order_id).await?;
                current.status.ensure_transition(next)?;

                let mut model: order_detail::ActiveModel = current.into();
                model.status = Set(next);
                let updated = model.update(txn).await?;

                let mut order_moved = None;
                if next == OrderDetailStatus::Completado
                    && order.status == ServiceOrderStatus::Abierta
                {
                    let order_id = order.id;
                    let mut active: service_order::ActiveModel = order.into();
                    active.status = Set(ServiceOrderStatus::EnProgreso);
                    active.update(txn).await?;
                    order_moved = Some(order_id);
                }
                Ok((updated, order_moved))
            })
        })
        .await?;

        if let Some(order_id) = order_moved {
            info!(order_id, "service order in progress after first completed detail");
            self.event_sender
                .publish(Event::ServiceOrderStatusChanged {
                    order_id,
                    from: ServiceOrderStatus::Abierta,
                    to: ServiceOrderStatus::EnProgreso,
                })
                .await;
        }
        Ok(detail)
    }

    #[instrument(skip(self))]
    pub async fn assign_mechanic(
        &self,
        id: i32,
        mechanic_id: i32,
    ) -> Result<order_detail::Model, ServiceError> {
        db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let current = order_detail::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Order detail", id))?;
                editable_order(txn, current.order_id).await?;
                ensure_mechanic(txn, mechanic_id).await?;

                let mut model: order_detail::ActiveModel = current.into();
                model.mechanic_id = Set(Some(mechanic_id));
                Ok(model.update(txn).await?)
            })
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let current = order_detail::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Order detail", id))?;
                editable_order(txn, current.order_id).await?;

                order_detail::Entity::delete_by_id(id).exec(txn).await?;
                recompute_total(txn, current.order_id).await?;
                Ok(())
            })
        })
        .await
    }
}
