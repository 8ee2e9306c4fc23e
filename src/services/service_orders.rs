use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::{self, DbPool},
    entities::{
        appointment::{self, AppointmentStatus},
        catalog_service,
        order_detail::{self, OrderDetailStatus},
        service_order::{self, ServiceOrderStatus},
        user, vehicle, vehicle_history,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};

use super::order_details::{insert_detail, NewOrderLine};

/// History entry label when the order does not name the kind of work.
pub const DEFAULT_HISTORY_SERVICE_TYPE: &str = "Mantenimiento general";

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewServiceOrder {
    pub customer_id: i32,
    pub vehicle_id: i32,
    /// Appointment this job comes from, if any.
    pub appointment_id: Option<i32>,
    #[validate(length(max = 2000))]
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    #[validate(range(min = 0))]
    pub mileage: Option<i32>,
    /// Label of the vehicle history entry opened with the order.
    #[validate(length(min = 1, max = 100))]
    pub service_type: Option<String>,
    /// Work lines created together with the order.
    #[serde(default)]
    pub details: Vec<NewOrderLine>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ServiceOrderChanges {
    #[validate(length(max = 2000))]
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    #[validate(range(min = 0))]
    pub mileage: Option<i32>,
}

#[derive(Serialize)]
struct ReceiptRow<'a> {
    order_id: i32,
    line: &'a str,
    service: &'a str,
    description: &'a str,
    mechanic_id: Option<i32>,
    status: String,
    work_hours: String,
    price: String,
}

/// Service orders and their lifecycle.
#[derive(Clone)]
pub struct ServiceOrderService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl ServiceOrderService {
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
    ) -> Result<(Vec<service_order::Model>, u64), ServiceError> {
        let query = service_order::Entity::find()
            .order_by_desc(service_order::Column::StartDate)
            .order_by_desc(service_order::Column::Id);
        super::fetch_page(&self.db_pool, query, page, limit).await
    }

    pub async fn get(&self, id: i32) -> Result<Option<service_order::Model>, ServiceError> {
        Ok(service_order::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?)
    }

    pub async fn require(&self, id: i32) -> Result<service_order::Model, ServiceError> {
        self.get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service order", id))
    }

    /// Renders an order as a CSV receipt: one row per detail line, then the total.
    #[instrument(skip(self))]
    pub async fn receipt_csv(&self, id: i32) -> Result<String, ServiceError> {
        let order = self.require(id).await?;
        let lines = order_detail::Entity::find()
            .filter(order_detail::Column::OrderId.eq(id))
            .find_also_related(catalog_service::Entity)
            .order_by_asc(order_detail::Column::Id)
            .all(&*self.db_pool)
            .await?;
        render_receipt(&order, &lines)
    }

    async fn all_where(
        &self,
        condition: impl sea_orm::sea_query::IntoCondition,
    ) -> Result<Vec<service_order::Model>, ServiceError> {
        Ok(service_order::Entity::find()
            .filter(condition)
            .order_by_desc(service_order::Column::StartDate)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn by_customer(&self, customer_id: i32) -> Result<Vec<service_order::Model>, ServiceError> {
        self.all_where(service_order::Column::CustomerId.eq(customer_id))
            .await
    }

    pub async fn by_vehicle(&self, vehicle_id: i32) -> Result<Vec<service_order::Model>, ServiceError> {
        self.all_where(service_order::Column::VehicleId.eq(vehicle_id))
            .await
    }

    pub async fn by_status(
        &self,
        status: ServiceOrderStatus,
    ) -> Result<Vec<service_order::Model>, ServiceError> {
        self.all_where(service_order::Column::Status.eq(status)).await
    }

    pub async fn details(&self, id: i32) -> Result<Vec<order_detail::Model>, ServiceError> {
        self.require(id).await?;
        Ok(order_detail::Entity::find()
            .filter(order_detail::Column::OrderId.eq(id))
            .order_by_asc(order_detail::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    /// Opens a new order. A linked `programada` appointment moves to `en_proceso`
    /// in the same transaction.
    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        input: NewServiceOrder,
        created_by: i32,
    ) -> Result<service_order::Model, ServiceError> {
        input.validate()?;
        for line in &input.details {
            line.check_amounts()?;
        }

        let order = db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                user::Entity::find_by_id(input.customer_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::reference_not_found("Customer", input.customer_id))?;
                let car = vehicle::Entity::find_by_id(input.vehicle_id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::reference_not_found("Vehicle", input.vehicle_id))?;
                if car.owner_id != input.customer_id {
                    return Err(ServiceError::BusinessRuleViolation(format!(
                        "vehicle {} does not belong to customer {}",
                        car.id, input.customer_id
                    )));
                }

                if let Some(appointment_id) = input.appointment_id {
                    let linked = appointment::Entity::find_by_id(appointment_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::reference_not_found("Appointment", appointment_id)
                        })?;
                    if linked.vehicle_id != input.vehicle_id {
                        return Err(ServiceError::BusinessRuleViolation(format!(
                            "appointment {} is for a different vehicle",
                            appointment_id
                        )));
                    }
                    match linked.status {
                        AppointmentStatus::Programada => {
                            let mut active: appointment::ActiveModel = linked.into();
                            active.status = Set(AppointmentStatus::EnProceso);
                            active.update(txn).await?;
                        }
                        AppointmentStatus::EnProceso => {}
                        other => {
                            return Err(ServiceError::InvalidTransition(format!(
                                "appointment {} is {} and cannot start a service order",
                                appointment_id, other
                            )))
                        }
                    }
                }

                let now = Utc::now();
                let created = service_order::ActiveModel {
                    appointment_id: Set(input.appointment_id),
                    customer_id: Set(input.customer_id),
                    vehicle_id: Set(input.vehicle_id),
                    start_date: Set(now),
                    end_date: Set(None),
                    status: Set(ServiceOrderStatus::Abierta),
                    diagnosis: Set(input.diagnosis.clone()),
                    notes: Set(input.notes.clone()),
                    mileage: Set(input.mileage),
                    total: Set(Decimal::ZERO),
                    created_by: Set(created_by),
                    finalized_by: Set(None),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await?;

                let line_count = input.details.len();
                for line in input.details {
                    insert_detail(txn, created.id, line).await?;
                }
                let created = if line_count > 0 {
                    let total = recompute_total(txn, created.id).await?;
                    service_order::Model { total, ..created }
                } else {
                    created
                };

                let service_type = input
                    .service_type
                    .unwrap_or_else(|| DEFAULT_HISTORY_SERVICE_TYPE.to_string());
                let description = input
                    .notes
                    .or(input.diagnosis)
                    .unwrap_or_else(|| service_type.clone());
                vehicle_history::ActiveModel {
                    vehicle_id: Set(created.vehicle_id),
                    order_id: Set(Some(created.id)),
                    mechanic_id: Set(created_by),
                    service_type: Set(service_type),
                    description: Set(description),
                    mileage: Set(input.mileage.unwrap_or(0)),
                    start_date: Set(now),
                    end_date: Set(None),
                    observations: Set(None),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
                Ok(created)
            })
        })
        .await?;

        info!(order_id = order.id, vehicle_id = order.vehicle_id, "service order opened");
        Ok(order)
    }

    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: i32,
        changes: ServiceOrderChanges,
    ) -> Result<service_order::Model, ServiceError> {
        changes.validate()?;
        let current = self.require(id).await?;
        current.ensure_editable()?;

        let mut model: service_order::ActiveModel = current.into();
        if changes.diagnosis.is_some() {
            model.diagnosis = Set(changes.diagnosis);
        }
        if changes.notes.is_some() {
            model.notes = Set(changes.notes);
        }
        if changes.mileage.is_some() {
            model.mileage = Set(changes.mileage);
        }
        Ok(model.update(&*self.db_pool).await?)
    }

    /// Manual status change. Finalization has its own operation with preconditions.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: i32,
        next: ServiceOrderStatus,
    ) -> Result<service_order::Model, ServiceError> {
        if next.is_finalized() {
            return Err(ServiceError::InvalidTransition(
                "service orders are finalized through the finalize operation".to_string(),
            ));
        }
        let current = self.require(id).await?;
        let from = current.status;
        from.ensure_transition(next)?;

        let mut model: service_order::ActiveModel = current.into();
        model.status = Set(next);
        let updated = model.update(&*self.db_pool).await?;

        self.event_sender
            .publish(Event::ServiceOrderStatusChanged {
                order_id: id,
                from,
                to: next,
            })
            .await;
        Ok(updated)
    }

    /// Closes an order whose every detail is `completado`.
    ///
    /// Sets end date, finalizing user and total, and releases a linked
    /// appointment as `finalizada`, all in one transaction. The customer is
    /// notified after commit.
    #[instrument(skip(self))]
    pub async fn finalize(
        &self,
        id: i32,
        user_id: i32,
    ) -> Result<service_order::Model, ServiceError> {
        let (order, previous) = db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let current = service_order::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Service order", id))?;
                let previous = current.status;
                previous.ensure_transition(ServiceOrderStatus::Finalizada)?;

                let details = order_detail::Entity::find()
                    .filter(order_detail::Column::OrderId.eq(id))
                    .all(txn)
                    .await?;
                let completed = details
                    .iter()
                    .filter(|d| d.status == OrderDetailStatus::Completado)
                    .count();
                if details.is_empty() || completed < details.len() {
                    return Err(ServiceError::IncompleteDetails(format!(
                        "service order {} has {} of {} details completed",
                        id,
                        completed,
                        details.len()
                    )));
                }
                let total: Decimal = details.iter().map(|d| d.price).sum();

                if let Some(appointment_id) = current.appointment_id {
                    release_appointment(txn, appointment_id).await?;
                }

                let mut model: service_order::ActiveModel = current.into();
                model.status = Set(ServiceOrderStatus::Finalizada);
                model.end_date = Set(Some(Utc::now()));
                model.finalized_by = Set(Some(user_id));
                model.total = Set(total);
                model.appointment_id = Set(None);
                let updated = model.update(txn).await?;

                let finished_at = updated.end_date;
                vehicle_history::Entity::update_many()
                    .col_expr(vehicle_history::Column::EndDate, Expr::value(finished_at))
                    .filter(vehicle_history::Column::OrderId.eq(id))
                    .filter(vehicle_history::Column::EndDate.is_null())
                    .exec(txn)
                    .await?;
                Ok((updated, previous))
            })
        })
        .await?;

        info!(order_id = id, total = %order.total, "service order finalized");
        self.event_sender
            .publish(Event::ServiceOrderStatusChanged {
                order_id: id,
                from: previous,
                to: ServiceOrderStatus::Finalizada,
            })
            .await;
        self.notify_vehicle_ready(&order).await;

        Ok(order)
    }

    async fn notify_vehicle_ready(&self, order: &service_order::Model) {
        let db = &*self.db_pool;
        let customer = user::Entity::find_by_id(order.customer_id).one(db).await;
        let car = vehicle::Entity::find_by_id(order.vehicle_id).one(db).await;

        match (customer, car) {
            (Ok(Some(customer)), Ok(Some(car))) => {
                self.event_sender
                    .publish(Event::ServiceOrderFinalized {
                        order_id: order.id,
                        customer_email: customer.email.clone(),
                        customer_name: customer.full_name(),
                        vehicle: car.description(),
                    })
                    .await;
            }
            _ => warn!(order_id = order.id, "could not load customer or vehicle for notification"),
        }
    }

    /// Removes an unfinalized order together with its details and history entries.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        db::transaction(&self.db_pool, move |txn| {
            Box::pin(async move {
                let current = service_order::Entity::find_by_id(id)
                    .one(txn)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Service order", id))?;
                if current.status.is_finalized() {
                    return Err(ServiceError::BusinessRuleViolation(format!(
                        "service order {} is finalized and cannot be deleted",
                        id
                    )));
                }

                order_detail::Entity::delete_many()
                    .filter(order_detail::Column::OrderId.eq(id))
                    .exec(txn)
                    .await?;
                vehicle_history::Entity::delete_many()
                    .filter(vehicle_history::Column::OrderId.eq(id))
                    .exec(txn)
                    .await?;
                service_order::Entity::delete_by_id(id).exec(txn).await?;
                Ok(())
            })
        })
        .await?;

        info!(order_id = id, "service order deleted");
        Ok(())
    }
}

async fn release_appointment<C>(conn: &C, appointment_id: i32) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let Some(linked) = appointment::Entity::find_by_id(appointment_id)
        .one(conn)
        .await?
    else {
        return Ok(());
    };

    if linked.status.can_transition_to(AppointmentStatus::Finalizada) {
        let mut active: appointment::ActiveModel = linked.into();
        active.status = Set(AppointmentStatus::Finalizada);
        active.update(conn).await?;
    } else {
        warn!(
            appointment_id,
            status = %linked.status,
            "linked appointment left unchanged on finalize"
        );
    }
    Ok(())
}

/// Sets the order total to the sum of its detail prices.
pub(crate) async fn recompute_total<C>(conn: &C, order_id: i32) -> Result<Decimal, ServiceError>
where
    C: ConnectionTrait,
{
    let total: Decimal = order_detail::Entity::find()
        .filter(order_detail::Column::OrderId.eq(order_id))
        .all(conn)
        .await?
        .iter()
        .map(|d| d.price)
        .sum();

    service_order::Entity::update_many()
        .col_expr(
            service_order::Column::Total,
            Expr::value(total),
        )
        .filter(service_order::Column::Id.eq(order_id))
        .exec(conn)
        .await?;
    Ok(total)
}

fn render_receipt(
    order: &service_order::Model,
    lines: &[(order_detail::Model, Option<catalog_service::Model>)],
) -> Result<String, ServiceError> {
    let fail = |e: &dyn std::fmt::Display| {
        ServiceError::InternalError(format!("receipt export failed: {}", e))
    };
    let mut writer = csv::Writer::from_writer(Vec::new());
    for (detail, service) in lines {
        writer
            .serialize(ReceiptRow {
                order_id: order.id,
                line: "detail",
                service: service.as_ref().map(|s| s.name.as_str()).unwrap_or(""),
                description: detail.description.as_deref().unwrap_or(""),
                mechanic_id: detail.mechanic_id,
                status: detail.status.to_string(),
                work_hours: detail.work_hours.to_string(),
                price: detail.price.to_string(),
            })
            .map_err(|e| fail(&e))?;
    }
    writer
        .serialize(ReceiptRow {
            order_id: order.id,
            line: "total",
            service: "",
            description: "",
            mechanic_id: None,
            status: order.status.to_string(),
            work_hours: lines
                .iter()
                .map(|(d, _)| d.work_hours)
                .sum::<Decimal>()
                .to_string(),
            price: order.total.to_string(),
        })
        .map_err(|e| fail(&e))?;
    let bytes = writer.into_inner().map_err(|e| fail(&e))?;
    String::from_utf8(bytes).map_err(|e| fail(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn receipt_lists_lines_then_total() {
        let now = Utc::now();
        let order = service_order::Model {
            id: 7,
            appointment_id: None,
            customer_id: 3,
            vehicle_id: 2,
            start_date: now,
            end_date: None,
            status: ServiceOrderStatus::Abierta,
            diagnosis: None,
            notes: None,
            mileage: Some(42_000),
            total: dec!(150.00),
            created_by: 1,
            finalized_by: None,
            created_at: now,
        };
        let detail = order_detail::Model {
            id: 1,
            order_id: 7,
            service_id: 5,
            mechanic_id: Some(2),
            description: Some("pastillas, delanteras".into()),
            status: OrderDetailStatus::Pendiente,
            price: dec!(150.00),
            work_hours: dec!(1.5),
        };

        let csv = render_receipt(&order, &[(detail, None)]).unwrap();
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("order_id,line,service"));
        assert!(rows[1].contains("\"pastillas, delanteras\""));
        assert!(rows[2].starts_with("7,total,"));
        assert!(rows[2].ends_with("1.5,150.00"));
    }
}
