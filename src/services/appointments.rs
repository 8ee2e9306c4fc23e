use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        appointment::{self, AppointmentStatus},
        service_order::{self, ServiceOrderStatus},
        user, vehicle,
    },
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewAppointment {
    pub customer_id: i32,
    pub vehicle_id: i32,
    #[schema(value_type = String, format = Date, example = "2026-03-14")]
    pub date: NaiveDate,
    #[validate(length(min = 1, max = 100))]
    pub service_type: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AppointmentChanges {
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 100))]
    pub service_type: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct AppointmentService {
    db_pool: Arc<DbPool>,
}

impl AppointmentService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub async fn list(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<appointment::Model>, u64), ServiceError> {
        let query = appointment::Entity::find()
            .order_by_desc(appointment::Column::Date)
            .order_by_desc(appointment::Column::Id);
        super::fetch_page(&self.db_pool, query, page, limit).await
    }

    pub async fn get(&self, id: i32) -> Result<Option<appointment::Model>, ServiceError> {
        Ok(appointment::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?)
    }

    async fn all_where(
        &self,
        condition: impl sea_orm::sea_query::IntoCondition,
    ) -> Result<Vec<appointment::Model>, ServiceError> {
        Ok(appointment::Entity::find()
            .filter(condition)
            .order_by_asc(appointment::Column::Date)
            .order_by_asc(appointment::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn by_customer(&self, customer_id: i32) -> Result<Vec<appointment::Model>, ServiceError> {
        self.all_where(appointment::Column::CustomerId.eq(customer_id))
            .await
    }

    pub async fn by_vehicle(&self, vehicle_id: i32) -> Result<Vec<appointment::Model>, ServiceError> {
        self.all_where(appointment::Column::VehicleId.eq(vehicle_id))
            .await
    }

    pub async fn by_date(&self, date: NaiveDate) -> Result<Vec<appointment::Model>, ServiceError> {
        self.all_where(appointment::Column::Date.eq(date)).await
    }

    pub async fn by_status(
        &self,
        status: AppointmentStatus,
    ) -> Result<Vec<appointment::Model>, ServiceError> {
        self.all_where(appointment::Column::Status.eq(status)).await
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewAppointment) -> Result<appointment::Model, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;

        user::Entity::find_by_id(input.customer_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::reference_not_found("Customer", input.customer_id))?;
        let car = vehicle::Entity::find_by_id(input.vehicle_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::reference_not_found("Vehicle", input.vehicle_id))?;
        if car.owner_id != input.customer_id {
            return Err(ServiceError::BusinessRuleViolation(format!(
                "vehicle {} does not belong to customer {}",
                car.id, input.customer_id
            )));
        }

        let created = appointment::ActiveModel {
            customer_id: Set(input.customer_id),
            vehicle_id: Set(input.vehicle_id),
            date: Set(input.date),
            status: Set(AppointmentStatus::Programada),
            service_type: Set(input.service_type),
            description: Set(input.description),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(appointment_id = created.id, date = %created.date, "appointment scheduled");
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: i32,
        changes: AppointmentChanges,
    ) -> Result<appointment::Model, ServiceError> {
        changes.validate()?;
        let current = self
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Appointment", id))?;
        if current.status.is_terminal() {
            return Err(ServiceError::BusinessRuleViolation(format!(
                "appointment {} is {} and can no longer change",
                id, current.status
            )));
        }

        let mut model: appointment::ActiveModel = current.into();
        if let Some(v) = changes.date {
            model.date = Set(v);
        }
        if let Some(v) = changes.service_type {
            model.service_type = Set(v);
        }
        if changes.description.is_some() {
            model.description = Set(changes.description);
        }
        Ok(model.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: i32,
        next: AppointmentStatus,
    ) -> Result<appointment::Model, ServiceError> {
        let current = self
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Appointment", id))?;
        let from = current.status;
        from.ensure_transition(next)?;

        // a linked open order closes the appointment itself when it is finalized
        if next != AppointmentStatus::EnProceso {
            let open_orders = service_order::Entity::find()
                .filter(service_order::Column::AppointmentId.eq(id))
                .filter(service_order::Column::Status.ne(ServiceOrderStatus::Finalizada))
                .count(&*self.db_pool)
                .await?;
            if open_orders > 0 {
                return Err(ServiceError::InvalidTransition(format!(
                    "appointment {} is linked to an open service order and cannot move to '{}'",
                    id, next
                )));
            }
        }

        let mut model: appointment::ActiveModel = current.into();
        model.status = Set(next);
        let updated = model.update(&*self.db_pool).await?;
        info!(appointment_id = id, from = %from, to = %next, "appointment status changed");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = appointment::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Appointment", id));
        }
        Ok(())
    }
}
