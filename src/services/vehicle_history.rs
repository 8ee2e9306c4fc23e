use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{service_order, vehicle, vehicle_history},
    errors::ServiceError,
};

use super::order_details::ensure_mechanic;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewVehicleHistory {
    pub vehicle_id: i32,
    pub order_id: Option<i32>,
    pub mechanic_id: i32,
    #[validate(length(min = 1, max = 100))]
    pub service_type: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(range(min = 0))]
    pub mileage: i32,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub observations: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct VehicleHistoryChanges {
    pub mechanic_id: Option<i32>,
    #[validate(length(min = 1, max = 100))]
    pub service_type: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub mileage: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub observations: Option<String>,
}

/// Column layout of the CSV export.
#[derive(Debug, Serialize)]
struct HistoryRow<'a> {
    id: i32,
    vehicle: &'a str,
    order_id: Option<i32>,
    mechanic_id: i32,
    service_type: &'a str,
    description: &'a str,
    mileage: i32,
    start_date: String,
    end_date: String,
    observations: &'a str,
}

fn ensure_date_order(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ServiceError> {
    match end {
        Some(end) if end < start => Err(ServiceError::ValidationError(
            "end_date must not precede start_date".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Work records per vehicle.
#[derive(Clone)]
pub struct VehicleHistoryService {
    db_pool: Arc<DbPool>,
}

impl VehicleHistoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub async fn list(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<vehicle_history::Model>, u64), ServiceError> {
        let query = vehicle_history::Entity::find()
            .order_by_desc(vehicle_history::Column::StartDate)
            .order_by_desc(vehicle_history::Column::Id);
        super::fetch_page(&self.db_pool, query, page, limit).await
    }

    pub async fn get(&self, id: i32) -> Result<Option<vehicle_history::Model>, ServiceError> {
        Ok(vehicle_history::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?)
    }

    async fn all_where(
        &self,
        condition: impl sea_orm::sea_query::IntoCondition,
    ) -> Result<Vec<vehicle_history::Model>, ServiceError> {
        Ok(vehicle_history::Entity::find()
            .filter(condition)
            .order_by_desc(vehicle_history::Column::StartDate)
            .order_by_desc(vehicle_history::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn by_vehicle(&self, vehicle_id: i32) -> Result<Vec<vehicle_history::Model>, ServiceError> {
        self.all_where(vehicle_history::Column::VehicleId.eq(vehicle_id))
            .await
    }

    pub async fn by_order(&self, order_id: i32) -> Result<Vec<vehicle_history::Model>, ServiceError> {
        self.all_where(vehicle_history::Column::OrderId.eq(order_id))
            .await
    }

    pub async fn by_mechanic(&self, mechanic_id: i32) -> Result<Vec<vehicle_history::Model>, ServiceError> {
        self.all_where(vehicle_history::Column::MechanicId.eq(mechanic_id))
            .await
    }

    /// Records whose start date falls inside `[from, to]`.
    pub async fn by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<vehicle_history::Model>, ServiceError> {
        if from > to {
            return Err(ServiceError::ValidationError(
                "`from` must not be after `to`".to_string(),
            ));
        }
        self.all_where(vehicle_history::Column::StartDate.between(from, to))
            .await
    }

    #[instrument(skip(self, input), fields(vehicle_id = input.vehicle_id))]
    pub async fn create(
        &self,
        input: NewVehicleHistory,
    ) -> Result<vehicle_history::Model, ServiceError> {
        input.validate()?;
        let start_date = input.start_date.unwrap_or_else(Utc::now);
        ensure_date_order(start_date, input.end_date)?;

        let db = &*self.db_pool;
        vehicle::Entity::find_by_id(input.vehicle_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::reference_not_found("Vehicle", input.vehicle_id))?;
        if let Some(order_id) = input.order_id {
            let order = service_order::Entity::find_by_id(order_id)
                .one(db)
                .await?
                .ok_or_else(|| ServiceError::reference_not_found("Service order", order_id))?;
            if order.vehicle_id != input.vehicle_id {
                return Err(ServiceError::BusinessRuleViolation(format!(
                    "service order {} is for another vehicle",
                    order_id
                )));
            }
        }
        ensure_mechanic(db, input.mechanic_id).await?;

        let created = vehicle_history::ActiveModel {
            vehicle_id: Set(input.vehicle_id),
            order_id: Set(input.order_id),
            mechanic_id: Set(input.mechanic_id),
            service_type: Set(input.service_type),
            description: Set(input.description),
            mileage: Set(input.mileage),
            start_date: Set(start_date),
            end_date: Set(input.end_date),
            observations: Set(input.observations),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(history_id = created.id, "vehicle history recorded");
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: i32,
        changes: VehicleHistoryChanges,
    ) -> Result<vehicle_history::Model, ServiceError> {
        changes.validate()?;
        let current = self
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Vehicle history", id))?;
        ensure_date_order(
            changes.start_date.unwrap_or(current.start_date),
            changes.end_date.or(current.end_date),
        )?;

        let mut model: vehicle_history::ActiveModel = current.into();
        if let Some(mechanic_id) = changes.mechanic_id {
            ensure_mechanic(&*self.db_pool, mechanic_id).await?;
            model.mechanic_id = Set(mechanic_id);
        }
        if let Some(v) = changes.service_type {
            model.service_type = Set(v);
        }
        if let Some(v) = changes.description {
            model.description = Set(v);
        }
        if let Some(v) = changes.mileage {
            model.mileage = Set(v);
        }
        if let Some(v) = changes.start_date {
            model.start_date = Set(v);
        }
        if changes.end_date.is_some() {
            model.end_date = Set(changes.end_date);
        }
        if changes.observations.is_some() {
            model.observations = Set(changes.observations);
        }
        Ok(model.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = vehicle_history::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Vehicle history", id));
        }
        Ok(())
    }

    /// Renders a vehicle's history as CSV, oldest record first.
    #[instrument(skip(self))]
    pub async fn export_csv(&self, vehicle_id: i32) -> Result<String, ServiceError> {
        let car = vehicle::Entity::find_by_id(vehicle_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Vehicle", vehicle_id))?;
        let mut records = self.by_vehicle(vehicle_id).await?;
        records.reverse();

        render_csv(&car.description(), &records)
    }
}

fn render_csv(vehicle: &str, records: &[vehicle_history::Model]) -> Result<String, ServiceError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer
            .serialize(HistoryRow {
                id: record.id,
                vehicle,
                order_id: record.order_id,
                mechanic_id: record.mechanic_id,
                service_type: &record.service_type,
                description: &record.description,
                mileage: record.mileage,
                start_date: record.start_date.to_rfc3339(),
                end_date: record
                    .end_date
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_default(),
                observations: record.observations.as_deref().unwrap_or(""),
            })
            .map_err(|e| ServiceError::InternalError(format!("csv export failed: {}", e)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ServiceError::InternalError(format!("csv export failed: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| ServiceError::InternalError(format!("csv export failed: {}", e)))
}
