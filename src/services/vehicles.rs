use chrono::Utc;
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
    entities::{appointment, service_order, user, vehicle, vehicle_history},
    errors::ServiceError,
};

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct VehicleInput {
    pub owner_id: Option<i32>,
    #[validate(length(min = 1, max = 64))]
    pub make: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub model: Option<String>,
    #[validate(range(min = 1900, max = 2100))]
    pub year: Option<i32>,
    #[validate(length(min = 1, max = 16))]
    pub plate: Option<String>,
    #[validate(length(max = 32))]
    pub vin: Option<String>,
    pub color: Option<String>,
    #[validate(range(min = 0))]
    pub mileage: Option<i32>,
}

#[derive(Clone)]
pub struct VehicleService {
    db_pool: Arc<DbPool>,
}

impl VehicleService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub async fn list(&self, page: u64, limit: u64) -> Result<(Vec<vehicle::Model>, u64), ServiceError> {
        let query = vehicle::Entity::find().order_by_asc(vehicle::Column::Plate);
        super::fetch_page(&self.db_pool, query, page, limit).await
    }

    pub async fn get(&self, id: i32) -> Result<Option<vehicle::Model>, ServiceError> {
        Ok(vehicle::Entity::find_by_id(id).one(&*self.db_pool).await?)
    }

    pub async fn by_plate(&self, plate: &str) -> Result<Option<vehicle::Model>, ServiceError> {
        Ok(vehicle::Entity::find()
            .filter(vehicle::Column::Plate.eq(normalize_plate(plate)))
            .one(&*self.db_pool)
            .await?)
    }

    pub async fn by_owner(&self, owner_id: i32) -> Result<Vec<vehicle::Model>, ServiceError> {
        Ok(vehicle::Entity::find()
            .filter(vehicle::Column::OwnerId.eq(owner_id))
            .order_by_asc(vehicle::Column::Plate)
            .all(&*self.db_pool)
            .await?)
    }

    async fn ensure_owner(&self, owner_id: i32) -> Result<(), ServiceError> {
        user::Entity::find_by_id(owner_id)
            .one(&*self.db_pool)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::reference_not_found("User", owner_id))
    }

    async fn ensure_plate_free(&self, plate: &str, except: Option<i32>) -> Result<(), ServiceError> {
        match self.by_plate(plate).await? {
            Some(existing) if Some(existing.id) != except => Err(ServiceError::Conflict(format!(
                "plate '{}' is already registered",
                plate
            ))),
            _ => Ok(()),
        }
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: VehicleInput) -> Result<vehicle::Model, ServiceError> {
        input.validate()?;
        let missing = |field: &str| ServiceError::ValidationError(format!("{} is required", field));
        let owner_id = input.owner_id.ok_or_else(|| missing("owner_id"))?;
        let make = input.make.ok_or_else(|| missing("make"))?;
        let model = input.model.ok_or_else(|| missing("model"))?;
        let year = input.year.ok_or_else(|| missing("year"))?;
        let plate = normalize_plate(&input.plate.ok_or_else(|| missing("plate"))?);

        self.ensure_owner(owner_id).await?;
        self.ensure_plate_free(&plate, None).await?;

        let created = vehicle::ActiveModel {
            owner_id: Set(owner_id),
            make: Set(make),
            model: Set(model),
            year: Set(year),
            plate: Set(plate),
            vin: Set(input.vin),
            color: Set(input.color),
            mileage: Set(input.mileage.unwrap_or(0)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;
        info!(vehicle_id = created.id, "vehicle registered");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i32, input: VehicleInput) -> Result<vehicle::Model, ServiceError> {
        input.validate()?;
        let current = self
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Vehicle", id))?;

        let mut model: vehicle::ActiveModel = current.into();
        if let Some(owner_id) = input.owner_id {
            self.ensure_owner(owner_id).await?;
            model.owner_id = Set(owner_id);
        }
        if let Some(plate) = input.plate {
            let plate = normalize_plate(&plate);
            self.ensure_plate_free(&plate, Some(id)).await?;
            model.plate = Set(plate);
        }
        if let Some(v) = input.make {
            model.make = Set(v);
        }
        if let Some(v) = input.model {
            model.model = Set(v);
        }
        if let Some(v) = input.year {
            model.year = Set(v);
        }
        if input.vin.is_some() {
            model.vin = Set(input.vin);
        }
        if input.color.is_some() {
            model.color = Set(input.color);
        }
        if let Some(v) = input.mileage {
            model.mileage = Set(v);
        }
        Ok(model.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Vehicle", id))?;

        let db = &*self.db_pool;
        let dependents = service_order::Entity::find()
            .filter(service_order::Column::VehicleId.eq(id))
            .count(db)
            .await?
            + appointment::Entity::find()
                .filter(appointment::Column::VehicleId.eq(id))
                .count(db)
                .await?
            + vehicle_history::Entity::find()
                .filter(vehicle_history::Column::VehicleId.eq(id))
                .count(db)
                .await?;
        if dependents > 0 {
            return Err(ServiceError::HasDependents(format!(
                "vehicle {} has {} orders, appointments or history entries",
                id, dependents
            )));
        }

        vehicle::Entity::delete_by_id(id).exec(db).await?;
        Ok(())
    }
}

/// Plates are stored upper-case without surrounding spaces.
pub(crate) fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plate_normalization() {
        assert_eq!(normalize_plate(" abc-123 "), "ABC-123");
    }

    #[test]
    fn model_year_bounds() {
        let mut input = VehicleInput {
            year: Some(2019),
            ..Default::default()
        };
        assert!(input.validate().is_ok());
        input.year = Some(1850);
        assert!(input.validate().is_err());
    }
}
