use rust_decimal::Decimal;
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
    entities::{catalog_service, order_detail},
    errors::ServiceError,
};

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CatalogServiceInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    #[schema(value_type = Option<String>, example = "450.00")]
    pub estimated_price: Option<Decimal>,
    #[validate(range(min = 1))]
    pub estimated_duration_minutes: Option<i32>,
}

/// The workshop's menu of services.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub async fn list(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<catalog_service::Model>, u64), ServiceError> {
        let query = catalog_service::Entity::find().order_by_asc(catalog_service::Column::Name);
        super::fetch_page(&self.db_pool, query, page, limit).await
    }

    pub async fn get(&self, id: i32) -> Result<Option<catalog_service::Model>, ServiceError> {
        Ok(catalog_service::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?)
    }

    pub async fn by_category(
        &self,
        category: &str,
    ) -> Result<Vec<catalog_service::Model>, ServiceError> {
        Ok(catalog_service::Entity::find()
            .filter(catalog_service::Column::Category.eq(category))
            .order_by_asc(catalog_service::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        input: CatalogServiceInput,
    ) -> Result<catalog_service::Model, ServiceError> {
        input.validate()?;
        let name = input
            .name
            .ok_or_else(|| ServiceError::ValidationError("name is required".to_string()))?;
        let price = input.estimated_price.ok_or_else(|| {
            ServiceError::ValidationError("estimated_price is required".to_string())
        })?;
        if price.is_sign_negative() {
            return Err(ServiceError::ValidationError(
                "estimated_price must not be negative".to_string(),
            ));
        }

        let created = catalog_service::ActiveModel {
            name: Set(name),
            description: Set(input.description),
            category: Set(input.category),
            estimated_price: Set(price),
            estimated_duration_minutes: Set(input.estimated_duration_minutes),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;
        info!(service_id = created.id, "catalog service created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: i32,
        input: CatalogServiceInput,
    ) -> Result<catalog_service::Model, ServiceError> {
        input.validate()?;
        let current = self
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service", id))?;

        let mut model: catalog_service::ActiveModel = current.into();
        if let Some(v) = input.name {
            model.name = Set(v);
        }
        if input.description.is_some() {
            model.description = Set(input.description);
        }
        if input.category.is_some() {
            model.category = Set(input.category);
        }
        if let Some(price) = input.estimated_price {
            if price.is_sign_negative() {
                return Err(ServiceError::ValidationError(
                    "estimated_price must not be negative".to_string(),
                ));
            }
            model.estimated_price = Set(price);
        }
        if input.estimated_duration_minutes.is_some() {
            model.estimated_duration_minutes = Set(input.estimated_duration_minutes);
        }
        Ok(model.update(&*self.db_pool).await?)
    }

    /// Services referenced by order details stay in the catalog.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Service", id))?;

        let used = order_detail::Entity::find()
            .filter(order_detail::Column::ServiceId.eq(id))
            .count(&*self.db_pool)
            .await?;
        if used > 0 {
            return Err(ServiceError::HasDependents(format!(
                "service {} is used by {} order details",
                id, used
            )));
        }

        catalog_service::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        Ok(())
    }
}
