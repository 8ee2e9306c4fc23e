use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{purchase_order, supplier},
    errors::ServiceError,
};

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SupplierInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub contact: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state_province: Option<String>,
    #[validate(length(max = 16))]
    pub postal_code: Option<String>,
    pub notes: Option<String>,
}

/// Service for managing suppliers
#[derive(Clone)]
pub struct SupplierService {
    db_pool: Arc<DbPool>,
}

impl SupplierService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<supplier::Model>, u64), ServiceError> {
        let query = supplier::Entity::find().order_by_asc(supplier::Column::Name);
        super::fetch_page(&self.db_pool, query, page, limit).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<Option<supplier::Model>, ServiceError> {
        Ok(supplier::Entity::find_by_id(id).one(&*self.db_pool).await?)
    }

    /// Matches name, contact, email or city.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<supplier::Model>, ServiceError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ServiceError::ValidationError(
                "search term must not be empty".to_string(),
            ));
        }
        Ok(supplier::Entity::find()
            .filter(
                Condition::any()
                    .add(supplier::Column::Name.contains(term))
                    .add(supplier::Column::Contact.contains(term))
                    .add(supplier::Column::Email.contains(term))
                    .add(supplier::Column::City.contains(term)),
            )
            .order_by_asc(supplier::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: SupplierInput) -> Result<supplier::Model, ServiceError> {
        input.validate()?;
        let name = input
            .name
            .ok_or_else(|| ServiceError::ValidationError("name is required".to_string()))?;

        let created = supplier::ActiveModel {
            name: Set(name),
            contact: Set(input.contact),
            phone: Set(input.phone),
            email: Set(input.email),
            address: Set(input.address),
            city: Set(input.city),
            state_province: Set(input.state_province),
            postal_code: Set(input.postal_code),
            notes: Set(input.notes),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(supplier_id = created.id, "supplier created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i32, input: SupplierInput) -> Result<supplier::Model, ServiceError> {
        input.validate()?;
        let current = self
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Supplier", id))?;

        let mut model: supplier::ActiveModel = current.into();
        if let Some(v) = input.name {
            model.name = Set(v);
        }
        if input.contact.is_some() {
            model.contact = Set(input.contact);
        }
        if input.phone.is_some() {
            model.phone = Set(input.phone);
        }
        if input.email.is_some() {
            model.email = Set(input.email);
        }
        if input.address.is_some() {
            model.address = Set(input.address);
        }
        if input.city.is_some() {
            model.city = Set(input.city);
        }
        if input.state_province.is_some() {
            model.state_province = Set(input.state_province);
        }
        if input.postal_code.is_some() {
            model.postal_code = Set(input.postal_code);
        }
        if input.notes.is_some() {
            model.notes = Set(input.notes);
        }
        Ok(model.update(&*self.db_pool).await?)
    }

    /// Suppliers with purchase orders on file cannot be removed.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Supplier", id))?;

        let orders = purchase_order::Entity::find()
            .filter(purchase_order::Column::SupplierId.eq(id))
            .count(&*self.db_pool)
            .await?;
        if orders > 0 {
            return Err(ServiceError::HasDependents(format!(
                "supplier {} has {} purchase orders",
                id, orders
            )));
        }

        supplier::Entity::delete_by_id(id).exec(&*self.db_pool).await?;
        info!(supplier_id = id, "supplier deleted");
        Ok(())
    }
}
