use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    auth::hash_password,
    db::DbPool,
    entities::{
        appointment, purchase_order, role, service_order, stock_movement, user, vehicle,
        vehicle_history,
    },
    errors::ServiceError,
};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NewUser {
    pub role_id: i32,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    pub second_last_name: Option<String>,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8 to 128 characters"))]
    pub password: String,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state_province: Option<String>,
    #[validate(length(max = 16))]
    pub postal_code: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UserChanges {
    pub role_id: Option<i32>,
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    pub second_last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 8, max = 128, message = "password must be 8 to 128 characters"))]
    pub password: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state_province: Option<String>,
    #[validate(length(max = 16))]
    pub postal_code: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub birth_date: Option<NaiveDate>,
}

/// Customers, mechanics and administrators.
#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub async fn list(&self, page: u64, limit: u64) -> Result<(Vec<user::Model>, u64), ServiceError> {
        let query = user::Entity::find()
            .order_by_asc(user::Column::LastName)
            .order_by_asc(user::Column::FirstName);
        super::fetch_page(&self.db_pool, query, page, limit).await
    }

    pub async fn get(&self, id: i32) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find_by_id(id).one(&*self.db_pool).await?)
    }

    pub async fn get_with_role(
        &self,
        id: i32,
    ) -> Result<Option<(user::Model, Option<role::Model>)>, ServiceError> {
        Ok(user::Entity::find_by_id(id)
            .find_also_related(role::Entity)
            .one(&*self.db_pool)
            .await?)
    }

    pub async fn by_email(&self, email: &str) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(&*self.db_pool)
            .await?)
    }

    /// Users holding the named role.
    #[instrument(skip(self))]
    pub async fn by_role(&self, role_name: &str) -> Result<Vec<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .join(JoinType::InnerJoin, user::Relation::Role.def())
            .filter(role::Column::Name.eq(role_name))
            .order_by_asc(user::Column::LastName)
            .all(&*self.db_pool)
            .await?)
    }

    /// Whether user `id` exists and holds `role_name`.
    pub async fn has_role(&self, id: i32, role_name: &str) -> Result<bool, ServiceError> {
        Ok(matches!(
            self.get_with_role(id).await?,
            Some((_, Some(r))) if r.name == role_name
        ))
    }

    async fn ensure_role_exists(&self, role_id: i32) -> Result<(), ServiceError> {
        role::Entity::find_by_id(role_id)
            .one(&*self.db_pool)
            .await?
            .map(|_| ())
            .ok_or_else(|| ServiceError::reference_not_found("Role", role_id))
    }

    async fn ensure_email_free(&self, email: &str, except: Option<i32>) -> Result<(), ServiceError> {
        match self.by_email(email).await? {
            Some(existing) if Some(existing.id) != except => Err(ServiceError::Conflict(format!(
                "email '{}' is already registered",
                email
            ))),
            _ => Ok(()),
        }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create(&self, input: NewUser) -> Result<user::Model, ServiceError> {
        input.validate()?;
        self.ensure_role_exists(input.role_id).await?;
        let email = normalize_email(&input.email);
        self.ensure_email_free(&email, None).await?;

        let now = Utc::now();
        let created = user::ActiveModel {
            role_id: Set(input.role_id),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            second_last_name: Set(input.second_last_name),
            email: Set(email),
            password_hash: Set(hash_password(&input.password)?),
            phone: Set(input.phone),
            address: Set(input.address),
            city: Set(input.city),
            state_province: Set(input.state_province),
            postal_code: Set(input.postal_code),
            birth_date: Set(input.birth_date),
            last_access: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(user_id = created.id, role_id = created.role_id, "user created");
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: i32, changes: UserChanges) -> Result<user::Model, ServiceError> {
        changes.validate()?;
        let current = self
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))?;

        let mut model: user::ActiveModel = current.into();
        if let Some(role_id) = changes.role_id {
            self.ensure_role_exists(role_id).await?;
            model.role_id = Set(role_id);
        }
        if let Some(email) = changes.email {
            let email = normalize_email(&email);
            self.ensure_email_free(&email, Some(id)).await?;
            model.email = Set(email);
        }
        if let Some(password) = changes.password {
            model.password_hash = Set(hash_password(&password)?);
        }
        if let Some(v) = changes.first_name {
            model.first_name = Set(v);
        }
        if let Some(v) = changes.last_name {
            model.last_name = Set(v);
        }
        if changes.second_last_name.is_some() {
            model.second_last_name = Set(changes.second_last_name);
        }
        if changes.phone.is_some() {
            model.phone = Set(changes.phone);
        }
        if changes.address.is_some() {
            model.address = Set(changes.address);
        }
        if changes.city.is_some() {
            model.city = Set(changes.city);
        }
        if changes.state_province.is_some() {
            model.state_province = Set(changes.state_province);
        }
        if changes.postal_code.is_some() {
            model.postal_code = Set(changes.postal_code);
        }
        if changes.birth_date.is_some() {
            model.birth_date = Set(changes.birth_date);
        }
        model.updated_at = Set(Utc::now());

        Ok(model.update(&*self.db_pool).await?)
    }

    /// Users referenced elsewhere in the workshop records are kept.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User", id))?;

        let db = &*self.db_pool;
        let dependents = vehicle::Entity::find()
            .filter(vehicle::Column::OwnerId.eq(id))
            .count(db)
            .await?
            + appointment::Entity::find()
                .filter(appointment::Column::CustomerId.eq(id))
                .count(db)
                .await?
            + service_order::Entity::find()
                .filter(
                    Condition::any()
                        .add(service_order::Column::CustomerId.eq(id))
                        .add(service_order::Column::CreatedBy.eq(id))
                        .add(service_order::Column::FinalizedBy.eq(id)),
                )
                .count(db)
                .await?
            + stock_movement::Entity::find()
                .filter(stock_movement::Column::UserId.eq(id))
                .count(db)
                .await?
            + vehicle_history::Entity::find()
                .filter(vehicle_history::Column::MechanicId.eq(id))
                .count(db)
                .await?
            + purchase_order::Entity::find()
                .filter(purchase_order::Column::RequestedBy.eq(id))
                .count(db)
                .await?;

        if dependents > 0 {
            return Err(ServiceError::HasDependents(format!(
                "user {} is referenced by {} records",
                id, dependents
            )));
        }

        user::Entity::delete_by_id(id).exec(db).await?;
        info!(user_id = id, "user deleted");
        Ok(())
    }
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_compared_case_insensitively() {
        assert_eq!(normalize_email("  Ana.Ruiz@Example.COM "), "ana.ruiz@example.com");
    }

    #[test]
    fn short_password_is_rejected() {
        let input = NewUser {
            role_id: 3,
            first_name: "Ana".into(),
            last_name: "Ruiz".into(),
            second_last_name: None,
            email: "ana@example.com".into(),
            password: "short".into(),
            phone: None,
            address: None,
            city: None,
            state_province: None,
            postal_code: None,
            birth_date: None,
        };
        assert!(input.validate().is_err());
    }
}
