use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;

use crate::{db::DbPool, entities::role, errors::ServiceError};

/// Roles are seeded by migration and read-only at runtime.
#[derive(Clone)]
pub struct RoleService {
    db_pool: Arc<DbPool>,
}

impl RoleService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub async fn list(&self) -> Result<Vec<role::Model>, ServiceError> {
        Ok(role::Entity::find()
            .order_by_asc(role::Column::Id)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn get(&self, id: i32) -> Result<Option<role::Model>, ServiceError> {
        Ok(role::Entity::find_by_id(id).one(&*self.db_pool).await?)
    }

    pub async fn by_name(&self, name: &str) -> Result<Option<role::Model>, ServiceError> {
        Ok(role::Entity::find()
            .filter(role::Column::Name.eq(name))
            .one(&*self.db_pool)
            .await?)
    }
}
