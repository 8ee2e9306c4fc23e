use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::tool::{self, DEFAULT_TOOL_STATUS},
    errors::ServiceError,
};

/// Full tool record, used for create and replace.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ToolInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 50))]
    pub tool_type: Option<String>,
    /// Free-form condition, e.g. `disponible`, `prestada`, `en reparacion`.
    #[validate(length(min = 1, max = 50))]
    pub status: Option<String>,
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[schema(value_type = Option<String>, format = Date, example = "2026-03-14")]
    pub checkout_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date)]
    pub return_date: Option<NaiveDate>,
}

impl ToolInput {
    fn check_dates(&self) -> Result<(), ServiceError> {
        match (self.checkout_date, self.return_date) {
            (Some(out), Some(back)) if back < out => Err(ServiceError::ValidationError(format!(
                "return_date {} is before checkout_date {}",
                back, out
            ))),
            (None, Some(_)) => Err(ServiceError::ValidationError(
                "return_date requires a checkout_date".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Workshop tools lent to mechanics.
#[derive(Clone)]
pub struct ToolService {
    db_pool: Arc<DbPool>,
}

impl ToolService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    pub async fn list(&self, page: u64, limit: u64) -> Result<(Vec<tool::Model>, u64), ServiceError> {
        let query = tool::Entity::find().order_by_asc(tool::Column::Name);
        super::fetch_page(&self.db_pool, query, page, limit).await
    }

    pub async fn get(&self, id: i32) -> Result<Option<tool::Model>, ServiceError> {
        Ok(tool::Entity::find_by_id(id).one(&*self.db_pool).await?)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: ToolInput) -> Result<tool::Model, ServiceError> {
        input.validate()?;
        input.check_dates()?;

        let created = tool::ActiveModel {
            name: Set(input.name),
            tool_type: Set(input.tool_type),
            status: Set(input
                .status
                .unwrap_or_else(|| DEFAULT_TOOL_STATUS.to_string())),
            quantity: Set(input.quantity),
            checkout_date: Set(input.checkout_date),
            return_date: Set(input.return_date),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(tool_id = created.id, "tool registered");
        Ok(created)
    }

    /// Replaces every editable field. Dates left out are cleared.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i32, input: ToolInput) -> Result<tool::Model, ServiceError> {
        input.validate()?;
        input.check_dates()?;

        let current = self
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tool", id))?;
        let status = input.status.unwrap_or(current.status.clone());

        let mut model: tool::ActiveModel = current.into();
        model.name = Set(input.name);
        model.tool_type = Set(input.tool_type);
        model.status = Set(status);
        model.quantity = Set(input.quantity);
        model.checkout_date = Set(input.checkout_date);
        model.return_date = Set(input.return_date);
        Ok(model.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = tool::Entity::delete_by_id(id).exec(&*self.db_pool).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Tool", id));
        }
        info!(tool_id = id, "tool removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(out: Option<&str>, back: Option<&str>) -> ToolInput {
        ToolInput {
            name: "Torquimetro".into(),
            tool_type: Some("medicion".into()),
            status: None,
            quantity: 2,
            checkout_date: out.map(|d| d.parse().unwrap()),
            return_date: back.map(|d| d.parse().unwrap()),
        }
    }

    #[test]
    fn return_cannot_precede_checkout() {
        assert!(input(Some("2026-05-10"), Some("2026-05-09")).check_dates().is_err());
        assert!(input(Some("2026-05-10"), Some("2026-05-10")).check_dates().is_ok());
        assert!(input(None, Some("2026-05-10")).check_dates().is_err());
        assert!(input(None, None).check_dates().is_ok());
    }

    #[test]
    fn negative_quantity_fails_validation() {
        let mut tool = input(None, None);
        tool.quantity = -1;
        assert!(tool.validate().is_err());
    }
}
