use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderDetailStatus {
    #[sea_orm(string_value = "pendiente")]
    Pendiente,
    #[sea_orm(string_value = "en_proceso")]
    EnProceso,
    #[sea_orm(string_value = "completado")]
    Completado,
}

impl OrderDetailStatus {
    pub fn can_transition_to(self, next: OrderDetailStatus) -> bool {
        use OrderDetailStatus::*;
        matches!(
            (self, next),
            (Pendiente, EnProceso) | (Pendiente, Completado) | (EnProceso, Completado)
        )
    }

    pub fn ensure_transition(self, next: OrderDetailStatus) -> Result<(), ServiceError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(ServiceError::InvalidTransition(format!(
                "order detail cannot move from '{}' to '{}'",
                self, next
            )))
        }
    }
}

/// One service line within a service order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_details")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub order_id: i32,
    pub service_id: i32,
    pub mechanic_id: Option<i32>,
    pub description: Option<String>,
    pub status: OrderDetailStatus,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((6, 2)))")]
    pub work_hours: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::service_order::Entity",
        from = "Column::OrderId",
        to = "super::service_order::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::catalog_service::Entity",
        from = "Column::ServiceId",
        to = "super::catalog_service::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Service,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::MechanicId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Mechanic,
}

impl Related<super::service_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::catalog_service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Service.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
