use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Audit trail of work done on a vehicle. Rows are only edited to correct mistakes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicle_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub vehicle_id: i32,
    pub order_id: Option<i32>,
    pub mechanic_id: i32,
    pub service_type: String,
    pub description: String,
    pub mileage: i32,
    pub start_date: DateTimeUtc,
    pub end_date: Option<DateTimeUtc>,
    pub observations: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Vehicle,
    #[sea_orm(
        belongs_to = "super::service_order::Entity",
        from = "Column::OrderId",
        to = "super::service_order::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    ServiceOrder,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::MechanicId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Mechanic,
}

impl ActiveModelBehavior for ActiveModel {}
