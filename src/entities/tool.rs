use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOOL_STATUS: &str = "disponible";

/// Workshop tool stock. Tools are lent out and returned, never consumed,
/// so they stay outside the parts ledger.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tools")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub tool_type: Option<String>,
    pub status: String,
    pub quantity: i32,
    pub checkout_date: Option<Date>,
    pub return_date: Option<Date>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
