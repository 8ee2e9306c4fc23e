use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Direction of a stock movement.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum MovementType {
    /// Inbound: receipts and returns to stock.
    #[sea_orm(string_value = "entrada")]
    #[serde(rename = "entrada", alias = "in")]
    #[strum(serialize = "entrada")]
    Entrada,
    /// Outbound: consumption on a service order or sale.
    #[sea_orm(string_value = "salida")]
    #[serde(rename = "salida", alias = "out")]
    #[strum(serialize = "salida")]
    Salida,
}

impl MovementType {
    /// Signed change applied to the stock counter.
    pub fn signed(self, quantity: i32) -> i32 {
        match self {
            MovementType::Entrada => quantity,
            MovementType::Salida => -quantity,
        }
    }

    /// Purchase price is recorded for inbound movements, sale price for outbound ones.
    pub fn unit_price(self, item: &super::inventory_item::Model) -> Decimal {
        match self {
            MovementType::Entrada => item.purchase_price,
            MovementType::Salida => item.sale_price,
        }
    }
}

/// The `stock_movements` table: the append-only stock ledger.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub item_id: i32,
    pub movement_type: MovementType,
    pub quantity: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub unit_price: Decimal,
    pub user_id: i32,
    pub order_id: Option<i32>,
    pub supplier_id: Option<i32>,
    pub motive: String,
    pub invoice_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::inventory_item::Entity",
        from = "Column::ItemId",
        to = "super::inventory_item::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Item,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::service_order::Entity",
        from = "Column::OrderId",
        to = "super::service_order::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    ServiceOrder,
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    Supplier,
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_english_aliases() {
        let parsed: MovementType = serde_json::from_str("\"in\"").unwrap();
        assert_eq!(parsed, MovementType::Entrada);
        let parsed: MovementType = serde_json::from_str("\"out\"").unwrap();
        assert_eq!(parsed, MovementType::Salida);
        assert_eq!(serde_json::to_string(&MovementType::Salida).unwrap(), "\"salida\"");
    }

    #[test]
    fn rejects_unknown_movement_type() {
        assert!(serde_json::from_str::<MovementType>("\"sideways\"").is_err());
    }

    #[test]
    fn signed_quantity_follows_direction() {
        assert_eq!(MovementType::Entrada.signed(4), 4);
        assert_eq!(MovementType::Salida.signed(4), -4);
    }
}
