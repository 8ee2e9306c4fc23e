use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STOCK_MINIMUM: i32 = 5;
pub const DEFAULT_STOCK_MAXIMUM: i32 = 100;

/// A stocked part or material. `stock_quantity` only changes through the stock ledger.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub stock_quantity: i32,
    pub stock_minimum: i32,
    pub stock_maximum: i32,
    pub unit_of_measure: Option<String>,
    pub location: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub purchase_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub sale_price: Decimal,
    pub last_updated: DateTimeUtc,
}

impl Model {
    /// At or below the configured minimum.
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.stock_minimum
    }

    /// Distance to the minimum; the most negative value is the most critical item.
    pub fn stock_margin(&self) -> i32 {
        self.stock_quantity - self.stock_minimum
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_movement::Entity")]
    StockMovements,
    #[sea_orm(has_many = "super::purchase_order_detail::Entity")]
    PurchaseOrderDetails,
}

impl Related<super::stock_movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockMovements.def()
    }
}

impl Related<super::purchase_order_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrderDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn item(stock: i32, minimum: i32) -> Model {
        Model {
            id: 1,
            code: "FLT-001".into(),
            name: "Oil filter".into(),
            description: None,
            category: Some("filters".into()),
            subcategory: None,
            brand: None,
            model: None,
            stock_quantity: stock,
            stock_minimum: minimum,
            stock_maximum: DEFAULT_STOCK_MAXIMUM,
            unit_of_measure: None,
            location: None,
            purchase_price: dec!(80.00),
            sale_price: dec!(120.00),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn low_stock_is_inclusive_of_minimum() {
        assert!(item(5, 5).is_low_stock());
        assert!(item(0, 5).is_low_stock());
        assert!(!item(6, 5).is_low_stock());
    }

    #[test]
    fn margin_orders_most_critical_first() {
        assert!(item(0, 10).stock_margin() < item(4, 5).stock_margin());
    }
}
