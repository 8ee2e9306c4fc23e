use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

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
pub enum PurchaseOrderDetailStatus {
    #[sea_orm(string_value = "pendiente")]
    Pendiente,
    #[sea_orm(string_value = "parcial")]
    Parcial,
    #[sea_orm(string_value = "completado")]
    Completado,
}

impl PurchaseOrderDetailStatus {
    /// Status after recording `received` units against `ordered`.
    ///
    /// A zero receipt leaves the current status untouched.
    pub fn after_receipt(self, ordered: i32, received: i32) -> Self {
        if received >= ordered {
            PurchaseOrderDetailStatus::Completado
        } else if received > 0 {
            PurchaseOrderDetailStatus::Parcial
        } else {
            self
        }
    }

    /// Status after the ordered quantity changes, derived only from the two counts.
    pub fn after_reorder(ordered: i32, received: i32) -> Self {
        if received >= ordered {
            PurchaseOrderDetailStatus::Completado
        } else if received > 0 {
            PurchaseOrderDetailStatus::Parcial
        } else {
            PurchaseOrderDetailStatus::Pendiente
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchase_order_details")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub purchase_order_id: i32,
    pub item_id: i32,
    pub ordered_quantity: i32,
    pub received_quantity: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub unit_price: Decimal,
    pub status: PurchaseOrderDetailStatus,
}

impl Model {
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.ordered_quantity) * self.unit_price
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::purchase_order::Entity",
        from = "Column::PurchaseOrderId",
        to = "super::purchase_order::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    PurchaseOrder,
    #[sea_orm(
        belongs_to = "super::inventory_item::Entity",
        from = "Column::ItemId",
        to = "super::inventory_item::Column::Id",
        on_update = "Cascade",
        on_delete = "Restrict"
    )]
    Item,
}

impl Related<super::purchase_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchaseOrder.def()
    }
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::PurchaseOrderDetailStatus::*;
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_receipt_keeps_status() {
        assert_eq!(Pendiente.after_receipt(10, 0), Pendiente);
        assert_eq!(Parcial.after_receipt(10, 0), Parcial);
    }

    #[test]
    fn partial_and_full_receipts() {
        assert_eq!(Pendiente.after_receipt(10, 4), Parcial);
        assert_eq!(Pendiente.after_receipt(10, 10), Completado);
        assert_eq!(Parcial.after_receipt(10, 12), Completado);
    }

    #[test]
    fn raising_the_order_reopens_a_completed_line() {
        assert_eq!(PurchaseOrderDetailStatus::after_reorder(20, 5), Parcial);
        assert_eq!(PurchaseOrderDetailStatus::after_reorder(20, 0), Pendiente);
        assert_eq!(PurchaseOrderDetailStatus::after_reorder(4, 5), Completado);
    }

    #[test]
    fn line_total_uses_ordered_quantity() {
        let line = Model {
            id: 1,
            purchase_order_id: 1,
            item_id: 1,
            ordered_quantity: 3,
            received_quantity: 1,
            unit_price: dec!(12.50),
            status: Parcial,
        };
        assert_eq!(line.line_total(), dec!(37.50));
    }

    proptest! {
        #[test]
        fn receipt_status_tracks_quantities(ordered in 1i32..1_000, received in 1i32..2_000) {
            let status = Pendiente.after_receipt(ordered, received);
            prop_assert_eq!(status == Completado, received >= ordered);
            prop_assert_ne!(status, Pendiente);
        }
    }
}
