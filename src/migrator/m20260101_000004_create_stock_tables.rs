use sea_orm_migration::prelude::*;

use super::m20260101_000001_create_roles_and_users::Users;
use super::m20260101_000002_create_catalog_tables::{InventoryItems, Suppliers};
use super::m20260101_000003_create_workshop_tables::ServiceOrders;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PurchaseOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseOrders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::SupplierId).integer().not_null())
                    .col(ColumnDef::new(PurchaseOrders::RequestedBy).integer().not_null())
                    .col(
                        ColumnDef::new(PurchaseOrders::OrderDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::ExpectedDeliveryDate)
                            .date()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::ReceivedDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::Status)
                            .string_len(32)
                            .not_null()
                            .default("pendiente"),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::Total)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(PurchaseOrders::Notes).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_orders_supplier_id")
                            .from(PurchaseOrders::Table, PurchaseOrders::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_orders_requested_by")
                            .from(PurchaseOrders::Table, PurchaseOrders::RequestedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PurchaseOrderDetails::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseOrderDetails::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderDetails::PurchaseOrderId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseOrderDetails::ItemId).integer().not_null())
                    .col(
                        ColumnDef::new(PurchaseOrderDetails::OrderedQuantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderDetails::ReceivedQuantity)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderDetails::UnitPrice)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrderDetails::Status)
                            .string_len(32)
                            .not_null()
                            .default("pendiente"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_order_details_order_id")
                            .from(
                                PurchaseOrderDetails::Table,
                                PurchaseOrderDetails::PurchaseOrderId,
                            )
                            .to(PurchaseOrders::Table, PurchaseOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_order_details_item_id")
                            .from(PurchaseOrderDetails::Table, PurchaseOrderDetails::ItemId)
                            .to(InventoryItems::Table, InventoryItems::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StockMovements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockMovements::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StockMovements::ItemId).integer().not_null())
                    .col(
                        ColumnDef::new(StockMovements::MovementType)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StockMovements::Quantity)
                            .integer()
                            .not_null()
                            .check(Expr::col(StockMovements::Quantity).gt(0)),
                    )
                    .col(
                        ColumnDef::new(StockMovements::UnitPrice)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockMovements::UserId).integer().not_null())
                    .col(ColumnDef::new(StockMovements::OrderId).integer().null())
                    .col(ColumnDef::new(StockMovements::SupplierId).integer().null())
                    .col(ColumnDef::new(StockMovements::Motive).string().not_null())
                    .col(
                        ColumnDef::new(StockMovements::InvoiceNumber)
                            .string_len(64)
                            .null(),
                    )
                    .col(ColumnDef::new(StockMovements::Notes).text().null())
                    .col(
                        ColumnDef::new(StockMovements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_movements_item_id")
                            .from(StockMovements::Table, StockMovements::ItemId)
                            .to(InventoryItems::Table, InventoryItems::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_movements_user_id")
                            .from(StockMovements::Table, StockMovements::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_movements_order_id")
                            .from(StockMovements::Table, StockMovements::OrderId)
                            .to(ServiceOrders::Table, ServiceOrders::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stock_movements_supplier_id")
                            .from(StockMovements::Table, StockMovements::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StockMovements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PurchaseOrderDetails::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum PurchaseOrders {
    Table,
    Id,
    SupplierId,
    RequestedBy,
    OrderDate,
    ExpectedDeliveryDate,
    ReceivedDate,
    Status,
    Total,
    Notes,
}

#[derive(DeriveIden)]
pub enum PurchaseOrderDetails {
    Table,
    Id,
    PurchaseOrderId,
    ItemId,
    OrderedQuantity,
    ReceivedQuantity,
    UnitPrice,
    Status,
}

#[derive(DeriveIden)]
pub enum StockMovements {
    Table,
    Id,
    ItemId,
    MovementType,
    Quantity,
    UnitPrice,
    UserId,
    OrderId,
    SupplierId,
    Motive,
    InvoiceNumber,
    Notes,
    CreatedAt,
}
