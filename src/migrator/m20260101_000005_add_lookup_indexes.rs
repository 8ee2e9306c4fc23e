use sea_orm_migration::prelude::*;

use super::m20260101_000003_create_workshop_tables::{
    Appointments, OrderDetails, ServiceOrders, VehicleHistory,
};
use super::m20260101_000004_create_stock_tables::{PurchaseOrderDetails, StockMovements};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Ledger lookups: movements per item, newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_stock_movements_item_created")
                    .table(StockMovements::Table)
                    .col(StockMovements::ItemId)
                    .col((StockMovements::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_details_order_status")
                    .table(OrderDetails::Table)
                    .col(OrderDetails::OrderId)
                    .col(OrderDetails::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_service_orders_status_created")
                    .table(ServiceOrders::Table)
                    .col(ServiceOrders::Status)
                    .col((ServiceOrders::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_appointments_date")
                    .table(Appointments::Table)
                    .col(Appointments::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_order_details_order_id")
                    .table(PurchaseOrderDetails::Table)
                    .col(PurchaseOrderDetails::PurchaseOrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_vehicle_history_vehicle_id")
                    .table(VehicleHistory::Table)
                    .col(VehicleHistory::VehicleId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_vehicle_history_vehicle_id",
            "idx_purchase_order_details_order_id",
            "idx_appointments_date",
            "idx_service_orders_status_created",
            "idx_order_details_order_status",
            "idx_stock_movements_item_created",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }
        Ok(())
    }
}
