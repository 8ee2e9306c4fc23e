use sea_orm_migration::prelude::*;

use super::m20260101_000001_create_roles_and_users::Users;
use super::m20260101_000002_create_catalog_tables::{Services, Vehicles};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Appointments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Appointments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Appointments::CustomerId).integer().not_null())
                    .col(ColumnDef::new(Appointments::VehicleId).integer().not_null())
                    .col(ColumnDef::new(Appointments::Date).date().not_null())
                    .col(
                        ColumnDef::new(Appointments::Status)
                            .string_len(32)
                            .not_null()
                            .default("programada"),
                    )
                    .col(ColumnDef::new(Appointments::ServiceType).string().not_null())
                    .col(ColumnDef::new(Appointments::Description).text().null())
                    .col(
                        ColumnDef::new(Appointments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_appointments_customer_id")
                            .from(Appointments::Table, Appointments::CustomerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_appointments_vehicle_id")
                            .from(Appointments::Table, Appointments::VehicleId)
                            .to(Vehicles::Table, Vehicles::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ServiceOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceOrders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ServiceOrders::AppointmentId).integer().null())
                    .col(ColumnDef::new(ServiceOrders::CustomerId).integer().not_null())
                    .col(ColumnDef::new(ServiceOrders::VehicleId).integer().not_null())
                    .col(
                        ColumnDef::new(ServiceOrders::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ServiceOrders::EndDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ServiceOrders::Status)
                            .string_len(32)
                            .not_null()
                            .default("abierta"),
                    )
                    .col(ColumnDef::new(ServiceOrders::Diagnosis).text().null())
                    .col(ColumnDef::new(ServiceOrders::Notes).text().null())
                    .col(ColumnDef::new(ServiceOrders::Mileage).integer().null())
                    .col(
                        ColumnDef::new(ServiceOrders::Total)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ServiceOrders::CreatedBy).integer().not_null())
                    .col(ColumnDef::new(ServiceOrders::FinalizedBy).integer().null())
                    .col(
                        ColumnDef::new(ServiceOrders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_orders_appointment_id")
                            .from(ServiceOrders::Table, ServiceOrders::AppointmentId)
                            .to(Appointments::Table, Appointments::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_orders_customer_id")
                            .from(ServiceOrders::Table, ServiceOrders::CustomerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_orders_vehicle_id")
                            .from(ServiceOrders::Table, ServiceOrders::VehicleId)
                            .to(Vehicles::Table, Vehicles::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_orders_created_by")
                            .from(ServiceOrders::Table, ServiceOrders::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_service_orders_finalized_by")
                            .from(ServiceOrders::Table, ServiceOrders::FinalizedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderDetails::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderDetails::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderDetails::OrderId).integer().not_null())
                    .col(ColumnDef::new(OrderDetails::ServiceId).integer().not_null())
                    .col(ColumnDef::new(OrderDetails::MechanicId).integer().null())
                    .col(ColumnDef::new(OrderDetails::Description).text().null())
                    .col(
                        ColumnDef::new(OrderDetails::Status)
                            .string_len(32)
                            .not_null()
                            .default("pendiente"),
                    )
                    .col(
                        ColumnDef::new(OrderDetails::Price)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrderDetails::WorkHours)
                            .decimal_len(6, 2)
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_details_order_id")
                            .from(OrderDetails::Table, OrderDetails::OrderId)
                            .to(ServiceOrders::Table, ServiceOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_details_service_id")
                            .from(OrderDetails::Table, OrderDetails::ServiceId)
                            .to(Services::Table, Services::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_details_mechanic_id")
                            .from(OrderDetails::Table, OrderDetails::MechanicId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VehicleHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VehicleHistory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VehicleHistory::VehicleId).integer().not_null())
                    .col(ColumnDef::new(VehicleHistory::OrderId).integer().null())
                    .col(ColumnDef::new(VehicleHistory::MechanicId).integer().not_null())
                    .col(ColumnDef::new(VehicleHistory::ServiceType).string().not_null())
                    .col(ColumnDef::new(VehicleHistory::Description).text().not_null())
                    .col(ColumnDef::new(VehicleHistory::Mileage).integer().not_null())
                    .col(
                        ColumnDef::new(VehicleHistory::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VehicleHistory::EndDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(VehicleHistory::Observations).text().null())
                    .col(
                        ColumnDef::new(VehicleHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_history_vehicle_id")
                            .from(VehicleHistory::Table, VehicleHistory::VehicleId)
                            .to(Vehicles::Table, Vehicles::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_history_order_id")
                            .from(VehicleHistory::Table, VehicleHistory::OrderId)
                            .to(ServiceOrders::Table, ServiceOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_history_mechanic_id")
                            .from(VehicleHistory::Table, VehicleHistory::MechanicId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VehicleHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrderDetails::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ServiceOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Appointments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Appointments {
    Table,
    Id,
    CustomerId,
    VehicleId,
    Date,
    Status,
    ServiceType,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum ServiceOrders {
    Table,
    Id,
    AppointmentId,
    CustomerId,
    VehicleId,
    StartDate,
    EndDate,
    Status,
    Diagnosis,
    Notes,
    Mileage,
    Total,
    CreatedBy,
    FinalizedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum OrderDetails {
    Table,
    Id,
    OrderId,
    ServiceId,
    MechanicId,
    Description,
    Status,
    Price,
    WorkHours,
}

#[derive(DeriveIden)]
pub enum VehicleHistory {
    Table,
    Id,
    VehicleId,
    OrderId,
    MechanicId,
    ServiceType,
    Description,
    Mileage,
    StartDate,
    EndDate,
    Observations,
    CreatedAt,
}
